use std::sync::Arc;

use crate::affordances::AffordanceRegistry;
use crate::cache::EventCache;
use crate::config::Config;
use crate::db::Db;
use crate::locks::KeyedLocks;
use crate::models::presence::{AfkStatus, SnipedMessage};
use crate::platform::{Effects, Platform};

/// Everything a request handler needs, shared across workers.
pub struct AppState {
    pub db: Arc<Db>,
    pub config: Config,
    pub effects: Effects,
    /// Serializes roster mutations per league id.
    pub league_locks: KeyedLocks,
    /// Serializes strike escalation per host id.
    pub host_locks: KeyedLocks,
    pub affordances: AffordanceRegistry,
    /// AFK status by user id.
    pub afk: EventCache<String, AfkStatus>,
    /// Last deleted message by channel id.
    pub snipes: EventCache<String, SnipedMessage>,
}

impl AppState {
    pub fn new(db: Arc<Db>, config: Config, platform: Arc<dyn Platform>) -> Self {
        let effects = Effects::new(platform, config.side_effect_timeout);
        AppState {
            db,
            config,
            effects,
            league_locks: KeyedLocks::new(),
            host_locks: KeyedLocks::new(),
            affordances: AffordanceRegistry::new(),
            afk: EventCache::new(),
            snipes: EventCache::new(),
        }
    }
}
