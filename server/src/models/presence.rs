use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::CallerContext;

#[derive(Debug, Deserialize)]
pub struct AfkRequest {
    pub context: CallerContext,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AfkStatus {
    pub reason: String,
    pub since: DateTime<Utc>,
}

/// A message seen in a channel. The issuer is the author.
#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    pub context: CallerContext,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub mentions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AfkAlert {
    pub user_id: String,
    pub reason: String,
    pub away_secs: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct PresenceEvents {
    pub alerts: Vec<AfkAlert>,
    /// The author was AFK and has just been cleared.
    pub welcomed_back: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeletedMessageEvent {
    pub channel_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnipedMessage {
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
