//! In-memory platform and fixtures shared by the tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::db::Db;
use crate::models::context::{CallerContext, MemberRef};
use crate::platform::{Platform, PlatformAction, PlatformError};
use crate::state::AppState;

/// Records every action and fails the kinds it is told to.
#[derive(Default)]
pub struct RecordingPlatform {
    actions: Mutex<Vec<PlatformAction>>,
    failing: Mutex<HashSet<&'static str>>,
    stalled: Mutex<Option<(&'static str, Duration)>>,
}

impl RecordingPlatform {
    pub fn fail(&self, kind: &'static str) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn recover(&self, kind: &'static str) {
        self.failing.lock().unwrap().remove(kind);
    }

    pub fn actions(&self) -> Vec<PlatformAction> {
        self.actions.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.kind() == kind)
            .count()
    }

    /// Makes every action of `kind` block for `delay` before succeeding.
    pub fn stall(&self, kind: &'static str, delay: Duration) {
        *self.stalled.lock().unwrap() = Some((kind, delay));
    }

    /// Replays the recorded role grants and removals for one user.
    pub fn roles_after(&self, user: &str, initial: &[&str]) -> Vec<String> {
        let mut held: Vec<String> = initial.iter().map(|r| r.to_string()).collect();
        for action in self.actions() {
            match action {
                PlatformAction::AddRole { user_id, role, .. } if user_id == user => {
                    if !held.contains(&role) {
                        held.push(role);
                    }
                }
                PlatformAction::RemoveRoles { user_id, roles, .. } if user_id == user => {
                    held.retain(|r| !roles.contains(r));
                }
                _ => {}
            }
        }
        held
    }
}

impl Platform for RecordingPlatform {
    fn perform(&self, action: PlatformAction) -> Result<(), PlatformError> {
        let kind = action.kind();
        self.actions.lock().unwrap().push(action);
        if self.failing.lock().unwrap().contains(kind) {
            return Err(PlatformError::Api(format!("{kind} rejected")));
        }
        let stalled = *self.stalled.lock().unwrap();
        if let Some((stalled_kind, delay)) = stalled {
            if stalled_kind == kind {
                std::thread::sleep(delay);
            }
        }
        Ok(())
    }
}

pub fn test_state() -> (Arc<AppState>, Arc<RecordingPlatform>) {
    let db = Arc::new(Db::open_in_memory().unwrap());
    let platform = Arc::new(RecordingPlatform::default());
    let state = AppState::new(db, Config::for_tests(), platform.clone());
    (Arc::new(state), platform)
}

pub fn ctx(issuer: &str, roles: &[&str]) -> CallerContext {
    CallerContext {
        issuer_id: issuer.into(),
        guild_id: "guild".into(),
        channel_id: None,
        issuer_roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn member(id: &str, roles: &[&str]) -> MemberRef {
    MemberRef {
        id: id.into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}
