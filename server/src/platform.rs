//! Boundary to the hosting platform.
//!
//! The core never talks to the platform directly. Every side effect is a
//! [`PlatformAction`] handed to a [`Platform`] through [`Effects`], which bounds
//! each call with a timeout and keeps it outside any store transaction.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::league::JoinAffordance;
use crate::models::moderation::ModAction;
use crate::models::rank::RankDetails;
use crate::models::strike::StrikeOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("platform API error: {0}")]
    Api(String),
}

/// Structured content for the platform to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    PlayerJoined {
        league_id: String,
        user_id: String,
        added_by_host: bool,
        rank: RankDetails,
    },
    PlayerKicked {
        league_id: String,
        user_id: String,
    },
    PlayerLeft {
        league_id: String,
        user_id: String,
    },
    TeamsRandomized {
        league_id: String,
        host: String,
        match_type: String,
        team_a: Vec<String>,
        team_b: Vec<String>,
    },
    LeagueEnded {
        league_id: String,
        host: String,
        ended_by: String,
    },
    StrikeIssued {
        target_id: String,
        staff_id: String,
        count: u32,
        reason: String,
        outcome: StrikeOutcome,
    },
    ModerationApplied {
        action: ModAction,
        target_id: String,
        moderator_id: String,
        reason: String,
        duration_secs: Option<u64>,
    },
    RoleToggled {
        target_id: String,
        moderator_id: String,
        role: String,
        added: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatformAction {
    AddThreadMember {
        thread_ref: String,
        user_id: String,
    },
    RemoveThreadMember {
        thread_ref: String,
        user_id: String,
    },
    PostToThread {
        thread_ref: String,
        notice: Notice,
    },
    PostToChannel {
        channel_ref: String,
        notice: Notice,
    },
    DisableJoinAffordance {
        channel_ref: String,
        msg_ref: String,
    },
    DeleteThread {
        thread_ref: String,
    },
    AddRole {
        user_id: String,
        role: String,
        reason: String,
    },
    RemoveRoles {
        user_id: String,
        roles: Vec<String>,
        reason: String,
    },
    RegisterJoinAffordance {
        affordance: JoinAffordance,
    },
    Log {
        notice: Notice,
    },
    Moderate {
        action: ModAction,
        user_id: String,
        reason: String,
        duration_secs: Option<u64>,
    },
}

impl PlatformAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformAction::AddThreadMember { .. } => "add_thread_member",
            PlatformAction::RemoveThreadMember { .. } => "remove_thread_member",
            PlatformAction::PostToThread { .. } => "post_to_thread",
            PlatformAction::PostToChannel { .. } => "post_to_channel",
            PlatformAction::DisableJoinAffordance { .. } => "disable_join_affordance",
            PlatformAction::DeleteThread { .. } => "delete_thread",
            PlatformAction::AddRole { .. } => "add_role",
            PlatformAction::RemoveRoles { .. } => "remove_roles",
            PlatformAction::RegisterJoinAffordance { .. } => "register_join_affordance",
            PlatformAction::Log { .. } => "log",
            PlatformAction::Moderate { .. } => "moderate",
        }
    }
}

/// Anything that can carry out platform actions.
///
/// Implementations may block; [`Effects`] runs them off the async workers.
pub trait Platform: Send + Sync {
    fn perform(&self, action: PlatformAction) -> Result<(), PlatformError>;
}

/// A side effect that failed after the core state was already committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideEffectWarning {
    pub effect: String,
    pub error: String,
}

impl SideEffectWarning {
    pub fn new(effect: &str, error: impl ToString) -> Self {
        SideEffectWarning {
            effect: effect.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Effects {
    platform: Arc<dyn Platform>,
    timeout: Duration,
}

impl Effects {
    pub fn new(platform: Arc<dyn Platform>, timeout: Duration) -> Self {
        Effects { platform, timeout }
    }

    /// Performs one action, giving up after the configured timeout.
    pub async fn perform(&self, action: PlatformAction) -> Result<(), PlatformError> {
        let platform = Arc::clone(&self.platform);
        let kind = action.kind();
        let call = tokio::task::spawn_blocking(move || platform.perform(action));
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PlatformError::Api(format!("{kind} task failed: {join}"))),
            Err(_) => Err(PlatformError::Timeout(self.timeout)),
        }
    }

    /// Performs one action, recording a failure as a warning instead of an error.
    ///
    /// Returns whether the action went through.
    pub async fn best_effort(
        &self,
        action: PlatformAction,
        warnings: &mut Vec<SideEffectWarning>,
    ) -> bool {
        let kind = action.kind();
        match self.perform(action).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(effect = kind, error = %err, "side effect failed");
                warnings.push(SideEffectWarning::new(kind, err));
                false
            }
        }
    }
}
