use serde::{Deserialize, Serialize};

use super::context::{CallerContext, MemberRef};
use crate::platform::SideEffectWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModAction {
    Kick,
    Ban,
    /// Targets a user id; the reported roles are ignored.
    Unban,
    Timeout,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub context: CallerContext,
    pub action: ModAction,
    pub target: MemberRef,
    #[serde(default)]
    pub reason: Option<String>,
    /// `<number><s|m|h|d>`, required for timeouts.
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModerationResult {
    pub action: ModAction,
    pub target_id: String,
    pub reason: String,
    pub duration_secs: Option<u64>,
    pub warnings: Vec<SideEffectWarning>,
}

/// Staff `role toggle`: adds the role when missing, removes it when held.
#[derive(Debug, Deserialize)]
pub struct RoleToggleRequest {
    pub context: CallerContext,
    pub target: MemberRef,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleToggleResult {
    pub target_id: String,
    pub role: String,
    pub added: bool,
    pub warnings: Vec<SideEffectWarning>,
}
