use serde::{Deserialize, Serialize};

use super::context::{CallerContext, MemberRef};
use crate::platform::SideEffectWarning;

#[derive(Debug, Deserialize)]
pub struct WarnRequest {
    pub context: CallerContext,
    pub target: MemberRef,
    pub reason: String,
}

/// Result of the role transition that follows a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeOutcome {
    RoleAdded,
    RoleAlreadyPresent,
    RoleAddFailed,
    RoleRemoveFailed,
    HostRevoked,
    HostRevokeFailed,
    NoHostRoleToRevoke,
}

#[derive(Debug, Serialize)]
pub struct StrikeReport {
    pub host_id: String,
    pub count: u32,
    pub outcome: StrikeOutcome,
    pub warnings: Vec<SideEffectWarning>,
}
