use serde::{Deserialize, Serialize};

use super::context::CallerContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub role_ref: String,
    pub name: String,
    pub level: i64,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRankRequest {
    pub context: CallerContext,
    pub role: String,
    pub name: String,
    pub level: i64,
    #[serde(default)]
    pub color: Option<String>,
}

/// Entry offered to the adapter when a host picks a rank gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankChoice {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ChoicesQuery {
    pub current: Option<String>,
}

/// Display rank of a member. `color` is absent when unranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankDetails {
    pub name: String,
    pub color: Option<String>,
}
