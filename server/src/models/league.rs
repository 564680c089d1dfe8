use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::{CallerContext, MemberRef};
use crate::platform::SideEffectWarning;

/// Stored value meaning "no rank gate".
pub const OPEN_RANK: &str = "None";

/// Rank gate of a league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum RankRequirement {
    Open,
    Role(String),
}

impl RankRequirement {
    pub fn role(&self) -> Option<&str> {
        match self {
            RankRequirement::Open => None,
            RankRequirement::Role(role) => Some(role),
        }
    }
}

impl From<Option<String>> for RankRequirement {
    fn from(value: Option<String>) -> Self {
        match value {
            None => RankRequirement::Open,
            Some(v) if v.is_empty() || v == OPEN_RANK || v.eq_ignore_ascii_case("open") => {
                RankRequirement::Open
            }
            Some(role) => RankRequirement::Role(role),
        }
    }
}

impl From<RankRequirement> for Option<String> {
    fn from(value: RankRequirement) -> Self {
        match value {
            RankRequirement::Open => Some(OPEN_RANK.to_string()),
            RankRequirement::Role(role) => Some(role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Perks {
    Enabled,
    Disabled,
}

/// Players needed for a match-type tag such as `"3v3"`.
///
/// `None` means the tag could not be read and the league has no cap.
pub fn capacity_for(match_type: &str) -> Option<usize> {
    team_size_for(match_type).map(|size| size * 2)
}

pub fn team_size_for(match_type: &str) -> Option<usize> {
    let (lead, _) = match_type.split_once('v')?;
    match lead.trim().parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(size) => Some(size),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub host: String,
    pub region: String,
    pub game_mode: String,
    pub match_type: String,
    pub perks: Perks,
    #[serde(default)]
    pub players: Vec<String>,
    #[serde(default = "open_rank")]
    pub rank_required: RankRequirement,
    #[serde(default)]
    pub thread_ref: Option<String>,
    #[serde(default)]
    pub announcement_channel_ref: Option<String>,
    #[serde(default)]
    pub announcement_msg_ref: Option<String>,
    #[serde(default)]
    pub thread_msg_ref: Option<String>,
    #[serde(default)]
    pub private_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn open_rank() -> RankRequirement {
    RankRequirement::Open
}

impl League {
    pub fn capacity(&self) -> Option<usize> {
        capacity_for(&self.match_type)
    }

    pub fn is_full(&self) -> bool {
        matches!(self.capacity(), Some(cap) if self.players.len() >= cap)
    }

    pub fn has_player(&self, user_id: &str) -> bool {
        self.players.iter().any(|p| p == user_id)
    }

    pub fn has_announcement(&self) -> bool {
        self.announcement_msg_ref.is_some()
    }
}

/// Everything needed to register a new league; the registry assigns the id.
#[derive(Debug, Clone)]
pub struct NewLeague {
    pub host: String,
    pub region: String,
    pub game_mode: String,
    pub match_type: String,
    pub perks: Perks,
    pub rank_required: RankRequirement,
    pub private_link: Option<String>,
}

/// Re-attachable join control for a league with a live announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinAffordance {
    pub league_id: String,
    pub rank_required: RankRequirement,
}

impl From<&League> for JoinAffordance {
    fn from(league: &League) -> Self {
        JoinAffordance {
            league_id: league.id.clone(),
            rank_required: league.rank_required.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HostLeagueRequest {
    pub context: CallerContext,
    pub region: String,
    pub game_mode: String,
    pub match_type: String,
    pub perks: String,
    #[serde(default)]
    pub rank_required: Option<String>,
    #[serde(default)]
    pub private_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachChannelsRequest {
    pub context: CallerContext,
    pub thread_ref: String,
    pub announcement_channel_ref: String,
    pub announcement_msg_ref: String,
    #[serde(default)]
    pub thread_msg_ref: Option<String>,
}

/// add-member / kick-member.
#[derive(Debug, Deserialize)]
pub struct MemberCommand {
    pub context: CallerContext,
    #[serde(default)]
    pub league_id: Option<String>,
    pub member: MemberRef,
}

/// leave-league / status / randomize-teams / end-league.
#[derive(Debug, Deserialize)]
pub struct LeagueCommand {
    pub context: CallerContext,
    #[serde(default)]
    pub league_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinPress {
    pub context: CallerContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Joined,
    Added,
    Kicked,
    Left,
}

/// Committed roster change plus whatever side effects did not go through.
#[derive(Debug, Serialize)]
pub struct MembershipChange {
    pub league_id: String,
    pub user_id: String,
    pub action: MembershipAction,
    pub players: usize,
    pub capacity: Option<usize>,
    pub warnings: Vec<SideEffectWarning>,
}

#[derive(Debug, Serialize)]
pub struct HostedLeague {
    pub league: League,
    pub capacity: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeagueStatus {
    pub league_id: String,
    pub host: String,
    pub players: Vec<String>,
    pub player_count: usize,
    pub capacity: Option<usize>,
    pub is_full: bool,
    pub region: String,
    pub game_mode: String,
    pub match_type: String,
    pub perks: Perks,
    /// Rank name, the raw role reference when unconfigured, `None` when open.
    pub rank_restriction: Option<String>,
    pub private_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Teams {
    pub league_id: String,
    pub match_type: String,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub warnings: Vec<SideEffectWarning>,
}

#[derive(Debug, Serialize)]
pub struct LeagueEnded {
    pub league_id: String,
    pub ended_by: String,
    pub warnings: Vec<SideEffectWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_from_tag() {
        assert_eq!(capacity_for("1v1"), Some(2));
        assert_eq!(capacity_for("2v2"), Some(4));
        assert_eq!(capacity_for("4v4"), Some(8));
        assert_eq!(capacity_for("free-for-all"), None);
        assert_eq!(capacity_for("xv3"), None);
        assert_eq!(capacity_for("0v0"), None);
    }

    #[test]
    fn rank_requirement_stores_open_as_sentinel() {
        let open: Option<String> = RankRequirement::Open.into();
        assert_eq!(open.as_deref(), Some(OPEN_RANK));
        assert_eq!(RankRequirement::from(None), RankRequirement::Open);
        assert_eq!(RankRequirement::from(Some("None".to_string())), RankRequirement::Open);
        assert_eq!(
            RankRequirement::from(Some("123".to_string())),
            RankRequirement::Role("123".into())
        );
    }

    #[test]
    fn legacy_document_without_optional_fields_loads() {
        let doc = serde_json::json!({
            "id": "00000000000000000001",
            "host": "42",
            "region": "EU",
            "game_mode": "Swift Game",
            "match_type": "2v2",
            "perks": "Enabled",
            "created_at": "2025-01-01T00:00:00Z",
        });
        let league: League = serde_json::from_value(doc).unwrap();
        assert_eq!(league.rank_required, RankRequirement::Open);
        assert!(league.players.is_empty());
        assert!(!league.has_announcement());
        assert_eq!(league.capacity(), Some(4));
    }
}
