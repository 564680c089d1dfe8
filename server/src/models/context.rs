use serde::{Deserialize, Serialize};

/// Who is asking, and from where.
///
/// Every command carries one of these; `channel_id` is what lets league
/// commands omit the league id when issued from a coordination thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerContext {
    pub issuer_id: String,
    pub guild_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub issuer_roles: Vec<String>,
}

impl CallerContext {
    pub fn holds(&self, role: &str) -> bool {
        holds_role(&self.issuer_roles, role)
    }

    pub fn as_member(&self) -> MemberRef {
        MemberRef {
            id: self.issuer_id.clone(),
            roles: self.issuer_roles.clone(),
        }
    }
}

/// A platform member as resolved by the adapter, with the roles they hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl MemberRef {
    pub fn holds(&self, role: &str) -> bool {
        holds_role(&self.roles, role)
    }
}

// An unset role id never matches anything.
fn holds_role(roles: &[String], role: &str) -> bool {
    !role.is_empty() && roles.iter().any(|r| r == role)
}
