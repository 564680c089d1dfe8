//! Rank Directory: which roles count as ranks, and how they order.

use rusqlite::params;

use crate::db::Db;
use crate::error::AppError;
use crate::models::league::{RankRequirement, OPEN_RANK};
use crate::models::rank::{Rank, RankChoice, RankDetails, SetRankRequest};
use crate::state::AppState;
use crate::validation;

const MAX_CHOICES: usize = 25;

/// Snapshot of the configured ranks, strongest first.
///
/// Equal levels keep the order in which their roles were first configured.
#[derive(Debug, Clone, Default)]
pub struct RankDirectory {
    ranks: Vec<Rank>,
}

impl RankDirectory {
    pub fn load(db: &Db) -> Result<Self, AppError> {
        Ok(RankDirectory::from_ranks(list(db)?))
    }

    pub fn from_ranks(ranks: Vec<Rank>) -> Self {
        let mut ranks = ranks;
        // stable: ties stay in insertion order
        ranks.sort_by(|a, b| b.level.cmp(&a.level));
        RankDirectory { ranks }
    }

    pub fn get(&self, role_ref: &str) -> Option<&Rank> {
        self.ranks.iter().find(|r| r.role_ref == role_ref)
    }

    /// Level of a configured rank; `None` for unknown roles and level 0.
    pub fn required_level(&self, role_ref: &str) -> Option<i64> {
        self.get(role_ref).map(|r| r.level).filter(|level| *level > 0)
    }

    fn strongest_held<'a>(&'a self, member_roles: &[String]) -> Option<&'a Rank> {
        // ranks are sorted, so the first match is the highest
        self.ranks
            .iter()
            .filter(|r| r.level > 0)
            .find(|r| member_roles.iter().any(|role| *role == r.role_ref))
    }

    pub fn highest_level(&self, member_roles: &[String]) -> i64 {
        self.strongest_held(member_roles).map_or(0, |r| r.level)
    }

    pub fn is_eligible(&self, required: &RankRequirement, member_roles: &[String]) -> bool {
        match required {
            RankRequirement::Open => true,
            RankRequirement::Role(role) => match self.required_level(role) {
                Some(level) => self.highest_level(member_roles) >= level,
                None => false,
            },
        }
    }

    pub fn display_name(&self, required: &RankRequirement) -> Option<String> {
        required
            .role()
            .map(|role| self.get(role).map_or_else(|| role.to_string(), |r| r.name.clone()))
    }

    pub fn details(&self, member_roles: &[String]) -> RankDetails {
        match self.strongest_held(member_roles) {
            Some(rank) => RankDetails {
                name: rank.name.clone(),
                color: Some(rank.color.clone()),
            },
            None => RankDetails {
                name: "Unranked".into(),
                color: None,
            },
        }
    }

    pub fn choices(&self) -> Vec<RankChoice> {
        let mut choices = vec![RankChoice {
            name: "None (Open League)".into(),
            value: OPEN_RANK.into(),
        }];
        choices.extend(self.ranks.iter().filter(|r| r.level > 0).map(|r| RankChoice {
            name: format!("Min Rank: {}", r.name),
            value: r.role_ref.clone(),
        }));
        choices
    }
}

/// Autocomplete filter over [`RankDirectory::choices`].
pub fn filter_choices(choices: Vec<RankChoice>, current: &str) -> Vec<RankChoice> {
    let needle = current.to_lowercase();
    choices
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&needle) || c.value == current)
        .take(MAX_CHOICES)
        .collect()
}

/// The staff-only `set-rank` command.
pub fn configure_rank(state: &AppState, req: SetRankRequest) -> Result<Rank, AppError> {
    if !req.context.holds(&state.config.roles.staff) {
        return Err(AppError::Forbidden("Only staff can configure ranks".into()));
    }
    set_rank(&state.db, &req.role, &req.name, req.level, req.color.as_deref())
}

/// Maps a role to a rank, replacing any previous mapping for that role.
pub fn set_rank(
    db: &Db,
    role: &str,
    name: &str,
    level: i64,
    color: Option<&str>,
) -> Result<Rank, AppError> {
    let role = role.trim();
    if role.is_empty() {
        return Err(AppError::InvalidInput("Role reference cannot be empty".into()));
    }
    let name = validation::validate_rank_name(name)?;
    validation::validate_rank_level(level)?;
    let color = validation::validate_color(color)?;

    db.with_tx(|tx| {
        // ON CONFLICT keeps the rowid, which is the tie-break order
        tx.execute(
            "INSERT INTO ranks (role_ref, name, level, color) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(role_ref) DO UPDATE SET
                name = excluded.name, level = excluded.level, color = excluded.color",
            params![role, name, level, color],
        )?;
        Ok::<_, AppError>(())
    })?;
    tracing::info!(role, name = %name, level, "rank configured");

    Ok(Rank {
        role_ref: role.to_string(),
        name,
        level,
        color,
    })
}

/// All configured ranks, highest level first.
pub fn list(db: &Db) -> Result<Vec<Rank>, AppError> {
    Ok(db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT role_ref, name, level, color FROM ranks ORDER BY level DESC, rowid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Rank {
                role_ref: row.get(0)?,
                name: row.get(1)?,
                level: row.get(2)?,
                color: row.get(3)?,
            })
        })?;

        let mut ranks = Vec::new();
        for row in rows {
            ranks.push(row?);
        }
        Ok::<_, rusqlite::Error>(ranks)
    })?)
}
