//! Strike escalation for league hosts.
//!
//! The counter is committed first and never rolled back; the role transition
//! that follows is best-effort and reported as a single [`StrikeOutcome`].

use rusqlite::{params, OptionalExtension};

use crate::config::RoleConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::context::{CallerContext, MemberRef};
use crate::models::strike::{StrikeOutcome, StrikeReport};
use crate::platform::{Effects, Notice, PlatformAction, SideEffectWarning};
use crate::state::AppState;
use crate::validation;

/// Increments and returns the host's strike count.
pub fn record_strike(db: &Db, host_id: &str, reason: &str) -> Result<u32, AppError> {
    db.with_tx(|tx| {
        tx.execute(
            "INSERT INTO warns (host_id, count, last_reason) VALUES (?1, 1, ?2)
             ON CONFLICT(host_id) DO UPDATE SET
                count = count + 1, last_reason = excluded.last_reason, updated_at = datetime('now')",
            params![host_id, reason],
        )?;
        let count: u32 = tx.query_row(
            "SELECT count FROM warns WHERE host_id = ?1",
            params![host_id],
            |row| row.get(0),
        )?;
        Ok(count)
    })
}

pub fn strike_count(db: &Db, host_id: &str) -> Result<u32, AppError> {
    let count: Option<u32> = db.with_conn(|conn| {
        conn.query_row(
            "SELECT count FROM warns WHERE host_id = ?1",
            params![host_id],
            |row| row.get(0),
        )
        .optional()
    })?;
    Ok(count.unwrap_or(0))
}

pub async fn issue_strike(
    state: &AppState,
    ctx: &CallerContext,
    target: &MemberRef,
    reason: &str,
) -> Result<StrikeReport, AppError> {
    if !ctx.holds(&state.config.roles.staff) {
        return Err(AppError::Forbidden(
            "Only staff can use the warning system".into(),
        ));
    }
    let reason = validation::validate_reason(Some(reason));

    let guard = state.host_locks.acquire(&target.id).await;
    let count = record_strike(&state.db, &target.id, &reason)?;
    tracing::info!(host_id = %target.id, count, staff = %ctx.issuer_id, "strike recorded");

    let mut warnings = Vec::new();
    let outcome = escalate(
        &state.effects,
        &state.config.roles,
        target,
        count,
        &reason,
        &mut warnings,
    )
    .await;
    drop(guard);
    tracing::info!(host_id = %target.id, count, ?outcome, "strike escalation applied");

    let notice = Notice::StrikeIssued {
        target_id: target.id.clone(),
        staff_id: ctx.issuer_id.clone(),
        count,
        reason,
        outcome,
    };
    state
        .effects
        .best_effort(PlatformAction::Log { notice }, &mut warnings)
        .await;

    Ok(StrikeReport {
        host_id: target.id.clone(),
        count,
        outcome,
        warnings,
    })
}

/// Strike roles the host may hold before strike `count` is applied.
///
/// The reported role set can predate a strike granted moments ago, so every
/// role an earlier strike would have added counts as held too. From the third
/// strike on, that is every strike role.
fn held_strike_roles(roles: &RoleConfig, target: &MemberRef, count: u32) -> Vec<String> {
    let mut held: Vec<String> = target
        .roles
        .iter()
        .filter(|r| roles.is_strike_role(r))
        .cloned()
        .collect();
    let granted_upto = if count >= 3 { 3 } else { count.saturating_sub(1) };
    for earlier in 1..=granted_upto {
        if let Some(role) = roles.strike_role(earlier).filter(|r| !r.is_empty()) {
            if !held.iter().any(|h| h == role) {
                held.push(role.to_string());
            }
        }
    }
    held
}

/// Moves the host's roles to match `count`.
///
/// Must run under the host's lock: `target.roles` is the role set reported
/// with the request and may be stale.
pub async fn escalate(
    effects: &Effects,
    roles: &RoleConfig,
    target: &MemberRef,
    count: u32,
    reason: &str,
    warnings: &mut Vec<SideEffectWarning>,
) -> StrikeOutcome {
    let held_strikes = held_strike_roles(roles, target, count);

    if count >= 3 {
        if !held_strikes.is_empty() {
            effects
                .best_effort(
                    PlatformAction::RemoveRoles {
                        user_id: target.id.clone(),
                        roles: held_strikes,
                        reason: format!("Final strike ({}) reached", count),
                    },
                    warnings,
                )
                .await;
        }
        if !target.holds(&roles.league_host) {
            return StrikeOutcome::NoHostRoleToRevoke;
        }
        let revoked = effects
            .perform(PlatformAction::RemoveRoles {
                user_id: target.id.clone(),
                roles: vec![roles.league_host.clone()],
                reason: format!("Maximum strikes reached ({}), host role revoked", count),
            })
            .await;
        return match revoked {
            Ok(()) => StrikeOutcome::HostRevoked,
            Err(err) => {
                tracing::warn!(host_id = %target.id, error = %err, "host role revoke failed");
                warnings.push(SideEffectWarning::new("revoke_host_role", err));
                StrikeOutcome::HostRevokeFailed
            }
        };
    }

    let strike_role = match roles.strike_role(count).filter(|r| !r.is_empty()) {
        Some(role) => role.to_string(),
        None => {
            warnings.push(SideEffectWarning::new(
                "add_role",
                format!("no role configured for strike {}", count),
            ));
            return StrikeOutcome::RoleAddFailed;
        }
    };

    let stale: Vec<String> = held_strikes
        .into_iter()
        .filter(|r| *r != strike_role)
        .collect();
    if !stale.is_empty() {
        let removed = effects
            .best_effort(
                PlatformAction::RemoveRoles {
                    user_id: target.id.clone(),
                    roles: stale,
                    reason: format!("Strike {} issued", count),
                },
                warnings,
            )
            .await;
        if !removed {
            return StrikeOutcome::RoleRemoveFailed;
        }
    }

    if target.holds(&strike_role) {
        return StrikeOutcome::RoleAlreadyPresent;
    }
    let added = effects
        .best_effort(
            PlatformAction::AddRole {
                user_id: target.id.clone(),
                role: strike_role,
                reason: format!("Strike {} issued: {}", count, reason),
            },
            warnings,
        )
        .await;
    if added {
        StrikeOutcome::RoleAdded
    } else {
        StrikeOutcome::RoleAddFailed
    }
}
