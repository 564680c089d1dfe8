//! Join Arbitration.
//!
//! Every roster change takes the league's lock, re-reads the league inside a
//! store transaction, checks, and commits; side effects run afterwards and can
//! only add warnings to the committed result.

use crate::error::AppError;
use crate::models::context::MemberRef;
use crate::models::league::{League, MembershipAction, MembershipChange};
use crate::platform::{Notice, PlatformAction, SideEffectWarning};
use crate::services::ranks::RankDirectory;
use crate::services::registry;
use crate::state::AppState;

/// A player pressing the join control.
pub async fn attempt_join(
    state: &AppState,
    league_id: &str,
    member: &MemberRef,
) -> Result<MembershipChange, AppError> {
    admit(state, league_id, member, None).await
}

/// The league host adding someone directly. Same checks as joining.
pub async fn host_add(
    state: &AppState,
    league_id: &str,
    acting_host: &str,
    member: &MemberRef,
) -> Result<MembershipChange, AppError> {
    admit(state, league_id, member, Some(acting_host)).await
}

async fn admit(
    state: &AppState,
    league_id: &str,
    member: &MemberRef,
    acting_host: Option<&str>,
) -> Result<MembershipChange, AppError> {
    let directory = RankDirectory::load(&state.db)?;

    let (league, ()) = locked_update(state, league_id, |league| {
        if let Some(host) = acting_host {
            if league.host != host {
                return Err(AppError::NotHost);
            }
        }
        if league.has_player(&member.id) {
            return Err(AppError::AlreadyMember(league.id.clone()));
        }
        if !directory.is_eligible(&league.rank_required, &member.roles) {
            return Err(AppError::NotEligible {
                required: directory
                    .display_name(&league.rank_required)
                    .unwrap_or_default(),
            });
        }
        if let Some(capacity) = league.capacity() {
            if league.players.len() >= capacity {
                return Err(AppError::LeagueFull {
                    league_id: league.id.clone(),
                    capacity,
                });
            }
        }
        league.players.push(member.id.clone());
        Ok(())
    })
    .await?;

    let action = if acting_host.is_some() {
        MembershipAction::Added
    } else {
        MembershipAction::Joined
    };
    tracing::info!(
        league_id = %league.id,
        user_id = %member.id,
        ?action,
        players = league.players.len(),
        "roster change committed"
    );

    let mut warnings = Vec::new();
    match &league.thread_ref {
        Some(thread_ref) => {
            let added = state
                .effects
                .best_effort(
                    PlatformAction::AddThreadMember {
                        thread_ref: thread_ref.clone(),
                        user_id: member.id.clone(),
                    },
                    &mut warnings,
                )
                .await;
            if added {
                let notice = Notice::PlayerJoined {
                    league_id: league.id.clone(),
                    user_id: member.id.clone(),
                    added_by_host: acting_host.is_some(),
                    rank: directory.details(&member.roles),
                };
                state
                    .effects
                    .best_effort(
                        PlatformAction::PostToThread {
                            thread_ref: thread_ref.clone(),
                            notice,
                        },
                        &mut warnings,
                    )
                    .await;
            }
        }
        None => warnings.push(missing_thread("add_thread_member")),
    }

    Ok(change(&league, &member.id, action, warnings))
}

/// The league host removing a player.
pub async fn kick(
    state: &AppState,
    league_id: &str,
    acting_host: &str,
    user_id: &str,
) -> Result<MembershipChange, AppError> {
    let (league, ()) = locked_update(state, league_id, |league| {
        if league.host != acting_host {
            return Err(AppError::NotHost);
        }
        if !league.has_player(user_id) {
            return Err(AppError::NotMember(league.id.clone()));
        }
        if league.host == user_id {
            return Err(AppError::CannotKickHost);
        }
        league.players.retain(|p| p != user_id);
        Ok(())
    })
    .await?;

    tracing::info!(league_id = %league.id, user_id, "player kicked");
    let notice = Notice::PlayerKicked {
        league_id: league.id.clone(),
        user_id: user_id.to_string(),
    };
    let warnings = remove_from_thread(state, &league, user_id, notice).await;
    Ok(change(&league, user_id, MembershipAction::Kicked, warnings))
}

/// A player leaving on their own. The host ends the league instead.
pub async fn leave(
    state: &AppState,
    league_id: &str,
    user_id: &str,
) -> Result<MembershipChange, AppError> {
    let (league, ()) = locked_update(state, league_id, |league| {
        if !league.has_player(user_id) {
            return Err(AppError::NotMember(league.id.clone()));
        }
        if league.host == user_id {
            return Err(AppError::HostMustEndLeague);
        }
        league.players.retain(|p| p != user_id);
        Ok(())
    })
    .await?;

    tracing::info!(league_id = %league.id, user_id, "player left");
    let notice = Notice::PlayerLeft {
        league_id: league.id.clone(),
        user_id: user_id.to_string(),
    };
    let warnings = remove_from_thread(state, &league, user_id, notice).await;
    Ok(change(&league, user_id, MembershipAction::Left, warnings))
}

/// [`registry::update`] under the league's lock.
pub(crate) async fn locked_update<F, T>(
    state: &AppState,
    league_id: &str,
    mutate: F,
) -> Result<(League, T), AppError>
where
    F: FnOnce(&mut League) -> Result<T, AppError>,
{
    let guard = state.league_locks.acquire(league_id).await;
    let result = registry::update(&state.db, league_id, mutate);
    drop(guard);
    if matches!(result, Err(AppError::NotFound(_))) {
        state.league_locks.forget(league_id);
    }
    result
}

async fn remove_from_thread(
    state: &AppState,
    league: &League,
    user_id: &str,
    notice: Notice,
) -> Vec<SideEffectWarning> {
    let mut warnings = Vec::new();
    let Some(thread_ref) = &league.thread_ref else {
        warnings.push(missing_thread("remove_thread_member"));
        return warnings;
    };
    let removed = state
        .effects
        .best_effort(
            PlatformAction::RemoveThreadMember {
                thread_ref: thread_ref.clone(),
                user_id: user_id.to_string(),
            },
            &mut warnings,
        )
        .await;
    if removed {
        state
            .effects
            .best_effort(
                PlatformAction::PostToThread {
                    thread_ref: thread_ref.clone(),
                    notice,
                },
                &mut warnings,
            )
            .await;
    }
    warnings
}

fn missing_thread(effect: &str) -> SideEffectWarning {
    SideEffectWarning::new(effect, "league has no coordination thread")
}

fn change(
    league: &League,
    user_id: &str,
    action: MembershipAction,
    warnings: Vec<SideEffectWarning>,
) -> MembershipChange {
    MembershipChange {
        league_id: league.id.clone(),
        user_id: user_id.to_string(),
        action,
        players: league.players.len(),
        capacity: league.capacity(),
        warnings,
    }
}
