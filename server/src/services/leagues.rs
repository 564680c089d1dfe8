//! League commands as the platform issues them.
//!
//! These resolve the target league from the caller context, enforce role
//! privileges, and hand roster changes to [`membership`].

use rand::seq::SliceRandom;

use crate::error::AppError;
use crate::models::context::CallerContext;
use crate::models::league::{
    team_size_for, AttachChannelsRequest, HostLeagueRequest, HostedLeague, JoinAffordance,
    League, LeagueEnded, LeagueStatus, MemberCommand, MembershipChange, NewLeague,
    RankRequirement, Teams,
};
use crate::platform::{Notice, PlatformAction};
use crate::services::membership::{self, locked_update};
use crate::services::ranks::RankDirectory;
use crate::services::registry;
use crate::state::AppState;
use crate::validation;

fn require_host_role(state: &AppState, ctx: &CallerContext, what: &str) -> Result<(), AppError> {
    if ctx.holds(&state.config.roles.league_host) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only League Hosts can {}", what)))
    }
}

pub fn host_league(state: &AppState, req: HostLeagueRequest) -> Result<HostedLeague, AppError> {
    require_host_role(state, &req.context, "host leagues")?;

    let region = validation::validate_region(&req.region)?;
    let game_mode = validation::validate_game_mode(&req.game_mode)?;
    let match_type = validation::validate_match_type(&req.match_type)?;
    let perks = validation::validate_perks(&req.perks)?;
    let private_link = validation::validate_private_link(req.private_link)?;

    let rank_required = RankRequirement::from(req.rank_required);
    if let RankRequirement::Role(role) = &rank_required {
        let directory = RankDirectory::load(&state.db)?;
        if directory.required_level(role).is_none() {
            return Err(AppError::InvalidInput(format!(
                "Role {} is not a configured rank",
                role
            )));
        }
    }

    let league = registry::create(
        &state.db,
        NewLeague {
            host: req.context.issuer_id.clone(),
            region,
            game_mode,
            match_type,
            perks,
            rank_required,
            private_link,
        },
    )?;
    tracing::info!(
        league_id = %league.id,
        host = %league.host,
        match_type = %league.match_type,
        "league hosted"
    );

    let capacity = league.capacity();
    Ok(HostedLeague { league, capacity })
}

/// Binds the thread and announcement the platform created for a league and
/// starts answering its join control.
pub async fn attach_channels(
    state: &AppState,
    league_id: &str,
    req: AttachChannelsRequest,
) -> Result<League, AppError> {
    let issuer = req.context.issuer_id.clone();
    let (league, ()) = locked_update(state, league_id, move |league| {
        if league.host != issuer {
            return Err(AppError::NotHost);
        }
        league.thread_ref = Some(req.thread_ref);
        league.announcement_channel_ref = Some(req.announcement_channel_ref);
        league.announcement_msg_ref = Some(req.announcement_msg_ref);
        league.thread_msg_ref = req.thread_msg_ref;
        Ok(())
    })
    .await?;

    state.affordances.register(JoinAffordance::from(&league));
    tracing::info!(league_id = %league.id, "league channels attached");
    Ok(league)
}

/// A press on a league's join control, routed through the affordance registry.
pub async fn press_join(
    state: &AppState,
    league_id: &str,
    ctx: &CallerContext,
) -> Result<MembershipChange, AppError> {
    if state.affordances.get(league_id).is_none() {
        return Err(AppError::NotFound("This league no longer exists".into()));
    }
    membership::attempt_join(state, league_id, &ctx.as_member()).await
}

pub async fn add_member(state: &AppState, cmd: MemberCommand) -> Result<MembershipChange, AppError> {
    require_host_role(state, &cmd.context, "add members")?;
    let league = registry::resolve(&state.db, cmd.league_id.as_deref(), &cmd.context)?;
    membership::host_add(state, &league.id, &cmd.context.issuer_id, &cmd.member).await
}

pub async fn kick_member(state: &AppState, cmd: MemberCommand) -> Result<MembershipChange, AppError> {
    require_host_role(state, &cmd.context, "kick members")?;
    let league = registry::resolve(&state.db, cmd.league_id.as_deref(), &cmd.context)?;
    membership::kick(state, &league.id, &cmd.context.issuer_id, &cmd.member.id).await
}

pub async fn leave_league(
    state: &AppState,
    ctx: &CallerContext,
    league_id: Option<&str>,
) -> Result<MembershipChange, AppError> {
    let league = registry::resolve(&state.db, league_id, ctx)?;
    membership::leave(state, &league.id, &ctx.issuer_id).await
}

pub fn status(
    state: &AppState,
    ctx: &CallerContext,
    league_id: Option<&str>,
) -> Result<LeagueStatus, AppError> {
    let league = registry::resolve(&state.db, league_id, ctx)?;
    league_status(state, league)
}

pub fn league_status(state: &AppState, league: League) -> Result<LeagueStatus, AppError> {
    let directory = RankDirectory::load(&state.db)?;
    Ok(LeagueStatus {
        rank_restriction: directory.display_name(&league.rank_required),
        capacity: league.capacity(),
        is_full: league.is_full(),
        player_count: league.players.len(),
        league_id: league.id,
        host: league.host,
        players: league.players,
        region: league.region,
        game_mode: league.game_mode,
        match_type: league.match_type,
        perks: league.perks,
        private_link: league.private_link,
    })
}

/// Splits the joined players into two random teams of the league's team size.
pub async fn randomize_teams(
    state: &AppState,
    ctx: &CallerContext,
    league_id: Option<&str>,
) -> Result<Teams, AppError> {
    require_host_role(state, ctx, "randomize teams")?;
    let league = registry::resolve(&state.db, league_id, ctx)?;
    if league.host != ctx.issuer_id {
        return Err(AppError::NotHost);
    }
    if league.match_type == "1v1" {
        return Err(AppError::InvalidInput(
            "Team randomization is not available for 1v1 leagues".into(),
        ));
    }
    let team_size = team_size_for(&league.match_type).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Could not determine team size from match type {}",
            league.match_type
        ))
    })?;
    let required = team_size * 2;
    if league.players.len() < required {
        return Err(AppError::NotEnoughPlayers {
            required,
            have: league.players.len(),
        });
    }

    let mut pool = league.players.clone();
    pool.shuffle(&mut rand::thread_rng());
    let team_a = pool[..team_size].to_vec();
    let team_b = pool[team_size..required].to_vec();

    let mut warnings = Vec::new();
    if let Some(thread_ref) = &league.thread_ref {
        let notice = Notice::TeamsRandomized {
            league_id: league.id.clone(),
            host: league.host.clone(),
            match_type: league.match_type.clone(),
            team_a: team_a.clone(),
            team_b: team_b.clone(),
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

    Ok(Teams {
        league_id: league.id,
        match_type: league.match_type,
        team_a,
        team_b,
        warnings,
    })
}

/// Deletes the league, then tears down its platform presence best-effort.
pub async fn end_league(
    state: &AppState,
    ctx: &CallerContext,
    league_id: Option<&str>,
) -> Result<LeagueEnded, AppError> {
    let league = registry::resolve(&state.db, league_id, ctx)?;
    if league.host != ctx.issuer_id && !ctx.holds(&state.config.roles.staff) {
        return Err(AppError::Forbidden(
            "You must be the league host or staff to end this league".into(),
        ));
    }

    let guard = state.league_locks.acquire(&league.id).await;
    let league = registry::delete(&state.db, &league.id)?;
    drop(guard);
    state.league_locks.forget(&league.id);
    state.affordances.remove(&league.id);
    tracing::info!(league_id = %league.id, ended_by = %ctx.issuer_id, "league ended");

    let mut warnings = Vec::new();
    if let (Some(channel_ref), Some(msg_ref)) =
        (&league.announcement_channel_ref, &league.announcement_msg_ref)
    {
        state
            .effects
            .best_effort(
                PlatformAction::DisableJoinAffordance {
                    channel_ref: channel_ref.clone(),
                    msg_ref: msg_ref.clone(),
                },
                &mut warnings,
            )
            .await;
    }
    if let Some(channel_ref) = &league.announcement_channel_ref {
        let notice = Notice::LeagueEnded {
            league_id: league.id.clone(),
            host: league.host.clone(),
            ended_by: ctx.issuer_id.clone(),
        };
        state
            .effects
            .best_effort(
                PlatformAction::PostToChannel {
                    channel_ref: channel_ref.clone(),
                    notice,
                },
                &mut warnings,
            )
            .await;
    }
    if let Some(thread_ref) = &league.thread_ref {
        state
            .effects
            .best_effort(
                PlatformAction::DeleteThread {
                    thread_ref: thread_ref.clone(),
                },
                &mut warnings,
            )
            .await;
    }

    Ok(LeagueEnded {
        league_id: league.id,
        ended_by: ctx.issuer_id.clone(),
        warnings,
    })
}
