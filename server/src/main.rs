mod affordances;
mod cache;
mod config;
mod db;
mod error;
mod handlers;
mod locks;
mod models;
mod platform;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod validation;

use config::Config;
use db::Db;
use ntex::web;
use ntex_cors::Cors;
use services::outbox::OutboxPlatform;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[ntex::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "league_hub_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let db = Arc::new(Db::open(&config.database_path).expect("Failed to open database"));
    let platform = Arc::new(OutboxPlatform::new(Arc::clone(&db)));
    let bind = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(db, config, platform));

    match services::rehydration::rehydrate(&state).await {
        Ok(report) if !report.warnings.is_empty() => {
            tracing::warn!(warnings = report.warnings.len(), "rehydration finished with warnings")
        }
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "rehydration failed"),
    }

    tracing::info!(%bind, "league hub server starting");

    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            // Health check
            .route("/api/health", web::get().to(health))
            // League commands
            .route("/api/commands/host-league", web::post().to(handlers::leagues::host_league))
            .route("/api/commands/add-member", web::post().to(handlers::leagues::add_member))
            .route("/api/commands/kick-member", web::post().to(handlers::leagues::kick_member))
            .route("/api/commands/leave-league", web::post().to(handlers::leagues::leave_league))
            .route("/api/commands/status", web::post().to(handlers::leagues::status))
            .route("/api/commands/randomize-teams", web::post().to(handlers::leagues::randomize_teams))
            .route("/api/commands/end-league", web::post().to(handlers::leagues::end_league))
            .route("/api/leagues/{id}", web::get().to(handlers::leagues::get_league))
            .route("/api/leagues/{id}/channels", web::post().to(handlers::leagues::attach_channels))
            .route("/api/affordances/{id}/join", web::post().to(handlers::leagues::press_join))
            // Ranks
            .route("/api/commands/set-rank", web::post().to(handlers::ranks::set_rank))
            .route("/api/ranks", web::get().to(handlers::ranks::list_ranks))
            .route("/api/ranks/choices", web::get().to(handlers::ranks::rank_choices))
            // Strikes and moderation
            .route("/api/commands/warn", web::post().to(handlers::strikes::warn))
            .route("/api/warns/{host_id}", web::get().to(handlers::strikes::get_strikes))
            .route("/api/commands/moderate", web::post().to(handlers::moderation::moderate))
            .route("/api/commands/role-toggle", web::post().to(handlers::moderation::toggle_role))
            // Presence
            .route("/api/presence/afk", web::post().to(handlers::presence::set_afk))
            .route("/api/presence/message", web::post().to(handlers::presence::message))
            .route("/api/presence/message-deleted", web::post().to(handlers::presence::message_deleted))
            .route("/api/presence/snipe/{channel_id}", web::get().to(handlers::presence::snipe))
            // Platform adapter
            .route("/api/outbox", web::get().to(handlers::outbox::pending))
            .route("/api/outbox/ack", web::post().to(handlers::outbox::acknowledge))
    })
    .bind(bind)?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::league::{
        AttachChannelsRequest, HostLeagueRequest, League, MemberCommand, NewLeague, Perks,
        RankRequirement,
    };
    use crate::models::moderation::{ModAction, ModerateRequest, RoleToggleRequest};
    use crate::models::presence::{DeletedMessageEvent, MessageEvent};
    use crate::models::strike::StrikeOutcome;
    use crate::platform::PlatformAction;
    use crate::services::{leagues, membership, moderation, presence, ranks, registry, strikes};
    use crate::testing::{ctx, member, test_state, RecordingPlatform};
    use std::time::{Duration, Instant};

    const HOST_ROLE: &str = "role-host";
    const STAFF_ROLE: &str = "role-staff";

    fn host_league(state: &AppState, match_type: &str, rank: Option<&str>) -> League {
        leagues::host_league(
            state,
            HostLeagueRequest {
                context: ctx("host", &[HOST_ROLE]),
                region: "eu".into(),
                game_mode: "Swift Game".into(),
                match_type: match_type.into(),
                perks: "Enabled".into(),
                rank_required: rank.map(String::from),
                private_link: None,
            },
        )
        .unwrap()
        .league
    }

    async fn attach(state: &AppState, league: &League) -> League {
        leagues::attach_channels(
            state,
            &league.id,
            AttachChannelsRequest {
                context: ctx(&league.host, &[HOST_ROLE]),
                thread_ref: format!("thread-{}", league.id),
                announcement_channel_ref: "announcements".into(),
                announcement_msg_ref: format!("msg-{}", league.id),
                thread_msg_ref: None,
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_db_open_in_memory() {
        let db = Db::open_in_memory().expect("Failed to open in-memory DB");
        db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'
                 AND name IN ('leagues', 'ranks', 'warns', 'platform_actions')",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(count, 4);
            Ok::<_, rusqlite::Error>(())
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_two_v_two_fills_then_rejects() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        assert_eq!(league.region, "EU");
        attach(&state, &league).await;

        for user in ["p1", "p2", "p3", "p4"] {
            let change = leagues::press_join(&state, &league.id, &ctx(user, &[]))
                .await
                .unwrap();
            assert!(change.warnings.is_empty());
        }
        let err = leagues::press_join(&state, &league.id, &ctx("p5", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LeagueFull { capacity: 4, .. }));

        let status = leagues::status(&state, &ctx("p1", &[]), Some(league.id.as_str())).unwrap();
        assert_eq!(status.player_count, 4);
        assert_eq!(status.capacity, Some(4));
        assert!(status.is_full);
        assert_eq!(platform.count("add_thread_member"), 4);
        assert_eq!(platform.count("post_to_thread"), 4);
    }

    #[tokio::test]
    async fn test_already_member_wins_over_full() {
        let (state, _) = test_state();
        let league = host_league(&state, "1v1", None);
        attach(&state, &league).await;

        leagues::press_join(&state, &league.id, &ctx("p1", &[])).await.unwrap();
        let err = leagues::press_join(&state, &league.id, &ctx("p1", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember(_)));

        leagues::press_join(&state, &league.id, &ctx("p2", &[])).await.unwrap();
        let err = leagues::press_join(&state, &league.id, &ctx("p2", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_slot_goes_to_exactly_one() {
        let (state, _) = test_state();
        let league = host_league(&state, "2v2", None);
        attach(&state, &league).await;
        for user in ["p1", "p2", "p3"] {
            membership::attempt_join(&state, &league.id, &member(user, &[]))
                .await
                .unwrap();
        }

        let spawn_join = |user: &str| {
            let state = Arc::clone(&state);
            let league_id = league.id.clone();
            let user = member(user, &[]);
            tokio::spawn(async move { membership::attempt_join(&state, &league_id, &user).await })
        };
        let (first, second) = tokio::join!(spawn_join("late-a"), spawn_join("late-b"));
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser, Err(AppError::LeagueFull { .. })));
        assert_eq!(registry::get(&state.db, &league.id).unwrap().players.len(), 4);
    }

    #[tokio::test]
    async fn test_rank_gate() {
        let (state, _) = test_state();
        ranks::set_rank(&state.db, "gold", "Gold", 10, Some("#FFD700")).unwrap();
        ranks::set_rank(&state.db, "silver", "Silver", 5, None).unwrap();

        let gold_league = host_league(&state, "4v4", Some("gold"));
        attach(&state, &gold_league).await;
        let err = leagues::press_join(&state, &gold_league.id, &ctx("s", &["silver"]))
            .await
            .unwrap_err();
        match err {
            AppError::NotEligible { required } => assert_eq!(required, "Gold"),
            other => panic!("unexpected error: {other:?}"),
        }
        leagues::press_join(&state, &gold_league.id, &ctx("g", &["gold"]))
            .await
            .unwrap();

        let silver_league = host_league(&state, "4v4", Some("silver"));
        attach(&state, &silver_league).await;
        leagues::press_join(&state, &silver_league.id, &ctx("g", &["silver", "gold"]))
            .await
            .unwrap();
        let status = leagues::status(&state, &ctx("g", &[]), Some(silver_league.id.as_str())).unwrap();
        assert_eq!(status.rank_restriction.as_deref(), Some("Silver"));
    }

    #[tokio::test]
    async fn test_host_league_checks() {
        let (state, _) = test_state();
        let mut req = HostLeagueRequest {
            context: ctx("someone", &[]),
            region: "EU".into(),
            game_mode: "War Game".into(),
            match_type: "3v3".into(),
            perks: "Disabled".into(),
            rank_required: None,
            private_link: None,
        };
        assert!(matches!(
            leagues::host_league(&state, req_clone(&req)),
            Err(AppError::Forbidden(_))
        ));

        req.context = ctx("someone", &[HOST_ROLE]);
        req.rank_required = Some("not-a-rank".into());
        assert!(matches!(
            leagues::host_league(&state, req_clone(&req)),
            Err(AppError::InvalidInput(_))
        ));

        req.rank_required = Some("None".into());
        req.region = "MARS".into();
        assert!(matches!(
            leagues::host_league(&state, req_clone(&req)),
            Err(AppError::InvalidInput(_))
        ));

        req.region = "NA".into();
        let hosted = leagues::host_league(&state, req).unwrap();
        assert_eq!(hosted.capacity, Some(6));
        assert!(hosted.league.players.is_empty());
    }

    fn req_clone(req: &HostLeagueRequest) -> HostLeagueRequest {
        HostLeagueRequest {
            context: req.context.clone(),
            region: req.region.clone(),
            game_mode: req.game_mode.clone(),
            match_type: req.match_type.clone(),
            perks: req.perks.clone(),
            rank_required: req.rank_required.clone(),
            private_link: req.private_link.clone(),
        }
    }

    #[tokio::test]
    async fn test_strike_escalation() {
        let (state, platform) = test_state();
        let staff = ctx("mod", &[STAFF_ROLE]);

        let report = strikes::issue_strike(&state, &staff, &member("h", &[HOST_ROLE]), "late")
            .await
            .unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.outcome, StrikeOutcome::RoleAdded);

        let report = strikes::issue_strike(
            &state,
            &staff,
            &member("h", &[HOST_ROLE, "role-strike-1"]),
            "no-show",
        )
        .await
        .unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.outcome, StrikeOutcome::RoleAdded);

        let report = strikes::issue_strike(
            &state,
            &staff,
            &member("h", &[HOST_ROLE, "role-strike-2"]),
            "again",
        )
        .await
        .unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.outcome, StrikeOutcome::HostRevoked);

        let report = strikes::issue_strike(&state, &staff, &member("h", &[]), "still")
            .await
            .unwrap();
        assert_eq!(report.count, 4);
        assert_eq!(report.outcome, StrikeOutcome::NoHostRoleToRevoke);
        assert!(report.warnings.is_empty());

        let actions = platform.actions();
        let added: Vec<&str> = actions
            .iter()
            .filter_map(|a| match a {
                PlatformAction::AddRole { role, .. } => Some(role.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(added, vec!["role-strike-1", "role-strike-2"]);
        let revokes = actions
            .iter()
            .filter(|a| {
                matches!(a, PlatformAction::RemoveRoles { roles, .. } if roles.iter().any(|r| r == HOST_ROLE))
            })
            .count();
        assert_eq!(revokes, 1);
        assert_eq!(platform.count("log"), 4);
        assert_eq!(strikes::strike_count(&state.db, "h").unwrap(), 4);
    }

    #[tokio::test]
    async fn test_strike_role_failures_are_reported() {
        let (state, platform) = test_state();
        let staff = ctx("mod", &[STAFF_ROLE]);

        assert!(matches!(
            strikes::issue_strike(&state, &ctx("nobody", &[]), &member("h", &[]), "x").await,
            Err(AppError::Forbidden(_))
        ));

        platform.fail("add_role");
        let report = strikes::issue_strike(&state, &staff, &member("h", &[HOST_ROLE]), "late")
            .await
            .unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.outcome, StrikeOutcome::RoleAddFailed);
        assert_eq!(report.warnings.len(), 1);

        platform.recover("add_role");
        platform.fail("remove_roles");
        let report = strikes::issue_strike(
            &state,
            &staff,
            &member("h", &[HOST_ROLE, "role-strike-1"]),
            "again",
        )
        .await
        .unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(report.outcome, StrikeOutcome::RoleRemoveFailed);
        assert_eq!(platform.count("add_role"), 1);
    }

    #[tokio::test]
    async fn test_end_league_then_gone() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        attach(&state, &league).await;
        leagues::press_join(&state, &league.id, &ctx("p1", &[])).await.unwrap();

        assert!(matches!(
            leagues::end_league(&state, &ctx("p1", &[]), Some(league.id.as_str())).await,
            Err(AppError::Forbidden(_))
        ));

        let ended = leagues::end_league(&state, &ctx("host", &[HOST_ROLE]), Some(league.id.as_str()))
            .await
            .unwrap();
        assert!(ended.warnings.is_empty());
        assert_eq!(platform.count("disable_join_affordance"), 1);
        assert_eq!(platform.count("post_to_channel"), 1);
        assert_eq!(platform.count("delete_thread"), 1);

        assert!(matches!(
            leagues::status(&state, &ctx("p1", &[]), Some(league.id.as_str())),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            leagues::press_join(&state, &league.id, &ctx("p2", &[])).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            leagues::end_league(&state, &ctx("host", &[HOST_ROLE]), Some(league.id.as_str())).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_staff_can_end_any_league() {
        let (state, _) = test_state();
        let league = host_league(&state, "2v2", None);
        leagues::end_league(&state, &ctx("mod", &[STAFF_ROLE]), Some(league.id.as_str()))
            .await
            .unwrap();
        assert!(registry::list(&state.db).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rehydration_is_idempotent() {
        let (state, _) = test_state();
        let attached = host_league(&state, "2v2", None);
        attach(&state, &attached).await;
        host_league(&state, "2v2", None);

        // a fresh process over the same store
        let platform = Arc::new(RecordingPlatform::default());
        let restarted = AppState::new(Arc::clone(&state.db), Config::for_tests(), platform.clone());

        let first = services::rehydration::rehydrate(&restarted).await.unwrap();
        assert_eq!(first.registered, 1);
        assert_eq!(first.already_registered, 0);
        let second = services::rehydration::rehydrate(&restarted).await.unwrap();
        assert_eq!(second.registered, 0);
        assert_eq!(second.already_registered, 1);
        assert_eq!(platform.count("register_join_affordance"), 1);
        assert_eq!(registry::list(&restarted.db).unwrap().len(), 2);

        leagues::press_join(&restarted, &attached.id, &ctx("p1", &[]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_side_effect_failure_keeps_join() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        attach(&state, &league).await;

        platform.fail("add_thread_member");
        let change = leagues::press_join(&state, &league.id, &ctx("p1", &[]))
            .await
            .unwrap();
        assert_eq!(change.players, 1);
        assert_eq!(change.warnings.len(), 1);
        assert_eq!(change.warnings[0].effect, "add_thread_member");
        assert_eq!(platform.count("post_to_thread"), 0);
        assert!(registry::get(&state.db, &league.id).unwrap().has_player("p1"));
    }

    #[tokio::test]
    async fn test_join_without_thread_warns() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        let change = membership::attempt_join(&state, &league.id, &member("p1", &[]))
            .await
            .unwrap();
        assert_eq!(change.warnings.len(), 1);
        assert!(platform.actions().is_empty());
    }

    #[tokio::test]
    async fn test_add_kick_and_leave() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        let league = attach(&state, &league).await;
        let host = ctx("host", &[HOST_ROLE]);
        let rival = ctx("rival", &[HOST_ROLE]);

        let cmd = |context, id: &str| MemberCommand {
            context,
            league_id: Some(league.id.clone()),
            member: member(id, &[]),
        };

        let added = leagues::add_member(&state, cmd(host.clone(), "p1")).await.unwrap();
        assert_eq!(added.players, 1);
        assert!(matches!(
            leagues::add_member(&state, cmd(rival.clone(), "p2")).await,
            Err(AppError::NotHost)
        ));
        assert!(matches!(
            leagues::add_member(&state, cmd(ctx("host", &[]), "p2")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            leagues::kick_member(&state, cmd(rival, "p1")).await,
            Err(AppError::NotHost)
        ));
        assert!(matches!(
            leagues::kick_member(&state, cmd(host.clone(), "stranger")).await,
            Err(AppError::NotMember(_))
        ));

        leagues::add_member(&state, cmd(host.clone(), "p2")).await.unwrap();
        let kicked = leagues::kick_member(&state, cmd(host, "p1")).await.unwrap();
        assert_eq!(kicked.players, 1);

        // issued from the coordination thread, no league id
        let mut in_thread = ctx("p2", &[]);
        in_thread.channel_id = league.thread_ref.clone();
        let left = leagues::leave_league(&state, &in_thread, None).await.unwrap();
        assert_eq!(left.players, 0);
        assert!(matches!(
            leagues::leave_league(&state, &in_thread, None).await,
            Err(AppError::NotMember(_))
        ));
        assert_eq!(platform.count("remove_thread_member"), 2);
    }

    #[tokio::test]
    async fn test_randomize_teams() {
        let (state, _) = test_state();
        let host = ctx("host", &[HOST_ROLE]);
        let league = host_league(&state, "2v2", None);
        for user in ["p1", "p2", "p3"] {
            membership::attempt_join(&state, &league.id, &member(user, &[]))
                .await
                .unwrap();
        }
        assert!(matches!(
            leagues::randomize_teams(&state, &host, Some(league.id.as_str())).await,
            Err(AppError::NotEnoughPlayers { required: 4, have: 3 })
        ));

        membership::attempt_join(&state, &league.id, &member("p4", &[]))
            .await
            .unwrap();
        let teams = leagues::randomize_teams(&state, &host, Some(league.id.as_str()))
            .await
            .unwrap();
        assert_eq!(teams.team_a.len(), 2);
        assert_eq!(teams.team_b.len(), 2);
        let mut everyone: Vec<String> = teams.team_a.iter().chain(&teams.team_b).cloned().collect();
        everyone.sort();
        assert_eq!(everyone, vec!["p1", "p2", "p3", "p4"]);

        let duel = host_league(&state, "1v1", None);
        assert!(matches!(
            leagues::randomize_teams(&state, &host, Some(duel.id.as_str())).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_moderation() {
        let (state, platform) = test_state();
        let request = |context, action, duration: Option<&str>| ModerateRequest {
            context,
            action,
            target: member("troll", &[]),
            reason: None,
            duration: duration.map(String::from),
        };
        let staff = ctx("mod", &[STAFF_ROLE]);

        assert!(matches!(
            moderation::moderate(&state, request(ctx("x", &[]), ModAction::Kick, None)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            moderation::moderate(&state, request(staff.clone(), ModAction::Timeout, None)).await,
            Err(AppError::InvalidInput(_))
        ));

        let result = moderation::moderate(
            &state,
            request(staff.clone(), ModAction::Timeout, Some("10m")),
        )
        .await
        .unwrap();
        assert_eq!(result.duration_secs, Some(600));
        assert_eq!(result.reason, "No reason provided");

        let unban = ModerateRequest {
            context: staff.clone(),
            action: ModAction::Unban,
            target: member("former-staff", &[STAFF_ROLE]),
            reason: Some("appeal accepted".into()),
            duration: None,
        };
        let result = moderation::moderate(&state, unban).await.unwrap();
        assert_eq!(result.action, ModAction::Unban);
        assert_eq!(result.duration_secs, None);
        assert!(platform.actions().iter().any(|a| matches!(
            a,
            PlatformAction::Moderate { action: ModAction::Unban, user_id, .. } if user_id == "former-staff"
        )));

        platform.fail("moderate");
        assert!(matches!(
            moderation::moderate(&state, request(staff, ModAction::Ban, None)).await,
            Err(AppError::External(_))
        ));
        assert_eq!(platform.count("log"), 2);
    }

    #[tokio::test]
    async fn test_role_toggle() {
        let (state, platform) = test_state();
        let staff = ctx("mod", &[STAFF_ROLE]);
        let toggle = |context, roles: &[&str], role: &str| RoleToggleRequest {
            context,
            target: member("u", roles),
            role: role.into(),
        };

        assert!(matches!(
            moderation::toggle_role(&state, toggle(ctx("x", &[]), &[], "vip")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            moderation::toggle_role(&state, toggle(staff.clone(), &[], STAFF_ROLE)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            moderation::toggle_role(&state, toggle(staff.clone(), &[], "  ")).await,
            Err(AppError::InvalidInput(_))
        ));

        let added = moderation::toggle_role(&state, toggle(staff.clone(), &["other"], "vip"))
            .await
            .unwrap();
        assert!(added.added);
        let removed = moderation::toggle_role(&state, toggle(staff.clone(), &["vip"], "vip"))
            .await
            .unwrap();
        assert!(!removed.added);
        assert!(removed.warnings.is_empty());
        assert!(platform.roles_after("u", &["vip"]).is_empty());
        assert_eq!(platform.count("log"), 2);

        platform.fail("add_role");
        assert!(matches!(
            moderation::toggle_role(&state, toggle(staff, &[], "vip")).await,
            Err(AppError::External(_))
        ));
        assert_eq!(platform.count("log"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_back_to_back_strikes_with_stale_roles() {
        let (state, platform) = test_state();
        let warn = |reason: &'static str| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                // both requests report the roles from before either strike
                strikes::issue_strike(
                    &state,
                    &ctx("mod", &[STAFF_ROLE]),
                    &member("h", &[HOST_ROLE]),
                    reason,
                )
                .await
            })
        };
        let (first, second) = tokio::join!(warn("late"), warn("no-show"));
        let mut counts = vec![first.unwrap().unwrap().count, second.unwrap().unwrap().count];
        counts.sort();
        assert_eq!(counts, vec![1, 2]);

        assert_eq!(
            platform.roles_after("h", &[HOST_ROLE]),
            vec![HOST_ROLE, "role-strike-2"]
        );
    }

    #[tokio::test]
    async fn test_unparseable_match_type_has_no_cap() {
        let (state, _) = test_state();
        let league = registry::create(
            &state.db,
            NewLeague {
                host: "host".into(),
                region: "EU".into(),
                game_mode: "War Game".into(),
                match_type: "free-for-all".into(),
                perks: Perks::Enabled,
                rank_required: RankRequirement::Open,
                private_link: None,
            },
        )
        .unwrap();

        for n in 0..12 {
            membership::attempt_join(&state, &league.id, &member(&format!("p{n}"), &[]))
                .await
                .unwrap();
        }
        let status = leagues::status(&state, &ctx("p0", &[]), Some(league.id.as_str())).unwrap();
        assert_eq!(status.player_count, 12);
        assert_eq!(status.capacity, None);
        assert!(!status.is_full);
    }

    #[tokio::test]
    async fn test_host_who_joined_cannot_be_kicked_or_leave() {
        let (state, _) = test_state();
        let league = host_league(&state, "2v2", None);
        let host = ctx("host", &[HOST_ROLE]);
        membership::attempt_join(&state, &league.id, &member("host", &[]))
            .await
            .unwrap();

        let kick_host = MemberCommand {
            context: host.clone(),
            league_id: Some(league.id.clone()),
            member: member("host", &[]),
        };
        assert!(matches!(
            leagues::kick_member(&state, kick_host).await,
            Err(AppError::CannotKickHost)
        ));
        assert!(matches!(
            leagues::leave_league(&state, &host, Some(league.id.as_str())).await,
            Err(AppError::HostMustEndLeague)
        ));
        assert!(registry::get(&state.db, &league.id).unwrap().has_player("host"));
    }

    #[tokio::test]
    async fn test_stalled_side_effect_is_cut_off() {
        let (state, platform) = test_state();
        let league = host_league(&state, "2v2", None);
        attach(&state, &league).await;
        platform.stall("add_thread_member", Duration::from_secs(2));

        let started = Instant::now();
        let change = leagues::press_join(&state, &league.id, &ctx("p1", &[]))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(change.players, 1);
        assert_eq!(change.warnings.len(), 1);
        assert_eq!(change.warnings[0].effect, "add_thread_member");
        assert!(change.warnings[0].error.contains("timed out"));
        assert_eq!(platform.count("post_to_thread"), 0);
    }

    #[test]
    fn test_afk_and_snipe() {
        let (state, _) = test_state();
        presence::set_afk(&state, &ctx("sleepy", &[]), None);

        let events = presence::on_message(
            &state,
            &MessageEvent {
                context: ctx("chatty", &[]),
                author_is_bot: false,
                mentions: vec!["sleepy".into(), "other".into()],
            },
        );
        assert_eq!(events.alerts.len(), 1);
        assert_eq!(events.alerts[0].reason, "AFK");
        assert!(!events.welcomed_back);

        let events = presence::on_message(
            &state,
            &MessageEvent {
                context: ctx("sleepy", &[]),
                author_is_bot: false,
                mentions: vec![],
            },
        );
        assert!(events.welcomed_back);

        assert!(presence::snipe(&state, "general").is_none());
        presence::on_message_deleted(
            &state,
            DeletedMessageEvent {
                channel_id: "general".into(),
                author_id: "chatty".into(),
                author_is_bot: false,
                content: "oops".into(),
                created_at: chrono::Utc::now(),
            },
        );
        assert_eq!(presence::snipe(&state, "general").unwrap().content, "oops");
    }
}
