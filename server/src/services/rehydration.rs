use serde::Serialize;

use crate::error::AppError;
use crate::models::league::JoinAffordance;
use crate::platform::{PlatformAction, SideEffectWarning};
use crate::services::registry;
use crate::state::AppState;

#[derive(Debug, Default, Serialize)]
pub struct RehydrationReport {
    pub registered: usize,
    pub already_registered: usize,
    pub warnings: Vec<SideEffectWarning>,
}

/// Re-attaches join controls for every league that still has an announcement.
///
/// Safe to run repeatedly: leagues already answered for are skipped and no
/// league is created or modified.
pub async fn rehydrate(state: &AppState) -> Result<RehydrationReport, AppError> {
    let mut report = RehydrationReport::default();

    for league in registry::list(&state.db)? {
        if !league.has_announcement() {
            continue;
        }
        let affordance = JoinAffordance::from(&league);
        if !state.affordances.register(affordance.clone()) {
            report.already_registered += 1;
            continue;
        }
        report.registered += 1;
        state
            .effects
            .best_effort(
                PlatformAction::RegisterJoinAffordance { affordance },
                &mut report.warnings,
            )
            .await;
    }

    tracing::info!(
        registered = report.registered,
        already_registered = report.already_registered,
        active = state.affordances.len(),
        "persistent join controls loaded"
    );
    Ok(report)
}
