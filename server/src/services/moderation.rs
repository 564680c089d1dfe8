use crate::error::AppError;
use crate::models::context::CallerContext;
use crate::models::moderation::{
    ModAction, ModerateRequest, ModerationResult, RoleToggleRequest, RoleToggleResult,
};
use crate::platform::{Notice, PlatformAction};
use crate::state::AppState;
use crate::validation;

fn require_staff(state: &AppState, ctx: &CallerContext) -> Result<(), AppError> {
    if ctx.holds(&state.config.roles.staff) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only staff can moderate members".into()))
    }
}

/// Applies a staff moderation action.
///
/// The action itself must go through; only the mod-log entry is best-effort.
pub async fn moderate(state: &AppState, req: ModerateRequest) -> Result<ModerationResult, AppError> {
    let ctx = &req.context;
    require_staff(state, ctx)?;
    if req.target.id == ctx.issuer_id {
        return Err(AppError::InvalidInput("You cannot moderate yourself".into()));
    }
    if req.action != ModAction::Unban && req.target.holds(&state.config.roles.staff) {
        return Err(AppError::Forbidden("Staff members cannot be moderated".into()));
    }

    let duration_secs = match (req.action, req.duration.as_deref()) {
        (ModAction::Timeout, Some(d)) => Some(validation::parse_duration(d)?),
        (ModAction::Timeout, None) => {
            return Err(AppError::InvalidInput("A timeout needs a duration".into()))
        }
        _ => None,
    };
    let reason = validation::validate_reason(req.reason.as_deref());

    state
        .effects
        .perform(PlatformAction::Moderate {
            action: req.action,
            user_id: req.target.id.clone(),
            reason: format!("{}: {}", ctx.issuer_id, reason),
            duration_secs,
        })
        .await?;
    tracing::info!(
        action = ?req.action,
        target_id = %req.target.id,
        moderator = %ctx.issuer_id,
        "moderation applied"
    );

    let mut warnings = Vec::new();
    let notice = Notice::ModerationApplied {
        action: req.action,
        target_id: req.target.id.clone(),
        moderator_id: ctx.issuer_id.clone(),
        reason: reason.clone(),
        duration_secs,
    };
    state
        .effects
        .best_effort(PlatformAction::Log { notice }, &mut warnings)
        .await;

    Ok(ModerationResult {
        action: req.action,
        target_id: req.target.id,
        reason,
        duration_secs,
        warnings,
    })
}

/// Adds `role` to the target, or removes it when they already hold it.
pub async fn toggle_role(
    state: &AppState,
    req: RoleToggleRequest,
) -> Result<RoleToggleResult, AppError> {
    let ctx = &req.context;
    require_staff(state, ctx)?;
    let role = req.role.trim().to_string();
    if role.is_empty() {
        return Err(AppError::InvalidInput("Role reference cannot be empty".into()));
    }
    if role == state.config.roles.staff {
        return Err(AppError::Forbidden(
            "You cannot manage roles equal to or higher than your own".into(),
        ));
    }

    let added = !req.target.holds(&role);
    let action = if added {
        PlatformAction::AddRole {
            user_id: req.target.id.clone(),
            role: role.clone(),
            reason: format!("Role added by {} (toggle)", ctx.issuer_id),
        }
    } else {
        PlatformAction::RemoveRoles {
            user_id: req.target.id.clone(),
            roles: vec![role.clone()],
            reason: format!("Role removed by {} (toggle)", ctx.issuer_id),
        }
    };
    state.effects.perform(action).await?;
    tracing::info!(target_id = %req.target.id, %role, added, moderator = %ctx.issuer_id, "role toggled");

    let mut warnings = Vec::new();
    let notice = Notice::RoleToggled {
        target_id: req.target.id.clone(),
        moderator_id: ctx.issuer_id.clone(),
        role: role.clone(),
        added,
    };
    state
        .effects
        .best_effort(PlatformAction::Log { notice }, &mut warnings)
        .await;

    Ok(RoleToggleResult {
        target_id: req.target.id,
        role,
        added,
        warnings,
    })
}
