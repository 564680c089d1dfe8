use crate::error::AppError;
use crate::models::moderation::{ModerateRequest, RoleToggleRequest};
use crate::services::moderation as service;
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn moderate(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<ModerateRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::moderate(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn toggle_role(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<RoleToggleRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::toggle_role(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(&result))
}
