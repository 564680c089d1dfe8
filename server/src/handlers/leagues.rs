use crate::error::AppError;
use crate::models::league::*;
use crate::services::leagues as service;
use crate::services::registry;
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn host_league(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<HostLeagueRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::host_league(&state, body.into_inner())?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn attach_channels(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
    body: web::types::Json<AttachChannelsRequest>,
) -> Result<HttpResponse, AppError> {
    let league = service::attach_channels(&state, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(&league))
}

pub async fn press_join(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
    body: web::types::Json<JoinPress>,
) -> Result<HttpResponse, AppError> {
    let result = service::press_join(&state, &path, &body.context).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn add_member(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<MemberCommand>,
) -> Result<HttpResponse, AppError> {
    let result = service::add_member(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn kick_member(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<MemberCommand>,
) -> Result<HttpResponse, AppError> {
    let result = service::kick_member(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn leave_league(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<LeagueCommand>,
) -> Result<HttpResponse, AppError> {
    let result = service::leave_league(&state, &body.context, body.league_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn status(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<LeagueCommand>,
) -> Result<HttpResponse, AppError> {
    let result = service::status(&state, &body.context, body.league_id.as_deref())?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn get_league(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let league = registry::get(&state.db, &path)?;
    let result = service::league_status(&state, league)?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn randomize_teams(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<LeagueCommand>,
) -> Result<HttpResponse, AppError> {
    let result =
        service::randomize_teams(&state, &body.context, body.league_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn end_league(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<LeagueCommand>,
) -> Result<HttpResponse, AppError> {
    let result = service::end_league(&state, &body.context, body.league_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(&result))
}
