use crate::error::AppError;
use crate::models::presence::*;
use crate::services::presence as service;
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn set_afk(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<AfkRequest>,
) -> Result<HttpResponse, AppError> {
    let status = service::set_afk(&state, &body.context, body.reason.as_deref());
    Ok(HttpResponse::Ok().json(&status))
}

pub async fn message(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<MessageEvent>,
) -> Result<HttpResponse, AppError> {
    let events = service::on_message(&state, &body);
    Ok(HttpResponse::Ok().json(&events))
}

pub async fn message_deleted(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<DeletedMessageEvent>,
) -> Result<HttpResponse, AppError> {
    service::on_message_deleted(&state, body.into_inner());
    Ok(HttpResponse::NoContent().finish())
}

pub async fn snipe(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let sniped = service::snipe(&state, &path)
        .ok_or_else(|| AppError::NotFound("There's nothing to snipe!".into()))?;
    Ok(HttpResponse::Ok().json(&sniped))
}
