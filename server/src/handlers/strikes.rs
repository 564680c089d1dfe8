use crate::error::AppError;
use crate::models::strike::WarnRequest;
use crate::services::strikes as service;
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn warn(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<WarnRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let result = service::issue_strike(&state, &req.context, &req.target, &req.reason).await?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn get_strikes(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let count = service::strike_count(&state.db, &path)?;
    Ok(HttpResponse::Ok().json(&serde_json::json!({
        "host_id": path.as_str(),
        "count": count,
    })))
}
