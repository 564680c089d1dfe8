use crate::error::AppError;
use crate::services::outbox::{self as service, AckRequest, OutboxQuery};
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn pending(
    state: web::types::State<Arc<AppState>>,
    query: web::types::Query<OutboxQuery>,
) -> Result<HttpResponse, AppError> {
    let entries = service::pending(&state.db, query.after, query.limit)?;
    Ok(HttpResponse::Ok().json(&entries))
}

pub async fn acknowledge(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<AckRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::acknowledge(&state.db, body.up_to)?;
    Ok(HttpResponse::Ok().json(&result))
}
