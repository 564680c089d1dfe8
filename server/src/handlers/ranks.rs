use crate::error::AppError;
use crate::models::rank::*;
use crate::services::ranks::{self as service, RankDirectory};
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn set_rank(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<SetRankRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::configure_rank(&state, body.into_inner())?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn list_ranks(state: web::types::State<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let ranks = service::list(&state.db)?;
    Ok(HttpResponse::Ok().json(&ranks))
}

/// Autocomplete choices for a league's rank requirement.
pub async fn rank_choices(
    state: web::types::State<Arc<AppState>>,
    query: web::types::Query<ChoicesQuery>,
) -> Result<HttpResponse, AppError> {
    let directory = RankDirectory::load(&state.db)?;
    let current = query.current.as_deref().unwrap_or("");
    let choices = service::filter_choices(directory.choices(), current);
    Ok(HttpResponse::Ok().json(&choices))
}
