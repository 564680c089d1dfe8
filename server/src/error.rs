use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::platform::PlatformError;

/// Coarse classification every [`AppError`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidInput,
    ExternalDependencyFailure,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Only the league host can do this")]
    NotHost,

    #[error("A minimum rank of {required} is required")]
    NotEligible { required: String },

    #[error("Already a member of league {0}")]
    AlreadyMember(String),

    #[error("League {league_id} is full ({capacity} players)")]
    LeagueFull { league_id: String, capacity: usize },

    #[error("Not a member of league {0}")]
    NotMember(String),

    #[error("The host cannot be kicked; end the league instead")]
    CannotKickHost,

    #[error("The host cannot leave; end the league instead")]
    HostMustEndLeague,

    #[error("Need {required} players to randomize teams, have {have}")]
    NotEnoughPlayers { required: usize, have: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Platform call failed: {0}")]
    External(#[from] PlatformError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) | AppError::NotMember(_) => ErrorKind::NotFound,
            AppError::Forbidden(_)
            | AppError::NotHost
            | AppError::NotEligible { .. }
            | AppError::CannotKickHost
            | AppError::HostMustEndLeague => ErrorKind::Forbidden,
            AppError::AlreadyMember(_)
            | AppError::LeagueFull { .. }
            | AppError::NotEnoughPlayers { .. } => ErrorKind::Conflict,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::External(_) => ErrorKind::ExternalDependencyFailure,
            AppError::Db(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::ExternalDependencyFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Storage details stay in the logs.
        let message = match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed");
                "Internal error".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(status).json(&serde_json::json!({
            "error": message,
            "kind": kind,
        }))
    }
}
