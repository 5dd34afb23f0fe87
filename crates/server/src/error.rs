//! API error taxonomy and HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed client input, rejected before reaching the engine.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Engine or collaborator failure while serving a request.
    #[error("Recommendation engine error: {0}")]
    Engine(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Engine(error) = self {
            tracing::error!(%error, "request failed");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
