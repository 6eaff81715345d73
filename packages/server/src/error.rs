use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use broker::BrokerError;
use sea_orm::DbErr;
use serde::Serialize;

/// Error envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false` on errors.
    #[schema(example = false)]
    pub success: bool,
    /// Human-readable error description.
    #[schema(example = "DLQ topic not found: 7b0c...")]
    pub error: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// The Kafka cluster could not be reached or rejected a request.
    Broker(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, error) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Broker(msg) => {
                tracing::error!("Broker error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };

        (
            status,
            ErrorBody {
                success: false,
                error,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<BrokerError> for AppError {
    fn from(err: BrokerError) -> Self {
        // A missing record is not a broker failure; `read_at` reports it as
        // an absent value, so every error reaching here is a 500.
        AppError::Broker(err.to_string())
    }
}
