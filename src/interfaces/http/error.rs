use crate::error::PaymentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of an HTTP handler.
///
/// Responses carry a short fixed text; the underlying message is only logged.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request that never reached the orchestrator.
    BadRequest(String),
    Payment(PaymentError),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self::Payment(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "invalid request")
            }
            ApiError::Payment(PaymentError::ValidationError(msg)) => {
                tracing::warn!("validation error: {}", msg);
                (StatusCode::BAD_REQUEST, "invalid request")
            }
            ApiError::Payment(PaymentError::NotFound(msg)) => {
                tracing::warn!("not found: {}", msg);
                (StatusCode::NOT_FOUND, "not found")
            }
            ApiError::Payment(e) => {
                tracing::error!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        (status, body).into_response()
    }
}
