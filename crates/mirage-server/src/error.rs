//! HTTP error mapping.
//!
//! Every handler returns `ApiResult<T>`; the conversion here is the
//! single place the error taxonomy meets status codes. Bodies carry a
//! short stable code and a human-readable message; payloads are never
//! echoed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mirage_core::error::MirageError;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub MirageError);

impl From<MirageError> for ApiError {
    fn from(err: MirageError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MirageError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            MirageError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            MirageError::Forbidden { .. } | MirageError::NodeInactive { .. } => {
                StatusCode::FORBIDDEN
            }
            MirageError::NotFound { .. } => StatusCode::NOT_FOUND,
            MirageError::Conflict { .. } => StatusCode::CONFLICT,
            MirageError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MirageError::Database(_) | MirageError::Crypto(_) | MirageError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
