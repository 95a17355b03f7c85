//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use timer24h_domain::error::Timer24hError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`Timer24hError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(Timer24hError);

impl From<Timer24hError> for ApiError {
    fn from(err: Timer24hError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Timer24hError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Timer24hError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            Timer24hError::Actuation(err) => {
                tracing::warn!(error = %err, "actuation error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            Timer24hError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timer24h_domain::error::{ActuationError, NotFoundError, ValidationError};

    fn status_of(err: Timer24hError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        assert_eq!(
            status_of(ValidationError::EmptyScheduleId.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(NotFoundError::schedule("x").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ActuationError::UnknownEntity("switch.x".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Timer24hError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
