use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Fatal conditions during startup; returned from `main` for a non-zero exit.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("DATABASE_URL is not set")]
    DatabaseUrlMissing,

    #[error("Failed to connect to the database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to initialize the LLM gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by request handlers, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(err) => match err {
                GatewayError::CredentialMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
                GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                GatewayError::Exhausted { source, .. }
                    if matches!(**source, GatewayError::RateLimited { .. }) =>
                {
                    StatusCode::TOO_MANY_REQUESTS
                }
                GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::warn!("Request rejected: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_status_mapping() {
        let cases = [
            (GatewayError::credential_missing(), StatusCode::SERVICE_UNAVAILABLE),
            (GatewayError::rate_limit("slow down"), StatusCode::TOO_MANY_REQUESTS),
            (GatewayError::from_status(400, ""), StatusCode::BAD_GATEWAY),
            (GatewayError::Network("reset".into()), StatusCode::BAD_GATEWAY),
            (
                GatewayError::Exhausted {
                    attempts: 4,
                    source: Box::new(GatewayError::rate_limit("slow down")),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                GatewayError::Exhausted {
                    attempts: 4,
                    source: Box::new(GatewayError::server(503, "busy")),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_bad_request_message() {
        let err = ApiError::BadRequest("message must not be empty".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "message must not be empty");
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::Internal;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
    }
}
