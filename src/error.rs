//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::statistics::StatisticsError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Server errors (5xx)
    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::Statistics(e) => {
                tracing::error!("Statistics error: {:?}", e);
                match e {
                    StatisticsError::Source(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                    }
                    StatisticsError::Cache(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable")
                    }
                    StatisticsError::Serialization(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                    }
                }
            }
        };

        // Server-side failures never echo backend details to the client
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            error_code: error_code.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;
    use crate::source::SourceError;

    fn source_failure() -> AppError {
        AppError::from(StatisticsError::Source(SourceError::Database(
            sqlx::Error::PoolTimedOut,
        )))
    }

    #[test]
    fn test_source_errors_map_to_500() {
        assert_eq!(
            source_failure().into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cache_errors_map_to_503() {
        let refused = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let err = AppError::from(StatisticsError::Cache(CacheError::from(refused)));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_error_body_hides_backend_details() {
        let response = source_failure().into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error_code"], "database_error");
        assert_eq!(json["error"], "Internal Server Error");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_error_display() {
        assert!(source_failure().to_string().starts_with("Database error: "));
    }
}
