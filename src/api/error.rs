use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::InvalidConfiguration(_)
            | DomainError::InvalidInput(_)
            | DomainError::InvalidTurn(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::NotReady(_) | DomainError::Busy(_) => StatusCode::CONFLICT,
            DomainError::EmbeddingService(_) | DomainError::GenerationService(_) => {
                StatusCode::BAD_GATEWAY
            }
            DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            DomainError::InvalidConfiguration(_) => "invalid_configuration",
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::InvalidTurn(_) => "invalid_turn",
            DomainError::NotReady(_) => "not_ready",
            DomainError::Busy(_) => "busy",
            DomainError::NotFound(_) => "not_found",
            DomainError::EmbeddingService(_) => "embedding_error",
            DomainError::GenerationService(_) => "generation_error",
            DomainError::Timeout(_) => "timeout",
            DomainError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_service_failure() {
            tracing::warn!(error = %self, "upstream service failed");
        } else if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DomainError::invalid_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(DomainError::busy("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            DomainError::not_ready("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::generation("x").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            DomainError::timeout("x").status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            DomainError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_carries_status() {
        let response = DomainError::embedding("down").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
