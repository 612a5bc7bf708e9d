use crate::domain::submission::ValidationError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("Endpoint not found")]
    NotFound,
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(e) => {
                tracing::debug!(error = %e, "Validation failed");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::InvalidBody(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Invalid request body");
                (StatusCode::BAD_REQUEST, rejection.body_text())
            }
            Self::NotFound => {
                tracing::debug!("Endpoint not found");
                (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
            }
            Self::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_envelope() {
        let response = AppError::from(ValidationError::MissingFields(vec!["message"])).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body, json!({"success": false, "error": "Missing required fields"}));
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let response = AppError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Endpoint not found");
    }
}
