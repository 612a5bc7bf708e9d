use crate::api::AppState;
use crate::api::schemas::email::{EmailPayload, EmailResponse};
use crate::domain::delivery::PolicyEntry;
use crate::domain::submission::EmailRequest;
use crate::error::{AppError, Result};
use crate::services::submission_service::SubmissionService;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

/// Relays a caller-rendered e-mail, starting with the primary transport.
///
/// Transport failures never surface here; see `DeliveryPolicy`.
///
/// # Errors
/// Returns `AppError::Validation` if `to`, `subject` or `html` is missing or `to` is invalid.
pub async fn send_email(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmailPayload>, JsonRejection>,
) -> Result<Json<EmailResponse>> {
    relay(&state, PolicyEntry::Primary, payload).await
}

/// Relays a caller-rendered e-mail, starting with the secondary transport.
///
/// # Errors
/// Returns `AppError::Validation` if `to`, `subject` or `html` is missing or `to` is invalid.
pub async fn send_email_fallback(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EmailPayload>, JsonRejection>,
) -> Result<Json<EmailResponse>> {
    relay(&state, PolicyEntry::Secondary, payload).await
}

async fn relay(
    state: &AppState,
    entry: PolicyEntry,
    payload: std::result::Result<Json<EmailPayload>, JsonRejection>,
) -> Result<Json<EmailResponse>> {
    let service = &state.submission_service;
    let endpoint = SubmissionService::email_endpoint(entry);

    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            service.log().error(endpoint, format!("Invalid request body: {}", rejection.body_text())).await;
            return Err(rejection.into());
        }
    };

    service.log().info(endpoint, format!("Email request received for: {}", payload.describe())).await;

    let request = match EmailRequest::try_from(payload) {
        Ok(r) => r,
        Err(e) => {
            service.reject(endpoint, &e).await;
            return Err(AppError::Validation(e));
        }
    };

    let outcome = service.send_email(&request, entry).await;
    Ok(Json(EmailResponse::from(outcome)))
}
