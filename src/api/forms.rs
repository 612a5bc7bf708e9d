use crate::api::AppState;
use crate::api::schemas::forms::{AirClaimPayload, AirTicketPayload, ContactPayload, FormResponse};
use crate::domain::request_log::LogEndpoint;
use crate::domain::submission::{AirClaimRequest, AirTicketRequest, ContactRequest, FormSubmission, ValidationError};
use crate::error::{AppError, Result};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

/// Accepts a contact form and sends the confirmation e-mail.
///
/// # Errors
/// Returns `AppError::Validation` if required fields are missing or the e-mail address is invalid.
pub async fn contact(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactPayload>, JsonRejection>,
) -> Result<Json<FormResponse>> {
    accept(&state, LogEndpoint::Contact, payload, |p| ContactRequest::try_from(p).map(FormSubmission::Contact)).await
}

/// Accepts a flight quote request.
///
/// # Errors
/// Returns `AppError::Validation` if required fields are missing, the e-mail
/// address is invalid or the trip type is unknown.
pub async fn air_ticket(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AirTicketPayload>, JsonRejection>,
) -> Result<Json<FormResponse>> {
    accept(&state, LogEndpoint::AirTicket, payload, |p| AirTicketRequest::try_from(p).map(FormSubmission::AirTicket))
        .await
}

/// Accepts a flight claim.
///
/// # Errors
/// Returns `AppError::Validation` if required fields are missing or the e-mail address is invalid.
pub async fn air_claim(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AirClaimPayload>, JsonRejection>,
) -> Result<Json<FormResponse>> {
    accept(&state, LogEndpoint::AirClaim, payload, |p| AirClaimRequest::try_from(p).map(FormSubmission::AirClaim)).await
}

async fn accept<P>(
    state: &AppState,
    endpoint: LogEndpoint,
    payload: std::result::Result<Json<P>, JsonRejection>,
    convert: impl FnOnce(P) -> std::result::Result<FormSubmission, ValidationError>,
) -> Result<Json<FormResponse>> {
    let service = &state.submission_service;

    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            service.log().error(endpoint, format!("Invalid request body: {}", rejection.body_text())).await;
            return Err(rejection.into());
        }
    };

    let submission = match convert(payload) {
        Ok(s) => s,
        Err(e) => {
            service.reject(endpoint, &e).await;
            return Err(AppError::Validation(e));
        }
    };

    service.submit_form(&submission).await;
    Ok(Json(FormResponse::accepted(submission.acknowledgement())))
}
