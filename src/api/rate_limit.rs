use crate::api::AppState;
use crate::domain::request_log::LogEndpoint;
use axum::extract::{OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Records every limiter decision on the form routes and writes throttled
/// requests to the server log.
pub async fn log_rate_limit_events(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path().to_string(), |uri| uri.path().to_string());
    let response = next.run(request).await;

    let retry_after = response.headers().get("retry-after").and_then(|v| v.to_str().ok());
    if state.rate_limit_service.record_decision(response.status(), &path, retry_after) {
        state.submission_service.log().error(LogEndpoint::Server, format!("Rate limit exceeded on {path}")).await;
    }

    response
}
