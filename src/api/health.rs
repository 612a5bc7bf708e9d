use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks the primary mail transport and the request log directory.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (transport_res, logs_res) =
        tokio::join!(state.health_service.check_transport(), state.health_service.check_logs());

    let mut status_code = StatusCode::OK;
    let mut component_status = |component: &str, result: Result<(), String>| {
        if let Err(e) = result {
            tracing::warn!(error = %e, component, "Readiness probe failed");
            status_code = StatusCode::SERVICE_UNAVAILABLE;
            "error"
        } else {
            "ok"
        }
    };
    let transport = component_status("transport", transport_res);
    let logs = component_status("logs", logs_res);

    let response = HealthResponse {
        status: if status_code == StatusCode::OK { "ok" } else { "error" }.to_string(),
        transport: transport.to_string(),
        logs: logs.to_string(),
    };

    (status_code, Json(response))
}
