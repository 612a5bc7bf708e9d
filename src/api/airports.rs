use crate::api::AppState;
use crate::api::schemas::airports::{AirportQuery, AirportResponse};
use axum::Json;
use axum::extract::{Query, State};

/// Airport autocomplete for the booking forms. Always 200; an empty list on
/// short keywords or lookup failure.
pub async fn search(State(state): State<AppState>, Query(query): Query<AirportQuery>) -> Json<Vec<AirportResponse>> {
    let airports = state.airport_service.search(&query.keyword).await;
    Json(airports.into_iter().map(AirportResponse::from).collect())
}
