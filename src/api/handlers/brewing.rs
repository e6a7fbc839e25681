use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    api::{dto::MessageResponse, errors::AppError, AppState},
    db::models::{BrewingReading, NewBrewingReading},
};

/// Current kettle and fermenter reading. Live RAPT telemetry when available,
/// otherwise the stored reading, otherwise a placeholder; never an error.
#[utoipa::path(
    get,
    path = "/api/brewing-data",
    responses(
        (status = 200, description = "Current brewing reading", body = BrewingReading),
    ),
    tag = "brewing"
)]
pub async fn current_reading(State(state): State<AppState>) -> Json<BrewingReading> {
    Json(state.brewing.current_reading().await)
}

/// Replace the stored reading.
#[utoipa::path(
    put,
    path = "/api/brewing-data",
    request_body = NewBrewingReading,
    responses(
        (status = 200, description = "Stored reading", body = BrewingReading),
        (status = 400, description = "Invalid reading", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "brewing"
)]
pub async fn update_reading(
    State(state): State<AppState>,
    payload: Result<Json<NewBrewingReading>, JsonRejection>,
) -> Result<Json<BrewingReading>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.brewing.update_reading(input).await?))
}
