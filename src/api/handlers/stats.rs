use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::{
    api::{dto::MessageResponse, errors::AppError, AppState},
    db::models::{NewStats, Stats},
};

/// Brewery statistics, or `null` if none have been recorded.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Current statistics, or null", body = Stats),
        (status = 500, description = "Internal server error", body = MessageResponse),
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Option<Stats>>, AppError> {
    Ok(Json(state.storage.stats().await?))
}

#[utoipa::path(
    put,
    path = "/api/stats",
    request_body = NewStats,
    responses(
        (status = 200, description = "Stored statistics", body = Stats),
        (status = 400, description = "Negative or malformed values", body = MessageResponse),
        (status = 401, description = "Not logged in", body = MessageResponse),
    ),
    security(("session" = [])),
    tag = "stats"
)]
pub async fn update_stats(
    State(state): State<AppState>,
    payload: Result<Json<NewStats>, JsonRejection>,
) -> Result<Json<Stats>, AppError> {
    let Json(input) = payload?;
    input.validate().map_err(AppError::Validation)?;

    let stats = state.storage.upsert_stats(input).await?;
    info!(total_batches = stats.total_batches, "Stats updated");
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::{api::testing::harness, storage::MemStorage};

    #[tokio::test]
    async fn missing_stats_are_null() {
        let h = harness(MemStorage::new()).await;
        let resp = h.server.get("/api/stats").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>(), Value::Null);
    }

    #[tokio::test]
    async fn seeded_stats_are_served() {
        let h = harness(MemStorage::seeded()).await;
        let body: Value = h.server.get("/api/stats").await.json();
        assert_eq!(body["totalBatches"], 47);
        assert_eq!(body["litersProduced"], 1180);
    }

    #[tokio::test]
    async fn admin_can_replace_stats() {
        let h = harness(MemStorage::seeded()).await;
        h.login().await;

        let resp = h
            .server
            .put("/api/stats")
            .json(&json!({
                "totalBatches": 48,
                "litersProduced": 1205,
                "activeFermenters": 2,
                "daysSinceLastBatch": 0
            }))
            .await;
        resp.assert_status_ok();

        let body: Value = h.server.get("/api/stats").await.json();
        assert_eq!(body["totalBatches"], 48);
        assert_eq!(body["daysSinceLastBatch"], 0);
    }

    #[tokio::test]
    async fn negative_values_are_rejected() {
        let h = harness(MemStorage::new()).await;
        h.login().await;

        let resp = h
            .server
            .put("/api/stats")
            .json(&json!({
                "totalBatches": 1,
                "litersProduced": -5,
                "activeFermenters": 0,
                "daysSinceLastBatch": 0
            }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let msg = resp.json::<Value>()["message"].as_str().unwrap().to_owned();
        assert!(msg.contains("litersProduced"));
    }

    #[tokio::test]
    async fn update_requires_admin() {
        let h = harness(MemStorage::new()).await;
        h.server
            .put("/api/stats")
            .json(&json!({
                "totalBatches": 1,
                "litersProduced": 1,
                "activeFermenters": 0,
                "daysSinceLastBatch": 0
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
