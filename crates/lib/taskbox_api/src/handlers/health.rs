//! Root endpoint — bootstrap health check.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::models::HealthResponse;

/// `GET /` — verifies the service is up and the database is reachable.
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let db_connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    Ok(Json(HealthResponse {
        message: format!("Taskbox v{} is running.", taskbox_core::version()),
        db_connected,
    }))
}
