use axum::{Json, extract::State};
use tokio::task;

use crate::auth::AppState;
use crate::error::ApiError;

/// `GET /channels` — every channel name that has at least one message.
pub async fn list_channels(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.clone();
    let channels = task::spawn_blocking(move || db.db.list_channels())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok(Json(channels))
}
