use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::DateTime;
use tokio::task;
use tracing::warn;

use parley_db::models::MessageRow;
use parley_types::api::CreateMessageRequest;
use parley_types::models::{DEFAULT_CHANNEL, Message};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// `GET /messages` — every message, newest first.
pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    let db = state.clone();
    let rows = task::spawn_blocking(move || db.db.list_messages())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok(Json(rows.into_iter().map(row_to_message).collect()))
}

/// `GET /messages/channel/{channel}` — one channel, newest first. The
/// segment arrives percent-decoded from the router.
pub async fn list_channel_messages(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let db = state.clone();
    let rows = task::spawn_blocking(move || db.db.list_channel_messages(&channel))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok(Json(rows.into_iter().map(row_to_message).collect()))
}

/// `POST /messages` — create a message owned by the caller. Whatever the
/// body claims, `user_id` is the gate-resolved identity.
pub async fn create_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = match req.body {
        Some(body) if !body.is_empty() => body,
        _ => return Err(ApiError::BadRequest("missing message body".into())),
    };

    let channel = req.channel.unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
    let attachments = serde_json::to_string(&req.attachments).map_err(anyhow::Error::from)?;
    let in_reply_to = req.in_reply_to;

    let db = state.clone();
    let row = task::spawn_blocking(move || {
        db.db
            .insert_message(&body, user_id, &attachments, in_reply_to, &channel)
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok((StatusCode::CREATED, Json(row_to_message(row))))
}

fn row_to_message(row: MessageRow) -> Message {
    let attachments = serde_json::from_str(&row.attachments).unwrap_or_else(|e| {
        warn!("Corrupt attachments on message {}: {}", row.id, e);
        Vec::new()
    });

    let created_at = DateTime::from_timestamp_millis(row.created_at).unwrap_or_else(|| {
        warn!("Corrupt created_at {} on message {}", row.created_at, row.id);
        DateTime::default()
    });

    Message {
        id: row.id,
        body: row.body,
        user_id: row.user_id,
        attachments,
        in_reply_to: row.in_reply_to,
        channel: row.channel,
        created_at,
    }
}
