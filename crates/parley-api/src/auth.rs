use std::sync::Arc;

use axum::{Json, extract::State};
use tokio::task;

use parley_db::Database;
use parley_types::api::{LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::session::SessionRegistry;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionRegistry,
}

/// `POST /auth/login` — verify name+password against the credential store
/// and issue a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(name), Some(password)) = (req.name, req.password) else {
        return Err(ApiError::BadRequest("missing name or password".into()));
    };

    // Credential lookup is blocking rusqlite work; run it off the runtime
    let db = state.clone();
    let user = task::spawn_blocking(move || db.db.user_by_credentials(&name, &password))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
        .ok_or(ApiError::Unauthorized("invalid credentials"))?;

    let session = state.sessions.issue(user.id).await;

    Ok(Json(LoginResponse {
        token: session.token,
        user_id: user.id,
        expiry: session.expires_at.timestamp_millis(),
    }))
}
