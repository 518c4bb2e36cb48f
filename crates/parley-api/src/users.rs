use axum::{Extension, Json, extract::State};
use tokio::task;

use parley_types::api::UpdateUserRequest;
use parley_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// `GET /users` — every registered user, without credential material.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let db = state.clone();
    let rows = task::spawn_blocking(move || db.db.list_users())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    let users = rows
        .into_iter()
        .map(|row| User {
            id: row.id,
            name: row.name,
            profile_picture_url: row.profile_picture_url,
        })
        .collect();

    Ok(Json(users))
}

/// `POST /users` — update the caller's own profile. The target id always
/// comes from the gate, never from the request body.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let (Some(name), Some(profile_picture_url)) = (req.name, req.profile_picture_url) else {
        return Err(ApiError::BadRequest(
            "missing name or profile_picture_url".into(),
        ));
    };

    let db = state.clone();
    let updated = {
        let name = name.clone();
        let profile_picture_url = profile_picture_url.clone();
        task::spawn_blocking(move || db.db.update_user(user_id, &name, &profile_picture_url))
            .await
            .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??
    };

    // The caller's own row vanished, e.g. a race with deletion
    if !updated {
        return Err(ApiError::NotFound("user not found"));
    }

    Ok(Json(User {
        id: user_id,
        name,
        profile_picture_url,
    }))
}
