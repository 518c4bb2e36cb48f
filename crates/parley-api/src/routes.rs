use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    routing::{get, post},
};

use parley_types::api::HealthResponse;

use crate::auth::{self, AppState};
use crate::channels;
use crate::messages;
use crate::middleware::{cors, require_auth};
use crate::users;

/// The full dispatch table. Precedence is the declaration order below;
/// anything unmatched — unknown path or unknown method on a known path —
/// falls through to the 404 handler.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(health))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/messages", get(messages::list_messages))
        .route(
            "/messages/channel/{channel}",
            get(messages::list_channel_messages),
        )
        .route("/channels", get(channels::list_channels));

    let protected = Router::new()
        .route("/users", post(users::update_user))
        .route("/messages", post(messages::create_message))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        name: "parley",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
