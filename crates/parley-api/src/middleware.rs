use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::session::SessionError;

/// Identity resolved by the access-control gate, attached as a request
/// extension so handlers never re-read the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Access-control gate: turn the request's Authorization header into a
/// verified identity or a terminal 401. Its only visible side effect is
/// the registry evicting an expired token during lookup.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized(
            "missing or invalid authorization header",
        ))?;

    let user_id = state.sessions.resolve(token).await.map_err(|e| match e {
        SessionError::NotFound => ApiError::Unauthorized("invalid token"),
        SessionError::Expired => ApiError::Unauthorized("token expired"),
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}

/// Uniform cross-origin shaping: every response carries a permissive
/// allow-origin header, and any OPTIONS request short-circuits to a 204
/// preflight answer with the method/header allow-lists.
pub async fn cors(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return (
            StatusCode::NO_CONTENT,
            [
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    "Authorization, Content-Type",
                ),
            ],
        )
            .into_response();
    }

    let mut res = next.run(req).await;
    res.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    res
}
