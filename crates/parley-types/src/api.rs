use serde::{Deserialize, Serialize};

// -- Auth --

/// Fields are optional so a missing one maps to a 400 with a useful
/// message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    /// Absolute expiry instant, epoch milliseconds.
    pub expiry: i64,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub profile_picture_url: Option<String>,
}

// -- Messages --

/// No `user_id` field: ownership always comes from the authenticated
/// caller, so anything the client sends for it is dropped on the floor.
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub body: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub in_reply_to: Option<i64>,
    pub channel: Option<String>,
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub name: &'static str,
    pub version: &'static str,
}
