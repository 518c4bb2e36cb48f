use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel applied to messages posted without an explicit one.
pub const DEFAULT_CHANNEL: &str = "general";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub profile_picture_url: String,
}

/// Messages are immutable once created; there is no update or delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    pub attachments: Vec<String>,
    pub in_reply_to: Option<i64>,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}
