/// Database row types — these map directly to SQLite rows.
/// Distinct from the parley-types API models to keep the store layer
/// independent; in particular `UserRow` carries the password column,
/// which must never be serialized out.

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub password: String,
    pub profile_picture_url: String,
}

pub struct MessageRow {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    /// JSON-encoded array of attachment URLs.
    pub attachments: String,
    pub in_reply_to: Option<i64>,
    pub channel: String,
    /// Epoch milliseconds, assigned at insert time.
    pub created_at: i64,
}
