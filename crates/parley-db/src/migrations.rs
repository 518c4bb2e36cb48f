use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY,
            name                TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            profile_picture_url TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS messages (
            id           INTEGER PRIMARY KEY,
            body         TEXT NOT NULL,
            user_id      INTEGER NOT NULL REFERENCES users(id),
            attachments  TEXT NOT NULL DEFAULT '[]',
            in_reply_to  INTEGER REFERENCES messages(id),
            channel      TEXT NOT NULL DEFAULT 'general',
            created_at   INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_channel
            ON messages(channel, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
