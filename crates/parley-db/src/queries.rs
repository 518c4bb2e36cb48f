use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::{MessageRow, UserRow};

impl Database {
    // -- Users --

    /// Provisioning entry point. There is no self-service registration
    /// endpoint; accounts are created out-of-band.
    pub fn create_user(&self, name: &str, password: &str, profile_picture_url: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, password, profile_picture_url) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, password, profile_picture_url],
            )?;
            Ok(UserRow {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                password: password.to_string(),
                profile_picture_url: profile_picture_url.to_string(),
            })
        })
    }

    /// Credential verification lives behind this single call so a hashing
    /// scheme can replace the plaintext comparison without touching the
    /// handlers or the session registry.
    pub fn user_by_credentials(&self, name: &str, password: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = query_user_by_name(conn, name)?;
            Ok(row.filter(|user| user.password == password))
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, password, profile_picture_url FROM users ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Returns false when no row matched the id.
    pub fn update_user(&self, id: i64, name: &str, profile_picture_url: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET name = ?1, profile_picture_url = ?2 WHERE id = ?3",
                rusqlite::params![name, profile_picture_url, id],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Messages --

    /// Inserts a message and returns the stored row. `id` and `created_at`
    /// are assigned here, never by the caller.
    pub fn insert_message(
        &self,
        body: &str,
        user_id: i64,
        attachments: &str,
        in_reply_to: Option<i64>,
        channel: &str,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            let created_at = Utc::now().timestamp_millis();
            conn.execute(
                "INSERT INTO messages (body, user_id, attachments, in_reply_to, channel, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![body, user_id, attachments, in_reply_to, channel, created_at],
            )?;
            Ok(MessageRow {
                id: conn.last_insert_rowid(),
                body: body.to_string(),
                user_id,
                attachments: attachments.to_string(),
                in_reply_to,
                channel: channel.to_string(),
                created_at,
            })
        })
    }

    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, None))
    }

    pub fn list_channel_messages(&self, channel: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, Some(channel)))
    }

    pub fn list_channels(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT channel FROM messages ORDER BY channel")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_name(conn: &Connection, name: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, password, profile_picture_url FROM users WHERE name = ?1",
    )?;

    let row = stmt.query_row([name], map_user).optional()?;

    Ok(row)
}

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        password: row.get(2)?,
        profile_picture_url: row.get(3)?,
    })
}

fn query_messages(conn: &Connection, channel: Option<&str>) -> Result<Vec<MessageRow>> {
    // Newest first; id breaks ties within the same millisecond
    let rows = match channel {
        Some(channel) => {
            let mut stmt = conn.prepare(
                "SELECT id, body, user_id, attachments, in_reply_to, channel, created_at
                 FROM messages
                 WHERE channel = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([channel], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, body, user_id, attachments, in_reply_to, channel, created_at
                 FROM messages
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

fn map_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        body: row.get(1)?,
        user_id: row.get(2)?,
        attachments: row.get(3)?,
        in_reply_to: row.get(4)?,
        channel: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn credentials_match_only_with_correct_password() {
        let db = test_db();
        let alice = db.create_user("alice", "secret123", "").unwrap();

        let found = db.user_by_credentials("alice", "secret123").unwrap().unwrap();
        assert_eq!(found.id, alice.id);

        assert!(db.user_by_credentials("alice", "wrong").unwrap().is_none());
        assert!(db.user_by_credentials("nobody", "secret123").unwrap().is_none());
    }

    #[test]
    fn user_names_are_unique() {
        let db = test_db();
        db.create_user("alice", "a", "").unwrap();
        assert!(db.create_user("alice", "b", "").is_err());
    }

    #[test]
    fn update_user_reports_missing_target() {
        let db = test_db();
        let alice = db.create_user("alice", "a", "").unwrap();

        assert!(db.update_user(alice.id, "alicia", "http://pics/alicia.png").unwrap());
        assert!(!db.update_user(999, "ghost", "").unwrap());

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "alicia");
        assert_eq!(users[0].profile_picture_url, "http://pics/alicia.png");
    }

    #[test]
    fn messages_come_back_newest_first() {
        let db = test_db();
        let alice = db.create_user("alice", "a", "").unwrap();

        db.insert_message("first", alice.id, "[]", None, "general").unwrap();
        db.insert_message("second", alice.id, "[]", None, "general").unwrap();
        db.insert_message("third", alice.id, "[]", None, "random").unwrap();

        let all = db.list_messages().unwrap();
        let bodies: Vec<&str> = all.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["third", "second", "first"]);
    }

    #[test]
    fn channel_filter_returns_only_that_channel() {
        let db = test_db();
        let alice = db.create_user("alice", "a", "").unwrap();

        db.insert_message("one", alice.id, "[]", None, "general").unwrap();
        db.insert_message("two", alice.id, "[]", None, "general").unwrap();
        db.insert_message("noise", alice.id, "[]", None, "random").unwrap();

        let general = db.list_channel_messages("general").unwrap();
        let bodies: Vec<&str> = general.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["two", "one"]);

        assert!(db.list_channel_messages("empty").unwrap().is_empty());
    }

    #[test]
    fn channels_are_distinct_and_sorted() {
        let db = test_db();
        let alice = db.create_user("alice", "a", "").unwrap();

        db.insert_message("a", alice.id, "[]", None, "random").unwrap();
        db.insert_message("b", alice.id, "[]", None, "general").unwrap();
        db.insert_message("c", alice.id, "[]", None, "general").unwrap();

        assert_eq!(db.list_channels().unwrap(), ["general", "random"]);
    }

    #[test]
    fn replies_reference_existing_messages() {
        let db = test_db();
        let alice = db.create_user("alice", "a", "").unwrap();

        let root = db.insert_message("root", alice.id, "[]", None, "general").unwrap();
        let reply = db
            .insert_message("reply", alice.id, "[]", Some(root.id), "general")
            .unwrap();

        let all = db.list_messages().unwrap();
        assert_eq!(all[0].id, reply.id);
        assert_eq!(all[0].in_reply_to, Some(root.id));
        assert_eq!(all[1].in_reply_to, None);
    }
}
