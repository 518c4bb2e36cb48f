use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// How long an issued token stays valid. Fixed TTL, not sliding: a lookup
/// never extends a session. Earlier deployments of this service disagreed
/// between 10 minutes and 1 hour; this implementation standardizes on 1 hour.
const SESSION_TTL_SECS: i64 = 3600;

/// Interval between background sweeps of the session table.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// A live session as returned to the login handler.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token")]
    NotFound,
    #[error("token expired")]
    Expired,
}

struct SessionEntry {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Issues, validates and expires bearer tokens.
///
/// Cloneable handle around shared state; constructed once at startup and
/// injected through the router state, never held as a global. Sessions live
/// only in process memory, so a restart invalidates all of them.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    ttl: TimeDelta,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_ttl(TimeDelta::seconds(SESSION_TTL_SECS))
    }

    /// Registry with a custom TTL. Tests use this to force expiry.
    pub fn with_ttl(ttl: TimeDelta) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                ttl,
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Issue a fresh token for `user_id`. One user may hold any number of
    /// concurrent sessions.
    pub async fn issue(&self, user_id: i64) -> Session {
        let token = generate_token();
        let expires_at = Utc::now() + self.inner.ttl;

        self.inner
            .sessions
            .write()
            .await
            .insert(token.clone(), SessionEntry { user_id, expires_at });

        debug!(user_id, %expires_at, "session issued");
        Session {
            token,
            user_id,
            expires_at,
        }
    }

    /// Look up a token. An expired entry is evicted on sight, so a second
    /// call with the same token reports `NotFound`.
    pub async fn resolve(&self, token: &str) -> Result<i64, SessionError> {
        let now = Utc::now();
        {
            let sessions = self.inner.sessions.read().await;
            match sessions.get(token) {
                None => return Err(SessionError::NotFound),
                Some(entry) if !is_expired(entry, now) => return Ok(entry.user_id),
                Some(_) => {}
            }
        }

        // Concurrent resolves of a just-expired token may race to this
        // remove; entries never return to active, so double-delete is safe.
        self.inner.sessions.write().await.remove(token);
        Err(SessionError::Expired)
    }

    /// Remove every entry whose expiry has passed, returning the count.
    ///
    /// Expired tokens are snapshotted under the read lock first so the
    /// write lock is never held for a scan of the whole table.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = {
            let sessions = self.inner.sessions.read().await;
            sessions
                .iter()
                .filter(|&(_, entry)| is_expired(entry, now))
                .map(|(token, _)| token.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.inner.sessions.write().await;
        expired
            .iter()
            .filter(|token| sessions.remove(token.as_str()).is_some())
            .count()
    }

    #[cfg(test)]
    async fn insert_raw(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) {
        self.inner
            .sessions
            .write()
            .await
            .insert(token.to_string(), SessionEntry { user_id, expires_at });
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The one authoritative expiry check, shared by lookup and sweep.
fn is_expired(entry: &SessionEntry, now: DateTime<Utc>) -> bool {
    entry.expires_at <= now
}

/// 32 bytes from the OS-seeded RNG, base64url — 43 chars, 256-bit entropy.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Background task that prunes expired sessions.
///
/// Lookup already evicts expired tokens on sight; this loop catches the
/// abandoned ones that are never looked up again, so the table does not
/// grow without bound. The spawner owns the task handle and aborts it at
/// shutdown.
pub async fn run_sweep_loop(registry: SessionRegistry) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        interval.tick().await;

        let evicted = registry.sweep().await;
        if evicted > 0 {
            info!("sweep: evicted {} expired sessions", evicted);
        }
    }
}
