//! In-memory session store
//!
//! Sessions map an opaque token, carried by the client in an HttpOnly
//! cookie, to the authenticated user. Entries are TTL-bounded and
//! reaped lazily on access; there is no background sweeper.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::info;

use crate::models::TelegramProfile;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sid";

/// Server-side session record
#[derive(Debug, Clone)]
pub struct Session {
    /// Internal user id (primary key in the users table)
    pub user_id: i32,
    /// External Telegram identity
    pub telegram_id: i64,
    /// Display fields cached at login
    pub profile: TelegramProfile,
    pub expires_at: DateTime<Utc>,
}

/// Session store handle, cheap to clone
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    sliding: bool,
}

impl SessionStore {
    /// Create a store with the given TTL in seconds.
    ///
    /// With `sliding` set, resolving a session pushes its expiry out by
    /// a full TTL; otherwise the lifetime is fixed at creation.
    pub fn new(ttl_secs: i64, sliding: bool) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs),
            sliding,
        }
    }

    /// Session TTL in seconds, as configured
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Create a session and return its token
    pub async fn create(&self, user_id: i32, telegram_id: i64, profile: TelegramProfile) -> String {
        let token = generate_token();
        let session = Session {
            user_id,
            telegram_id,
            profile,
            expires_at: Utc::now() + self.ttl,
        };

        self.sessions.write().await.insert(token.clone(), session);
        info!("Created session for user {}", user_id);

        token
    }

    /// Resolve a token to its session.
    ///
    /// Returns `None` for unknown or expired tokens; expired entries
    /// are removed on the way out.
    pub async fn resolve(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(token) {
            Some(session) => session.expires_at <= Utc::now(),
            None => return None,
        };
        if expired {
            sessions.remove(token);
            return None;
        }

        let session = sessions.get_mut(token)?;
        if self.sliding {
            session.expires_at = Utc::now() + self.ttl;
        }

        Some(session.clone())
    }

    /// Destroy a session; unknown tokens are a no-op
    pub async fn destroy(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            info!("Destroyed session for user {}", session.user_id);
        }
    }
}

/// 32 random bytes, hex-encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
