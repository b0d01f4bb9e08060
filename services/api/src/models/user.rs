//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User entity
///
/// `id` is the internal primary key; `telegram_id` is the stable
/// external identity the user authenticates with.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub telegram_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display fields of a Telegram account, as cached in the session and
/// echoed back to the client on login and session check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramProfile {
    /// Telegram user id (the external identity, not the internal key)
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl From<&User> for TelegramProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.telegram_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
        }
    }
}
