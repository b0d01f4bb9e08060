//! Service configuration from environment variables

use std::env;

use crate::telegram::DEFAULT_AUTH_MAX_AGE_SECS;

/// Default session lifetime: 24 hours
const DEFAULT_SESSION_TTL_SECS: i64 = 86400;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Telegram bot token; logins are rejected when unset
    pub bot_token: Option<String>,
    /// Bot username exposed to the client via /api/config
    pub bot_username: Option<String>,
    /// Public application URL exposed to the client via /api/config
    pub app_url: Option<String>,
    /// Freshness window for the login payload's auth_date, in seconds
    pub auth_max_age_secs: i64,
    /// Session lifetime in seconds
    pub session_ttl_secs: i64,
    /// Whether resolving a session extends its lifetime
    pub session_sliding: bool,
    /// Whether the session cookie is marked Secure
    pub cookie_secure: bool,
    /// Optional allow-list of Telegram user ids; empty means everyone
    pub allowed_users: Vec<i64>,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10000);

        let bot_token = env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty());
        let bot_username = env::var("TELEGRAM_BOT_USERNAME").ok().filter(|s| !s.is_empty());
        let app_url = env::var("APP_URL").ok().filter(|s| !s.is_empty());

        let auth_max_age_secs = env::var("AUTH_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_AUTH_MAX_AGE_SECS);

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let session_sliding = env::var("SESSION_SLIDING")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let allowed_users = env::var("ALLOWED_USERS")
            .map(|s| parse_allowed_users(&s))
            .unwrap_or_default();

        Self {
            port,
            bot_token,
            bot_username,
            app_url,
            auth_max_age_secs,
            session_ttl_secs,
            session_sliding,
            cookie_secure,
            allowed_users,
        }
    }

    /// Check a Telegram user id against the allow-list.
    ///
    /// An empty allow-list admits everyone.
    pub fn is_user_allowed(&self, telegram_id: i64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&telegram_id)
    }
}

fn parse_allowed_users(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
