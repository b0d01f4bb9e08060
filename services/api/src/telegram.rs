//! Telegram login payload verification
//!
//! Implements the signature check from the Telegram login widget
//! protocol: the signing key is the SHA-256 digest of the bot token,
//! and the tag is the hex HMAC-SHA256 of the payload's check string
//! (all fields except `hash`, empty values omitted, sorted by key,
//! rendered as `key=value` lines joined with a newline).

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window for the `auth_date` field, in seconds
pub const DEFAULT_AUTH_MAX_AGE_SECS: i64 = 86400;

/// Rejection reasons for a Telegram login payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bot token configured on the server
    #[error("Telegram bot token is not configured")]
    NotConfigured,

    /// A required payload field is missing
    #[error("missing payload field: {0}")]
    MissingField(&'static str),

    /// A payload field could not be parsed
    #[error("malformed payload field: {0}")]
    MalformedField(&'static str),

    /// The payload is older than the freshness window
    #[error("authentication payload has expired")]
    Expired,

    /// The HMAC tag does not match the payload
    #[error("invalid payload signature")]
    BadSignature,
}

/// Identity fields extracted from a payload that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAuth {
    pub telegram_id: i64,
    pub auth_date: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Verifier for Telegram login payloads
#[derive(Debug, Clone)]
pub struct TelegramAuthVerifier {
    bot_token: Option<String>,
    max_age_secs: i64,
}

impl TelegramAuthVerifier {
    /// Create a verifier for the given bot token and freshness window
    pub fn new(bot_token: Option<String>, max_age_secs: i64) -> Self {
        Self {
            bot_token,
            max_age_secs,
        }
    }

    /// Verify a login payload against the bot token
    pub fn verify(&self, payload: &Map<String, Value>) -> Result<VerifiedAuth, AuthRejection> {
        self.verify_at(payload, Utc::now().timestamp())
    }

    /// Verify a login payload as of the given unix timestamp
    pub fn verify_at(
        &self,
        payload: &Map<String, Value>,
        now: i64,
    ) -> Result<VerifiedAuth, AuthRejection> {
        let bot_token = match &self.bot_token {
            Some(token) => token,
            None => {
                warn!("TELEGRAM_BOT_TOKEN not configured, rejecting login");
                return Err(AuthRejection::NotConfigured);
            }
        };

        let claimed_tag = payload
            .get("hash")
            .and_then(field_as_string)
            .ok_or(AuthRejection::MissingField("hash"))?;
        let claimed_tag =
            hex::decode(&claimed_tag).map_err(|_| AuthRejection::MalformedField("hash"))?;

        let auth_date = payload
            .get("auth_date")
            .and_then(field_as_string)
            .ok_or(AuthRejection::MissingField("auth_date"))?
            .parse::<i64>()
            .map_err(|_| AuthRejection::MalformedField("auth_date"))?;

        if now - auth_date > self.max_age_secs {
            return Err(AuthRejection::Expired);
        }

        let check_string = check_string(payload);

        let secret_key = Sha256::digest(bot_token.as_bytes());
        let mut mac = HmacSha256::new_from_slice(&secret_key)
            .map_err(|_| AuthRejection::MalformedField("hash"))?;
        mac.update(check_string.as_bytes());

        // Constant-time comparison
        mac.verify_slice(&claimed_tag)
            .map_err(|_| AuthRejection::BadSignature)?;

        let telegram_id = payload
            .get("id")
            .and_then(field_as_string)
            .ok_or(AuthRejection::MissingField("id"))?
            .parse::<i64>()
            .map_err(|_| AuthRejection::MalformedField("id"))?;

        Ok(VerifiedAuth {
            telegram_id,
            auth_date,
            first_name: payload.get("first_name").and_then(field_as_string),
            last_name: payload.get("last_name").and_then(field_as_string),
            username: payload.get("username").and_then(field_as_string),
        })
    }
}

/// Build the canonical check string: every field but `hash`, empty
/// values dropped, sorted by key, `key=value` lines joined with '\n'.
fn check_string(payload: &Map<String, Value>) -> String {
    let mut fields = payload
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .filter_map(|(key, value)| Some((key.as_str(), field_as_string(value)?)))
        .collect::<Vec<_>>();
    fields.sort_by_key(|(key, _)| *key);

    fields
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a payload field the way the login widget serializes it.
///
/// Strings are taken verbatim, numbers and booleans by their JSON
/// rendering. Null and empty strings count as absent.
fn field_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOT_TOKEN: &str = "110201543:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";

    fn sign(payload: &Map<String, Value>, bot_token: &str) -> String {
        let check_string = check_string(payload);

        let secret_key = Sha256::digest(bot_token.as_bytes());
        let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
        mac.update(check_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed_payload(auth_date: i64) -> Map<String, Value> {
        let mut payload = json!({
            "id": 42,
            "first_name": "Alice",
            "last_name": "",
            "username": "alice",
            "auth_date": auth_date.to_string(),
        })
        .as_object()
        .unwrap()
        .clone();
        let tag = sign(&payload, BOT_TOKEN);
        payload.insert("hash".to_string(), Value::String(tag));
        payload
    }

    fn verifier() -> TelegramAuthVerifier {
        TelegramAuthVerifier::new(Some(BOT_TOKEN.to_string()), DEFAULT_AUTH_MAX_AGE_SECS)
    }

    #[test]
    fn accepts_correctly_signed_payload() {
        let now = 1_700_000_000;
        let payload = signed_payload(now - 60);

        let auth = verifier().verify_at(&payload, now).unwrap();
        assert_eq!(auth.telegram_id, 42);
        assert_eq!(auth.first_name.as_deref(), Some("Alice"));
        assert_eq!(auth.last_name, None);
        assert_eq!(auth.username.as_deref(), Some("alice"));
    }

    #[test]
    fn rejects_flipped_tag_character() {
        let now = 1_700_000_000;
        let mut payload = signed_payload(now - 60);

        let tag = payload["hash"].as_str().unwrap();
        let flipped = if tag.starts_with('0') {
            format!("1{}", &tag[1..])
        } else {
            format!("0{}", &tag[1..])
        };
        payload.insert("hash".to_string(), Value::String(flipped));

        assert_eq!(
            verifier().verify_at(&payload, now),
            Err(AuthRejection::BadSignature)
        );
    }

    #[test]
    fn rejects_tampered_field_value() {
        let now = 1_700_000_000;
        let mut payload = signed_payload(now - 60);
        payload.insert("first_name".to_string(), Value::String("Mallory".into()));

        assert_eq!(
            verifier().verify_at(&payload, now),
            Err(AuthRejection::BadSignature)
        );
    }

    #[test]
    fn rejects_payload_one_second_past_the_window() {
        let now = 1_700_000_000;
        let payload = signed_payload(now - 86401);

        assert_eq!(
            verifier().verify_at(&payload, now),
            Err(AuthRejection::Expired)
        );
    }

    #[test]
    fn accepts_payload_exactly_at_the_window() {
        let now = 1_700_000_000;
        let payload = signed_payload(now - 86400);

        assert!(verifier().verify_at(&payload, now).is_ok());
    }

    #[test]
    fn rejects_when_token_not_configured() {
        let now = 1_700_000_000;
        let payload = signed_payload(now - 60);
        let verifier = TelegramAuthVerifier::new(None, DEFAULT_AUTH_MAX_AGE_SECS);

        assert_eq!(
            verifier.verify_at(&payload, now),
            Err(AuthRejection::NotConfigured)
        );
    }

    #[test]
    fn rejects_missing_or_malformed_tag() {
        let now = 1_700_000_000;
        let mut payload = signed_payload(now - 60);
        payload.remove("hash");
        assert_eq!(
            verifier().verify_at(&payload, now),
            Err(AuthRejection::MissingField("hash"))
        );

        payload.insert("hash".to_string(), Value::String("not-hex".into()));
        assert_eq!(
            verifier().verify_at(&payload, now),
            Err(AuthRejection::MalformedField("hash"))
        );
    }

    #[test]
    fn numeric_id_signs_the_same_as_its_decimal_rendering() {
        // The login widget posts `id` as a JSON number; it is signed by
        // its decimal rendering.
        let now = 1_700_000_000;
        let mut payload = signed_payload(now - 60);
        assert_eq!(payload["id"], json!(42));

        payload.insert("id".to_string(), Value::String("42".into()));
        assert!(verifier().verify_at(&payload, now).is_ok());
    }

    #[test]
    fn freshness_window_is_configurable() {
        let now = 1_700_000_000;
        let payload = signed_payload(now - 600);
        let strict = TelegramAuthVerifier::new(Some(BOT_TOKEN.to_string()), 300);

        assert_eq!(strict.verify_at(&payload, now), Err(AuthRejection::Expired));
    }
}
