//! Signed "remember me" tokens
//!
//! A token is `base64url(json) "." hex(hmac_sha256(secret, payload))`, where
//! the JSON carries the username and the issue time in Unix seconds. Tokens
//! are stateless: anything holding the secret can check one, and changing
//! the secret invalidates all of them.

use crate::error::{AuthError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims {
    username: String,
    issued_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberToken {
    pub username: String,
    pub issued_at: DateTime<Utc>,
}

impl RememberToken {
    pub fn new(username: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            issued_at,
        }
    }

    /// Token for `username` issued now.
    pub fn issue(username: impl Into<String>) -> Self {
        Self::new(username, Utc::now())
    }

    pub fn encode(&self, secret: &str) -> Result<String> {
        if secret.is_empty() {
            return Err(AuthError::RememberDisabled);
        }

        let claims = Claims {
            username: self.username.clone(),
            issued_at: self.issued_at.timestamp(),
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(mac(secret, &payload)?.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    /// Check signature and age of `token` as of `now`.
    pub fn decode_at(
        token: &str,
        secret: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::RememberDisabled);
        }

        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| AuthError::MalformedToken("missing signature".to_string()))?;

        let signature = hex::decode(signature).map_err(|_| AuthError::BadSignature)?;
        mac(secret, payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        let issued_at = Utc
            .timestamp_opt(claims.issued_at, 0)
            .single()
            .ok_or_else(|| AuthError::MalformedToken("invalid issue time".to_string()))?;

        if now - issued_at > max_age {
            return Err(AuthError::TokenExpired);
        }
        // A token from the future was not issued by us with this clock.
        if issued_at - now > Duration::minutes(5) {
            return Err(AuthError::MalformedToken("issued in the future".to_string()));
        }

        Ok(Self::new(claims.username, issued_at))
    }

    pub fn decode(token: &str, secret: &str, max_age: Duration) -> Result<Self> {
        Self::decode_at(token, secret, max_age, Utc::now())
    }
}

/// Keyed MAC over `payload`, ready to finalize or verify.
fn mac(secret: &str, payload: &str) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}
