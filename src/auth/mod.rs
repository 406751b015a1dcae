//! Bearer token gate
//!
//! A single shared secret guards every search route. The gate only answers
//! allow or deny; it keeps no state between requests.

use crate::config::AuthSettings;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a request is refused at the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header
    #[error("Not authenticated")]
    Missing,
    /// A bearer token was sent but does not match
    #[error("Invalid authentication token")]
    Unauthorized,
    /// The server has no secret to compare against
    #[error("API_TOKEN not configured. Please set API_TOKEN environment variable.")]
    Misconfigured,
}

/// Compares presented tokens with the configured secret in constant time.
///
/// Both sides are run through HMAC-SHA256 under a per-process random key and
/// the tags are compared with [`Mac::verify_slice`], so neither the secret's
/// length nor its content leaks through timing.
#[derive(Clone)]
pub struct AuthGate {
    key: [u8; 32],
    expected: Option<Vec<u8>>,
}

impl AuthGate {
    /// Build a gate. A blank secret counts as not configured.
    pub fn new(secret: Option<&str>) -> Self {
        let key: [u8; 32] = rand::random();
        let expected = secret
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| tag(&key, s.as_bytes()));
        Self { key, expected }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(settings.api_token.as_deref())
    }

    /// Whether a secret is configured
    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Check the raw `Authorization` header value.
    ///
    /// A missing credential is reported before a missing secret, which is
    /// reported before a mismatch.
    pub fn check(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let token = authorization.and_then(bearer_token).ok_or(AuthError::Missing)?;
        let expected = self.expected.as_ref().ok_or(AuthError::Misconfigured)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::Unauthorized)?;
        mac.update(token.as_bytes());
        mac.verify_slice(expected)
            .map_err(|_| AuthError::Unauthorized)
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn tag(key: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Extract the token from `Bearer <token>`; the scheme is case-insensitive
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
