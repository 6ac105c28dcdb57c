//! Access token returned by the authorization-code exchange.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// An OAuth token as handed to the post-login continuation.
///
/// The debugger never stores or refreshes it; the value is passed straight
/// on to whoever completes the browser's callback request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl OAuthToken {
    /// Create a new token with the given access token and `Bearer` type.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_at: None,
            refresh_token: None,
        }
    }

    /// Override the token type reported by the token endpoint.
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// Set the expiry to `expires_in_secs` seconds from now, clamped at
    /// `u64::MAX`.
    #[must_use]
    pub fn with_expiry(mut self, expires_in_secs: u64) -> Self {
        self.expires_at = Some(unix_now().saturating_add(expires_in_secs));
        self
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_bearer() {
        let t = OAuthToken::new("tok");
        assert_eq!(t.token_type.as_deref(), Some("Bearer"));
        assert!(t.refresh_token.is_none());
        assert!(t.expires_at.is_none());
    }

    #[test]
    fn test_expiry_is_relative_to_now() {
        let before = unix_now();
        let t = OAuthToken::new("tok").with_expiry(3600);
        let at = t.expires_at.unwrap();
        assert!(at >= before + 3600 && at <= unix_now() + 3600);
    }

    #[test]
    fn test_huge_expiry_saturates() {
        let t = OAuthToken::new("tok").with_expiry(u64::MAX);
        assert_eq!(t.expires_at, Some(u64::MAX));
    }

    #[test]
    fn test_serde_skips_none() {
        let t = OAuthToken {
            token_type: None,
            ..OAuthToken::new("tok")
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("expires_at"));
        assert!(!json.contains("token_type"));
    }
}
