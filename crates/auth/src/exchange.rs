//! Authorization-code → access-token exchange.

use async_trait::async_trait;
use huedebug_types::{DebuggerError, OAuthToken, Result};
use serde_json::Value;
use std::time::Duration;

use crate::client::OAuthClientConfig;

/// Swaps an authorization code for a token at the configured token endpoint.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform one exchange for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`DebuggerError::ExchangeFailed`] when the endpoint is
    /// unreachable, rejects the code, or answers without an access token.
    async fn exchange(&self, config: &OAuthClientConfig, code: &str) -> Result<OAuthToken>;
}

/// Standard form-encoded exchange over HTTP, client authenticated with
/// HTTP Basic credentials.
pub struct HttpTokenExchanger {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTokenExchanger {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Bound the whole exchange, response body included.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, config: &OAuthClientConfig, code: &str) -> Result<OAuthToken> {
        let mut form = vec![("grant_type", "authorization_code"), ("code", code)];
        if !config.redirect_url.is_empty() {
            form.push(("redirect_uri", config.redirect_url.as_str()));
        }

        let mut req = self
            .http
            .post(&config.token_url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DebuggerError::ExchangeFailed(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| DebuggerError::ExchangeFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(DebuggerError::ExchangeFailed(format!(
                "token endpoint returned {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }

        let json: Value = serde_json::from_slice(&body).map_err(|e| {
            DebuggerError::ExchangeFailed(format!("failed to parse token response: {e}"))
        })?;
        parse_token_response(&json)
    }
}

/// Parse the token endpoint JSON response into an [`OAuthToken`].
///
/// `expires_in` is accepted both as a number and as a numeric string.
///
/// # Errors
///
/// Returns an error if the response is missing the `access_token` field.
pub fn parse_token_response(json: &Value) -> Result<OAuthToken> {
    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            DebuggerError::ExchangeFailed("server response missing access_token".into())
        })?;

    let mut token = OAuthToken::new(access_token);
    if let Some(t) = json.get("token_type").and_then(Value::as_str) {
        token = token.with_token_type(t);
    }
    if let Some(r) = json.get("refresh_token").and_then(Value::as_str) {
        token = token.with_refresh(r);
    }
    let expires_in = json.get("expires_in").and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    });
    if let Some(exp) = expires_in {
        token = token.with_expiry(exp);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Form, Json, Router,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use huedebug_types::ApiVersion;
    use serde_json::json;
    use std::collections::HashMap;

    async fn token_endpoint(
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> axum::response::Response {
        let basic = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if basic != "Basic Y2lkOnNlY3JldA==" {
            return (StatusCode::UNAUTHORIZED, "bad client").into_response();
        }
        if form.get("grant_type").map(String::as_str) != Some("authorization_code")
            || form.get("redirect_uri").map(String::as_str) != Some("https://dbg.test/cb")
        {
            return (StatusCode::BAD_REQUEST, "bad form").into_response();
        }
        match form.get("code").map(String::as_str) {
            Some("good") => Json(json!({
                "access_token": "at-1",
                "token_type": "bearer",
                "expires_in": "604800",
                "refresh_token": "rt-1"
            }))
            .into_response(),
            Some("empty") => Json(json!({"token_type": "bearer"})).into_response(),
            Some("slow") => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"access_token": "late"})).into_response()
            }
            _ => (StatusCode::BAD_REQUEST, "invalid_grant").into_response(),
        }
    }

    async fn spawn_token_server() -> String {
        let app = Router::new().route("/v2/oauth2/token", post(token_endpoint));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(api: &str) -> OAuthClientConfig {
        OAuthClientConfig::build("https://dbg.test/cb", "app", "cid", "secret", api, ApiVersion::V2)
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let api = spawn_token_server().await;
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let token = exchanger.exchange(&config(&api), "good").await.unwrap();
        assert_eq!(token.access_token, "at-1");
        assert_eq!(token.token_type.as_deref(), Some("bearer"));
        assert_eq!(token.refresh_token.as_deref(), Some("rt-1"));
        assert!(token.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_exchange_rejected_code() {
        let api = spawn_token_server().await;
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let err = exchanger.exchange(&config(&api), "bad").await.unwrap_err();
        assert!(matches!(err, DebuggerError::ExchangeFailed(_)));
        let msg = err.to_string();
        assert!(msg.contains("400"), "{msg}");
        assert!(msg.contains("invalid_grant"), "{msg}");
    }

    #[tokio::test]
    async fn test_exchange_missing_access_token() {
        let api = spawn_token_server().await;
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let err = exchanger.exchange(&config(&api), "empty").await.unwrap_err();
        assert!(err.to_string().contains("missing access_token"));
    }

    #[tokio::test]
    async fn test_exchange_wrong_credentials() {
        let api = spawn_token_server().await;
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let mut cfg = config(&api);
        cfg.client_secret = "wrong".into();
        let err = exchanger.exchange(&cfg, "good").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_exchange_unreachable_endpoint() {
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let err = exchanger
            .exchange(&config("http://127.0.0.1:1"), "good")
            .await
            .unwrap_err();
        assert!(matches!(err, DebuggerError::ExchangeFailed(_)));
    }

    #[tokio::test]
    async fn test_exchange_unparseable_token_url() {
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new());
        let err = exchanger.exchange(&config(""), "good").await.unwrap_err();
        assert!(matches!(err, DebuggerError::ExchangeFailed(_)));
    }

    #[test]
    fn test_parse_numeric_expiry() {
        let t = parse_token_response(&json!({"access_token": "tok", "expires_in": 3600})).unwrap();
        assert_eq!(t.access_token, "tok");
        assert!(t.expires_at.is_some());
        assert_eq!(t.token_type.as_deref(), Some("Bearer"));
    }

    #[tokio::test]
    async fn test_exchange_times_out() {
        let api = spawn_token_server().await;
        let exchanger = HttpTokenExchanger::new(reqwest::Client::new())
            .with_timeout(Duration::from_millis(200));
        let err = exchanger.exchange(&config(&api), "slow").await.unwrap_err();
        assert!(matches!(err, DebuggerError::ExchangeFailed(_)));
    }

    #[test]
    fn test_parse_out_of_range_expiry() {
        let t = parse_token_response(&json!({"access_token": "tok", "expires_in": u64::MAX}))
            .unwrap();
        assert_eq!(t.expires_at, Some(u64::MAX));
    }

    #[test]
    fn test_parse_missing() {
        assert!(parse_token_response(&json!({})).is_err());
        assert!(parse_token_response(&json!({"access_token": ""})).is_err());
    }
}
