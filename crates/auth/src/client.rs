//! OAuth client configuration for the Hue Remote API.
//!
//! Both API generations key the authorize request on the application id,
//! sent once as `appid` and once as `deviceid`. Nothing here is validated:
//! an empty or broken value only surfaces when the token exchange fails.

use huedebug_types::ApiVersion;

/// Endpoint URLs and client credentials for one API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    /// Authorize endpoint including the `appid`/`deviceid`/`devicename` query.
    pub authorize_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Always empty for the Hue API; kept for a standard authorize request.
    pub scopes: Vec<String>,
    pub version: ApiVersion,
}

impl OAuthClientConfig {
    /// Build the client configuration for `version` against `api_endpoint`.
    #[must_use]
    pub fn build(
        callback_url: &str,
        app_id: &str,
        client_id: &str,
        client_secret: &str,
        api_endpoint: &str,
        version: ApiVersion,
    ) -> Self {
        let api = api_endpoint.trim_end_matches('/');
        let device_query = encode_pairs(&[
            ("appid", app_id),
            ("deviceid", app_id),
            ("devicename", version.device_name()),
        ]);
        Self {
            authorize_url: format!("{api}{}?{device_query}", version.authorize_path()),
            token_url: format!("{api}{}", version.token_path()),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_url: callback_url.to_string(),
            scopes: Vec::new(),
            version,
        }
    }

    /// Full authorize URL the browser is redirected to for `state`.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let scope = self.scopes.join(" ");
        let mut pairs = vec![("response_type", "code"), ("client_id", self.client_id.as_str())];
        if !self.redirect_url.is_empty() {
            pairs.push(("redirect_uri", self.redirect_url.as_str()));
        }
        if !scope.is_empty() {
            pairs.push(("scope", scope.as_str()));
        }
        pairs.push(("state", state));

        let sep = if self.authorize_url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{}", self.authorize_url, encode_pairs(&pairs))
    }
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    // string pairs always serialize
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}
