use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Yaml},
    value::{Uncased, UncasedStr},
};
use huedebug_types::ApiVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable names understood without the `HUEDEBUG_` prefix,
/// mapped to the config field they populate.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("CALLBACK_URL", "callback_url"),
    ("HUE_APPID", "app_id"),
    ("HUE_CLIENT_ID", "client_id"),
    ("HUE_CLIENT_SECRET", "client_secret"),
    ("HUE_API_ENDPOINT", "api_endpoint"),
    ("HUE_API_VERSION", "api_version"),
];

const ENV_PREFIX: &str = "HUEDEBUG_";

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_api_endpoint() -> String {
    "https://api.meethue.com".to_string()
}
fn default_error_root() -> String {
    "/".to_string()
}
fn default_proxy_prefixes() -> Vec<String> {
    ["/api/", "/v2/", "/bridge/", "/connectionstatus"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_upstream_timeout_secs() -> u64 {
    30
}

/// Paths of the fixed routes served locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Liveness probe (defaults to `/_ah/health`).
    pub health: String,
    /// Starts the OAuth login (defaults to `/login`).
    pub login: String,
    /// OAuth redirect target registered with the vendor.
    pub callback: String,
    /// Traffic inspector page the token is handed to.
    pub viewer: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            health: "/_ah/health".to_string(),
            login: "/login".to_string(),
            callback: "/hue_callback_url".to_string(),
            viewer: "/clip.html".to_string(),
        }
    }
}

/// How the anti-forgery `state` parameter is produced and checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMode {
    /// Random single-use values remembered for `ttl_secs`.
    #[default]
    Nonce,
    /// One constant shared value. Only suitable for a single operator.
    Fixed,
}

/// Anti-forgery state settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    pub mode: StateMode,
    /// Value used when `mode` is `fixed`.
    pub fixed_value: String,
    /// Lifetime of an issued nonce.
    pub ttl_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            mode: StateMode::Nonce,
            fixed_value: "pseudo-random".to_string(),
            ttl_secs: 600,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,
    /// OAuth redirect URL registered for the client.
    #[serde(default)]
    pub callback_url: String,
    /// Application id, also sent as the device id.
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Base URL of the remote API; also the reverse proxy's upstream.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Where the browser is sent when login fails.
    #[serde(default = "default_error_root")]
    pub error_root: String,
    #[serde(default)]
    pub routes: RouteConfig,
    /// Path prefixes forwarded to the upstream API.
    #[serde(default = "default_proxy_prefixes")]
    pub proxy_prefixes: Vec<String>,
    /// Timeout applied to the token exchange and every proxied call.
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            callback_url: String::new(),
            app_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            api_endpoint: default_api_endpoint(),
            api_version: ApiVersion::default(),
            error_root: default_error_root(),
            routes: RouteConfig::default(),
            proxy_prefixes: default_proxy_prefixes(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            state: StateConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Loads the effective configuration: defaults, then the optional YAML
    /// file, then the legacy environment names, then `HUEDEBUG_*` variables.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if any layer fails to parse or the merged
    /// result does not match the schema.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::raw().filter_map(legacy_env_key))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Returns a copy safe to print, with the client secret masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.client_secret.is_empty() {
            copy.client_secret = "********".to_string();
        }
        copy
    }
}

fn legacy_env_key(key: &UncasedStr) -> Option<Uncased<'_>> {
    LEGACY_ENV
        .iter()
        .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
        .map(|(_, field)| Uncased::from(*field))
}
