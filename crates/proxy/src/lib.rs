//! HTTP layer of the debugger: axum router, route handlers, and error mapping.
//!
//! Serves the OAuth login and callback routes, forwards allow-listed API
//! paths to the remote API, and hosts the small local pages around them.

mod error;
pub mod forward;
pub mod login;
mod pages;
pub mod target;

pub use error::ApiError;
pub use login::{RedirectWithToken, TokenHandoff};
pub use target::{PathRouter, ProxyTarget, Route};

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use huedebug_auth::{
    Authenticator, FixedState, HttpTokenExchanger, NonceStates, OAuthClientConfig, StateStrategy,
    TokenExchanger,
};
use huedebug_config::{Config, RouteConfig, StateConfig, StateMode};
use huedebug_types::{DebuggerError, Result};
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;

/// Shared, immutable state passed to all route handlers.
///
/// Built once at startup from [`Config`]; every request only reads it.
pub struct Debugger {
    pub(crate) auth: Authenticator,
    pub(crate) target: ProxyTarget,
    pub(crate) paths: PathRouter,
    pub(crate) routes: RouteConfig,
    pub(crate) error_root: String,
    pub(crate) handoff: Arc<dyn TokenHandoff>,
    /// HTTP client for the token endpoint and proxied requests.
    pub(crate) http: reqwest::Client,
}

impl Debugger {
    /// Build the debugger with the HTTP token exchanger.
    ///
    /// # Errors
    ///
    /// Returns [`DebuggerError::MalformedUpstreamTarget`] if the API endpoint
    /// is unusable, or [`DebuggerError::Config`] for invalid route paths.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.upstream_timeout_secs);
        let http = build_http_client(timeout);
        let exchanger = Arc::new(HttpTokenExchanger::new(http.clone()).with_timeout(timeout));
        Self::assemble(config, http, exchanger)
    }

    /// Build the debugger around a caller-supplied token exchanger.
    ///
    /// # Errors
    ///
    /// Same as [`Debugger::from_config`].
    pub fn with_exchanger(config: &Config, exchanger: Arc<dyn TokenExchanger>) -> Result<Self> {
        let http = build_http_client(Duration::from_secs(config.upstream_timeout_secs));
        Self::assemble(config, http, exchanger)
    }

    /// Replace the post-login continuation.
    #[must_use]
    pub fn with_handoff(mut self, handoff: Arc<dyn TokenHandoff>) -> Self {
        self.handoff = handoff;
        self
    }

    fn assemble(
        config: &Config,
        http: reqwest::Client,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Result<Self> {
        let target = ProxyTarget::parse(&config.api_endpoint)?;
        validate_routes(&config.routes)?;

        let oauth = OAuthClientConfig::build(
            &config.callback_url,
            &config.app_id,
            &config.client_id,
            &config.client_secret,
            &config.api_endpoint,
            config.api_version,
        );

        Ok(Self {
            auth: Authenticator::new(oauth, state_strategy(&config.state), exchanger),
            target,
            paths: PathRouter::new(config.proxy_prefixes.iter().cloned()),
            routes: config.routes.clone(),
            error_root: config.error_root.clone(),
            handoff: Arc::new(RedirectWithToken::new(config.routes.viewer.clone())),
            http,
        })
    }

    /// The upstream every proxied request goes to.
    #[must_use]
    pub fn target(&self) -> &ProxyTarget {
        &self.target
    }
}

fn state_strategy(config: &StateConfig) -> Arc<dyn StateStrategy> {
    match config.mode {
        StateMode::Nonce => Arc::new(NonceStates::new(Duration::from_secs(config.ttl_secs))),
        StateMode::Fixed => {
            tracing::warn!("using a fixed oauth state; only safe for a single operator");
            Arc::new(FixedState::new(config.fixed_value.clone()))
        }
    }
}

fn validate_routes(routes: &RouteConfig) -> Result<()> {
    let paths = [&routes.health, &routes.login, &routes.callback, &routes.viewer];
    for (i, path) in paths.iter().enumerate() {
        if !path.starts_with('/') || path.contains(['{', '}', '*', ':']) {
            return Err(DebuggerError::Config(format!(
                "route path {path:?} must be a literal absolute path"
            )));
        }
        if paths[..i].contains(path) {
            return Err(DebuggerError::Config(format!(
                "route path {path:?} is configured twice"
            )));
        }
    }
    Ok(())
}

/// Build an HTTP client that never follows redirects, so upstream redirects
/// reach the browser unchanged.
///
/// `stall` bounds connecting and each socket read, not the whole transfer;
/// a long streamed response keeps flowing as long as bytes keep arriving.
fn build_http_client(stall: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(stall)
        .read_timeout(stall)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build http client, using defaults");
            reqwest::Client::new()
        })
}

/// Build the full axum router.
///
/// Routes (paths configurable, defaults shown):
/// - GET      /_ah/health        liveness probe
/// - ANY      /login             307 to the authorize endpoint
/// - GET/POST /hue_callback_url  code exchange, then token handoff
/// - GET      /clip.html         traffic viewer
/// - ANY      everything else    proxied if allow-listed, `/` landing, else 404
pub fn make_router(state: Arc<Debugger>) -> Router {
    let routes = state.routes.clone();
    Router::new()
        .route(&routes.health, get(pages::health))
        .route(&routes.login, any(login::login))
        .route(
            &routes.callback,
            get(login::callback).post(login::callback),
        )
        .route(&routes.viewer, get(pages::viewer))
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<Arc<Debugger>>, req: Request) -> Response {
    match state.paths.classify(req.uri().path()) {
        Route::Proxy => forward::forward(&state, req)
            .await
            .unwrap_or_else(IntoResponse::into_response),
        Route::Landing => pages::landing(&state.routes.login).into_response(),
        Route::NotFound => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
    }
}
