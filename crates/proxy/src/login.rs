//! OAuth login redirect and callback dispatch.
//!
//! Routes (paths come from configuration):
//! - `GET       /login`            -> 307 to the vendor authorize URL.
//! - `GET/POST  /hue_callback_url` -> redeem `state`/`code`, then hand the
//!   token to the configured [`TokenHandoff`]; failures 307 to the error root.

use axum::{
    body::{self, Body},
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use huedebug_types::{DebuggerError, OAuthToken};
use std::sync::Arc;

use crate::Debugger;

/// Largest callback form body that is read.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Completes the browser's callback request once a token is in hand.
pub trait TokenHandoff: Send + Sync {
    /// Build the response for the callback request described by `request`.
    fn complete(&self, token: OAuthToken, request: &Parts) -> Response;
}

/// Default handoff: redirect to the viewer page with the token in its query.
pub struct RedirectWithToken {
    viewer: String,
}

impl RedirectWithToken {
    pub fn new(viewer: impl Into<String>) -> Self {
        Self {
            viewer: viewer.into(),
        }
    }
}

impl TokenHandoff for RedirectWithToken {
    fn complete(&self, token: OAuthToken, _request: &Parts) -> Response {
        temporary_redirect(&with_query(
            &self.viewer,
            &[("accessToken", token.access_token.as_str())],
        ))
    }
}

#[derive(Debug, Default)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
}

impl CallbackParams {
    /// Decode a urlencoded string; the first occurrence of a repeated key wins.
    fn parse(encoded: &[u8]) -> Self {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(encoded)
            .unwrap_or_default();
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "state" => &mut params.state,
                "code" => &mut params.code,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    /// Fields present in `other` win.
    fn overlay(self, other: Self) -> Self {
        Self {
            state: other.state.or(self.state),
            code: other.code.or(self.code),
        }
    }
}

/// Handles the login route: issue a state and send the browser to the vendor.
pub async fn login(State(state): State<Arc<Debugger>>) -> Response {
    let url = state.auth.login_url();
    tracing::debug!(version = %state.auth.config().version, "redirecting to authorize endpoint");
    temporary_redirect(&url)
}

/// Handles the OAuth callback.
///
/// Auth-flow failures never escape this handler: they become a redirect to
/// the error root carrying the message.
pub async fn callback(State(state): State<Arc<Debugger>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let params = read_params(&parts, body).await;

    match state
        .auth
        .redeem(params.state.as_deref(), params.code.as_deref())
        .await
    {
        Ok(token) => {
            tracing::info!("oauth login completed");
            state.handoff.complete(token, &parts)
        }
        Err(e) => error_redirect(&state.error_root, &e),
    }
}

/// Query parameters, overlaid with a form-encoded body when there is one.
async fn read_params(parts: &Parts, payload: Body) -> CallbackParams {
    let query = parts
        .uri
        .query()
        .map(|q| CallbackParams::parse(q.as_bytes()))
        .unwrap_or_default();

    let is_form = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return query;
    }

    let form = match body::to_bytes(payload, MAX_FORM_BYTES).await {
        Ok(bytes) => CallbackParams::parse(&bytes),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read callback form body");
            CallbackParams::default()
        }
    };
    query.overlay(form)
}

fn error_redirect(root: &str, err: &DebuggerError) -> Response {
    temporary_redirect(&with_query(root, &[("error", err.to_string().as_str())]))
}

/// Append URL-encoded `pairs` to `base`, respecting an existing query.
fn with_query(base: &str, pairs: &[(&str, &str)]) -> String {
    let encoded = serde_urlencoded::to_string(pairs).unwrap_or_default();
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{encoded}")
}

fn temporary_redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(v) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, v)]).into_response(),
        Err(_) => {
            tracing::error!(location, "redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
