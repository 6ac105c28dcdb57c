//! Login URL construction and callback redemption.

use huedebug_types::{DebuggerError, OAuthToken, Result};
use std::sync::Arc;

use crate::{client::OAuthClientConfig, exchange::TokenExchanger, state::StateStrategy};

/// Runs the two halves of the authorization-code flow.
///
/// Immutable after construction and shared across request handlers.
pub struct Authenticator {
    config: OAuthClientConfig,
    states: Arc<dyn StateStrategy>,
    exchanger: Arc<dyn TokenExchanger>,
}

impl Authenticator {
    pub fn new(
        config: OAuthClientConfig,
        states: Arc<dyn StateStrategy>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            config,
            states,
            exchanger,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// Issue a fresh state and return the authorize URL carrying it.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.config.authorize_url(&self.states.generate())
    }

    /// Validate the callback's `state` and exchange its `code`.
    ///
    /// The state is checked (and, for single-use strategies, consumed)
    /// before anything else; the exchanger is called at most once.
    ///
    /// # Errors
    ///
    /// - [`DebuggerError::InvalidState`] if `state` is absent or rejected.
    /// - [`DebuggerError::ExchangeFailed`] if `code` is absent or the token
    ///   endpoint fails.
    pub async fn redeem(&self, state: Option<&str>, code: Option<&str>) -> Result<OAuthToken> {
        let state = state.unwrap_or_default();
        if state.is_empty() || !self.states.validate(state) {
            tracing::warn!("rejected oauth callback with unknown state");
            return Err(DebuggerError::InvalidState);
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DebuggerError::ExchangeFailed("missing authorization code".into()))?;

        self.exchanger
            .exchange(&self.config, code)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "token exchange failed"))
    }
}
