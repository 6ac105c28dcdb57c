//! OAuth2 authorization-code flow against the Hue Remote API.
//!
//! [`client::OAuthClientConfig`] derives the endpoint URLs for an API
//! version, [`state`] issues and checks the anti-forgery value, and
//! [`exchange`] swaps an authorization code for an access token. The
//! [`Authenticator`] composes the three for the login and callback routes.

pub mod authenticator;
pub mod client;
pub mod exchange;
pub mod state;

pub use authenticator::Authenticator;
pub use client::OAuthClientConfig;
pub use exchange::{HttpTokenExchanger, TokenExchanger};
pub use state::{FixedState, NonceStates, StateStrategy};
