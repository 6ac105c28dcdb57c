//! Core types for the Hue Remote API debugger workspace.
//!
//! Holds the error taxonomy shared by the auth and proxy layers, the
//! access-token value produced by a code exchange, and the API version
//! selector that picks the vendor's OAuth endpoint shapes.

pub mod error;
pub mod token;
pub mod version;

pub use error::{DebuggerError, Result};
pub use token::OAuthToken;
pub use version::ApiVersion;
