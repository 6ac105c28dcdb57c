//! Unified error type for the debugger workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across huedebug crates.
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// The callback's `state` was missing, unknown, expired or already used.
    #[error("invalid oauth state")]
    InvalidState,

    /// The token endpoint rejected the code or could not be reached.
    #[error("code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The configured upstream API endpoint is not a usable absolute URL.
    #[error("malformed upstream target: {0}")]
    MalformedUpstreamTarget(String),

    /// Transport failure while forwarding a request upstream.
    #[error("upstream error: {0}")]
    ProxyUpstream(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DebuggerError>;
