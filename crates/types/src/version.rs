//! Remote API protocol version.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which generation of the vendor's OAuth endpoints to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Legacy `/oauth2/*` endpoints.
    V1,
    /// Versioned `/v2/oauth2/*` endpoints.
    #[default]
    V2,
}

impl ApiVersion {
    /// Device name announced on the authorize request.
    #[must_use]
    pub fn device_name(self) -> &'static str {
        match self {
            Self::V1 => "browser-v1",
            Self::V2 => "browser",
        }
    }

    /// Path of the authorize endpoint relative to the API base.
    #[must_use]
    pub fn authorize_path(self) -> &'static str {
        match self {
            Self::V1 => "/oauth2/auth",
            Self::V2 => "/v2/oauth2/authorize",
        }
    }

    /// Path of the token endpoint relative to the API base.
    #[must_use]
    pub fn token_path(self) -> &'static str {
        match self {
            Self::V1 => "/oauth2/token",
            Self::V2 => "/v2/oauth2/token",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}
