//! Upstream target resolution and path classification.

use huedebug_types::{DebuggerError, Result};
use reqwest::Url;

/// Scheme and authority every proxied request is rewritten to.
///
/// Resolved once at startup; a bad endpoint stops the process instead of
/// letting every API call fail later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub scheme: String,
    /// Host, with the port when the endpoint names one explicitly.
    pub host: String,
}

impl ProxyTarget {
    /// Parse the configured API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DebuggerError::MalformedUpstreamTarget`] unless `endpoint`
    /// is an absolute `http`/`https` URL with a host.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| DebuggerError::MalformedUpstreamTarget(format!("{endpoint:?}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DebuggerError::MalformedUpstreamTarget(format!(
                "{endpoint:?}: unsupported scheme {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                DebuggerError::MalformedUpstreamTarget(format!("{endpoint:?}: missing host"))
            })?;

        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
        })
    }

    /// Absolute upstream URL for an inbound path and query.
    #[must_use]
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}://{}{path_and_query}", self.scheme, self.host)
    }
}

/// What to do with a request that matched none of the fixed routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Proxy,
    Landing,
    NotFound,
}

/// Prefix allow-list deciding which paths are forwarded upstream.
#[derive(Debug, Clone)]
pub struct PathRouter {
    prefixes: Vec<String>,
}

impl PathRouter {
    /// Empty prefixes are dropped; they would forward every path.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> Route {
        if self.prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            Route::Proxy
        } else if path == "/" {
            Route::Landing
        } else {
            Route::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_router() -> PathRouter {
        PathRouter::new(["/api/", "/v2/", "/bridge/", "/connectionstatus"])
    }

    #[test]
    fn test_parse_https_endpoint() {
        let t = ProxyTarget::parse("https://api.meethue.com").unwrap();
        assert_eq!(t.scheme, "https");
        assert_eq!(t.host, "api.meethue.com");
    }

    #[test]
    fn test_parse_keeps_explicit_port() {
        let t = ProxyTarget::parse("http://127.0.0.1:9000/ignored/path").unwrap();
        assert_eq!(t.host, "127.0.0.1:9000");
        assert_eq!(t.url_for("/api/x?y=1"), "http://127.0.0.1:9000/api/x?y=1");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "api.meethue.com", "not a url", "ftp://files.test", "unix:/tmp/sock"] {
            let err = ProxyTarget::parse(bad).unwrap_err();
            assert!(
                matches!(err, DebuggerError::MalformedUpstreamTarget(_)),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_classify_prefixes() {
        let r = default_router();
        assert_eq!(r.classify("/api/lights"), Route::Proxy);
        assert_eq!(r.classify("/v2/clip/resource"), Route::Proxy);
        assert_eq!(r.classify("/bridge/0/config"), Route::Proxy);
    }

    #[test]
    fn test_classify_connectionstatus() {
        let r = default_router();
        assert_eq!(r.classify("/connectionstatus"), Route::Proxy);
        assert_eq!(r.classify("/connectionstatus/abc"), Route::Proxy);
    }

    #[test]
    fn test_classify_landing_and_not_found() {
        let r = default_router();
        assert_eq!(r.classify("/"), Route::Landing);
        assert_eq!(r.classify("/unknown/xyz"), Route::NotFound);
        assert_eq!(r.classify("/api"), Route::NotFound);
        assert_eq!(r.classify("/v2"), Route::NotFound);
    }

    #[test]
    fn test_empty_prefix_ignored() {
        let r = PathRouter::new(["", "/api/"]);
        assert_eq!(r.classify("/anything"), Route::NotFound);
    }
}
