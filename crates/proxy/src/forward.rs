//! Transparent reverse proxy to the remote API.
//!
//! The inbound method, path, query, headers and body go upstream with only
//! the origin swapped; the upstream status, headers and body come back
//! unchanged. Bodies are streamed in both directions. If the browser goes
//! away the handler future is dropped, which drops the in-flight upstream
//! request with it.

use axum::{
    body::{Body, HttpBody as _},
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    response::Response,
};
use std::net::SocketAddr;

use crate::{Debugger, error::ApiError, target::ProxyTarget};

/// Headers that must not be forwarded (hop-by-hop).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The rewritten request line and headers sent upstream.
#[derive(Debug)]
pub struct Outbound {
    pub url: String,
    pub headers: HeaderMap,
}

/// Retarget an inbound request at `target`.
///
/// `Host` is left for the client to derive from the new URL; the original
/// one is preserved in `X-Forwarded-Host`.
#[must_use]
pub fn rewrite(parts: &Parts, target: &ProxyTarget) -> Outbound {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    let mut headers = HeaderMap::with_capacity(parts.headers.len() + 2);
    for (name, value) in &parts.headers {
        if !is_hop_by_hop(name) && name != header::HOST {
            headers.append(name.clone(), value.clone());
        }
    }

    let original_host = parts
        .headers
        .get(header::HOST)
        .cloned()
        .or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host);
    }

    if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        append_forwarded_for(&mut headers, peer);
    }

    Outbound {
        url: target.url_for(path_and_query),
        headers,
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, peer: &SocketAddr) {
    let ip = peer.ip().to_string();
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{prior}, {ip}"),
        None => ip,
    };
    if let Ok(v) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, v);
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Forward `req` to the configured upstream and relay its response.
///
/// # Errors
///
/// Returns an [`ApiError`] (rendered as 502) when the upstream cannot be
/// reached or stalls past the configured timeout before answering.
pub async fn forward(state: &Debugger, req: Request) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let outbound = rewrite(&parts, &state.target);
    tracing::info!(method = %parts.method, url = %outbound.url, "proxy");

    let mut builder = state
        .http
        .request(parts.method, &outbound.url)
        .headers(outbound.headers);
    // an empty inbound body must not turn into a chunked upstream one
    if body.size_hint().exact() != Some(0) {
        builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = builder
        .send()
        .await
        .map_err(|e| {
            tracing::error!(url = %outbound.url, error = %e, "upstream request failed");
            ApiError::upstream(&e)
        })?;

    Ok(relay(upstream))
}

fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut resp = Response::new(Body::from_stream(upstream.bytes_stream()));
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request as HttpRequest};

    fn parts(req: HttpRequest<()>) -> Parts {
        req.into_parts().0
    }

    fn hue() -> ProxyTarget {
        ProxyTarget::parse("https://api.meethue.com").unwrap()
    }

    #[test]
    fn test_rewrite_scheme_host_and_forwarded_host() {
        let p = parts(
            HttpRequest::builder()
                .method(Method::PUT)
                .uri("/api/lights/1/state?debug=1")
                .header("host", "localhost:8080")
                .header("authorization", "Bearer tok")
                .body(())
                .unwrap(),
        );
        let out = rewrite(&p, &hue());
        assert_eq!(out.url, "https://api.meethue.com/api/lights/1/state?debug=1");
        let url = reqwest::Url::parse(&out.url).unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("api.meethue.com"));
        assert_eq!(out.headers["x-forwarded-host"], "localhost:8080");
        assert_eq!(out.headers["authorization"], "Bearer tok");
        assert!(out.headers.get("host").is_none());
    }

    #[test]
    fn test_rewrite_drops_hop_by_hop() {
        let p = parts(
            HttpRequest::builder()
                .uri("/v2/clip/resource")
                .header("host", "dbg.test")
                .header("connection", "keep-alive")
                .header("transfer-encoding", "chunked")
                .header("proxy-authorization", "Basic x")
                .header("hue-application-key", "k")
                .body(())
                .unwrap(),
        );
        let out = rewrite(&p, &hue());
        assert!(out.headers.get("connection").is_none());
        assert!(out.headers.get("transfer-encoding").is_none());
        assert!(out.headers.get("proxy-authorization").is_none());
        assert_eq!(out.headers["hue-application-key"], "k");
    }

    #[test]
    fn test_rewrite_keeps_repeated_headers() {
        let p = parts(
            HttpRequest::builder()
                .uri("/api/x")
                .header("accept", "text/plain")
                .header("accept", "application/json")
                .body(())
                .unwrap(),
        );
        let out = rewrite(&p, &hue());
        assert_eq!(out.headers.get_all("accept").iter().count(), 2);
    }

    #[test]
    fn test_rewrite_appends_forwarded_for() {
        let mut p = parts(
            HttpRequest::builder()
                .uri("/api/x")
                .header("x-forwarded-for", "10.0.0.1")
                .body(())
                .unwrap(),
        );
        p.extensions
            .insert(ConnectInfo::<SocketAddr>("192.168.1.5:50000".parse().unwrap()));
        let out = rewrite(&p, &hue());
        assert_eq!(out.headers["x-forwarded-for"], "10.0.0.1, 192.168.1.5");
    }

    #[test]
    fn test_rewrite_without_host_header() {
        let p = parts(HttpRequest::builder().uri("/bridge").body(()).unwrap());
        let out = rewrite(&p, &hue());
        assert!(out.headers.get("x-forwarded-host").is_none());
        assert_eq!(out.url, "https://api.meethue.com/bridge");
    }
}
