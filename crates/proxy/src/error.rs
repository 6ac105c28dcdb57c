//! Error response for proxied requests that never got an upstream answer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use huedebug_types::DebuggerError;
use serde_json::json;

/// Upstream transport failure, rendered as `502 Bad Gateway` with a JSON body.
#[derive(Debug)]
pub struct ApiError(DebuggerError);

impl ApiError {
    pub(crate) fn upstream(err: &reqwest::Error) -> Self {
        Self(DebuggerError::ProxyUpstream(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": {
                    "message": self.0.to_string(),
                    "code": "upstream_error",
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt as _;

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/api")
            .send()
            .await
            .unwrap_err();
        let resp = ApiError::upstream(&err).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "upstream_error");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("upstream error:")
        );
    }
}
