//! Local pages: health probe, landing page and the traffic viewer.

use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

/// Inspector page the access token is handed to after login.
const VIEWER_HTML: &str = include_str!("../assets/clip.html");

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

pub async fn viewer() -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Html(VIEWER_HTML),
    )
        .into_response()
}

/// Landing page linking to the login route.
#[must_use]
pub fn landing(login_path: &str) -> Html<String> {
    Html(format!(
        "<html>\n<body>\n\t<a href=\"{login_path}\">Hue Log In</a>\n</body>\n</html>"
    ))
}
