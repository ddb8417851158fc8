//! Response hardening and CORS.

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Middleware that adds security headers to all responses.
///
/// - **Cache-Control: no-store**: session tokens travel in response bodies and
///   must not land in shared caches.
/// - **Referrer-Policy: no-referrer**: login links carry the secret key in the
///   `k` query parameter (see [`crate::client::split_login_link`]).
/// - **X-Content-Type-Options: nosniff**
/// - **X-Frame-Options: DENY**
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));

    response
}

/// CORS for the browser front-end: one configured origin, or any origin when
/// `ALLOWED_ORIGIN` is unset. Other origins get no `access-control-allow-origin`. Only `POST` with a JSON body is allowed.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match config
        .allowed_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
    {
        Some(value) => AllowOrigin::list([value]),
        None => {
            if let Some(raw) = &config.allowed_origin {
                tracing::warn!(origin = %raw, "Ignoring invalid ALLOWED_ORIGIN");
            }
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
