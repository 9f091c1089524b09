//! Per-request correlation IDs.
//!
//! A well-formed `x-request-id` from the proxy is kept; anything else is
//! replaced with a fresh UUID. The ID lands on the request span, the Sentry
//! scope and the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_UPSTREAM_ID_LEN: usize = 128;

fn upstream_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = upstream_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    tracing::Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_bounds() {
        let mut headers = HeaderMap::new();
        assert_eq!(upstream_id(&headers), None);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("edge-42"));
        assert_eq!(upstream_id(&headers), Some("edge-42"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static(""));
        assert_eq!(upstream_id(&headers), None);

        let long = "x".repeat(MAX_UPSTREAM_ID_LEN + 1);
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_eq!(upstream_id(&headers), None);
    }
}
