use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// HTTP header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Cookie identifying one browser across requests
pub const CLIENT_COOKIE: &str = "ff_client";

const CLIENT_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Id of the browser making the request, taken from [`CLIENT_COOKIE`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Finds a cookie value by name across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, value) = cookie.split_once('=')?;
            (key.trim() == name).then(|| value.trim())
        })
}

fn client_cookie(client_id: ClientId) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        CLIENT_COOKIE, client_id, CLIENT_COOKIE_MAX_AGE
    )
}

/// Attaches a [`RequestId`] and a [`ClientId`] to every request.
///
/// The request id comes from `x-request-id` when valid and is echoed back.
/// A browser without a valid client cookie is issued a new one.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(RequestId)
        .unwrap_or_else(|| RequestId(Uuid::new_v4()));

    let existing = cookie_value(request.headers(), CLIENT_COOKIE)
        .and_then(|v| Uuid::parse_str(v).ok())
        .map(ClientId);
    let client_id = existing.unwrap_or_else(|| ClientId(Uuid::new_v4()));

    request.extensions_mut().insert(request_id);
    request.extensions_mut().insert(client_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    if existing.is_none() {
        if let Ok(value) = HeaderValue::from_str(&client_cookie(client_id)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Tracing span carrying the request and client ids
pub fn make_span_with_request_context(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let client_id = request
        .extensions()
        .get::<ClientId>()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        client_id = %client_id,
    )
}
