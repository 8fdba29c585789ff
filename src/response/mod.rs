pub mod cookie;

use fnv::FnvBuildHasher;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

pub use cookie::{SameSite, SetCookie};

static REASON_PHRASES: Lazy<HashMap<u16, &'static str, FnvBuildHasher>> = Lazy::new(|| {
    let mut phrases = HashMap::with_hasher(FnvBuildHasher::default());
    phrases.insert(200, "OK");
    phrases.insert(201, "Created");
    phrases.insert(204, "No Content");
    phrases.insert(301, "Moved Permanently");
    phrases.insert(302, "Found");
    phrases.insert(304, "Not Modified");
    phrases.insert(400, "Bad Request");
    phrases.insert(401, "Unauthorized");
    phrases.insert(403, "Forbidden");
    phrases.insert(404, "Not Found");
    phrases.insert(405, "Method Not Allowed");
    phrases.insert(409, "Conflict");
    phrases.insert(429, "Too Many Requests");
    phrases.insert(500, "Internal Server Error");
    phrases.insert(502, "Bad Gateway");
    phrases.insert(503, "Service Unavailable");
    phrases
});

/// The standard reason phrase for a status code, or an empty string for
/// statuses the table does not cover.
pub fn reason_phrase(status: u16) -> &'static str {
    REASON_PHRASES.get(&status).copied().unwrap_or("")
}

/// A terminal HTTP response produced by a dispatch.
///
/// Headers keep their insertion order. The body is raw bytes; the `text` and
/// `json` constructors set the matching content type.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .set_header("content-type", "text/plain; charset=utf-8")
            .set_body(body.into().into_bytes())
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .set_header("content-type", "application/json")
            .set_body(body))
    }

    /// JSON constructor for already-built `serde_json::Value` payloads, which
    /// cannot fail to serialize.
    pub fn json_value(status: u16, value: &serde_json::Value) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_else(|_| Vec::from(*b"{}"));
        Self::new(status)
            .set_header("content-type", "application/json")
            .set_body(body)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn set_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn set_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets a header, replacing any existing values for the same name.
    pub fn set_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = name.as_ref();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_lowercase(), value.into()));
        self
    }

    /// Appends a header without touching existing values for the same name.
    pub fn append_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.as_ref().to_lowercase(), value.into()));
        self
    }

    /// Attaches a `Set-Cookie` header for this cookie.
    pub fn set_cookie(self, cookie: SetCookie) -> Self {
        self.append_header("set-cookie", cookie.header_value())
    }
}

/// Immutable default headers applied to responses the dispatcher builds on
/// its own (fallbacks and rendered errors).
///
/// This value is threaded into the router at construction; there is no
/// process-wide mutable configuration to set or reset.
#[derive(Debug, Clone, Default)]
pub struct ResponseDefaults {
    headers: Vec<(String, String)>,
}

impl ResponseDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.as_ref().to_lowercase(), value.into()));
        self
    }

    /// Adds each default header the response does not already carry.
    pub fn apply(&self, response: Response) -> Response {
        let mut response = response;
        for (name, value) in &self.headers {
            if response.header(name).is_none() {
                response = response.append_header(name, value.clone());
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_constructor() {
        let response = Response::text(200, "hello");
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain; charset=utf-8"));
        assert_eq!(response.body(), b"hello");
    }

    #[test]
    fn test_json_constructor() {
        let response = Response::json_value(201, &json!({"id": "7"}));
        assert_eq!(response.status(), 201);
        assert_eq!(response.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["id"], "7");
    }

    #[test]
    fn test_json_serializes_values() {
        #[derive(serde::Serialize)]
        struct User {
            id: u32,
        }
        let response = Response::json(200, &User { id: 7 }).unwrap();
        assert_eq!(response.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["id"], 7);
    }

    #[test]
    fn test_set_header_replaces_append_does_not() {
        let response = Response::new(200)
            .set_header("x-tag", "a")
            .set_header("X-Tag", "b")
            .append_header("x-tag", "c");

        let values: Vec<&str> = response
            .headers()
            .iter()
            .filter(|(name, _)| name == "x-tag")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(values, vec!["b", "c"]);
    }

    #[test]
    fn test_defaults_only_fill_missing() {
        let defaults = ResponseDefaults::new()
            .with_header("server", "trellis")
            .with_header("x-frame-options", "DENY");
        let response = defaults.apply(Response::new(200).set_header("server", "custom"));

        assert_eq!(response.header("server"), Some("custom"));
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(405), "Method Not Allowed");
        assert_eq!(reason_phrase(299), "");
    }

    #[test]
    fn test_set_cookie_appends_headers() {
        let response = Response::new(200)
            .set_cookie(SetCookie::new("a", "1"))
            .set_cookie(SetCookie::new("b", "2").http_only());
        let cookies: Vec<&str> = response
            .headers()
            .iter()
            .filter(|(name, _)| name == "set-cookie")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(cookies, vec!["a=1", "b=2; HttpOnly"]);
    }
}
