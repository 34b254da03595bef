//! Inbound response value

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Longest body excerpt carried into error messages.
const BODY_EXCERPT_LIMIT: usize = 512;

/// A complete HTTP response: status, headers, and the fully-read body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body. A value that fails to serialize leaves the body empty.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = Bytes::from(serde_json::to_vec(body).unwrap_or_default());
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True when the body contains anything other than whitespace.
    pub fn has_body(&self) -> bool {
        !self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Value of `Location`, if present and valid UTF-8.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text for error messages, truncated and lossily decoded.
    pub fn body_excerpt(&self) -> String {
        if !self.has_body() {
            return String::from("<no body>");
        }
        let text = String::from_utf8_lossy(&self.body);
        match text.char_indices().nth(BODY_EXCERPT_LIMIT) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_body_counts_as_empty() {
        let mut response = HttpResponse::new(StatusCode::CREATED);
        assert!(!response.has_body());
        response.body = Bytes::from_static(b" \r\n");
        assert!(!response.has_body());
        response.body = Bytes::from_static(b"{}");
        assert!(response.has_body());
    }

    #[test]
    fn location_header_is_exposed() {
        let response = HttpResponse::new(StatusCode::CREATED).with_header(
            LOCATION,
            HeaderValue::from_static("/api/v1/beer/7d5b8c3e-0000-4000-8000-000000000001"),
        );
        assert_eq!(
            response.location(),
            Some("/api/v1/beer/7d5b8c3e-0000-4000-8000-000000000001")
        );
    }

    #[test]
    fn body_excerpt_truncates_long_bodies() {
        let mut response = HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR);
        response.body = Bytes::from("x".repeat(2000));
        let excerpt = response.body_excerpt();
        assert_eq!(excerpt.len(), BODY_EXCERPT_LIMIT + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn body_excerpt_for_empty_body() {
        let response = HttpResponse::new(StatusCode::NOT_FOUND);
        assert_eq!(response.body_excerpt(), "<no body>");
    }

    #[test]
    fn json_decodes_body() {
        let response =
            HttpResponse::new(StatusCode::OK).with_json(&serde_json::json!({"upc": "12345"}));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["upc"], "12345");
        assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
