//! Outbound request value

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::{Error, Result};

/// A fully-built HTTP request, independent of the client that will send it.
///
/// Fields are public so wrappers (the bearer-token injector) and test doubles
/// can inspect and modify headers without a builder round trip.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set a header, replacing any existing value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Ask for a JSON response.
    pub fn accept_json(self) -> Self {
        self.with_header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    /// Serialize `body` as the JSON request payload.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| Error::InvalidRequest(format!("serializing JSON body: {e}")))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(Bytes::from(bytes));
        Ok(self)
    }

    /// Encode `pairs` as an `application/x-www-form-urlencoded` payload.
    pub fn with_form(mut self, pairs: &[(&str, &str)]) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.body = Some(Bytes::from(encoded));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost:8080/api/v1/beer").unwrap()
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::post(url())
            .with_json(&serde_json::json!({"beerName": "Mango Bobs"}))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(
            request.body.as_deref(),
            Some(br#"{"beerName":"Mango Bobs"}"#.as_slice())
        );
    }

    #[test]
    fn form_body_is_url_encoded() {
        let request = HttpRequest::post(url())
            .with_form(&[("grant_type", "client_credentials"), ("scope", "read write")]);

        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            request.body.as_deref(),
            Some(b"grant_type=client_credentials&scope=read+write".as_slice())
        );
    }

    #[test]
    fn with_header_replaces_existing_value() {
        let request = HttpRequest::get(url())
            .with_header(ACCEPT, HeaderValue::from_static("text/plain"))
            .accept_json();

        assert_eq!(request.headers.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(request.headers.get(ACCEPT).unwrap(), "application/json");
    }
}
