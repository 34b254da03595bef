//! Where the beer service lives
//!
//! The collection URL is `base_url` (with `port` applied when set) followed
//! by `service_path`. Item URLs append `item_path`, a template whose single
//! `{...}` segment is replaced by the path-encoded id.

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Beer service location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BeerServiceConfig {
    pub base_url: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_service_path")]
    pub service_path: String,
    #[serde(default = "default_item_path")]
    pub item_path: String,
}

fn default_service_path() -> String {
    "/api/v1/beer".into()
}

fn default_item_path() -> String {
    "/{id}".into()
}

impl BeerServiceConfig {
    /// Config with the default service and item paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            port: None,
            service_path: default_service_path(),
            item_path: default_item_path(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_service_path(mut self, service_path: impl Into<String>) -> Self {
        self.service_path = service_path.into();
        self
    }

    pub fn with_item_path(mut self, item_path: impl Into<String>) -> Self {
        self.item_path = item_path.into();
        self
    }

    /// Compose the collection URL. Query and fragment of `base_url` are dropped.
    pub fn collection_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.port.is_some() {
            url.set_port(self.port)
                .map_err(|()| invalid(format!("cannot set port on {}", self.base_url)))?;
        }
        url.set_query(None);
        url.set_fragment(None);
        append_segments(&mut url, literal_segments(&self.service_path))?;
        Ok(url)
    }

    pub fn item_template(&self) -> Result<ItemPath> {
        ItemPath::parse(&self.item_path)
    }

    /// Check the whole config without building a client.
    pub fn validate(&self) -> Result<()> {
        self.collection_url()?;
        self.item_template()?;
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::Validation(format!("invalid beer service config: {message}"))
}

fn literal_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn append_segments<'a>(url: &mut Url, segments: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let display = url.to_string();
    url.path_segments_mut()
        .map_err(|()| invalid(format!("{display} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Id,
}

/// Parsed item path template, e.g. `/{id}` or `/{beerId}/details`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    segments: Vec<Segment>,
}

impl ItemPath {
    /// Parse a template. It must contain exactly one placeholder, and the
    /// placeholder must be a whole path segment.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut placeholders = 0;
        for segment in literal_segments(template) {
            let is_placeholder =
                segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}');
            let inner = if is_placeholder {
                &segment[1..segment.len() - 1]
            } else {
                segment
            };
            if inner.contains(['{', '}']) {
                return Err(invalid(format!(
                    "item_path segment {segment:?} must be a literal or a single {{...}} placeholder"
                )));
            }
            if is_placeholder {
                placeholders += 1;
                segments.push(Segment::Id);
            } else {
                segments.push(Segment::Literal(segment.to_owned()));
            }
        }
        if placeholders != 1 {
            return Err(invalid(format!(
                "item_path must contain exactly one {{...}} placeholder, found {placeholders} in {template:?}"
            )));
        }
        Ok(Self { segments })
    }

    /// Item URL under `collection` for `id`.
    pub fn resolve(&self, collection: &Url, id: &str) -> Result<Url> {
        let mut url = collection.clone();
        append_segments(
            &mut url,
            self.segments.iter().map(|segment| match segment {
                Segment::Literal(literal) => literal.as_str(),
                Segment::Id => id,
            }),
        )?;
        Ok(url)
    }
}
