//! Beer service client
//!
//! `BeerClient` turns each operation into one request (two for `create` and
//! `update`, which re-read what they wrote) and maps the response onto the
//! error taxonomy. It knows nothing about authentication: hand it an
//! `AuthenticatingTransport`, or use `with_oauth`, and every request carries
//! a bearer token.

use std::sync::Arc;

use oauth_client::{AuthenticatingTransport, TokenProvider};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use transport::{HttpRequest, HttpResponse, StatusCode, Transport, Url};
use uuid::Uuid;

use crate::config::{BeerServiceConfig, ItemPath};
use crate::error::{Error, Result};
use crate::metrics::record_request;
use crate::model::Beer;
use crate::page::Page;
use crate::params::BeerListParams;

/// Typed client for the beer REST resource.
#[derive(Clone)]
pub struct BeerClient {
    transport: Arc<dyn Transport>,
    collection_url: Url,
    item_path: ItemPath,
}

impl std::fmt::Debug for BeerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeerClient")
            .field("collection_url", &self.collection_url.as_str())
            .field("item_path", &self.item_path)
            .finish_non_exhaustive()
    }
}

impl BeerClient {
    /// Build a client over `transport`. Fails if `config` does not describe a
    /// usable service location.
    pub fn new(config: &BeerServiceConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let collection_url = config.collection_url()?;
        let item_path = config.item_template()?;
        debug!(collection_url = %collection_url, "beer client configured");
        Ok(Self {
            transport,
            collection_url,
            item_path,
        })
    }

    /// Build a client whose requests are authorized by `provider` under
    /// `registration_id`, sent over `inner`.
    pub fn with_oauth<T>(
        config: &BeerServiceConfig,
        provider: Arc<TokenProvider>,
        registration_id: impl Into<String>,
        inner: T,
    ) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let transport = AuthenticatingTransport::new(inner, provider, registration_id);
        Self::new(config, Arc::new(transport))
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    pub fn item_url(&self, id: Uuid) -> Result<Url> {
        self.item_path.resolve(&self.collection_url, &id.to_string())
    }

    /// One page of beers matching `params`.
    #[instrument(skip_all, fields(operation = "list"))]
    pub async fn list(&self, params: &BeerListParams) -> Result<Page<Beer>> {
        let result = self.list_inner(params).await;
        record_request("list", &result);
        result
    }

    #[instrument(skip_all, fields(operation = "get_by_id", beer_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Beer> {
        let result = self.get_by_id_inner(id).await;
        record_request("get_by_id", &result);
        result
    }

    /// Create `beer` and return it as stored, id included.
    #[instrument(skip_all, fields(operation = "create"))]
    pub async fn create(&self, beer: &Beer) -> Result<Beer> {
        let result = self.create_inner(beer).await;
        record_request("create", &result);
        result
    }

    /// Replace `beer` and return it as stored afterwards.
    #[instrument(skip_all, fields(operation = "update", beer_id = ?beer.id))]
    pub async fn update(&self, beer: &Beer) -> Result<Beer> {
        let result = self.update_inner(beer).await;
        record_request("update", &result);
        result
    }

    #[instrument(skip_all, fields(operation = "delete", beer_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = self.delete_inner(id).await;
        record_request("delete", &result);
        result
    }

    async fn list_inner(&self, params: &BeerListParams) -> Result<Page<Beer>> {
        let mut url = self.collection_url.clone();
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let response = self.send(HttpRequest::get(url).accept_json()).await?;
        ensure_success(&response, "list")?;
        let page: Page<Beer> = decode(&response, "beer page")?;
        debug!(
            page_number = page.page_number(),
            elements = page.number_of_elements(),
            total_elements = page.total_elements(),
            "page received"
        );
        Ok(page)
    }

    async fn get_by_id_inner(&self, id: Uuid) -> Result<Beer> {
        let url = self.item_url(id)?;
        let response = self.send(HttpRequest::get(url).accept_json()).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("beer {id}")));
        }
        ensure_success(&response, "get")?;
        decode(&response, "beer")
    }

    async fn create_inner(&self, beer: &Beer) -> Result<Beer> {
        if let Some(id) = beer.id {
            return Err(Error::Validation(format!(
                "a new beer must not carry an id, got {id}"
            )));
        }

        let request = HttpRequest::post(self.collection_url.clone())
            .accept_json()
            .with_json(beer)?;
        let response = self.send(request).await?;
        ensure_success(&response, "create")?;

        if response.has_body() {
            match response.json::<Beer>() {
                Ok(created) if created.id.is_some() => {
                    info!(beer_id = ?created.id, "beer created");
                    return Ok(created);
                }
                Ok(_) => debug!("create response has no id, following Location"),
                Err(e) => debug!(error = %e, "create response is not a beer, following Location"),
            }
        }

        let Some(location) = response.location() else {
            return Err(Error::Decode(format!(
                "create answered {} with neither a stored beer nor a Location header",
                response.status
            )));
        };
        let target = self.resolve_location(location, response.status)?;

        let follow_up = self.send(HttpRequest::get(target.clone()).accept_json()).await?;
        if !follow_up.is_success() {
            return Err(Error::status(
                follow_up.status,
                format!(
                    "reading created beer at {target} returned {}: {}",
                    follow_up.status,
                    follow_up.body_excerpt()
                ),
            ));
        }
        let created: Beer = decode(&follow_up, "created beer")?;
        if created.id.is_none() {
            return Err(Error::Decode(format!("beer at {target} has no id")));
        }
        info!(beer_id = ?created.id, location = %target, "beer created");
        Ok(created)
    }

    async fn update_inner(&self, beer: &Beer) -> Result<Beer> {
        let id = beer
            .id
            .ok_or_else(|| Error::Validation("updating a beer requires its id".into()))?;
        let url = self.item_url(id)?;

        let request = HttpRequest::put(url.clone()).accept_json().with_json(beer)?;
        let response = self.send(request).await?;
        ensure_success(&response, "update")?;

        let response = self.send(HttpRequest::get(url).accept_json()).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("beer {id} after update")));
        }
        ensure_success(&response, "get after update")?;
        let updated: Beer = decode(&response, "updated beer")?;
        info!(beer_id = %id, "beer updated");
        Ok(updated)
    }

    async fn delete_inner(&self, id: Uuid) -> Result<()> {
        let url = self.item_url(id)?;
        let response = self.send(HttpRequest::delete(url)).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("beer {id}")));
        }
        ensure_success(&response, "delete")?;
        info!(beer_id = %id, "beer deleted");
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.to_string();
        debug!(%method, %url, "sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, %url, error = %e, "request not completed");
            Error::from(e)
        })?;

        debug!(%method, %url, status = response.status.as_u16(), "response received");
        Ok(response)
    }

    /// Resolve a `Location` header against the collection URL. Only targets
    /// on the same origin are followed.
    fn resolve_location(&self, location: &str, status: StatusCode) -> Result<Url> {
        let target = self.collection_url.join(location).map_err(|e| {
            Error::status(status, format!("invalid Location header {location:?}: {e}"))
        })?;
        if target.origin() != self.collection_url.origin() {
            warn!(location = %target, "refusing to follow cross-origin Location");
            return Err(Error::status(
                status,
                format!(
                    "Location {target} is not on the service origin {}",
                    self.collection_url.origin().ascii_serialization()
                ),
            ));
        }
        Ok(target)
    }
}

fn ensure_success(response: &HttpResponse, operation: &str) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    warn!(
        operation,
        status = response.status.as_u16(),
        "unexpected response status"
    );
    Err(Error::status(
        response.status,
        format!(
            "{operation} returned {}: {}",
            response.status,
            response.body_excerpt()
        ),
    ))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
    response
        .json()
        .map_err(|e| Error::Decode(format!("malformed {what}: {e}")))
}
