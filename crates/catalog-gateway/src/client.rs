//! Catalog client for the remote product catalogue API.

use std::fmt::Debug;
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{ClientInitError, FetchError, ResponseExt};
use crate::mock::MockClient;
use crate::types::{Category, Product, ProductList, ProductQuery};

/// The remote catalogue API interface.
///
/// This trait enables alternate implementations:
/// - **HTTP**: REST calls to the catalogue API via [`CatalogClient`]
/// - **Mock**: canned responses without HTTP via [`MockClient`]
///
/// Timeouts are handled by the implementation, callers see any failure as a
/// [`FetchError`].
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List every category of the catalogue.
    async fn list_categories(&self) -> Result<Vec<Category>, FetchError>;

    /// List products of a category, bounded and ordered as requested.
    async fn list_products_by_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
        query: ProductQuery,
    ) -> Result<ProductList, FetchError>;

    /// Fetch the first product listed under a category, if any.
    async fn first_product_of_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
    ) -> Result<Option<Product>, FetchError> {
        let list = self
            .list_products_by_category(slug, ProductQuery::first())
            .await?;
        Ok(list.products.into_iter().next())
    }
}

/// Either a client for the actual catalogue service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

impl Client {
    /// Build the client described by `config`,
    /// serving canned responses if it names a mock data file.
    pub fn from_config(config: CatalogClientConfig) -> Result<Self, ClientInitError> {
        match &config.mock_data {
            Some(path) => {
                debug!(path = %path.display(), "using mock catalog client");
                let mock = MockClient::new(Some(path)).map_err(ClientInitError::MockData)?;
                Ok(Client::Mock(mock))
            },
            None => {
                let client = CatalogClient::new(config).map_err(ClientInitError::Http)?;
                Ok(Client::Catalog(client))
            },
        }
    }
}

/// A client for the catalogue service.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.catalog_url)
            .map_err(|e| FetchError::Url(format!("{}: {e}", config.catalog_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Url(config.catalog_url.clone()));
        }

        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Append path segments to the base url, percent-encoding each of them.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Url(self.config.catalog_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&'static str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(FetchError::Request)?
            .error_for_fetch()
            .await?;

        let body = response.bytes().await.map_err(FetchError::Request)?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all)]
    async fn list_categories(&self) -> Result<Vec<Category>, FetchError> {
        let url = self.endpoint(["products", "categories"])?;
        debug!(%url, "listing categories");

        let categories: Vec<Category> = self.get_json(url, &[]).await?;

        debug!(n_categories = categories.len(), "received categories");
        Ok(categories)
    }

    #[instrument(skip_all, fields(slug = %slug.as_ref(), ?query))]
    async fn list_products_by_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
        query: ProductQuery,
    ) -> Result<ProductList, FetchError> {
        let url = self.endpoint(["products", "category", slug.as_ref()])?;
        debug!(%url, "listing products");

        let products: ProductList = self.get_json(url, &query.to_query_pairs()).await?;

        debug!(
            n_products = products.products.len(),
            total = products.total,
            "received products"
        );
        Ok(products)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| FetchError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| FetchError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| FetchError::Other(e.to_string()))
}
