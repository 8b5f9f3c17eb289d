//! A catalog client that answers from canned responses.
//!
//! Responses are queued per [Route] and can be seeded programmatically or read
//! from a JSON file, e.g.
//!
//! ```json
//! [
//!   { "route": "categories", "response": [{ "slug": "phones", "name": "Phones" }] },
//!   { "route": "products/phones", "response": { "products": [] }, "delay_ms": 200 },
//!   { "route": "products/laptops", "response": { "status": 500, "message": "boom" } }
//! ]
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, DurationMilliSeconds, SerializeDisplay, serde_as};
use thiserror::Error;
use tracing::debug;

use crate::client::ClientTrait;
use crate::error::FetchError;
use crate::types::{Category, ProductList, ProductQuery};

// Arc allows pushing responses into the client from outside the client.
// Mutex allows sharing across threads (necessary because of tokio).
type MockField<T> = Arc<Mutex<T>>;

/// The request a mock response answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Route {
    Categories,
    Products(String),
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Categories => write!(f, "categories"),
            Route::Products(slug) => write!(f, "products/{slug}"),
        }
    }
}

impl FromStr for Route {
    type Err = MockDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            None if s == "categories" => Ok(Route::Categories),
            Some(("products", slug)) if !slug.is_empty() => Ok(Route::Products(slug.to_string())),
            _ => Err(MockDataError::InvalidData(format!("unknown route '{s}'"))),
        }
    }
}

/// An API error the mock should answer with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Categories(Vec<Category>),
    Products(ProductList),
    Error(ErrorResponse),
}

/// A queued response, optionally delayed to simulate a slow network.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockEntry {
    pub route: Route,
    pub response: Response,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "delay_ms", skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

/// A request the mock has answered (or failed to answer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub route: Route,
    pub query: Option<ProductQuery>,
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the mock data file
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
    /// The data was parsed as JSON but it wasn't semantically valid
    #[error("invalid mocked data: {0}")]
    InvalidData(String),
}

/// Reads a list of mock responses from disk.
fn read_mock_entries(path: impl AsRef<Path>) -> Result<Vec<MockEntry>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    serde_json::from_str(&contents).map_err(MockDataError::ParseJson)
}

/// A catalog client that can be seeded with mock responses.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<HashMap<Route, VecDeque<MockEntry>>>,
    pub requests: MockField<Vec<RecordedRequest>>,
}

impl MockClient {
    /// Create a new mock client, potentially reading mock responses from disk
    pub fn new(mock_data_path: Option<impl AsRef<Path>>) -> Result<Self, MockDataError> {
        let client = Self::default();
        if let Some(path) = mock_data_path {
            let entries = read_mock_entries(&path)?;
            debug!(n_entries = entries.len(), "loaded mock catalog responses");
            for entry in entries {
                client.push_entry(entry);
            }
        }
        Ok(client)
    }

    /// Queue a response for its route.
    pub fn push_entry(&self, entry: MockEntry) {
        self.responses()
            .entry(entry.route.clone())
            .or_default()
            .push_back(entry);
    }

    pub fn push_categories_response(&self, categories: Vec<Category>) {
        self.push(Route::Categories, Response::Categories(categories), None);
    }

    pub fn push_products_response(&self, slug: &str, products: ProductList) {
        self.push(
            Route::Products(slug.to_string()),
            Response::Products(products),
            None,
        );
    }

    /// Queue a product listing that is answered only after `delay` has elapsed.
    pub fn push_delayed_products_response(
        &self,
        slug: &str,
        products: ProductList,
        delay: Duration,
    ) {
        self.push(
            Route::Products(slug.to_string()),
            Response::Products(products),
            Some(delay),
        );
    }

    /// Queue an API error for a route.
    pub fn push_error_response(&self, route: Route, status: u16, message: Option<&str>) {
        let response = Response::Error(ErrorResponse {
            status,
            message: message.map(str::to_string),
        });
        self.push(route, response, None);
    }

    /// All requests made so far, in the order they were issued.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    fn push(&self, route: Route, response: Response, delay: Option<Duration>) {
        self.push_entry(MockEntry {
            route,
            response,
            delay,
        });
    }

    fn responses(&self) -> MutexGuard<'_, HashMap<Route, VecDeque<MockEntry>>> {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
    }

    /// Record the request and answer with the next queued response for its route.
    async fn answer(
        &self,
        route: Route,
        query: Option<ProductQuery>,
    ) -> Result<Response, FetchError> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(RecordedRequest {
                route: route.clone(),
                query,
            });

        let entry = self
            .responses()
            .get_mut(&route)
            .and_then(|queue| queue.pop_front());

        let Some(entry) = entry else {
            debug!(%route, "no mock response queued");
            return Err(FetchError::status(
                404,
                Some(format!("no mock response for '{route}'")),
            ));
        };

        if let Some(delay) = entry.delay {
            tokio::time::sleep(delay).await;
        }

        match entry.response {
            Response::Error(ErrorResponse { status, message }) => {
                Err(FetchError::status(status, message))
            },
            response => Ok(response),
        }
    }
}

impl ClientTrait for MockClient {
    async fn list_categories(&self) -> Result<Vec<Category>, FetchError> {
        match self.answer(Route::Categories, None).await? {
            Response::Categories(categories) => Ok(categories),
            other => panic!("expected categories response, found {other:?}"),
        }
    }

    async fn list_products_by_category(
        &self,
        slug: impl AsRef<str> + Send + Sync,
        query: ProductQuery,
    ) -> Result<ProductList, FetchError> {
        let route = Route::Products(slug.as_ref().to_string());
        match self.answer(route, Some(query)).await? {
            Response::Products(products) => Ok(products),
            other => panic!("expected products response, found {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn phones() -> Vec<Category> {
        vec![Category::new("phones", "Phones")]
    }

    #[tokio::test]
    async fn mock_client_uses_seeded_responses() {
        let path: Option<&PathBuf> = None;
        let client = MockClient::new(path).unwrap();
        client.push_categories_response(phones());

        let categories = client.list_categories().await.unwrap();
        assert_eq!(categories, phones());
    }

    #[tokio::test]
    async fn responses_are_answered_per_route() {
        let client = MockClient::default();
        client.push_products_response("phones", ProductList::default());
        client.push_error_response(Route::Products("laptops".to_string()), 500, Some("boom"));

        let laptops = client
            .list_products_by_category("laptops", ProductQuery::first())
            .await;
        let phones = client
            .list_products_by_category("phones", ProductQuery::first())
            .await;

        assert!(phones.is_ok());
        assert!(
            matches!(&laptops, Err(FetchError::Status { message: Some(m), .. }) if m == "boom"),
            "unexpected result: {laptops:?}"
        );
    }

    #[tokio::test]
    async fn unseeded_route_is_not_found() {
        let client = MockClient::default();
        let result = client.list_categories().await;
        assert!(matches!(
            result,
            Err(FetchError::Status { status, .. }) if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let client = MockClient::default();
        let _ = client.list_categories().await;
        let _ = client
            .list_products_by_category("phones", ProductQuery::first())
            .await;

        assert_eq!(client.requests(), vec![
            RecordedRequest {
                route: Route::Categories,
                query: None,
            },
            RecordedRequest {
                route: Route::Products("phones".to_string()),
                query: Some(ProductQuery::first()),
            },
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response_waits() {
        let client = MockClient::default();
        client.push_delayed_products_response(
            "phones",
            ProductList::default(),
            Duration::from_millis(250),
        );

        let start = tokio::time::Instant::now();
        client
            .list_products_by_category("phones", ProductQuery::first())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn parses_mock_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(
            br#"[
                { "route": "categories", "response": [{ "slug": "phones", "name": "Phones" }] },
                { "route": "products/phones", "response": { "status": 503 }, "delay_ms": 5 }
            ]"#,
        )
        .unwrap();

        let client = MockClient::new(Some(tmp.path())).unwrap();
        assert_eq!(client.list_categories().await.unwrap(), phones());
        assert!(
            client
                .list_products_by_category("phones", ProductQuery::first())
                .await
                .is_err()
        );
    }

    #[test]
    fn error_when_invalid_json() {
        // There's nothing in the mock data file yet, so it can't be parsed as JSON.
        let tmp = NamedTempFile::new().unwrap();
        let result = MockClient::new(Some(tmp.path()));
        assert!(matches!(result, Err(MockDataError::ParseJson(_))));
    }

    #[test]
    fn error_when_file_missing() {
        let result = MockClient::new(Some("/nonexistent/catalog-mock.json"));
        assert!(matches!(result, Err(MockDataError::ReadMockFile(_))));
    }

    #[test]
    fn route_round_trips_through_strings() {
        assert_eq!("categories".parse::<Route>().unwrap(), Route::Categories);
        assert_eq!(
            "products/mens-shirts".parse::<Route>().unwrap(),
            Route::Products("mens-shirts".to_string())
        );
        assert_eq!(
            Route::Products("tablets".to_string()).to_string(),
            "products/tablets"
        );
        assert!("products/".parse::<Route>().is_err());
        assert!("reviews/1".parse::<Route>().is_err());
    }
}
