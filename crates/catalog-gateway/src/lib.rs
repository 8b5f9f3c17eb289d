//! HTTP client infrastructure for the remote product catalogue API.
//!
//! This crate provides:
//! - the [`ClientTrait`] request/response contract consumed by the browsing core
//! - an HTTP implementation ([`CatalogClient`]) for DummyJSON-compatible APIs
//! - a seedable [`MockClient`] for tests and offline use
//! - the catalogue domain types ([`types`])
//!
//! ## Usage
//!
//! ```ignore
//! use catalog_gateway::{Client, ClientTrait, CatalogClientConfig};
//!
//! let client = Client::from_config(CatalogClientConfig::new("https://dummyjson.com"))?;
//! let categories = client.list_categories().await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
pub mod types;

pub use client::{CatalogClient, Client, ClientTrait};
pub use config::CatalogClientConfig;
pub use error::{ClientInitError, FetchError};
pub use mock::{MockClient, MockDataError, MockEntry, RecordedRequest, Response, Route};
