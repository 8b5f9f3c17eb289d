//! Data pipeline behind a two-screen product catalogue browser.
//!
//! The category overview lists all categories of the remote catalogue with
//! one representative image each; the category drill-down shows the products
//! of one category with debounced search, upstream sorting and pagination.
//!
//! [`pipeline::CatalogPipeline`] ties the pieces together:
//! - [`image_resolver`] resolves category images concurrently and best-effort
//! - [`view_state`] holds the view parameters and derives the visible page
//! - [`debounce`] and [`generation`] make sure only the latest input wins
//!
//! ```ignore
//! use catalog_browser::{BrowserConfig, CatalogPipeline};
//!
//! let pipeline = CatalogPipeline::from_config(BrowserConfig::load(None)?)?;
//! pipeline.load_categories().await;
//! pipeline.open_category("smartphones").await;
//! let screen = pipeline.drill_down();
//! ```

pub mod config;
pub mod debounce;
pub mod generation;
pub mod image_resolver;
pub mod loadable;
pub mod pipeline;
pub mod utils;
pub mod view_state;

pub use config::{BrowserConfig, ConfigError};
pub use pipeline::{
    CardImage,
    CatalogPipeline,
    CategoryCard,
    CategoryDrillDown,
    CategoryOverview,
    OverviewStatus,
};
