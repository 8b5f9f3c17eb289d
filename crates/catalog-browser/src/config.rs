//! Layered configuration of the catalogue browser.
//!
//! Sources, from lowest to highest precedence:
//! 1. built-in defaults
//! 2. `<user config dir>/catalog-browser/catalog-browser.toml`, if it exists
//! 3. an explicitly given TOML file
//! 4. `CATALOG_BROWSER_*` environment variables

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog_gateway::CatalogClientConfig;
use config::{Config as HierarchicalConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::view_state::{DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE};

const CONFIG_DIR_NAME: &str = "catalog-browser";
pub const CONFIG_FILE: &str = "catalog-browser.toml";
const ENV_PREFIX: &str = "CATALOG_BROWSER";

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";
pub const DEFAULT_PRODUCT_LIMIT: NonZeroU32 = NonZeroU32::new(100).unwrap();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Base URL of the catalogue API
    pub catalog_url: Url,
    /// Products shown per page of a category
    pub page_size: NonZeroUsize,
    /// Quiescence window before an edited search query is applied
    pub search_debounce_ms: u64,
    /// Upper bound of products fetched for one category
    pub product_limit: NonZeroU32,
    pub user_agent: Option<String>,
    /// Serve catalogue responses from this mock data file
    pub mock_data: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            catalog_url: Url::parse(DEFAULT_CATALOG_URL).expect("default catalog url is valid"),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE.as_millis() as u64,
            product_limit: DEFAULT_PRODUCT_LIMIT,
            user_agent: None,
            mock_data: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{}' does not exist", .0.display())]
    MissingFile(PathBuf),
    #[error("could not read configuration")]
    Read(#[source] config::ConfigError),
}

impl BrowserConfig {
    /// Load the configuration from all sources, including `explicit_file` if given.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self, ConfigError> {
        let user_file = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE));
        Self::load_from(user_file.as_deref(), explicit_file)
    }

    fn load_from(user_file: Option<&Path>, explicit_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = HierarchicalConfig::builder();

        if let Some(user_file) = user_file {
            debug!(path = %user_file.display(), "looking for user config file");
            builder = builder.add_source(
                File::from(user_file)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(explicit_file) = explicit_file {
            if !explicit_file.exists() {
                return Err(ConfigError::MissingFile(explicit_file.to_path_buf()));
            }
            debug!(path = %explicit_file.display(), "reading config file");
            builder = builder.add_source(File::from(explicit_file).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: BrowserConfig = builder
            .build()
            .and_then(HierarchicalConfig::try_deserialize)
            .map_err(ConfigError::Read)?;

        debug!(?config, "loaded configuration");
        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Configuration of the gateway client this browser talks through.
    pub fn client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            user_agent: self.user_agent.clone(),
            mock_data: self.mock_data.clone(),
            ..CatalogClientConfig::new(self.catalog_url.as_str())
        }
    }
}
