//! Best-effort resolution of one representative image per category.

use std::collections::BTreeMap;
use std::sync::Arc;

use catalog_gateway::ClientTrait;
use catalog_gateway::types::{Category, Product};
use derive_more::{Deref, From};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::generation::GenerationCounter;

/// Representative image url per category slug.
///
/// A missing entry means the image could not be resolved, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deref, From)]
pub struct ImageMap(BTreeMap<String, String>);

impl FromIterator<(String, String)> for ImageMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The observable state of a [CategoryImageResolver].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryImages {
    pub images: ImageMap,
    pub loading: bool,
}

/// Pick the image standing in for a product's category:
/// the first product image, falling back to the thumbnail.
pub fn representative_image(product: &Product) -> Option<&str> {
    product
        .images
        .first()
        .map(String::as_str)
        .or_else(|| product.thumbnail.as_deref().filter(|url| !url.is_empty()))
}

/// Resolves an [ImageMap] for a set of categories.
///
/// Each call to [CategoryImageResolver::resolve] supersedes all previous ones:
/// results of a superseded call are dropped when they arrive, so the published
/// map always belongs to the latest input and is never a partial map.
#[derive(Debug)]
pub struct CategoryImageResolver<C> {
    client: Arc<C>,
    generation: GenerationCounter,
    state: watch::Sender<CategoryImages>,
}

impl<C> CategoryImageResolver<C>
where
    C: ClientTrait,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            generation: GenerationCounter::default(),
            state: watch::Sender::new(CategoryImages::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CategoryImages> {
        self.state.subscribe()
    }

    pub fn current(&self) -> CategoryImages {
        self.state.borrow().clone()
    }

    /// Resolve images for `categories`, replacing the current map once every
    /// category has settled.
    ///
    /// An empty input publishes an empty map right away. Failures of individual
    /// categories are logged and leave their entry out of the map.
    #[instrument(skip_all, fields(n_categories = categories.len()))]
    pub async fn resolve(&self, categories: &[Category]) {
        let generation = self.generation.advance();

        if categories.is_empty() {
            self.state.send_replace(CategoryImages::default());
            return;
        }

        self.state.send_replace(CategoryImages {
            images: ImageMap::default(),
            loading: true,
        });

        let lookups = categories
            .iter()
            .map(|category| self.image_for_category(category));
        let images = join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .collect::<ImageMap>();

        self.state.send_if_modified(|state| {
            if !self.generation.is_current(generation) {
                debug!(%generation, "discarding images of superseded categories");
                return false;
            }
            debug!(n_images = images.len(), "resolved category images");
            *state = CategoryImages {
                images,
                loading: false,
            };
            true
        });
    }

    async fn image_for_category(&self, category: &Category) -> Option<(String, String)> {
        match self.client.first_product_of_category(&category.slug).await {
            Ok(Some(product)) => {
                representative_image(&product).map(|url| (category.slug.clone(), url.to_string()))
            },
            Ok(None) => {
                debug!(slug = %category.slug, "category has no products");
                None
            },
            Err(err) => {
                warn!(slug = %category.slug, error = %err, "failed to fetch category image");
                None
            },
        }
    }
}
