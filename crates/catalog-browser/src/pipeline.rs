//! Composition of category retrieval, image resolution and per-category
//! product retrieval into the two catalogue screens.
//!
//! Categories, images and products are three independent channels: each
//! has its own loading and error state, and a retry re-issues only the fetch
//! of its own channel. A failing channel never hides data of another one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use catalog_gateway::types::{Category, Product, SortField, SortOrder};
use catalog_gateway::{Client, ClientInitError, ClientTrait, FetchError};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::config::BrowserConfig;
use crate::generation::GenerationCounter;
use crate::image_resolver::{CategoryImageResolver, CategoryImages, ImageMap};
use crate::loadable::Loadable;
use crate::view_state::{CatalogViewState, DerivedView};

pub type CategoriesState = Loadable<Arc<[Category]>>;
pub type ProductsState = Loadable<Arc<[Product]>>;

/// What the category overview should render as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewStatus {
    Loading,
    Failed,
    Empty,
    Ready,
}

/// The image slot of a category card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardImage {
    Loading,
    Url(String),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCard {
    pub category: Category,
    pub image: CardImage,
}

/// Snapshot of the category overview screen.
#[derive(Debug, Clone)]
pub struct CategoryOverview {
    pub categories: Option<Arc<[Category]>>,
    pub image_map: ImageMap,
    pub categories_loading: bool,
    pub images_loading: bool,
    pub categories_error: Option<Arc<FetchError>>,
}

impl CategoryOverview {
    /// A refetch keeps reporting the previous outcome until it settles.
    pub fn status(&self) -> OverviewStatus {
        if self.categories_loading
            && self.categories.is_none()
            && self.categories_error.is_none()
        {
            OverviewStatus::Loading
        } else if self.categories_error.is_some() {
            OverviewStatus::Failed
        } else if self.categories.as_ref().is_some_and(|c| !c.is_empty()) {
            OverviewStatus::Ready
        } else {
            OverviewStatus::Empty
        }
    }

    /// One card per loaded category, in catalogue order.
    pub fn cards(&self) -> Vec<CategoryCard> {
        let Some(categories) = &self.categories else {
            return Vec::new();
        };
        categories
            .iter()
            .map(|category| {
                let image = if self.images_loading {
                    CardImage::Loading
                } else {
                    match self.image_map.get(&category.slug) {
                        Some(url) => CardImage::Url(url.clone()),
                        None => CardImage::Placeholder,
                    }
                };
                CategoryCard {
                    category: category.clone(),
                    image,
                }
            })
            .collect()
    }
}

/// Snapshot of the category drill-down screen.
#[derive(Debug, Clone)]
pub struct CategoryDrillDown {
    pub current_category: Category,
    pub derived_view: DerivedView,
    pub products_loading: bool,
    pub products_error: Option<Arc<FetchError>>,
    /// The query as typed, filtering may still use an older one.
    pub search_query: String,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub current_page: usize,
}

#[derive(Debug)]
struct DrillDown {
    category: Category,
    view: CatalogViewState,
}

/// The catalogue browsing pipeline behind both screens.
///
/// Fetches are driven by awaiting the async methods; every method takes
/// `&self` so that a newer request can be issued while an older one is still
/// in flight, in which case the older result is discarded on arrival.
#[derive(Debug)]
pub struct CatalogPipeline<C> {
    client: Arc<C>,
    config: BrowserConfig,
    categories: watch::Sender<CategoriesState>,
    categories_generation: GenerationCounter,
    images: CategoryImageResolver<C>,
    products: watch::Sender<ProductsState>,
    products_generation: GenerationCounter,
    drill_down: Mutex<Option<DrillDown>>,
}

impl CatalogPipeline<Client> {
    /// Create a pipeline talking to the client described by `config`.
    pub fn from_config(config: BrowserConfig) -> Result<Self, ClientInitError> {
        let client = Client::from_config(config.client_config())?;
        Ok(Self::new(Arc::new(client), config))
    }
}

impl<C> CatalogPipeline<C>
where
    C: ClientTrait,
{
    pub fn new(client: Arc<C>, config: BrowserConfig) -> Self {
        Self {
            images: CategoryImageResolver::new(Arc::clone(&client)),
            client,
            config,
            categories: watch::Sender::new(Loadable::default()),
            categories_generation: GenerationCounter::default(),
            products: watch::Sender::new(Loadable::default()),
            products_generation: GenerationCounter::default(),
            drill_down: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    // region: category overview

    /// Fetch the category list, then resolve images for it.
    #[instrument(skip_all)]
    pub async fn load_categories(&self) {
        let generation = self.categories_generation.advance();
        self.categories.send_modify(Loadable::start_loading);

        let result = self
            .client
            .list_categories()
            .await
            .map(Arc::<[Category]>::from);
        let loaded = match &result {
            Ok(categories) => Arc::clone(categories),
            Err(_) => Arc::default(),
        };

        let published = self.categories.send_if_modified(|state| {
            if !self.categories_generation.is_current(generation) {
                debug!(%generation, "discarding superseded category list");
                return false;
            }
            state.finish(result);
            true
        });

        // a new list invalidates the image map of the previous one
        if published {
            self.images.resolve(&loaded).await;
        }
    }

    /// Re-issue the category fetch, leaving products untouched.
    pub async fn retry_categories(&self) {
        self.load_categories().await
    }

    /// Re-resolve images for the loaded category list without fetching it again.
    pub async fn retry_images(&self) {
        let categories = self
            .categories
            .borrow()
            .data
            .clone()
            .unwrap_or_default();
        self.images.resolve(&categories).await;
    }

    pub fn overview(&self) -> CategoryOverview {
        let categories = self.categories.borrow().clone();
        let CategoryImages { images, loading } = self.images.current();
        CategoryOverview {
            categories: categories.data,
            image_map: images,
            categories_loading: categories.loading,
            images_loading: loading,
            categories_error: categories.error,
        }
    }

    pub fn subscribe_categories(&self) -> watch::Receiver<CategoriesState> {
        self.categories.subscribe()
    }

    pub fn subscribe_images(&self) -> watch::Receiver<CategoryImages> {
        self.images.subscribe()
    }

    // endregion

    // region: category drill-down

    /// Navigate into a category, discarding any previous drill-down.
    #[instrument(skip(self))]
    pub async fn open_category(&self, slug: &str) {
        let category = self
            .categories
            .borrow()
            .data
            .as_ref()
            .and_then(|categories| categories.iter().find(|c| c.slug == slug).cloned())
            .unwrap_or_else(|| {
                debug!("category not loaded, deriving name from slug");
                Category::from_slug(slug)
            });

        let view = CatalogViewState::new(self.config.page_size, self.config.search_debounce());
        *self.lock_drill_down() = Some(DrillDown { category, view });
        self.products.send_replace(Loadable::default());

        self.fetch_products().await;
    }

    /// Leave the drill-down; in-flight product fetches are ignored.
    pub fn close_category(&self) {
        self.products_generation.advance();
        *self.lock_drill_down() = None;
        self.products.send_replace(Loadable::default());
    }

    /// Re-issue the product fetch of the open category, leaving categories untouched.
    pub async fn retry_products(&self) {
        self.fetch_products().await
    }

    pub fn set_search_query(&self, text: impl Into<String>) {
        if let Some(drill_down) = self.lock_drill_down().as_mut() {
            drill_down.view.set_search_query(text);
        }
    }

    /// Change the sort field or direction and fetch products in the new order.
    pub async fn set_sort(&self, field: SortField) {
        let changed = match self.lock_drill_down().as_mut() {
            Some(drill_down) => {
                drill_down.view.set_sort(field);
                true
            },
            None => false,
        };
        if changed {
            self.fetch_products().await;
        }
    }

    /// Go to `page`, clamped to the pages of the current view.
    pub fn set_page(&self, page: usize) {
        let products = self.products.borrow().data.clone();
        if let Some(drill_down) = self.lock_drill_down().as_mut() {
            drill_down.view.set_page(page);
            let total_pages = drill_down
                .view
                .derive_view(products.as_deref().unwrap_or_default())
                .total_pages;
            drill_down.view.clamp_page(total_pages);
        }
    }

    /// The drill-down screen, if a category is open.
    ///
    /// A current page left out of range by a narrowed search is clamped here.
    pub fn drill_down(&self) -> Option<CategoryDrillDown> {
        let products = self.products.borrow().clone();
        let mut guard = self.lock_drill_down();
        let drill_down = guard.as_mut()?;

        let raw = products.data.as_deref().unwrap_or_default();
        let mut derived_view = drill_down.view.derive_view(raw);
        if drill_down.view.clamp_page(derived_view.total_pages) {
            debug!(
                page = drill_down.view.current_page(),
                "current page out of range, clamped"
            );
            derived_view = drill_down.view.derive_view(raw);
        }

        Some(CategoryDrillDown {
            current_category: drill_down.category.clone(),
            derived_view,
            products_loading: products.loading,
            products_error: products.error,
            search_query: drill_down.view.search_query().to_string(),
            sort_by: drill_down.view.sort_by(),
            sort_order: drill_down.view.sort_order(),
            current_page: drill_down.view.current_page(),
        })
    }

    pub fn subscribe_products(&self) -> watch::Receiver<ProductsState> {
        self.products.subscribe()
    }

    /// Notified when the debounced search query of the open category is applied.
    pub fn subscribe_applied_query(&self) -> Option<watch::Receiver<String>> {
        self.lock_drill_down()
            .as_ref()
            .map(|drill_down| drill_down.view.subscribe_applied_query())
    }

    // endregion

    async fn fetch_products(&self) {
        let request = self.lock_drill_down().as_ref().map(|drill_down| {
            (
                drill_down.category.slug.clone(),
                drill_down.view.product_query(Some(self.config.product_limit)),
            )
        });
        let Some((slug, query)) = request else {
            debug!("no category open, not fetching products");
            return;
        };

        let generation = self.products_generation.advance();
        self.products.send_modify(Loadable::start_loading);

        let result = self
            .client
            .list_products_by_category(&slug, query)
            .await
            .map(|list| Arc::<[Product]>::from(list.products));

        self.products.send_if_modified(|state| {
            if !self.products_generation.is_current(generation) {
                debug!(%generation, %slug, "discarding superseded product list");
                return false;
            }
            state.finish(result);
            true
        });
    }

    fn lock_drill_down(&self) -> MutexGuard<'_, Option<DrillDown>> {
        self.drill_down
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
