//! User controlled view parameters of a category's product list and the
//! page of products derived from them.
//!
//! Ordering is owned by the remote catalogue: a sort change is sent upstream
//! as part of the next product fetch, while search and pagination are applied
//! locally on top of whatever order the catalogue returned.

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use catalog_gateway::types::{Product, ProductQuery, SortField, SortOrder};
use serde::Serialize;
use tokio::sync::watch;

use crate::debounce::Debounced;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(20).unwrap();
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// The parameters a [DerivedView] is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewParameters {
    /// The applied (debounced) search query.
    pub search_query: String,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub current_page: usize,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            current_page: 1,
        }
    }
}

/// The visible page of a product collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedView {
    pub visible_products: Vec<Product>,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Case-insensitive substring match against the title or the brand.
///
/// `query` must already be lower-cased; an empty query matches everything.
fn matches_query(product: &Product, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    product.title.to_lowercase().contains(query)
        || product
            .brand
            .as_ref()
            .is_some_and(|brand| brand.to_lowercase().contains(query))
}

/// Compute the visible page of `products` for `params`.
///
/// Filtering keeps the relative order of `products`. A page past the end
/// yields no visible products rather than failing.
pub fn derive_view(
    products: &[Product],
    params: &ViewParameters,
    page_size: NonZeroUsize,
) -> DerivedView {
    let query = params.search_query.trim().to_lowercase();
    let filtered = products
        .iter()
        .filter(|product| matches_query(product, &query))
        .collect::<Vec<_>>();

    let page_size = page_size.get();
    let total_items = filtered.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = params
        .current_page
        .saturating_sub(1)
        .saturating_mul(page_size);
    let visible_products = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    DerivedView {
        visible_products,
        total_items,
        total_pages,
    }
}

/// View state of one category drill-down.
///
/// The search query entered by the user is applied to filtering only after
/// the debounce window passes without further edits.
#[derive(Debug)]
pub struct CatalogViewState {
    entered_query: String,
    applied_query: Debounced<String>,
    sort_by: SortField,
    sort_order: SortOrder,
    current_page: usize,
    page_size: NonZeroUsize,
}

impl Default for CatalogViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE)
    }
}

impl CatalogViewState {
    pub fn new(page_size: NonZeroUsize, search_debounce: Duration) -> Self {
        let defaults = ViewParameters::default();
        Self {
            entered_query: defaults.search_query.clone(),
            applied_query: Debounced::new(defaults.search_query, search_debounce),
            sort_by: defaults.sort_by,
            sort_order: defaults.sort_order,
            current_page: defaults.current_page,
            page_size,
        }
    }

    /// Update the search query and go back to the first page.
    ///
    /// Filtering picks up the new query once the debounce window has passed.
    /// Must be called from within a tokio runtime.
    pub fn set_search_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.entered_query = text.clone();
        self.applied_query.schedule(text);
        self.current_page = 1;
    }

    /// Sort by `field`, toggling the direction if it already is the sort field.
    pub fn set_sort(&mut self, field: SortField) {
        if field == self.sort_by {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_by = field;
            self.sort_order = SortOrder::Asc;
        }
        self.current_page = 1;
    }

    /// Go to `page`, never below the first page.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Move the current page into `[1, total_pages]`.
    ///
    /// Returns whether the page changed.
    pub fn clamp_page(&mut self, total_pages: usize) -> bool {
        let clamped = self.current_page.clamp(1, total_pages.max(1));
        let changed = clamped != self.current_page;
        self.current_page = clamped;
        changed
    }

    /// The query as typed by the user.
    pub fn search_query(&self) -> &str {
        &self.entered_query
    }

    /// The query currently used for filtering.
    pub fn applied_search_query(&self) -> String {
        self.applied_query.current()
    }

    pub fn subscribe_applied_query(&self) -> watch::Receiver<String> {
        self.applied_query.subscribe()
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn params(&self) -> ViewParameters {
        ViewParameters {
            search_query: self.applied_search_query(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            current_page: self.current_page,
        }
    }

    /// The upstream request for the current ordering.
    pub fn product_query(&self, limit: Option<NonZeroU32>) -> ProductQuery {
        ProductQuery::sorted(limit, self.sort_by, self.sort_order)
    }

    pub fn derive_view(&self, products: &[Product]) -> DerivedView {
        derive_view(products, &self.params(), self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn product(id: u64, title: &str, brand: Option<&str>) -> Product {
        Product {
            id,
            title: title.to_string(),
            brand: brand.map(str::to_string),
            category: "gaming".to_string(),
            price: id as f64,
            images: vec![],
            thumbnail: None,
            description: None,
            rating: None,
            stock: None,
        }
    }

    fn numbered(n: u64) -> Vec<Product> {
        (1..=n)
            .map(|id| product(id, &format!("Product {id}"), None))
            .collect()
    }

    fn params_for_page(page: usize) -> ViewParameters {
        ViewParameters {
            current_page: page,
            ..Default::default()
        }
    }

    #[test]
    fn last_partial_page() {
        let view = derive_view(&numbered(45), &params_for_page(3), DEFAULT_PAGE_SIZE);
        assert_eq!(view.visible_products.len(), 5);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.total_items, 45);
        assert_eq!(view.visible_products[0].id, 41);
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let view = derive_view(&[], &params_for_page(1), DEFAULT_PAGE_SIZE);
        assert_eq!(view, DerivedView::default());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let view = derive_view(&numbered(45), &params_for_page(7), DEFAULT_PAGE_SIZE);
        assert!(view.visible_products.is_empty());
        assert_eq!(view.total_pages, 3);
    }

    #[test]
    fn search_matches_title_or_brand_case_insensitively() {
        let products = vec![
            product(1, "Xbox Series X", Some("Microsoft")),
            product(2, "Wireless Controller", Some("XBOX")),
            product(3, "PlayStation", Some("Sony")),
            product(4, "Xbox-less bundle", None),
        ];
        let params = ViewParameters {
            search_query: "xbox".to_string(),
            ..Default::default()
        };

        let view = derive_view(&products, &params, DEFAULT_PAGE_SIZE);
        assert_eq!(
            view.visible_products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );
    }

    #[test]
    fn product_without_brand_never_matches_on_brand() {
        let products = vec![product(1, "Controller", None)];
        let params = ViewParameters {
            search_query: "sony".to_string(),
            ..Default::default()
        };
        assert_eq!(derive_view(&products, &params, DEFAULT_PAGE_SIZE).total_items, 0);
    }

    #[test]
    fn search_query_is_trimmed() {
        let products = vec![product(1, "Xbox Series X", None)];
        let params = ViewParameters {
            search_query: "  SERIES ".to_string(),
            ..Default::default()
        };
        assert_eq!(derive_view(&products, &params, DEFAULT_PAGE_SIZE).total_items, 1);
    }

    #[test]
    fn filtering_preserves_upstream_order() {
        // deliberately not sorted by id or title
        let products = vec![
            product(9, "Case B", None),
            product(2, "Phone", None),
            product(5, "Case A", None),
            product(1, "Case C", None),
        ];
        let params = ViewParameters {
            search_query: "case".to_string(),
            ..Default::default()
        };
        let view = derive_view(&products, &params, DEFAULT_PAGE_SIZE);
        assert_eq!(
            view.visible_products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![9, 5, 1]
        );
    }

    #[test]
    fn changing_sort_field_resets_order_and_page() {
        let mut state = CatalogViewState::default();
        state.set_sort(SortField::Title);
        assert_eq!(state.sort_order(), SortOrder::Desc);
        state.set_page(4);

        state.set_sort(SortField::Price);
        assert_eq!(state.sort_by(), SortField::Price);
        assert_eq!(state.sort_order(), SortOrder::Asc);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn same_sort_field_toggles_order() {
        let mut state = CatalogViewState::default();
        state.set_sort(SortField::Price);
        state.set_page(2);
        state.set_sort(SortField::Price);

        assert_eq!(state.sort_by(), SortField::Price);
        assert_eq!(state.sort_order(), SortOrder::Desc);
        assert_eq!(state.current_page(), 1);

        state.set_sort(SortField::Price);
        assert_eq!(state.sort_order(), SortOrder::Asc);
    }

    #[test]
    fn product_query_follows_sort() {
        let mut state = CatalogViewState::default();
        state.set_sort(SortField::Rating);
        state.set_sort(SortField::Rating);
        assert_eq!(
            state.product_query(NonZeroU32::new(100)),
            ProductQuery::sorted(NonZeroU32::new(100), SortField::Rating, SortOrder::Desc)
        );
    }

    #[test]
    fn set_page_never_goes_below_one() {
        let mut state = CatalogViewState::default();
        state.set_page(0);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn clamp_page_to_total_pages() {
        let mut state = CatalogViewState::default();
        state.set_page(5);
        assert!(state.clamp_page(3));
        assert_eq!(state.current_page(), 3);
        assert!(!state.clamp_page(3));

        // no results still leaves a valid first page
        assert!(state.clamp_page(0));
        assert_eq!(state.current_page(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn search_resets_page_and_applies_after_debounce() {
        let mut state = CatalogViewState::default();
        let products = vec![
            product(1, "Xbox Series X", None),
            product(2, "PlayStation", Some("Sony")),
        ];
        state.set_page(2);

        state.set_search_query("xbox");
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.search_query(), "xbox");
        // typed but not yet applied
        assert_eq!(state.derive_view(&products).total_items, 2);

        tokio::time::sleep(DEFAULT_SEARCH_DEBOUNCE + Duration::from_millis(1)).await;
        assert_eq!(state.applied_search_query(), "xbox");
        assert_eq!(state.derive_view(&products).total_items, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_keystroke_is_applied() {
        let mut state = CatalogViewState::default();
        let mut applied = state.subscribe_applied_query();
        for text in ["p", "ph", "pho", "phone"] {
            state.set_search_query(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(state.applied_search_query(), "");

        applied.changed().await.unwrap();
        assert_eq!(*applied.borrow_and_update(), "phone");
        tokio::time::sleep(DEFAULT_SEARCH_DEBOUNCE * 2).await;
        assert!(!applied.has_changed().unwrap());
    }

    fn arb_products() -> impl Strategy<Value = Vec<Product>> {
        proptest::collection::vec(
            (
                "[a-zA-Z ]{0,12}",
                proptest::option::of("[a-zA-Z]{0,6}"),
            ),
            0..120,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(id, (title, brand))| product(id as u64, &title, brand.as_deref()))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn pages_partition_filtered_items(
            products in arb_products(),
            query in "[a-zA-Z]{0,2}",
            page_size in 1..30_usize,
        ) {
            let page_size = NonZeroUsize::new(page_size).unwrap();
            let first = derive_view(&products, &ViewParameters {
                search_query: query.clone(),
                ..Default::default()
            }, page_size);

            prop_assert_eq!(first.total_pages == 0, first.total_items == 0);

            let mut seen = 0;
            for page in 1..=first.total_pages {
                let view = derive_view(&products, &ViewParameters {
                    search_query: query.clone(),
                    current_page: page,
                    ..Default::default()
                }, page_size);
                prop_assert!(view.visible_products.len() <= page_size.get());
                prop_assert_eq!(view.total_items, first.total_items);
                seen += view.visible_products.len();
            }
            prop_assert_eq!(seen, first.total_items);
        }

        #[test]
        fn derive_view_is_deterministic(
            products in arb_products(),
            query in "[a-z]{0,2}",
            page in 0..8_usize,
        ) {
            let params = ViewParameters {
                search_query: query,
                current_page: page,
                ..Default::default()
            };
            prop_assert_eq!(
                derive_view(&products, &params, DEFAULT_PAGE_SIZE),
                derive_view(&products, &params, DEFAULT_PAGE_SIZE)
            );
        }
    }
}
