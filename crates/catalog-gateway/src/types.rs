//! Catalogue domain types.
//!
//! These mirror the JSON documents served by the catalogue API. They are
//! immutable snapshots: consumers filter and reorder copies, never mutate them.

use std::num::NonZeroU32;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A named partition of the catalogue, identified by its slug.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Unique, URL-safe identifier.
    pub slug: String,
    /// Display label.
    pub name: String,
    /// Link to the category's product listing on the API.
    #[serde(default)]
    pub url: Option<String>,
}

impl Category {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            url: None,
        }
    }

    /// Build a category for a slug we have no metadata for,
    /// deriving a display name from the slug (`mens-shirts` -> `Mens Shirts`).
    pub fn from_slug(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        let name = slug
            .split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            slug,
            name,
            url: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Slug of the category this product is listed under.
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stock: Option<u32>,
}

/// A bounded listing of products as returned by the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    /// Number of products the API holds for the query, regardless of `limit`.
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Fields the API can order a product listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    #[display("title")]
    Title,
    #[display("price")]
    Price,
    #[display("rating")]
    Rating,
    #[display("stock")]
    Stock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Parameters of a products-by-category request.
///
/// Unset fields are left out of the request, leaving the choice to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub limit: Option<NonZeroU32>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl ProductQuery {
    /// Query for the first product of a category.
    pub fn first() -> Self {
        Self {
            limit: Some(NonZeroU32::MIN),
            ..Default::default()
        }
    }

    pub fn sorted(limit: Option<NonZeroU32>, sort_by: SortField, order: SortOrder) -> Self {
        Self {
            limit,
            sort_by: Some(sort_by),
            order: Some(order),
        }
    }

    /// Query string pairs in the form the API expects.
    pub(crate) fn to_query_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sortBy", sort_by.to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn product_without_optional_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "title": "Plain Mug",
            "category": "kitchen-accessories",
            "price": 4.5,
        }))
        .unwrap();

        assert_eq!(product.brand, None);
        assert_eq!(product.thumbnail, None);
        assert!(product.images.is_empty());
    }

    #[test]
    fn product_ignores_unknown_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "title": "iPhone 9",
            "brand": "Apple",
            "category": "smartphones",
            "price": 549,
            "discountPercentage": 12.96,
            "images": ["https://cdn.example/1.jpg", "https://cdn.example/2.jpg"],
            "thumbnail": "https://cdn.example/thumb.jpg",
        }))
        .unwrap();

        assert_eq!(product.brand.as_deref(), Some("Apple"));
        assert_eq!(product.images.len(), 2);
    }

    #[test]
    fn category_name_from_slug() {
        assert_eq!(Category::from_slug("mens-shirts").name, "Mens Shirts");
        assert_eq!(Category::from_slug("laptops").name, "Laptops");
        assert_eq!(Category::from_slug("home--decoration").name, "Home Decoration");
    }

    #[test]
    fn query_pairs_skip_unset_fields() {
        assert_eq!(ProductQuery::first().to_query_pairs(), vec![(
            "limit",
            "1".to_string()
        )]);

        let query = ProductQuery::sorted(NonZeroU32::new(30), SortField::Price, SortOrder::Desc);
        assert_eq!(query.to_query_pairs(), vec![
            ("limit", "30".to_string()),
            ("sortBy", "price".to_string()),
            ("order", "desc".to_string()),
        ]);
    }

    #[test]
    fn sort_order_toggles() {
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.toggled(), SortOrder::Asc);
    }
}
