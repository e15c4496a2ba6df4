//! Wire and domain types for the catalog API.
//!
//! Records from the API are loose: most fields are optional and prices come
//! as strings. Optional fields default so a sparse record still parses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use nexus_core::{CategoryId, PriceInput, ProductId, normalize_price};

use crate::cart::ProductInput;

// =============================================================================
// Product Types
// =============================================================================

/// Product display image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL. `None` when the image has no stored file.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Category reference embedded in a product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Category display name.
    pub name: String,
}

/// A product record from the listing or detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// URL slug used by the detail endpoint.
    #[serde(default)]
    pub slug: String,
    /// Price as sent by the API (usually a decimal string).
    #[serde(default)]
    pub price: PriceInput,
    /// Main product image.
    #[serde(default)]
    pub primary_image: Option<ProductImage>,
    /// Owning category.
    #[serde(default)]
    pub category: Option<CategoryRef>,
    /// Long description (detail endpoint only).
    #[serde(default)]
    pub description: Option<String>,
    /// Units in stock.
    #[serde(default)]
    pub quantity: Option<i64>,
    /// Pre-sale comparison price.
    #[serde(default)]
    pub compare_at_price: Option<PriceInput>,
    /// Discount relative to `compare_at_price`.
    #[serde(default)]
    pub discount_percentage: Option<PriceInput>,
    /// Stock label such as `"in_stock"`.
    #[serde(default)]
    pub inventory_status: Option<String>,
    /// Whether the product is featured on the home page.
    #[serde(default)]
    pub is_featured: Option<bool>,
    /// Creation timestamp as sent by the API.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Product {
    /// Normalized unit price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        normalize_price(&self.price)
    }

    /// Name of the owning category, if present.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// Whether the product is featured.
    #[must_use]
    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            image: product.primary_image.clone(),
        }
    }
}

// =============================================================================
// Listing Types
// =============================================================================

/// Pagination links in a listing envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
}

/// Raw listing envelope from `GET /products/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsResponse {
    /// Products on this page.
    #[serde(default)]
    pub results: Vec<Product>,
    /// Pagination links.
    #[serde(default)]
    pub links: PageLinks,
    /// Total matching products across all pages.
    #[serde(default)]
    pub count: u64,
    /// Products per page.
    #[serde(default)]
    pub page_size: u64,
}

/// One fetched page of products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    /// Products on this page, in API order.
    pub items: Vec<Product>,
    /// Whether the envelope carried a next link.
    pub has_more: bool,
    /// Total matching products across all pages.
    pub count: u64,
    /// Products per page.
    pub page_size: u64,
}

impl CatalogPage {
    /// Number of pages implied by `count` and `page_size`; zero when the
    /// page size is unknown.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.count.div_ceil(self.page_size)
        }
    }
}

impl From<ProductsResponse> for CatalogPage {
    fn from(response: ProductsResponse) -> Self {
        // A blank next link counts as "no next page"
        let has_more = response
            .links
            .next
            .as_deref()
            .is_some_and(|next| !next.is_empty());

        Self {
            items: response.results,
            has_more,
            count: response.count,
            page_size: response.page_size,
        }
    }
}

/// Filters applied to the listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Free-text search term (`search=`).
    pub search: Option<String>,
    /// Category slug (`category=`).
    pub category: Option<String>,
}

impl CatalogQuery {
    /// Unfiltered listing.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Listing filtered by a search term.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            category: None,
        }
    }

    /// Restrict to a category slug.
    #[must_use]
    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }
}

// =============================================================================
// Category Types
// =============================================================================

/// A category from `GET /categories/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    #[serde(default)]
    pub id: Option<CategoryId>,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Parent category, for subcategories.
    #[serde(default)]
    pub parent: Option<CategoryId>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of products in the category.
    #[serde(default)]
    pub product_count: Option<u64>,
}

/// Raw envelope from `GET /categories/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesResponse {
    /// Categories.
    #[serde(default)]
    pub results: Vec<Category>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "links": {"next": "https://api.example.com/products/?page=2", "previous": null},
        "count": 45,
        "page_size": 20,
        "results": [
            {
                "id": 1,
                "name": "iPhone 14 Pro",
                "slug": "iphone-14-pro",
                "price": "180000.00",
                "primary_image": {"image_url": "/iphone.jpg", "alt_text": "iPhone"},
                "category": {"name": "Mobiles"},
                "quantity": 12,
                "is_featured": true
            },
            {"id": 2, "name": "Bare record", "price": 50}
        ]
    }"#;

    #[test]
    fn test_listing_envelope_parses() {
        let response: ProductsResponse = serde_json::from_str(LISTING).unwrap();
        let page = CatalogPage::from(response);

        assert!(page.has_more);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 3);

        let first = &page.items[0];
        assert_eq!(first.unit_price(), Decimal::from(180_000));
        assert_eq!(first.category_name(), Some("Mobiles"));
        assert!(first.is_featured());

        let bare = &page.items[1];
        assert_eq!(bare.slug, "");
        assert!(bare.category_name().is_none());
        assert!(!bare.is_featured());
    }

    #[test]
    fn test_null_or_blank_next_means_last_page() {
        for links in [
            r#"{"next": null, "previous": null}"#,
            r#"{"next": "", "previous": null}"#,
            "{}",
        ] {
            let json = format!(r#"{{"results": [], "links": {links}}}"#);
            let response: ProductsResponse = serde_json::from_str(&json).unwrap();
            assert!(!CatalogPage::from(response).has_more);
        }
    }

    #[test]
    fn test_total_pages_without_page_size() {
        let page = CatalogPage {
            count: 10,
            ..CatalogPage::default()
        };
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_product_converts_to_cart_input() {
        let response: ProductsResponse = serde_json::from_str(LISTING).unwrap();
        let input = ProductInput::from(&response.results[0]);
        assert_eq!(input.id, ProductId::new(1));
        assert_eq!(input.image.unwrap().image_url.as_deref(), Some("/iphone.jpg"));
    }

    #[test]
    fn test_image_without_file_keeps_page() {
        let json = r#"{
            "links": {"next": null},
            "results": [
                {"id": 1, "name": "Lamp", "price": "900.00"},
                {"id": 2, "name": "Rug", "price": "2500.00",
                 "primary_image": {"image_url": null, "alt_text": "Rug"}},
                {"id": 3, "name": "Vase", "price": "300.00",
                 "primary_image": {"alt_text": null}}
            ]
        }"#;

        let page = CatalogPage::from(serde_json::from_str::<ProductsResponse>(json).unwrap());

        assert_eq!(page.items.len(), 3);
        let rug = page.items[1].primary_image.as_ref().unwrap();
        assert!(rug.image_url.is_none());
        assert_eq!(rug.alt_text.as_deref(), Some("Rug"));
        assert!(page.items[2].primary_image.as_ref().unwrap().image_url.is_none());
    }

    #[test]
    fn test_query_builders() {
        let query = CatalogQuery::search("sofa").in_category("home");
        assert_eq!(query.search.as_deref(), Some("sofa"));
        assert_eq!(query.category.as_deref(), Some("home"));
        assert_eq!(CatalogQuery::all(), CatalogQuery::default());
    }
}
