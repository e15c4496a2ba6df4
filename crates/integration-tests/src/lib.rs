//! Integration tests for the Nexus storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nexus-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - cart reload round-trips on the file store
//! - `catalog_aggregation` - listing walks against a scripted catalog
//! - `checkout` - cart to order flow over a shared store
//!
//! The helpers here stand in for the remote catalog so no test touches the
//! network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use nexus_core::{PriceInput, ProductId};
use nexus_storefront::catalog::{
    CatalogError, CatalogPage, CatalogQuery, CatalogSource, Category, CategoryRef, Product,
};

/// Build a listing record.
#[must_use]
pub fn product(id: i64, name: &str, price: impl Into<PriceInput>) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        slug: format!("product-{id}"),
        price: price.into(),
        primary_image: None,
        category: None,
        description: None,
        quantity: None,
        compare_at_price: None,
        discount_percentage: None,
        inventory_status: None,
        is_featured: None,
        created_at: None,
    }
}

/// Same record with a category attached, as the detail endpoint returns it.
#[must_use]
pub fn in_category(mut product: Product, name: &str) -> Product {
    product.category = Some(CategoryRef {
        name: name.to_string(),
    });
    product
}

/// Scripted catalog: fixed pages, optional failing pages and detail records.
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    pages: Vec<Vec<Product>>,
    failing_pages: HashSet<u32>,
    details: HashMap<String, Product>,
    requests: Mutex<Vec<u32>>,
}

impl ScriptedCatalog {
    /// Catalog serving `pages` in order, page 1 first.
    #[must_use]
    pub fn with_pages(pages: Vec<Vec<Product>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Make `page` fail with a 503.
    #[must_use]
    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    /// Serve `product` from the detail endpoint under its slug.
    #[must_use]
    pub fn with_detail(mut self, product: Product) -> Self {
        self.details.insert(product.slug.clone(), product);
        self
    }

    /// Pages requested so far, in request order.
    ///
    /// # Panics
    ///
    /// Panics if a previous request panicked while recording.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn requests(&self) -> Vec<u32> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_page(
        &self,
        _query: &CatalogQuery,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(page);
        }

        if self.failing_pages.contains(&page) {
            return Err(CatalogError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        let index = usize::try_from(page.saturating_sub(1)).unwrap_or(usize::MAX);
        let items = self.pages.get(index).cloned().unwrap_or_default();

        Ok(CatalogPage {
            items,
            has_more: index.saturating_add(1) < self.pages.len(),
            count: self.pages.iter().map(|p| p.len() as u64).sum(),
            page_size: self.pages.first().map_or(0, |p| p.len() as u64),
        })
    }

    async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
        self.details
            .get(slug)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("/products/{slug}/")))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(Vec::new())
    }
}
