//! Remote product catalog access.
//!
//! # Architecture
//!
//! - [`CatalogSource`] is the seam over the remote listing, detail and
//!   category endpoints; [`CatalogClient`] implements it over HTTP
//! - [`CatalogAggregator`] walks paginated listings one page at a time and
//!   concatenates them, stopping at the first failure or the page ceiling
//! - [`filter`] holds the in-memory narrowing the product pages apply to an
//!   aggregated listing
//!
//! # Endpoints
//!
//! - `GET <base>/products/?page=<n>` - paginated listing with a `links.next`
//!   continuation signal
//! - `GET <base>/products/<slug>/` - single product with its category
//! - `GET <base>/categories/` - category list

mod aggregator;
mod client;
pub mod filter;
pub mod types;

pub use aggregator::{
    AggregatedCatalog, CatalogAggregator, CategoryIndex, CategoryIndexOutcome, DEFAULT_MAX_PAGES,
};
pub use client::CatalogClient;
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when fetching from the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The listing still reported more pages after the configured ceiling.
    #[error("Page limit of {limit} reached with more pages remaining")]
    PageLimitExceeded { limit: u32 },

    /// The whole aggregation ran longer than its deadline.
    #[error("Catalog fetch exceeded {0:?}")]
    DeadlineExceeded(Duration),
}

/// Access to the remote catalog endpoints.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of the product listing. Pages start at 1.
    async fn fetch_page(&self, query: &CatalogQuery, page: u32)
    -> Result<CatalogPage, CatalogError>;

    /// Fetch a single product by slug.
    async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError>;

    /// Fetch the category list.
    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<T> {
    async fn fetch_page(
        &self,
        query: &CatalogQuery,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        (**self).fetch_page(query, page).await
    }

    async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
        (**self).fetch_product(slug).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        (**self).fetch_categories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound("red-sofa".to_string());
        assert_eq!(err.to_string(), "Not found: red-sofa");

        let err = CatalogError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
    }

    #[test]
    fn test_page_limit_error_display() {
        let err = CatalogError::PageLimitExceeded { limit: 50 };
        assert_eq!(
            err.to_string(),
            "Page limit of 50 reached with more pages remaining"
        );
    }
}
