//! Paginated listing aggregation.
//!
//! Pages are requested strictly one at a time starting at page 1. Items keep
//! the API order, page by page. The first failed page ends the walk and the
//! items gathered so far are still returned alongside the failure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use super::{CatalogError, CatalogPage, CatalogQuery, CatalogSource, Product};

/// Default ceiling on pages fetched per aggregation.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Result of walking a paginated listing.
#[derive(Debug)]
pub struct AggregatedCatalog {
    /// Items from every successfully fetched page, in order.
    pub items: Vec<Product>,
    /// Number of pages fetched successfully.
    pub pages_fetched: u32,
    /// Why the walk stopped early, if it did.
    pub failure: Option<CatalogError>,
}

impl AggregatedCatalog {
    /// Whether every page was fetched.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// Discard partial results on failure.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the walk, if any.
    pub fn into_result(self) -> Result<Vec<Product>, CatalogError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}

/// Products grouped by category name, categories in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    groups: Vec<(String, Vec<Product>)>,
    positions: HashMap<String, usize>,
    uncategorized: Vec<Product>,
}

impl CategoryIndex {
    /// File a product under its category name.
    pub fn insert(&mut self, product: Product) {
        let Some(name) = product.category_name().map(str::to_string) else {
            self.uncategorized.push(product);
            return;
        };

        if let Some((_, products)) = self
            .positions
            .get(&name)
            .and_then(|&position| self.groups.get_mut(position))
        {
            products.push(product);
        } else {
            self.positions.insert(name.clone(), self.groups.len());
            self.groups.push((name, vec![product]));
        }
    }

    /// Products in the named category.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Product]> {
        self.positions
            .get(name)
            .and_then(|&position| self.groups.get(position))
            .map(|(_, products)| products.as_slice())
    }

    /// Category names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(name, products)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Product])> {
        self.groups
            .iter()
            .map(|(name, products)| (name.as_str(), products.as_slice()))
    }

    /// Products whose detail carried no category.
    #[must_use]
    pub fn uncategorized(&self) -> &[Product] {
        &self.uncategorized
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no categorized product was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Category index together with what went wrong building it.
#[derive(Debug)]
pub struct CategoryIndexOutcome {
    /// Grouped products.
    pub index: CategoryIndex,
    /// Failure of the underlying listing walk, if any.
    pub failure: Option<CatalogError>,
    /// Detail lookups that failed and were left out.
    pub skipped: usize,
}

/// Walks a [`CatalogSource`] listing page by page.
#[derive(Debug, Clone)]
pub struct CatalogAggregator<S> {
    source: S,
    max_pages: u32,
    deadline: Option<Duration>,
}

impl<S: CatalogSource> CatalogAggregator<S> {
    /// Aggregator with the default page ceiling and no deadline.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            max_pages: DEFAULT_MAX_PAGES,
            deadline: None,
        }
    }

    /// Cap the number of pages fetched. A ceiling of zero is treated as one.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Bound the total time spent on one aggregation.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The wrapped source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every page of the listing and concatenate the items.
    ///
    /// Stops after the first page without a next link, at the first failed
    /// page, or when the page ceiling is reached while more pages remain.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, query: &CatalogQuery) -> AggregatedCatalog {
        let started = Instant::now();
        let mut items = Vec::new();
        let mut pages_fetched = 0;
        let mut page = 1;

        let failure = loop {
            match self.fetch_within_deadline(query, page, started).await {
                Ok(fetched) => {
                    pages_fetched += 1;
                    items.extend(fetched.items);

                    if !fetched.has_more {
                        break None;
                    }
                    if pages_fetched >= self.max_pages {
                        warn!(limit = self.max_pages, "Page ceiling reached, truncating listing");
                        break Some(CatalogError::PageLimitExceeded {
                            limit: self.max_pages,
                        });
                    }
                    page += 1;
                }
                Err(e) => {
                    warn!(page, error = %e, "Page fetch failed, keeping earlier pages");
                    break Some(e);
                }
            }
        };

        info!(
            pages = pages_fetched,
            items = items.len(),
            complete = failure.is_none(),
            "Catalog aggregation finished"
        );

        AggregatedCatalog {
            items,
            pages_fetched,
            failure,
        }
    }

    async fn fetch_within_deadline(
        &self,
        query: &CatalogQuery,
        page: u32,
        started: Instant,
    ) -> Result<CatalogPage, CatalogError> {
        let Some(deadline) = self.deadline else {
            return self.source.fetch_page(query, page).await;
        };

        let remaining = deadline
            .checked_sub(started.elapsed())
            .filter(|r| !r.is_zero())
            .ok_or(CatalogError::DeadlineExceeded(deadline))?;

        tokio::time::timeout(remaining, self.source.fetch_page(query, page))
            .await
            .unwrap_or(Err(CatalogError::DeadlineExceeded(deadline)))
    }

    /// Aggregate the listing, then look up each product's detail to group
    /// the listing by category name.
    ///
    /// Lookups run in listing order. Failed lookups are logged and skipped.
    #[instrument(skip(self))]
    pub async fn fetch_category_index(&self, query: &CatalogQuery) -> CategoryIndexOutcome {
        let listing = self.fetch_all(query).await;
        let mut index = CategoryIndex::default();
        let mut skipped = 0;

        for product in &listing.items {
            match self.source.fetch_product(&product.slug).await {
                Ok(detail) => index.insert(detail),
                Err(e) => {
                    warn!(slug = %product.slug, error = %e, "Skipping product without detail");
                    skipped += 1;
                }
            }
        }

        debug!(categories = index.len(), skipped, "Built category index");

        CategoryIndexOutcome {
            index,
            failure: listing.failure,
            skipped,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use nexus_core::{PriceInput, ProductId};

    use super::*;
    use crate::catalog::{Category, CategoryRef};

    fn product(id: i64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            price: PriceInput::from("100"),
            primary_image: None,
            category: category.map(|name| CategoryRef {
                name: name.to_string(),
            }),
            description: None,
            quantity: None,
            compare_at_price: None,
            discount_percentage: None,
            inventory_status: None,
            is_featured: None,
            created_at: None,
        }
    }

    /// Serves fixed pages; `fail_on` pages return an API error.
    struct PagedSource {
        pages: Vec<Vec<Product>>,
        fail_on: Option<u32>,
        requested: Mutex<Vec<u32>>,
        details: Vec<Product>,
    }

    impl PagedSource {
        fn new(pages: Vec<Vec<Product>>) -> Self {
            Self {
                pages,
                fail_on: None,
                requested: Mutex::new(Vec::new()),
                details: Vec::new(),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSource for PagedSource {
        async fn fetch_page(
            &self,
            _query: &CatalogQuery,
            page: u32,
        ) -> Result<CatalogPage, CatalogError> {
            self.requested.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                return Err(CatalogError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let index = (page - 1) as usize;
            Ok(CatalogPage {
                items: self.pages[index].clone(),
                has_more: index + 1 < self.pages.len(),
                count: 0,
                page_size: 0,
            })
        }

        async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
            self.details
                .iter()
                .find(|p| p.slug == slug)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
        }

        async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
            Ok(Vec::new())
        }
    }

    /// Never finishes a page.
    struct StalledSource;

    #[async_trait]
    impl CatalogSource for StalledSource {
        async fn fetch_page(
            &self,
            _query: &CatalogQuery,
            _page: u32,
        ) -> Result<CatalogPage, CatalogError> {
            std::future::pending().await
        }

        async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
            Err(CatalogError::NotFound(slug.to_string()))
        }

        async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn ids(items: &[Product]) -> Vec<i64> {
        items.iter().map(|p| p.id.as_i64()).collect()
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let source = PagedSource::new(vec![
            vec![product(1, None), product(2, None)],
            vec![product(3, None)],
            vec![product(4, None), product(5, None)],
        ]);
        let aggregator = CatalogAggregator::new(source);

        let result = aggregator.fetch_all(&CatalogQuery::all()).await;

        assert!(result.is_complete());
        assert_eq!(result.pages_fetched, 3);
        assert_eq!(ids(&result.items), vec![1, 2, 3, 4, 5]);
        assert_eq!(aggregator.source().requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let aggregator = CatalogAggregator::new(PagedSource::new(vec![vec![product(7, None)]]));
        let result = aggregator.fetch_all(&CatalogQuery::all()).await;
        assert_eq!(ids(&result.items), vec![7]);
        assert_eq!(aggregator.source().requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let aggregator = CatalogAggregator::new(PagedSource::new(vec![Vec::new()]));
        let result = aggregator.fetch_all(&CatalogQuery::all()).await;
        assert!(result.is_complete());
        assert!(result.items.is_empty());
        assert_eq!(result.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_pages() {
        let mut source = PagedSource::new(vec![
            vec![product(1, None), product(2, None)],
            vec![product(3, None)],
            vec![product(4, None)],
        ]);
        source.fail_on = Some(2);
        let aggregator = CatalogAggregator::new(source);

        let result = aggregator.fetch_all(&CatalogQuery::all()).await;

        assert_eq!(ids(&result.items), vec![1, 2]);
        assert_eq!(result.pages_fetched, 1);
        assert!(matches!(
            result.failure,
            Some(CatalogError::Api { status: 500, .. })
        ));
        // Page 3 is never requested
        assert_eq!(aggregator.source().requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_first_page_failure_yields_nothing() {
        let mut source = PagedSource::new(vec![vec![product(1, None)]]);
        source.fail_on = Some(1);
        let result = CatalogAggregator::new(source)
            .fetch_all(&CatalogQuery::all())
            .await;
        assert!(result.items.is_empty());
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn test_page_ceiling_truncates() {
        let source = PagedSource::new(vec![
            vec![product(1, None)],
            vec![product(2, None)],
            vec![product(3, None)],
        ]);
        let aggregator = CatalogAggregator::new(source).with_max_pages(2);

        let result = aggregator.fetch_all(&CatalogQuery::all()).await;

        assert_eq!(ids(&result.items), vec![1, 2]);
        assert!(matches!(
            result.failure,
            Some(CatalogError::PageLimitExceeded { limit: 2 })
        ));
        assert_eq!(aggregator.source().requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_ceiling_equal_to_page_count_is_complete() {
        let source = PagedSource::new(vec![vec![product(1, None)], vec![product(2, None)]]);
        let result = CatalogAggregator::new(source)
            .with_max_pages(2)
            .fetch_all(&CatalogQuery::all())
            .await;
        assert!(result.is_complete());
        assert_eq!(ids(&result.items), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_deadline_stops_stalled_source() {
        let aggregator =
            CatalogAggregator::new(StalledSource).with_deadline(Duration::from_millis(50));
        let result = aggregator.fetch_all(&CatalogQuery::all()).await;
        assert!(result.items.is_empty());
        assert!(matches!(
            result.failure,
            Some(CatalogError::DeadlineExceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_category_index_groups_in_first_seen_order() {
        let mut source = PagedSource::new(vec![
            vec![product(1, None), product(2, None)],
            vec![product(3, None), product(4, None)],
        ]);
        source.details = vec![
            product(1, Some("Mobiles")),
            product(2, Some("Furniture")),
            product(3, Some("Mobiles")),
        ];
        let aggregator = CatalogAggregator::new(source);

        let outcome = aggregator.fetch_category_index(&CatalogQuery::all()).await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.skipped, 1);
        assert_eq!(
            outcome.index.names().collect::<Vec<_>>(),
            vec!["Mobiles", "Furniture"]
        );
        assert_eq!(ids(outcome.index.get("Mobiles").unwrap()), vec![1, 3]);
        assert!(outcome.index.get("Books").is_none());
    }

    #[test]
    fn test_category_index_uncategorized() {
        let mut index = CategoryIndex::default();
        index.insert(product(1, None));
        index.insert(product(2, Some("Books")));
        assert_eq!(index.len(), 1);
        assert_eq!(ids(index.uncategorized()), vec![1]);
        assert_eq!(index.iter().count(), 1);
    }
}
