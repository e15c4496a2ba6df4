//! HTTP implementation of [`CatalogSource`].
//!
//! Product details are cached with `moka` since the category index looks up
//! every listed product by slug.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::CatalogConfig;

use super::{
    CatalogError, CatalogPage, CatalogQuery, CatalogSource, CategoriesResponse, Category, Product,
    ProductsResponse,
};

/// Upper bound on cached product details.
const DETAIL_CACHE_CAPACITY: u64 = 1000;

/// Longest error body kept in [`CatalogError::Api`].
const MAX_ERROR_BODY: usize = 200;

/// Catalog API client.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    details: Cache<String, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let details = Cache::builder()
            .max_capacity(DETAIL_CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                details,
            }),
        })
    }

    /// Base URL all endpoints hang off.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build `<base>/<segments...>/` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// Listing URL for `page` with the query's filters appended.
    fn listing_url(&self, query: &CatalogQuery, page: u32) -> Result<Url, CatalogError> {
        let mut url = self.endpoint(&["products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("search", search);
            }
            if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
                pairs.append_pair("category", category);
            }
        }
        Ok(url)
    }

    /// GET `url` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let path = url.path().to_string();
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            error!(status = %status, path = %path, "Catalog API request failed");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, path = %path, "Failed to parse catalog response");
            CatalogError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[instrument(skip(self), fields(search = ?query.search, category = ?query.category))]
    async fn fetch_page(
        &self,
        query: &CatalogQuery,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let url = self.listing_url(query, page)?;
        let response: ProductsResponse = self.get_json(url).await?;
        let page = CatalogPage::from(response);
        debug!(items = page.items.len(), has_more = page.has_more, "Fetched page");
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_product(&self, slug: &str) -> Result<Product, CatalogError> {
        if slug.is_empty() {
            return Err(CatalogError::NotFound("product with empty slug".to_string()));
        }

        if let Some(product) = self.inner.details.get(slug).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = self.endpoint(&["products", slug])?;
        let product: Product = self.get_json(url).await?;
        self.inner
            .details
            .insert(slug.to_string(), product.clone())
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let url = self.endpoint(&["categories"])?;
        let response: CategoriesResponse = self.get_json(url).await?;
        debug!(count = response.results.len(), "Fetched categories");
        Ok(response.results)
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
            max_pages: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_listing_url_first_page() {
        let client = client("https://api.example.com/api/v1");
        let url = client.listing_url(&CatalogQuery::all(), 1).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/products/?page=1");
    }

    #[test]
    fn test_listing_url_with_trailing_slash_base() {
        let client = client("https://api.example.com/api/v1/");
        let url = client.listing_url(&CatalogQuery::all(), 3).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/products/?page=3");
    }

    #[test]
    fn test_listing_url_encodes_filters() {
        let client = client("https://api.example.com/api/v1");
        let query = CatalogQuery::search("red sofa&co").in_category("home-decor");
        let url = client.listing_url(&query, 2).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/v1/products/?page=2&search=red+sofa%26co&category=home-decor"
        );
    }

    #[test]
    fn test_listing_url_skips_blank_filters() {
        let client = client("https://api.example.com/api/v1");
        let query = CatalogQuery {
            search: Some(String::new()),
            category: None,
        };
        let url = client.listing_url(&query, 1).unwrap();
        assert_eq!(url.query(), Some("page=1"));
    }

    #[test]
    fn test_detail_endpoint_encodes_slug() {
        let client = client("https://api.example.com/api/v1");
        let url = client.endpoint(&["products", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/products/a%2Fb/");
    }

    #[tokio::test]
    async fn test_empty_slug_is_not_found() {
        let client = client("https://api.example.com/api/v1");
        let err = client.fetch_product("").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
