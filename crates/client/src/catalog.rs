//! Catalog browsing with a short-lived read cache.
//!
//! Catalog data changes rarely and is requested constantly while
//! browsing, so responses sit in a TTL cache and repeat views are served
//! without another round trip.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use storefront_core::{Category, Listing, Product, ProductId};

use crate::error::ApiError;
use crate::http::ApiClient;

const CACHE_CAPACITY: u64 = 1_000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Cached catalog responses, keyed by request path.
#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
    Product(Arc<Product>),
}

/// Typed wrapper over the catalog endpoints.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogService {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Transport and backend errors on a cache miss.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        let path = "/catalog/products/";
        if let Some(CacheValue::Products(products)) = self.cache.get(path).await {
            return Ok(products);
        }

        let listing: Listing<Product> = self.api.get_json(path).await?;
        let products = Arc::new(listing.into_vec());
        self.cache
            .insert(path.to_string(), CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Transport and backend errors on a cache miss.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        let path = "/catalog/category/";
        if let Some(CacheValue::Categories(categories)) = self.cache.get(path).await {
            return Ok(categories);
        }

        let listing: Listing<Category> = self.api.get_json(path).await?;
        let categories = Arc::new(listing.into_vec());
        self.cache
            .insert(
                path.to_string(),
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// Transport and backend errors, including 404 for an unknown id.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Arc<Product>, ApiError> {
        let path = format!("/catalog/products/{id}/");
        if let Some(CacheValue::Product(product)) = self.cache.get(&path).await {
            return Ok(product);
        }

        let product: Arc<Product> = Arc::new(self.api.get_json(&path).await?);
        self.cache
            .insert(path, CacheValue::Product(Arc::clone(&product)))
            .await;
        Ok(product)
    }

    /// Drop all cached catalog responses.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
