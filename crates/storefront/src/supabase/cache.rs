//! Cache types for data API responses.

use std::sync::Arc;

use yeezy_marketplace_core::Product;

/// Cache key for product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    FeaturedProducts { limit: usize },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
}
