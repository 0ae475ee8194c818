//! Provider persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Provider;

/// Provider repository Trait
///
/// Rows come back as fully defaulted [`Provider`] values; path fallbacks
/// are the storage layer's job at construction time.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Get all providers
    async fn find_all(&self) -> CoreResult<Vec<Provider>>;

    /// Get a provider by its unique name
    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Provider>>;
}
