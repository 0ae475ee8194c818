//! Settings persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;

/// String-keyed settings store Trait
///
/// Holds small operator-editable values; the core only uses it for the
/// active cron expression.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Get a setting value
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Set a setting value (upsert)
    async fn set(&self, key: &str, value: &str) -> CoreResult<()>;
}
