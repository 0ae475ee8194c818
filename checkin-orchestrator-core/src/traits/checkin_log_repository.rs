//! Check-in log persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::CheckinLogEntry;

/// Append-only check-in log Trait
///
/// The cascade appends exactly one entry per account per batch run.
/// Querying and pagination live in the platform layer.
#[async_trait]
pub trait CheckinLogRepository: Send + Sync {
    /// Append one log entry
    async fn append(&self, entry: CheckinLogEntry) -> CoreResult<()>;
}
