//! Notification dispatch abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;

/// Notifier collaborator Trait
///
/// Fire-and-forget fan-out to operator-configured channels. Channel
/// implementations live in the platform layer; callers log and swallow
/// errors, never propagate them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push one message to all configured channels
    async fn push(&self, title: &str, body: &str) -> CoreResult<()>;
}
