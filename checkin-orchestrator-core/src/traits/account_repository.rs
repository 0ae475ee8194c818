//! Account persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Account, CheckinUpdate};

/// Account repository Trait
///
/// Account CRUD lives in the platform layer; the orchestration core only
/// reads accounts and writes back per-attempt status snapshots.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Get all accounts
    async fn find_all(&self) -> CoreResult<Vec<Account>>;

    /// Get the accounts taking part in batch runs, in stable order
    async fn find_enabled(&self) -> CoreResult<Vec<Account>>;

    /// Get account based on ID
    async fn find_by_id(&self, id: i64) -> CoreResult<Option<Account>>;

    /// Write the status snapshot of one attempt back to the account.
    ///
    /// Balance fields are overwritten only when the update carries them.
    async fn record_checkin(&self, id: i64, update: CheckinUpdate) -> CoreResult<()>;
}
