//! 批量签到服务 - 单飞调度
//!
//! Runs every enabled account sequentially under one in-process lock, so
//! a manual trigger and the cron job can never interleave; the later
//! caller waits and then runs a full batch of its own.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::services::checkin_service::{truncate_message, CheckinService};
use crate::services::ServiceContext;
use crate::types::{
    Account, BatchSummary, CheckinLogEntry, CheckinStatus, CheckinUpdate, TriggerSource,
};

/// 批量签到服务
pub struct BatchService {
    ctx: Arc<ServiceContext>,
    checkin: CheckinService,
    batch_lock: Mutex<()>,
}

impl BatchService {
    /// 创建批量签到服务
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            checkin: CheckinService::new(Arc::clone(&ctx)),
            ctx,
            batch_lock: Mutex::new(()),
        }
    }

    /// The single-account service, for operator-triggered individual runs.
    #[must_use]
    pub fn checkin(&self) -> &CheckinService {
        &self.checkin
    }

    /// Run one batch over all enabled accounts.
    ///
    /// One account's failure never stops the batch: errors out of the
    /// cascade are converted to failed log entries and tallied. `Err` here
    /// means the batch could not start at all.
    pub async fn run_batch(&self, triggered_by: TriggerSource) -> CoreResult<BatchSummary> {
        let _guard = self.batch_lock.lock().await;

        let accounts = self.ctx.account_repository.find_enabled().await?;
        if accounts.is_empty() {
            log::info!("No enabled accounts, skipping batch");
            return Ok(BatchSummary::default());
        }

        log::info!(
            "Starting check-in batch for {} accounts ({})",
            accounts.len(),
            triggered_by.as_str()
        );

        let mut summary = BatchSummary {
            total: accounts.len(),
            ..BatchSummary::default()
        };

        for account in &accounts {
            match self.checkin.run_account(account, triggered_by).await {
                Ok(outcome) => {
                    if outcome.status.is_success_like() {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    if e.is_expected() {
                        log::warn!("Check-in error for account \"{}\": {e}", account.name);
                    } else {
                        log::error!("Check-in error for account \"{}\": {e}", account.name);
                    }
                    self.record_cascade_error(account, triggered_by, &e).await;
                }
            }
        }

        log::info!(
            "Check-in batch completed: success={}, failed={}, total={}",
            summary.succeeded,
            summary.failed,
            summary.total
        );

        if summary.failed > 0 {
            self.notify_summary(&summary).await;
        }

        Ok(summary)
    }

    /// Safety net for errors the cascade could not absorb (storage
    /// failures): best-effort log entry and status snapshot, so the
    /// account still shows up in history.
    async fn record_cascade_error(
        &self,
        account: &Account,
        triggered_by: TriggerSource,
        error: &CoreError,
    ) {
        let message = truncate_message(&error.to_string());
        let now = Utc::now();

        if let Err(log_error) = self
            .ctx
            .log_repository
            .append(CheckinLogEntry {
                account_id: account.id,
                account_name: account.name.clone(),
                provider: account.provider.clone(),
                status: CheckinStatus::Failed,
                balance: None,
                used_quota: None,
                message,
                triggered_by,
                created_at: now,
            })
            .await
        {
            log::warn!(
                "Failed to log check-in error for account \"{}\": {log_error}",
                account.name
            );
        }

        if let Err(update_error) = self
            .ctx
            .account_repository
            .record_checkin(
                account.id,
                CheckinUpdate {
                    last_checkin: now,
                    last_status: CheckinStatus::Failed,
                    last_balance: None,
                    last_used: None,
                },
            )
            .await
        {
            log::warn!(
                "Failed to update status for account \"{}\": {update_error}",
                account.name
            );
        }
    }

    /// Aggregate notification, only when something failed. Dispatch errors
    /// are logged and swallowed.
    async fn notify_summary(&self, summary: &BatchSummary) {
        let body = format!(
            "Check-in completed: {}/{} succeeded",
            summary.succeeded, summary.total
        );
        if let Err(e) = self.ctx.notifier.push("Check-in report", &body).await {
            log::warn!("Notification dispatch failed: {e}");
        }
    }
}
