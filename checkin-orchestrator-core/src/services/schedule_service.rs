//! 定时签到服务 - cron 调度
//!
//! One background task sleeps until the next cron fire time, runs a
//! scheduled batch, and loops. Rescheduling swaps the parsed expression
//! and wakes the task so the new plan takes effect immediately.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;

use crate::error::{CoreError, CoreResult};
use crate::services::{BatchService, ServiceContext};
use crate::types::TriggerSource;

/// Settings key holding the active cron expression.
pub const CRON_SETTING_KEY: &str = "cron_expression";

/// Fallback when no expression is stored: every 6 hours, on the hour.
pub const DEFAULT_CRON: &str = "0 */6 * * *";

/// A validated five-field cron expression.
///
/// Stored and displayed in the conventional five-field form; the parser
/// wants a seconds field, so fires always happen at second zero.
#[derive(Debug, Clone)]
pub struct CronSpec {
    expression: String,
    schedule: Schedule,
}

impl CronSpec {
    /// Parse and validate a five-field cron expression.
    pub fn parse(expression: &str) -> CoreResult<Self> {
        let trimmed = expression.trim();
        if trimmed.split_whitespace().count() != 5 {
            return Err(CoreError::ValidationError(format!(
                "cron expression must have 5 fields: \"{trimmed}\""
            )));
        }
        let schedule = Schedule::from_str(&format!("0 {trimmed}")).map_err(|e| {
            CoreError::ValidationError(format!("invalid cron expression \"{trimmed}\": {e}"))
        })?;
        Ok(Self {
            expression: trimmed.to_string(),
            schedule,
        })
    }

    /// The five-field expression as stored.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next fire time strictly after `after`.
    #[must_use]
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

/// 定时签到服务
pub struct ScheduleService {
    ctx: Arc<ServiceContext>,
    batch: Arc<BatchService>,
    spec: Arc<RwLock<CronSpec>>,
    rescheduled: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduleService {
    /// Create the service with the default schedule. The stored expression
    /// is loaded on [`start`](Self::start).
    pub fn new(ctx: Arc<ServiceContext>, batch: Arc<BatchService>) -> CoreResult<Self> {
        Ok(Self {
            ctx,
            batch,
            spec: Arc::new(RwLock::new(CronSpec::parse(DEFAULT_CRON)?)),
            rescheduled: Arc::new(Notify::new()),
            task: Mutex::new(None),
        })
    }

    /// Load the persisted expression and spawn the scheduler loop,
    /// replacing any previous loop.
    ///
    /// An unparsable stored expression falls back to the default instead
    /// of refusing to start.
    pub async fn start(&self) -> CoreResult<()> {
        let stored = self.ctx.settings.get(CRON_SETTING_KEY).await?;
        let expression = stored.unwrap_or_else(|| DEFAULT_CRON.to_string());
        let spec = match CronSpec::parse(&expression) {
            Ok(spec) => spec,
            Err(e) => {
                log::warn!("Stored cron expression rejected, using default: {e}");
                CronSpec::parse(DEFAULT_CRON)?
            }
        };
        log::info!("Starting check-in scheduler with cron \"{}\"", spec.expression());
        *self.spec.write().await = spec;

        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(tokio::spawn(run_loop(
            Arc::clone(&self.ctx),
            Arc::clone(&self.batch),
            Arc::clone(&self.spec),
            Arc::clone(&self.rescheduled),
        )));
        Ok(())
    }

    /// Validate a new expression, persist it, and wake the loop.
    ///
    /// On a validation error nothing is persisted and the previous
    /// schedule stays active.
    pub async fn reschedule(&self, expression: &str) -> CoreResult<()> {
        let spec = CronSpec::parse(expression)?;
        self.ctx
            .settings
            .set(CRON_SETTING_KEY, spec.expression())
            .await?;
        log::info!("Rescheduled check-in job with cron \"{}\"", spec.expression());
        *self.spec.write().await = spec;
        self.rescheduled.notify_waiters();
        Ok(())
    }

    /// The currently active expression.
    pub async fn current_expression(&self) -> String {
        self.spec.read().await.expression().to_string()
    }

    /// Next fire time under the active schedule.
    pub async fn next_run_time(&self) -> Option<DateTime<Utc>> {
        self.spec.read().await.next_after(Utc::now())
    }

    /// Stop the scheduler loop, if running.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            log::info!("Check-in scheduler stopped");
        }
    }
}

async fn run_loop(
    ctx: Arc<ServiceContext>,
    batch: Arc<BatchService>,
    spec: Arc<RwLock<CronSpec>>,
    rescheduled: Arc<Notify>,
) {
    loop {
        let next = spec.read().await.next_after(Utc::now());
        let Some(next) = next else {
            log::warn!("Cron schedule has no future fire time, waiting for reschedule");
            rescheduled.notified().await;
            continue;
        };

        let delay = (next - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            () = tokio::time::sleep(delay) => {
                log::info!("Scheduled check-in triggered");
                match ctx.bypass_cache.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => {
                        log::info!("Removed {removed} expired bypass cookie entries");
                    }
                    Err(e) => log::warn!("Bypass cookie cleanup failed: {e}"),
                }
                match batch.run_batch(TriggerSource::Schedule).await {
                    Ok(summary) => log::info!(
                        "Scheduled batch finished: {}/{} succeeded",
                        summary.succeeded,
                        summary.total
                    ),
                    Err(e) => log::error!("Scheduled batch failed: {e}"),
                }
            }
            // A reschedule swapped the expression; recompute the fire time.
            () = rescheduled.notified() => {}
        }
    }
}
