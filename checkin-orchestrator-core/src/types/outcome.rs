//! 签到结果与日志类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical status of one check-in attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckinStatus {
    /// The provider accepted the check-in
    Success,
    /// The provider reported today's check-in already happened
    AlreadyCheckedIn,
    /// The attempt failed
    Failed,
}

impl CheckinStatus {
    /// Success and already-checked-in both count as a good outcome for
    /// batch tallies.
    #[must_use]
    pub fn is_success_like(self) -> bool {
        matches!(self, Self::Success | Self::AlreadyCheckedIn)
    }

    /// Stable snake_case label, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CheckinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final normalized outcome of one account's check-in for one run.
///
/// Invariant: `status == AlreadyCheckedIn` implies `success`, regardless of
/// the raw upstream flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinOutcome {
    /// Whether the outcome counts as successful
    pub success: bool,
    /// Canonical status
    pub status: CheckinStatus,
    /// Human-readable message, advisory hints included
    pub message: String,
    /// Observed balance, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    /// Observed used quota, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_quota: Option<f64>,
}

impl CheckinOutcome {
    /// A failed outcome with the given message and no balances.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: CheckinStatus::Failed,
            message: message.into(),
            balance: None,
            used_quota: None,
        }
    }
}

/// What triggered a batch run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Operator-initiated
    Manual,
    /// Cron-driven
    Schedule,
}

impl TriggerSource {
    /// Stable snake_case label, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Schedule => "schedule",
        }
    }
}

/// Immutable append-only record of one attempt.
///
/// Exactly one entry per account per batch run; cascade-internal retries
/// never produce extra entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinLogEntry {
    /// Account ID
    pub account_id: i64,
    /// Account display name at the time of the attempt
    pub account_name: String,
    /// Provider name
    pub provider: String,
    /// Final normalized status
    pub status: CheckinStatus,
    /// Balance snapshot, when observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    /// Used-quota snapshot, when observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_quota: Option<f64>,
    /// Message, advisory hints included
    pub message: String,
    /// What triggered the run
    pub triggered_by: TriggerSource,
    /// Entry timestamp
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    /// Accounts processed
    pub total: usize,
    /// Success-like outcomes (success + already checked in)
    pub succeeded: usize,
    /// Failed outcomes
    pub failed: usize,
}
