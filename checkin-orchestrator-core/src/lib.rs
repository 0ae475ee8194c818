//! Check-in Orchestrator Core Library
//!
//! Provides core business logic for automated provider check-ins, including:
//! - Single-account check-in with the WAF bypass retry cascade (Checkin Service)
//! - Sequential single-flight batch runs (Batch Service)
//! - Cron-driven scheduling (Schedule Service)
//!
//! This library is designed to be platform-independent, abstracting the storage
//! layer, browser automation and notification dispatch through traits.

pub mod classify;
pub mod error;
pub mod failure_reason;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult, ProviderError};
pub use services::{BatchService, CheckinService, ScheduleService, ServiceContext};
pub use traits::{
    AccountRepository, BrowserAutomation, BypassCookieCache, CheckinLogRepository, Notifier,
    ProviderRepository, SettingsStore,
};
