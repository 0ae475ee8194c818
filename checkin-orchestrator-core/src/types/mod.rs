//! 核心类型定义

mod account;
mod outcome;
mod provider;

pub use account::{parse_cookies, Account, AuthMethod, CheckinUpdate};
pub use outcome::{BatchSummary, CheckinLogEntry, CheckinOutcome, CheckinStatus, TriggerSource};
pub use provider::{builtin_providers, Provider};
