//! Failure reason categorization for check-in logs
//!
//! A pure keyword classifier mapping a normalized status plus free-text
//! message to a stable diagnostic category. Buckets are tested in a fixed
//! priority order, so a message matching several buckets lands in the
//! highest-priority one.

use serde::{Deserialize, Serialize};

use crate::classify::is_already_checked_in_message;
use crate::types::CheckinStatus;

/// Stable diagnostic category of a check-in result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The check-in succeeded
    Success,
    /// Daily no-op: the account had already checked in
    AlreadyCheckedIn,
    /// Credentials rejected (expired cookies, bad API user, …)
    AuthFailed,
    /// Blocked by anti-bot mitigation
    WafBlocked,
    /// Connectivity problem between orchestrator and provider
    NetworkError,
    /// Local misconfiguration (missing provider, bad URL, …)
    ConfigError,
    /// The provider itself errored (5xx and friends)
    UpstreamError,
    /// Nothing matched
    UnknownError,
}

/// Static display metadata for a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    /// Short human-readable label
    pub label: &'static str,
    /// Suggested operator action
    pub hint: &'static str,
    /// Whether operator action is likely to fix recurrences
    pub actionable: bool,
}

const AUTH_FAILED_KEYWORDS: &[&str] = &[
    "auth failed",
    "authentication",
    "unauthorized",
    "invalid api user",
    "invalid token",
    "invalid credentials",
    "cookie expired",
    "凭据",
    "认证失败",
    "cookie 过期",
    "api user",
];

const WAF_BLOCKED_KEYWORDS: &[&str] = &[
    "waf",
    "cloudflare",
    "cf_chl",
    "missing waf cookies",
    "challenge",
    "反爬",
    "风控",
];

const NETWORK_ERROR_KEYWORDS: &[&str] = &[
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "temporary failure in name resolution",
    "failed to establish a new connection",
    "无法连接",
    "连接超时",
    "网络错误",
    "dns",
];

const CONFIG_ERROR_KEYWORDS: &[&str] = &[
    "provider not found",
    "invalid url",
    "域名格式",
    "配置错误",
    "json",
];

const UPSTREAM_ERROR_KEYWORDS: &[&str] = &[
    "http 5",
    "upstream",
    "bad gateway",
    "service unavailable",
    "internal server error",
];

/// Keyword buckets in match priority order. Auth outranks WAF outranks
/// network: a message mentioning both an expired cookie and a challenge
/// timeout is an auth problem first.
const BUCKETS: &[(FailureCategory, &[&str])] = &[
    (FailureCategory::AuthFailed, AUTH_FAILED_KEYWORDS),
    (FailureCategory::WafBlocked, WAF_BLOCKED_KEYWORDS),
    (FailureCategory::NetworkError, NETWORK_ERROR_KEYWORDS),
    (FailureCategory::ConfigError, CONFIG_ERROR_KEYWORDS),
    (FailureCategory::UpstreamError, UPSTREAM_ERROR_KEYWORDS),
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Categorize a check-in result into a stable diagnostic category.
#[must_use]
pub fn categorize(status: CheckinStatus, message: &str) -> FailureCategory {
    if status == CheckinStatus::Success {
        return FailureCategory::Success;
    }
    if status == CheckinStatus::AlreadyCheckedIn || is_already_checked_in_message(message) {
        return FailureCategory::AlreadyCheckedIn;
    }

    let text = message.trim().to_lowercase();
    for (category, keywords) in BUCKETS {
        if contains_any(&text, keywords) {
            return *category;
        }
    }
    FailureCategory::UnknownError
}

impl FailureCategory {
    /// Display metadata: label, operator hint, whether operator action
    /// is likely to help.
    #[must_use]
    pub fn info(self) -> CategoryInfo {
        match self {
            Self::Success => CategoryInfo {
                label: "Success",
                hint: "No action needed",
                actionable: false,
            },
            Self::AlreadyCheckedIn => CategoryInfo {
                label: "Already checked in",
                hint: "No action needed; today's check-in already happened",
                actionable: false,
            },
            Self::AuthFailed => CategoryInfo {
                label: "Authentication failed",
                hint: "Refresh the account's cookies or API user identifier",
                actionable: true,
            },
            Self::WafBlocked => CategoryInfo {
                label: "Blocked by WAF",
                hint: "Bypass cookies are stale or insufficient; a fresh browser fetch may help",
                actionable: true,
            },
            Self::NetworkError => CategoryInfo {
                label: "Network error",
                hint: "Transient connectivity problem; usually resolves on the next run",
                actionable: false,
            },
            Self::ConfigError => CategoryInfo {
                label: "Configuration error",
                hint: "Check the provider definition and account domain settings",
                actionable: true,
            },
            Self::UpstreamError => CategoryInfo {
                label: "Provider error",
                hint: "The provider is having problems; retry later",
                actionable: false,
            },
            Self::UnknownError => CategoryInfo {
                label: "Unknown error",
                hint: "Inspect the log message for details",
                actionable: false,
            },
        }
    }
}
