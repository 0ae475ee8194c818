//! Browser automation abstract Trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::traits::bypass_cache::CookieMap;

/// Parameters of one full browser login + check-in sequence.
#[derive(Debug, Clone)]
pub struct BrowserCheckinRequest {
    /// Account display name, for logging only
    pub account_name: String,
    /// Resolved base URL, no trailing slash
    pub domain: String,
    /// Login page path
    pub login_path: String,
    /// Login username
    pub username: String,
    /// Login password
    pub password: String,
    /// Endpoint returning the quota snapshot
    pub user_info_path: String,
    /// Explicit check-in endpoint, when the provider has one
    pub sign_in_path: Option<String>,
}

/// Result of one browser login + check-in sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserCheckinResult {
    /// Raw success flag, before status normalization
    pub success: bool,
    /// Remaining quota, when observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<f64>,
    /// Used quota, when observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_quota: Option<f64>,
    /// Business message or error text
    pub message: String,
}

/// Browser automation collaborator Trait
///
/// Both calls are time-bounded and run in an isolated, disposable browser
/// profile per invocation so that fetches never share mutable browser
/// state. Page-level interaction details live behind this trait, outside
/// the orchestration core.
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Visit `login_url`, let the WAF challenge resolve, and collect exactly
    /// the required cookie names.
    ///
    /// Returns `None` when the fetch fails for any reason; the cascade
    /// degrades to a bypass-less attempt instead of failing hard.
    async fn fetch_bypass_cookies(
        &self,
        login_url: &str,
        required_names: &[String],
    ) -> Option<CookieMap>;

    /// Full login + check-in + balance-fetch sequence in one call.
    async fn login_and_checkin(
        &self,
        request: &BrowserCheckinRequest,
    ) -> CoreResult<BrowserCheckinResult>;
}
