//! 单账户签到服务 - 重试级联
//!
//! Runs one account end to end: resolve the provider and domain, acquire
//! bypass credentials, execute the attempt, and escalate through the
//! cookie tiers (cached → fresh → no bypass) until one succeeds or all
//! are exhausted. Exactly one log entry is written per run, whatever the
//! number of internal attempts.

use std::sync::Arc;

use checkin_orchestrator_provider::{
    execute_check_in, is_waf_challenge, AttemptConfig,
};
use chrono::Utc;

use crate::classify::normalize_status;
use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{BrowserCheckinRequest, CookieMap};
use crate::types::{
    Account, AuthMethod, CheckinLogEntry, CheckinOutcome, CheckinStatus, CheckinUpdate,
    Provider, TriggerSource,
};

/// Longest message persisted to logs and account snapshots.
const MESSAGE_LIMIT: usize = 200;

const HINT_COOKIES_REFRESHED: &str = "WAF cookies refreshed successfully";
const HINT_BYPASS_UNNEEDED: &str =
    "Check-in succeeded without WAF bypass; consider disabling bypass for this provider";

/// Resolve the base URL for an attempt.
///
/// A fixed provider domain always wins; the account-level override only
/// applies to template providers. `None` means a template provider with
/// no override, which is a terminal configuration failure.
#[must_use]
pub fn resolve_domain(provider: &Provider, account: &Account) -> Option<String> {
    if !provider.is_template() {
        return Some(provider.domain.clone());
    }
    account.domain_override().map(str::to_string)
}

/// Bypass cookie cache key for this provider/account pairing.
///
/// Accounts on the same fixed-domain provider share one entry; an
/// account-level domain override gets its own entry per domain.
#[must_use]
pub fn cache_key(provider: &Provider, account: &Account) -> String {
    match account.domain_override() {
        Some(domain) => format!("{}:{domain}", provider.name),
        None => provider.name.clone(),
    }
}

/// Truncate a message to the persisted limit, on a char boundary.
#[must_use]
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MESSAGE_LIMIT {
        message.to_string()
    } else {
        message.chars().take(MESSAGE_LIMIT).collect()
    }
}

/// Bypass cookies merged under the account's own session cookies; on a
/// name collision the account cookie wins.
fn merge_cookies(bypass: &CookieMap, account_cookies: &CookieMap) -> CookieMap {
    let mut merged = bypass.clone();
    merged.extend(
        account_cookies
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    merged
}

fn default_message(status: CheckinStatus, balance: Option<f64>, used: Option<f64>) -> String {
    match status {
        CheckinStatus::AlreadyCheckedIn => "Already checked in today".to_string(),
        CheckinStatus::Failed => "Check-in failed (WAF bypass or request error)".to_string(),
        CheckinStatus::Success => match (balance, used) {
            (Some(balance), Some(used)) => format!("Balance: ${balance}, Used: ${used}"),
            (Some(balance), None) => format!("Balance: ${balance}"),
            _ => "Check-in succeeded".to_string(),
        },
    }
}

/// 单账户签到服务
pub struct CheckinService {
    ctx: Arc<ServiceContext>,
}

impl CheckinService {
    /// 创建签到服务
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Run one account's check-in to completion.
    ///
    /// Configuration problems (unknown provider, unresolvable domain) come
    /// back as failed outcomes, not errors; `Err` is reserved for storage
    /// failures the caller's safety net has to handle.
    pub async fn run_account(
        &self,
        account: &Account,
        triggered_by: TriggerSource,
    ) -> CoreResult<CheckinOutcome> {
        log::info!(
            "Starting check-in for account \"{}\" ({})",
            account.name,
            triggered_by.as_str()
        );

        let Some(provider) = self
            .ctx
            .provider_repository
            .find_by_name(&account.provider)
            .await?
        else {
            let message = CoreError::ProviderNotFound(account.provider.clone()).to_string();
            return self.record_terminal_failure(account, triggered_by, message).await;
        };

        let Some(domain) = resolve_domain(&provider, account) else {
            let message = CoreError::DomainUnresolved(provider.name.clone()).to_string();
            return self.record_terminal_failure(account, triggered_by, message).await;
        };

        match account.auth_method {
            AuthMethod::BrowserLogin => {
                self.run_browser_checkin(account, &provider, &domain, triggered_by)
                    .await
            }
            AuthMethod::Cookie => {
                self.run_cookie_cascade(account, &provider, &domain, triggered_by)
                    .await
            }
        }
    }

    /// Cookie-auth path: attempt with escalating cookie tiers.
    async fn run_cookie_cascade(
        &self,
        account: &Account,
        provider: &Provider,
        domain: &str,
        triggered_by: TriggerSource,
    ) -> CoreResult<CheckinOutcome> {
        let cfg = AttemptConfig {
            domain,
            sign_in_path: provider.sign_in_path.as_deref(),
            user_info_path: &provider.user_info_path,
            api_user_key: &provider.api_user_key,
        };
        let transport = self.ctx.transport.as_ref();
        let needs_bypass = provider.needs_bypass();
        let key = cache_key(provider, account);
        let login_url = format!("{domain}{}", provider.login_path);
        let required = provider.waf_cookie_names.clone().unwrap_or_default();

        // Tier 1: cached (or freshly fetched) bypass cookies merged with
        // the account's own. A failed fetch degrades to a plain attempt.
        let first_cookies = if needs_bypass {
            match self
                .acquire_bypass_cookies(&account.name, &key, &login_url, &required)
                .await
            {
                Some(bypass) => merge_cookies(&bypass, &account.cookies),
                None => {
                    log::warn!(
                        "Account \"{}\": bypass cookie fetch failed, attempting without bypass",
                        account.name
                    );
                    account.cookies.clone()
                }
            }
        } else {
            account.cookies.clone()
        };

        let mut attempt =
            execute_check_in(transport, &provider.name, &cfg, &account.api_user, &first_cookies)
                .await;
        let (mut status, mut success) = normalize_status(attempt.success, &attempt.message);
        let mut hint: Option<&str> = None;

        // Tier 2: the response was a WAF challenge, so the cached cookies
        // are stale. Invalidate, fetch fresh ones, and retry once.
        if !success
            && needs_bypass
            && (attempt.waf_challenge || is_waf_challenge(&attempt.message))
        {
            log::info!(
                "Account \"{}\": WAF challenge detected, refreshing bypass cookies",
                account.name
            );
            if let Err(e) = self.ctx.bypass_cache.invalidate(&key).await {
                log::warn!(
                    "Account \"{}\": bypass cookie invalidation failed: {e}",
                    account.name
                );
            }
            if let Some(fresh) = self
                .ctx
                .browser
                .fetch_bypass_cookies(&login_url, &required)
                .await
            {
                if let Err(e) = self.ctx.bypass_cache.store(&key, &fresh).await {
                    log::warn!(
                        "Account \"{}\": bypass cookie caching failed: {e}",
                        account.name
                    );
                }
                let merged = merge_cookies(&fresh, &account.cookies);
                attempt =
                    execute_check_in(transport, &provider.name, &cfg, &account.api_user, &merged)
                        .await;
                (status, success) = normalize_status(attempt.success, &attempt.message);
                if success {
                    hint = Some(HINT_COOKIES_REFRESHED);
                }
            }
        }

        // Tier 3: bypass did not help; last resort is the account's own
        // cookies alone, even when the first attempt already ran without
        // bypass (the failure may have been transient).
        if !success && needs_bypass {
            log::info!("Account \"{}\": retrying without WAF bypass", account.name);
            attempt = execute_check_in(
                transport,
                &provider.name,
                &cfg,
                &account.api_user,
                &account.cookies,
            )
            .await;
            (status, success) = normalize_status(attempt.success, &attempt.message);
            if success {
                hint = Some(HINT_BYPASS_UNNEEDED);
            }
        }

        // Balances from a failed final attempt are never trusted.
        let balance = if attempt.success { attempt.quota } else { None };
        let used = if attempt.success { attempt.used_quota } else { None };

        let mut message = if attempt.message.is_empty() {
            default_message(status, balance, used)
        } else {
            truncate_message(&attempt.message)
        };
        if let Some(hint) = hint {
            message = format!("{message} | {hint}");
        }

        self.finish(account, triggered_by, status, success, message, balance, used)
            .await
    }

    /// Browser-auth path: the whole sequence runs behind the automation
    /// trait; only normalization and persistence happen here.
    async fn run_browser_checkin(
        &self,
        account: &Account,
        provider: &Provider,
        domain: &str,
        triggered_by: TriggerSource,
    ) -> CoreResult<CheckinOutcome> {
        let request = BrowserCheckinRequest {
            account_name: account.name.clone(),
            domain: domain.to_string(),
            login_path: provider.login_path.clone(),
            username: account.username.clone(),
            password: account.password.clone(),
            user_info_path: provider.user_info_path.clone(),
            sign_in_path: provider.sign_in_path.clone(),
        };

        match self.ctx.browser.login_and_checkin(&request).await {
            Ok(result) => {
                let (status, success) = normalize_status(result.success, &result.message);
                let message = if result.message.is_empty() {
                    default_message(status, result.quota, result.used_quota)
                } else {
                    truncate_message(&result.message)
                };
                self.finish(
                    account,
                    triggered_by,
                    status,
                    success,
                    message,
                    result.quota,
                    result.used_quota,
                )
                .await
            }
            Err(e) => {
                let message = truncate_message(&e.to_string());
                self.finish(
                    account,
                    triggered_by,
                    CheckinStatus::Failed,
                    false,
                    message,
                    None,
                    None,
                )
                .await
            }
        }
    }

    /// Cache-first bypass cookie acquisition. `None` means the browser
    /// fetch failed; cache errors only cost the cache, never the run.
    async fn acquire_bypass_cookies(
        &self,
        account_name: &str,
        key: &str,
        login_url: &str,
        required: &[String],
    ) -> Option<CookieMap> {
        match self.ctx.bypass_cache.lookup(key).await {
            Ok(Some(cached)) => {
                log::info!("Account \"{account_name}\": using cached bypass cookies ({key})");
                return Some(cached);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Account \"{account_name}\": bypass cookie cache lookup failed: {e}");
            }
        }

        log::info!(
            "Account \"{account_name}\": no cached bypass cookies, launching browser ({key})"
        );
        let fetched = self
            .ctx
            .browser
            .fetch_bypass_cookies(login_url, required)
            .await?;
        if let Err(e) = self.ctx.bypass_cache.store(key, &fetched).await {
            log::warn!("Account \"{account_name}\": bypass cookie caching failed: {e}");
        }
        Some(fetched)
    }

    /// Configuration failure before any attempt: one log entry, no account
    /// status update.
    async fn record_terminal_failure(
        &self,
        account: &Account,
        triggered_by: TriggerSource,
        message: String,
    ) -> CoreResult<CheckinOutcome> {
        log::warn!("Check-in aborted for account \"{}\": {message}", account.name);
        self.append_log(account, triggered_by, CheckinStatus::Failed, None, None, &message)
            .await?;
        Ok(CheckinOutcome::failed(message))
    }

    /// Persist the final outcome: account snapshot plus one log entry.
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        account: &Account,
        triggered_by: TriggerSource,
        status: CheckinStatus,
        success: bool,
        message: String,
        balance: Option<f64>,
        used: Option<f64>,
    ) -> CoreResult<CheckinOutcome> {
        self.ctx
            .account_repository
            .record_checkin(
                account.id,
                CheckinUpdate {
                    last_checkin: Utc::now(),
                    last_status: status,
                    last_balance: balance,
                    last_used: used,
                },
            )
            .await?;
        self.append_log(account, triggered_by, status, balance, used, &message)
            .await?;

        if success {
            log::info!(
                "Check-in finished for account \"{}\": {} - {message}",
                account.name,
                status
            );
        } else {
            log::warn!(
                "Check-in failed for account \"{}\": {message}",
                account.name
            );
        }

        Ok(CheckinOutcome {
            success,
            status,
            message,
            balance,
            used_quota: used,
        })
    }

    async fn append_log(
        &self,
        account: &Account,
        triggered_by: TriggerSource,
        status: CheckinStatus,
        balance: Option<f64>,
        used: Option<f64>,
        message: &str,
    ) -> CoreResult<()> {
        self.ctx
            .log_repository
            .append(CheckinLogEntry {
                account_id: account.id,
                account_name: account.name.clone(),
                provider: account.provider.clone(),
                status,
                balance,
                used_quota: used,
                message: message.to_string(),
                triggered_by,
                created_at: Utc::now(),
            })
            .await
    }
}
