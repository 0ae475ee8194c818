//! Single check-in attempt executor
//!
//! One call = one attempt against a provider's HTTP API: POST the sign-in
//! endpoint (when the provider has one), interpret the transport and
//! business layers into a flat [`AttemptResult`], then pull the balance
//! snapshot from the user-info endpoint. Escalation across attempts lives
//! in the orchestration core, not here.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::http_client::{truncate_for_log, HttpResponse, HttpTransport};
use crate::waf::is_waf_challenge;

/// Business result code providers report for a successful check-in.
const SUCCESS_RET: i64 = 1;

/// Endpoint paths and header names for one attempt, resolved by the caller.
#[derive(Debug, Clone)]
pub struct AttemptConfig<'a> {
    /// Provider base URL, no trailing slash.
    pub domain: &'a str,
    /// Check-in endpoint; `None` means the provider has no explicit
    /// check-in call and the user-info fetch alone decides the outcome.
    pub sign_in_path: Option<&'a str>,
    /// Endpoint returning the account's quota snapshot.
    pub user_info_path: &'a str,
    /// Name of the header carrying the account's API-user identifier.
    pub api_user_key: &'a str,
}

/// Flat result of one attempt, before status normalization.
///
/// `success` mirrors the provider's business-level signal only; callers
/// apply the already-checked-in override on top of it.
#[derive(Debug, Clone, Default)]
pub struct AttemptResult {
    /// Raw business success flag.
    pub success: bool,
    /// Business message or error text.
    pub message: String,
    /// Remaining quota, when the user-info fetch succeeded.
    pub quota: Option<f64>,
    /// Used quota, when the user-info fetch succeeded.
    pub used_quota: Option<f64>,
    /// The response body carried a WAF challenge signature.
    pub waf_challenge: bool,
}

impl AttemptResult {
    fn failed(message: String) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
struct SignInPayload {
    ret: Option<i64>,
    success: Option<bool>,
    msg: Option<String>,
    message: Option<String>,
}

impl SignInPayload {
    fn is_ok(&self) -> bool {
        self.ret == Some(SUCCESS_RET) || self.success == Some(true)
    }

    fn message(self) -> String {
        self.msg.or(self.message).unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct UserInfoPayload {
    success: Option<bool>,
    msg: Option<String>,
    message: Option<String>,
    data: Option<UserInfoData>,
}

#[derive(Deserialize)]
struct UserInfoData {
    quota: Option<f64>,
    used_quota: Option<f64>,
}

/// Execute one check-in attempt with the given cookies.
///
/// Transport errors never propagate; they come back as a failed
/// [`AttemptResult`] carrying the error text.
pub async fn execute_check_in(
    transport: &dyn HttpTransport,
    provider_name: &str,
    cfg: &AttemptConfig<'_>,
    api_user: &str,
    cookies: &HashMap<String, String>,
) -> AttemptResult {
    let headers = attempt_headers(cfg.api_user_key, api_user);

    let mut result = if let Some(sign_in_path) = cfg.sign_in_path {
        let url = format!("{}{sign_in_path}", cfg.domain);
        match transport.post(provider_name, &url, &headers, cookies).await {
            Ok(response) => interpret_sign_in(provider_name, &response),
            Err(e) => AttemptResult::failed(e.to_string()),
        }
    } else {
        // No explicit check-in call; treated as successful until the
        // user-info fetch says otherwise.
        AttemptResult {
            success: true,
            ..AttemptResult::default()
        }
    };

    if result.success {
        fetch_user_info(
            transport,
            provider_name,
            cfg,
            &headers,
            cookies,
            &mut result,
        )
        .await;
    }

    result
}

fn attempt_headers(api_user_key: &str, api_user: &str) -> HashMap<String, String> {
    let mut headers = HashMap::from([(
        "Content-Type".to_string(),
        "application/json".to_string(),
    )]);
    if !api_user.is_empty() {
        headers.insert(api_user_key.to_string(), api_user.to_string());
    }
    headers
}

/// Failure text for a non-2xx response. A 401/403 is a credential
/// rejection and gets the dedicated error display so the categorizer
/// recognizes it.
fn http_failure_message(provider_name: &str, response: &HttpResponse) -> String {
    if matches!(response.status, 401 | 403) {
        return ProviderError::InvalidCredentials {
            provider: provider_name.to_string(),
            raw_message: Some(truncate_for_log(&response.body)),
        }
        .to_string();
    }
    format!(
        "HTTP {}: {}",
        response.status,
        truncate_for_log(&response.body)
    )
}

/// Interpret the sign-in response: non-2xx is a transport failure, a 2xx
/// body that is not structured data is a parse failure, otherwise the
/// business ok-flag decides.
fn interpret_sign_in(provider_name: &str, response: &HttpResponse) -> AttemptResult {
    if !response.is_success() {
        let mut result =
            AttemptResult::failed(http_failure_message(provider_name, response));
        result.waf_challenge = is_waf_challenge(&response.body);
        return result;
    }

    match serde_json::from_str::<SignInPayload>(&response.body) {
        Ok(payload) => {
            let success = payload.is_ok();
            AttemptResult {
                success,
                message: payload.message(),
                ..AttemptResult::default()
            }
        }
        Err(e) => {
            // WAF interstitials are HTML served with a 2xx status.
            let parse_error = ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            };
            let mut result = AttemptResult::failed(parse_error.to_string());
            result.waf_challenge = is_waf_challenge(&response.body);
            result
        }
    }
}

/// Fetch the quota snapshot. When the provider had an explicit check-in
/// call, a failed fetch keeps the attempt successful without balances;
/// when it did not, the fetch alone decides the outcome.
async fn fetch_user_info(
    transport: &dyn HttpTransport,
    provider_name: &str,
    cfg: &AttemptConfig<'_>,
    headers: &HashMap<String, String>,
    cookies: &HashMap<String, String>,
    result: &mut AttemptResult,
) {
    let decisive = cfg.sign_in_path.is_none();
    let url = format!("{}{}", cfg.domain, cfg.user_info_path);

    let failure = |result: &mut AttemptResult, message: String, waf: bool| {
        if decisive {
            result.success = false;
            result.message = message;
            result.waf_challenge = waf;
        } else {
            log::warn!("[{provider_name}] User info fetch failed: {message}");
        }
    };

    match transport.get(provider_name, &url, headers, cookies).await {
        Ok(response) if response.is_success() => {
            match serde_json::from_str::<UserInfoPayload>(&response.body) {
                Ok(payload) => {
                    if payload.success == Some(false) {
                        let message = payload.msg.or(payload.message).unwrap_or_default();
                        failure(result, message, false);
                        return;
                    }
                    if let Some(data) = payload.data {
                        result.quota = data.quota;
                        result.used_quota = data.used_quota;
                    }
                }
                Err(e) => {
                    let parse_error = ProviderError::ParseError {
                        provider: provider_name.to_string(),
                        detail: e.to_string(),
                    };
                    failure(
                        result,
                        parse_error.to_string(),
                        is_waf_challenge(&response.body),
                    );
                }
            }
        }
        Ok(response) => {
            let message = http_failure_message(provider_name, &response);
            failure(result, message, is_waf_challenge(&response.body));
        }
        Err(e) => failure(result, e.to_string(), false),
    }
}
