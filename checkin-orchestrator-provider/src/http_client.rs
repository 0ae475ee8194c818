//! HTTP transport abstraction
//!
//! The orchestration core never talks to `reqwest` directly; it goes through
//! the [`HttpTransport`] trait so tests can substitute a scripted transport.
//! The real implementation handles cookie-map assembly, timeouts and
//! error mapping in one place.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use crate::error::{ProviderError, Result};

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent presented to providers. Matches a plain desktop browser so the
/// check-in endpoint sees the same identity as the bypass-cookie fetch.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Maximum length of a response body fragment embedded in logs.
const LOG_BODY_LIMIT: usize = 500;

/// A raw HTTP response: status code plus body text.
///
/// Body interpretation (structured payload vs. raw text) is left to the
/// caller; WAF interstitials are frequently HTML with a 2xx status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP collaborator consumed by the check-in attempt executor.
///
/// Both methods carry an arbitrary header map (including the per-provider
/// API-user identity header) and a cookie map sent as a `Cookie` header.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST to `url` with the given headers and cookies.
    async fn post(
        &self,
        provider_name: &str,
        url: &str,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> Result<HttpResponse>;

    /// GET `url` with the given headers and cookies.
    async fn get(
        &self,
        provider_name: &str,
        url: &str,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default 30 s timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    fn apply(
        &self,
        builder: RequestBuilder,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> RequestBuilder {
        let mut builder = builder
            .timeout(self.timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !cookies.is_empty() {
            builder = builder.header(reqwest::header::COOKIE, cookie_header(cookies));
        }
        builder
    }

    async fn execute(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url: &str,
    ) -> Result<HttpResponse> {
        log::debug!("[{provider_name}] {method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status}");

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!("[{provider_name}] Response Body: {}", truncate_for_log(&body));

        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(
        &self,
        provider_name: &str,
        url: &str,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        let builder = self.apply(self.client.post(url), headers, cookies);
        Self::execute(builder, provider_name, "POST", url).await
    }

    async fn get(
        &self,
        provider_name: &str,
        url: &str,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> Result<HttpResponse> {
        let builder = self.apply(self.client.get(url), headers, cookies);
        Self::execute(builder, provider_name, "GET", url).await
    }
}

/// Assemble a `Cookie` header value from a cookie map.
///
/// Order is sorted by name so the output is deterministic.
#[must_use]
pub fn cookie_header(cookies: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = cookies.iter().collect();
    pairs.sort_by_key(|(name, _)| name.as_str());
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Truncate a response body for log output.
#[must_use]
pub fn truncate_for_log(text: &str) -> String {
    match text.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...(truncated)", &text[..idx]),
        None => text.to_string(),
    }
}
