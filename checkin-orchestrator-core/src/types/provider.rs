//! Provider 相关类型定义

use serde::{Deserialize, Serialize};

/// A check-in provider definition.
///
/// An empty `domain` marks a template provider: the actual domain is
/// supplied per-account. Path and header defaults are applied at
/// construction, never in consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// Unique provider name
    pub name: String,
    /// Base URL, no trailing slash; empty for template providers
    pub domain: String,
    /// Login page path (WAF challenge entry point)
    pub login_path: String,
    /// Explicit check-in endpoint; `None` when the provider has none
    pub sign_in_path: Option<String>,
    /// Endpoint returning the quota snapshot
    pub user_info_path: String,
    /// Name of the header carrying the account's API-user identifier
    pub api_user_key: String,
    /// Anti-bot bypass method tag (e.g. `waf_cookies`); `None` = no bypass
    pub bypass_method: Option<String>,
    /// Ordered list of cookie names required to pass the WAF
    pub waf_cookie_names: Option<Vec<String>>,
    /// Built-in providers are immutable in the CRUD layer
    pub is_builtin: bool,
}

impl Provider {
    /// Create a provider with default paths and header name.
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into().trim_end_matches('/').to_string(),
            login_path: "/login".to_string(),
            sign_in_path: Some("/api/user/sign_in".to_string()),
            user_info_path: "/api/user/self".to_string(),
            api_user_key: "new-api-user".to_string(),
            bypass_method: None,
            waf_cookie_names: None,
            is_builtin: false,
        }
    }

    /// Whether this provider requires bypass credentials: a bypass method is
    /// set AND the required cookie name list is non-empty.
    #[must_use]
    pub fn needs_bypass(&self) -> bool {
        self.bypass_method.is_some()
            && self
                .waf_cookie_names
                .as_ref()
                .is_some_and(|names| !names.is_empty())
    }

    /// Whether the domain is supplied per-account.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.domain.is_empty()
    }
}

/// Built-in provider seed rows.
///
/// These ship with the system and are marked immutable.
#[must_use]
pub fn builtin_providers() -> Vec<Provider> {
    let waf = |provider: Provider, names: &[&str]| Provider {
        bypass_method: Some("waf_cookies".to_string()),
        waf_cookie_names: Some(names.iter().map(ToString::to_string).collect()),
        is_builtin: true,
        ..provider
    };

    vec![
        waf(
            Provider::new("new-api", "https://new-api.example.com"),
            &["acw_tc"],
        ),
        waf(
            Provider::new("anyrouter", "https://anyrouter.top"),
            &["acw_tc", "cdn_sec_tc", "acw_sc__v2"],
        ),
        Provider {
            sign_in_path: None,
            ..waf(
                Provider::new("agentrouter", "https://agentrouter.org"),
                &["acw_tc"],
            )
        },
    ]
}
