//! 账户相关类型定义

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::CheckinStatus;

/// How an account authenticates against its provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Present stored cookies plus the API-user header
    Cookie,
    /// Full browser login with username/password
    BrowserLogin,
}

/// An account enrolled for automated check-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: i64,
    /// Display name
    pub name: String,
    /// Provider name (foreign key)
    pub provider: String,
    /// Authentication method
    pub auth_method: AuthMethod,
    /// Session cookies (cookie accounts); persisted as serialized text by
    /// the storage layer
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    /// API-user identifier sent in the provider's identity header
    #[serde(default)]
    pub api_user: String,
    /// Login username (browser accounts)
    #[serde(default)]
    pub username: String,
    /// Login password (browser accounts)
    #[serde(default)]
    pub password: String,
    /// Domain override, used when the linked provider is a template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether the account takes part in batch runs
    pub enabled: bool,
    /// Timestamp of the last attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<DateTime<Utc>>,
    /// Status of the last attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<CheckinStatus>,
    /// Last observed balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_balance: Option<f64>,
    /// Last observed used quota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<f64>,
}

impl Account {
    /// Create an enabled cookie-auth account with empty credentials.
    pub fn new(id: i64, name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            provider: provider.into(),
            auth_method: AuthMethod::Cookie,
            cookies: HashMap::new(),
            api_user: String::new(),
            username: String::new(),
            password: String::new(),
            domain: None,
            enabled: true,
            last_checkin: None,
            last_status: None,
            last_balance: None,
            last_used: None,
        }
    }

    /// Account-level domain override, trimmed; `None` when empty.
    #[must_use]
    pub fn domain_override(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(|d| d.trim_end_matches('/'))
            .filter(|d| !d.is_empty())
    }
}

/// Status snapshot written back to an account after one attempt.
///
/// Balance fields are only overwritten when the outcome carried them.
#[derive(Debug, Clone)]
pub struct CheckinUpdate {
    /// Attempt timestamp
    pub last_checkin: DateTime<Utc>,
    /// Final normalized status
    pub last_status: CheckinStatus,
    /// New balance, when observed
    pub last_balance: Option<f64>,
    /// New used quota, when observed
    pub last_used: Option<f64>,
}

/// Parse stored cookie text into a map.
///
/// Accepts a JSON object (the persisted form) or a raw `Cookie` header
/// string (`name=value; name2=value2`), which is what operators paste in.
#[must_use]
pub fn parse_cookies(raw: &str) -> HashMap<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return HashMap::new();
    }

    if let Ok(map) = serde_json::from_str::<HashMap<String, String>>(trimmed) {
        return map;
    }

    trimmed
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
