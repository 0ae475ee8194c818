//! # checkin-orchestrator-provider
//!
//! Transport layer for the check-in orchestrator: a reusable HTTP client
//! abstraction, the single-attempt executor, and WAF challenge signature
//! detection.
//!
//! The crate deliberately knows nothing about accounts, caching or retry
//! policy — one call maps to one attempt, and every failure mode comes back
//! as data ([`AttemptResult`] or [`ProviderError`]) for the orchestration
//! core to inspect.
//!
//! ## TLS Backend
//!
//! - **`native-tls`** *(default)* — Use the platform's native TLS
//!   implementation.
//! - **`rustls`** — Use rustls. Recommended for cross-compilation.

mod checkin;
mod error;
mod http_client;
mod waf;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export the attempt executor
pub use checkin::{execute_check_in, AttemptConfig, AttemptResult};

// Re-export the transport abstraction
pub use http_client::{
    cookie_header, truncate_for_log, HttpResponse, HttpTransport, ReqwestTransport, USER_AGENT,
};

// Re-export challenge detection
pub use waf::is_waf_challenge;
