//! WAF challenge signature detection
//!
//! Providers behind bot mitigation answer blocked requests with an
//! interstitial page instead of the business payload. Detection is a plain
//! case-insensitive substring scan; signatures cover Aliyun WAF cookie
//! markers and Cloudflare challenge pages.

/// Signatures that identify an anti-bot challenge response or message.
const CHALLENGE_SIGNATURES: &[&str] = &[
    "waf",
    "challenge",
    "acw_sc",
    "cf_chl",
    "cdn_sec",
    "just a moment",
    "verify you are human",
    "checking your browser",
    "请开启 javascript",
];

/// Whether the given response body or outcome message looks like a WAF
/// challenge rather than a business response.
#[must_use]
pub fn is_waf_challenge(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    CHALLENGE_SIGNATURES.iter().any(|sig| lower.contains(sig))
}
