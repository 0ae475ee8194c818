//! Outcome status normalization
//!
//! Providers report a business-level "already checked in today" no-op
//! inconsistently: some as an HTTP success with a message, some as an HTTP
//! failure with the same message text. The message keywords therefore
//! override the raw success flag.

use crate::types::CheckinStatus;

/// Multilingual phrases providers use for the daily no-op.
pub(crate) const ALREADY_CHECKED_IN_KEYWORDS: &[&str] = &[
    "already checked in",
    "already check in",
    "already signed in",
    "already_checked_in",
    "already_check_in",
    "已经签到",
    "已签到",
    "重复签到",
];

/// Whether the message matches an already-checked-in phrase.
#[must_use]
pub fn is_already_checked_in_message(message: &str) -> bool {
    let text = message.trim().to_lowercase();
    if text.is_empty() {
        return false;
    }
    ALREADY_CHECKED_IN_KEYWORDS
        .iter()
        .any(|keyword| text.contains(keyword))
}

/// Normalize a raw attempt result into a canonical status.
///
/// The keyword override wins over any raw failure signal from the
/// transport layer; otherwise the raw flag is mirrored.
#[must_use]
pub fn normalize_status(raw_success: bool, message: &str) -> (CheckinStatus, bool) {
    if is_already_checked_in_message(message) {
        return (CheckinStatus::AlreadyCheckedIn, true);
    }
    if raw_success {
        (CheckinStatus::Success, true)
    } else {
        (CheckinStatus::Failed, false)
    }
}
