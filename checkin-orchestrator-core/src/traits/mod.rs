//! Storage layer abstraction trait definition

mod account_repository;
mod browser;
mod bypass_cache;
mod checkin_log_repository;
mod notifier;
mod provider_repository;
mod settings;

pub use account_repository::AccountRepository;
pub use browser::{BrowserAutomation, BrowserCheckinRequest, BrowserCheckinResult};
pub use bypass_cache::{
    BypassCookieCache, CookieMap, InMemoryBypassCache, BYPASS_COOKIE_TTL_HOURS,
};
pub use checkin_log_repository::CheckinLogRepository;
pub use notifier::Notifier;
pub use provider_repository::ProviderRepository;
pub use settings::SettingsStore;
