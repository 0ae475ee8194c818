//! 业务逻辑服务层

mod batch_service;
mod checkin_service;
mod schedule_service;

pub use batch_service::BatchService;
pub use checkin_service::{cache_key, resolve_domain, truncate_message, CheckinService};
pub use schedule_service::{CronSpec, ScheduleService, CRON_SETTING_KEY, DEFAULT_CRON};

use std::sync::Arc;

use checkin_orchestrator_provider::HttpTransport;

use crate::traits::{
    AccountRepository, BrowserAutomation, BypassCookieCache, CheckinLogRepository, Notifier,
    ProviderRepository, SettingsStore,
};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
pub struct ServiceContext {
    /// 账户持久化仓库
    pub account_repository: Arc<dyn AccountRepository>,
    /// Provider 持久化仓库
    pub provider_repository: Arc<dyn ProviderRepository>,
    /// 签到日志仓库
    pub log_repository: Arc<dyn CheckinLogRepository>,
    /// WAF 绕过 cookie 缓存
    pub bypass_cache: Arc<dyn BypassCookieCache>,
    /// 浏览器自动化
    pub browser: Arc<dyn BrowserAutomation>,
    /// 通知分发
    pub notifier: Arc<dyn Notifier>,
    /// 设置存储
    pub settings: Arc<dyn SettingsStore>,
    /// HTTP 传输层
    pub transport: Arc<dyn HttpTransport>,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_repository: Arc<dyn AccountRepository>,
        provider_repository: Arc<dyn ProviderRepository>,
        log_repository: Arc<dyn CheckinLogRepository>,
        bypass_cache: Arc<dyn BypassCookieCache>,
        browser: Arc<dyn BrowserAutomation>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<dyn SettingsStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            account_repository,
            provider_repository,
            log_repository,
            bypass_cache,
            browser,
            notifier,
            settings,
            transport,
        }
    }
}
