//! 测试工具模块 - 仅在测试时可用
//!
//! In-memory fakes for every collaborator trait, plus a factory wiring
//! them into a [`ServiceContext`]. The fakes record enough of what
//! happened (requests, log entries, call counts) for tests to assert on
//! behavior instead of implementation details.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use checkin_orchestrator_provider::{
    HttpResponse, HttpTransport, ProviderError, Result as ProviderResult,
};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{
    AccountRepository, BrowserAutomation, BrowserCheckinRequest, BrowserCheckinResult,
    BypassCookieCache, CheckinLogRepository, CookieMap, InMemoryBypassCache, Notifier,
    ProviderRepository, SettingsStore,
};
use crate::types::{Account, CheckinLogEntry, CheckinUpdate, Provider};

/// Shared ordered recorder, for tests asserting cross-mock call order.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// A provider with a fixed domain and a single required WAF cookie.
pub fn bypass_provider(name: &str) -> Provider {
    Provider {
        bypass_method: Some("waf_cookies".to_string()),
        waf_cookie_names: Some(vec!["acw_tc".to_string()]),
        ..Provider::new(name, format!("https://{name}.example.com"))
    }
}

/// A provider with a fixed domain and no bypass requirement.
pub fn plain_provider(name: &str) -> Provider {
    Provider::new(name, format!("https://{name}.example.com"))
}

/// An enabled cookie-auth account with one session cookie.
pub fn cookie_account(id: i64, name: &str, provider: &str) -> Account {
    let mut account = Account::new(id, name, provider);
    account.cookies = cookies(&[("session", "abc")]);
    account.api_user = "123".to_string();
    account
}

/// Build a cookie map from name/value pairs.
pub fn cookies(pairs: &[(&str, &str)]) -> CookieMap {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

/// In-memory account store.
#[derive(Default)]
pub struct MockAccountRepository {
    accounts: Mutex<Vec<Account>>,
    events: Mutex<Option<EventLog>>,
}

impl MockAccountRepository {
    pub fn push(&self, account: Account) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn get(&self, id: i64) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn record_events(&self, events: EventLog) {
        *self.events.lock().unwrap() = Some(events);
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_all(&self) -> CoreResult<Vec<Account>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn find_enabled(&self) -> CoreResult<Vec<Account>> {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            events.lock().unwrap().push("find_enabled".to_string());
        }
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.enabled)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<Account>> {
        Ok(self.get(id))
    }

    async fn record_checkin(&self, id: i64, update: CheckinUpdate) -> CoreResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
        account.last_checkin = Some(update.last_checkin);
        account.last_status = Some(update.last_status);
        if update.last_balance.is_some() {
            account.last_balance = update.last_balance;
        }
        if update.last_used.is_some() {
            account.last_used = update.last_used;
        }
        Ok(())
    }
}

/// In-memory provider store with an injectable lookup failure.
#[derive(Default)]
pub struct MockProviderRepository {
    providers: Mutex<Vec<Provider>>,
    fail_for: Mutex<Option<String>>,
}

impl MockProviderRepository {
    pub fn push(&self, provider: Provider) {
        self.providers.lock().unwrap().push(provider);
    }

    /// Make `find_by_name` fail for one provider name.
    pub fn fail_lookup_of(&self, name: &str) {
        *self.fail_for.lock().unwrap() = Some(name.to_string());
    }
}

#[async_trait]
impl ProviderRepository for MockProviderRepository {
    async fn find_all(&self) -> CoreResult<Vec<Provider>> {
        Ok(self.providers.lock().unwrap().clone())
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Provider>> {
        if self.fail_for.lock().unwrap().as_deref() == Some(name) {
            return Err(CoreError::StorageError("injected lookup failure".to_string()));
        }
        Ok(self
            .providers
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }
}

/// In-memory append-only log.
#[derive(Default)]
pub struct MockLogRepository {
    entries: Mutex<Vec<CheckinLogEntry>>,
    events: Mutex<Option<EventLog>>,
}

impl MockLogRepository {
    pub fn entries(&self) -> Vec<CheckinLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn record_events(&self, events: EventLog) {
        *self.events.lock().unwrap() = Some(events);
    }
}

#[async_trait]
impl CheckinLogRepository for MockLogRepository {
    async fn append(&self, entry: CheckinLogEntry) -> CoreResult<()> {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            events.lock().unwrap().push("log".to_string());
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Scripted browser automation.
///
/// Fetch results are consumed in order; an empty script means every
/// fetch fails (`None`).
#[derive(Default)]
pub struct MockBrowserAutomation {
    fetch_results: Mutex<VecDeque<Option<CookieMap>>>,
    login_results: Mutex<VecDeque<CoreResult<BrowserCheckinResult>>>,
    fetch_calls: AtomicUsize,
    login_calls: AtomicUsize,
}

impl MockBrowserAutomation {
    pub fn script_fetch(&self, result: Option<CookieMap>) {
        self.fetch_results.lock().unwrap().push_back(result);
    }

    pub fn script_login(&self, result: CoreResult<BrowserCheckinResult>) {
        self.login_results.lock().unwrap().push_back(result);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserAutomation for MockBrowserAutomation {
    async fn fetch_bypass_cookies(
        &self,
        _login_url: &str,
        _required_names: &[String],
    ) -> Option<CookieMap> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_results.lock().unwrap().pop_front().flatten()
    }

    async fn login_and_checkin(
        &self,
        _request: &BrowserCheckinRequest,
    ) -> CoreResult<BrowserCheckinResult> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CoreError::StorageError(
                    "no scripted browser result".to_string(),
                ))
            })
    }
}

/// Recording notifier with an injectable dispatch failure.
#[derive(Default)]
pub struct MockNotifier {
    pushes: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn push(&self, title: &str, body: &str) -> CoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::NotificationError(
                "injected dispatch failure".to_string(),
            ));
        }
        self.pushes
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// In-memory settings store.
#[derive(Default)]
pub struct MockSettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MockSettingsStore {
    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl SettingsStore for MockSettingsStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.value_of(key))
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.seed(key, value);
        Ok(())
    }
}

/// Real in-memory cache wrapped with per-operation call counters.
#[derive(Default)]
pub struct CountingBypassCache {
    inner: InMemoryBypassCache,
    lookups: AtomicUsize,
    stores: AtomicUsize,
    invalidations: AtomicUsize,
}

impl CountingBypassCache {
    /// Pre-populate an entry without touching the counters.
    pub async fn seed(&self, key: &str, cookies: &CookieMap) {
        self.inner.store(key, cookies).await.unwrap();
    }

    /// Read an entry without touching the counters.
    pub async fn lookup_raw(&self, key: &str) -> Option<CookieMap> {
        self.inner.lookup(key).await.unwrap()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BypassCookieCache for CountingBypassCache {
    async fn lookup(&self, key: &str) -> CoreResult<Option<CookieMap>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(key).await
    }

    async fn store(&self, key: &str, cookies: &CookieMap) -> CoreResult<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, cookies).await
    }

    async fn invalidate(&self, key: &str) -> CoreResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(key).await
    }

    async fn cleanup_expired(&self) -> CoreResult<usize> {
        self.inner.cleanup_expired().await
    }
}

/// One recorded transport call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub cookies: HashMap<String, String>,
}

/// Scripted HTTP transport, consuming responses in order.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ProviderResult<HttpResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedTransport {
    /// Queue a 200 response with the given body.
    pub fn push_ok(&self, body: &str) {
        self.push_response(200, body);
    }

    /// Queue a response with an explicit status.
    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Queue a transport error.
    pub fn push_err(&self, error: ProviderError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Sleep before answering each call, for concurrency tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(
        &self,
        method: &str,
        url: &str,
        cookies: &HashMap<String, String>,
    ) -> ProviderResult<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            cookies: cookies.clone(),
        });
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "transport script exhausted: {method} {url}");
        responses.pop_front().unwrap()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post(
        &self,
        _provider_name: &str,
        url: &str,
        _headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> ProviderResult<HttpResponse> {
        self.pause().await;
        self.next("POST", url, cookies)
    }

    async fn get(
        &self,
        _provider_name: &str,
        url: &str,
        _headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> ProviderResult<HttpResponse> {
        self.pause().await;
        self.next("GET", url, cookies)
    }
}

/// All fakes plus the wired [`ServiceContext`].
pub struct TestContext {
    pub ctx: Arc<ServiceContext>,
    pub accounts: Arc<MockAccountRepository>,
    pub providers: Arc<MockProviderRepository>,
    pub logs: Arc<MockLogRepository>,
    pub cache: Arc<CountingBypassCache>,
    pub browser: Arc<MockBrowserAutomation>,
    pub notifier: Arc<MockNotifier>,
    pub settings: Arc<MockSettingsStore>,
    pub transport: Arc<ScriptedTransport>,
}

/// Create a fully wired test context with empty stores.
pub fn create_test_context() -> TestContext {
    let accounts = Arc::new(MockAccountRepository::default());
    let providers = Arc::new(MockProviderRepository::default());
    let logs = Arc::new(MockLogRepository::default());
    let cache = Arc::new(CountingBypassCache::default());
    let browser = Arc::new(MockBrowserAutomation::default());
    let notifier = Arc::new(MockNotifier::default());
    let settings = Arc::new(MockSettingsStore::default());
    let transport = Arc::new(ScriptedTransport::default());

    let ctx = Arc::new(ServiceContext::new(
        accounts.clone(),
        providers.clone(),
        logs.clone(),
        cache.clone(),
        browser.clone(),
        notifier.clone(),
        settings.clone(),
        transport.clone(),
    ));

    TestContext {
        ctx,
        accounts,
        providers,
        logs,
        cache,
        browser,
        notifier,
        settings,
        transport,
    }
}
