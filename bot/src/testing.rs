//! In-memory stand-ins for the identity provider, marketplace and store.
use crate::service::{Identity, Marketplace, Session, SessionFactory, Store};
use async_trait::async_trait;
use common::{Account, ApiKey, PricedItem, Settings};
use market::{Inventory, InventoryItem, Listing, PriceLookup, SuccessResponse, BAD_KEY_ERROR};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use steam::Profile;

pub(crate) fn account(login: &str) -> Account {
    Account {
        login: login.to_string(),
        password: "password".into(),
        steam_id: 76561198000000000,
        steam_api_key: format!("{login}-steam-key"),
        shared_secret: "shared".into(),
        identity_secret: "identity".into(),
        market_api_key: format!("{login}-market-key"),
        proxy: None,
    }
}

pub(crate) fn settings() -> Settings {
    Settings {
        database_url: "postgres://unused".into(),
        set_steam_api_interval: Duration::from_secs(5),
        get_inventory_interval: Duration::from_secs(5),
        update_inventory_interval: Duration::from_secs(600),
        collect_prices_interval: Duration::from_secs(900),
        ping_interval: Duration::from_secs(60),
        test_interval: Duration::from_secs(30),
        hash_name_chunk: 2,
        ..Settings::default()
    }
}

fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[derive(Default)]
pub(crate) struct FakeIdentity {
    reject: bool,
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl FakeIdentity {
    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub(crate) fn logins(&self) -> usize {
        count(&self.logins)
    }

    pub(crate) fn logouts(&self) -> usize {
        count(&self.logouts)
    }
}

#[async_trait]
impl Identity for FakeIdentity {
    async fn login(&self) -> steam::Result<()> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(steam::Error::InvalidCredentials("fake".into()));
        }
        Ok(())
    }

    async fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }

    async fn profile(&self, steam_id: u64) -> steam::Result<Profile> {
        Ok(Profile {
            steam_id: steam_id.to_string(),
            persona_name: "bot".into(),
            profile_url: String::new(),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeMarket {
    listings: HashMap<String, Vec<Listing>>,
    bad_keys: HashSet<ApiKey>,
    broken_keys: HashSet<ApiKey>,
    inventory: Vec<String>,
    set_key_rejections: AtomicUsize,
    update_rejections: AtomicUsize,
    fail_pings_after: Option<usize>,
    set_key_calls: AtomicUsize,
    update_calls: AtomicUsize,
    inventory_calls: AtomicUsize,
    pings: AtomicUsize,
    tests: AtomicUsize,
    lookups: Mutex<Vec<(ApiKey, Vec<String>)>>,
}

impl FakeMarket {
    pub(crate) fn with_listings(mut self, names: &[&str]) -> Self {
        for (i, name) in names.iter().enumerate() {
            let i = i as i64;
            self.listings.insert(
                name.to_string(),
                vec![Listing { id: Some(i), price: 100 + i }],
            );
        }
        self
    }

    pub(crate) fn with_bad_keys(mut self, keys: &[&str]) -> Self {
        self.bad_keys.extend(keys.iter().map(|&k| ApiKey::from(k)));
        self
    }

    pub(crate) fn with_broken_keys(mut self, keys: &[&str]) -> Self {
        self.broken_keys.extend(keys.iter().map(|&k| ApiKey::from(k)));
        self
    }

    pub(crate) fn with_inventory(mut self, asset_ids: &[&str]) -> Self {
        self.inventory = asset_ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// The first `n` set-key calls report `success: false`.
    pub(crate) fn rejecting_set_key(self, n: usize) -> Self {
        self.set_key_rejections.store(n, Ordering::SeqCst);
        self
    }

    /// The first `n` inventory refreshes report `success: false`.
    pub(crate) fn rejecting_update(self, n: usize) -> Self {
        self.update_rejections.store(n, Ordering::SeqCst);
        self
    }

    /// Pings error out once `n` pings have succeeded.
    pub(crate) fn failing_pings_after(mut self, n: usize) -> Self {
        self.fail_pings_after = Some(n);
        self
    }

    pub(crate) fn set_key_calls(&self) -> usize {
        count(&self.set_key_calls)
    }

    pub(crate) fn update_calls(&self) -> usize {
        count(&self.update_calls)
    }

    pub(crate) fn inventory_calls(&self) -> usize {
        count(&self.inventory_calls)
    }

    pub(crate) fn pings(&self) -> usize {
        count(&self.pings)
    }

    pub(crate) fn tests(&self) -> usize {
        count(&self.tests)
    }

    pub(crate) fn lookups(&self) -> Vec<(ApiKey, Vec<String>)> {
        self.lookups.lock().unwrap().clone()
    }

    fn take_rejection(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn succeeded(success: bool) -> SuccessResponse {
        SuccessResponse {
            success,
            error: None,
        }
    }
}

#[async_trait]
impl Marketplace for FakeMarket {
    async fn set_steam_api_key(&self, _steam_api_key: &str) -> market::Result<SuccessResponse> {
        self.set_key_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::succeeded(!Self::take_rejection(&self.set_key_rejections)))
    }

    async fn ping(&self) -> market::Result<SuccessResponse> {
        let done = self.pings.fetch_add(1, Ordering::SeqCst);
        match self.fail_pings_after {
            Some(limit) if done >= limit => Err(market::Error::Deserialize("ping failed".into())),
            _ => Ok(Self::succeeded(true)),
        }
    }

    async fn test(&self) -> market::Result<SuccessResponse> {
        self.tests.fetch_add(1, Ordering::SeqCst);
        Ok(Self::succeeded(true))
    }

    async fn update_inventory(&self) -> market::Result<SuccessResponse> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::succeeded(!Self::take_rejection(&self.update_rejections)))
    }

    async fn inventory(&self) -> market::Result<Inventory> {
        self.inventory_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Inventory {
            success: true,
            items: self
                .inventory
                .iter()
                .map(|id| InventoryItem {
                    id: id.clone(),
                    market_hash_name: None,
                    market_price: None,
                })
                .collect(),
            error: None,
        })
    }

    async fn prices_by_hash_names(
        &self,
        key: &ApiKey,
        hash_names: &[String],
    ) -> market::Result<PriceLookup> {
        self.lookups
            .lock()
            .unwrap()
            .push((key.clone(), hash_names.to_vec()));

        if self.broken_keys.contains(key) {
            return Err(market::Error::Deserialize("connection reset".into()));
        }
        if self.bad_keys.contains(key) {
            return Ok(PriceLookup {
                success: false,
                error: Some(BAD_KEY_ERROR.into()),
                ..PriceLookup::default()
            });
        }

        let data = hash_names
            .iter()
            .filter_map(|name| Some((name.clone(), self.listings.get(name)?.clone())))
            .collect();
        Ok(PriceLookup {
            success: true,
            data,
            ..PriceLookup::default()
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    accounts: Vec<Account>,
    hash_names: HashMap<String, Vec<String>>,
    keys: Mutex<Vec<(ApiKey, bool)>>,
    deactivations: Mutex<Vec<ApiKey>>,
    waiting: Mutex<Vec<(String, Vec<String>)>>,
    saved: Mutex<Vec<(String, Vec<PricedItem>)>>,
}

impl FakeStore {
    pub(crate) fn with_keys(keys: &[(&str, bool)]) -> Self {
        Self {
            keys: Mutex::new(keys.iter().map(|&(k, a)| (ApiKey::from(k), a)).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn with_hash_names(mut self, login: &str, names: &[&str]) -> Self {
        self.hash_names.insert(
            login.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_accounts(mut self, logins: &[&str]) -> Self {
        self.accounts = logins.iter().map(|login| account(login)).collect();
        self
    }

    pub(crate) fn deactivations(&self) -> Vec<ApiKey> {
        self.deactivations.lock().unwrap().clone()
    }

    pub(crate) fn active(&self) -> Vec<ApiKey> {
        self.keys
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, active)| *active)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub(crate) fn waiting(&self) -> Vec<(String, Vec<String>)> {
        self.waiting.lock().unwrap().clone()
    }

    pub(crate) fn saved(&self) -> Vec<(String, Vec<PricedItem>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn accounts(&self) -> store::Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    async fn account_hash_names(&self, login: &str) -> store::Result<Vec<String>> {
        Ok(self.hash_names.get(login).cloned().unwrap_or_default())
    }

    async fn active_keys(&self) -> store::Result<Vec<ApiKey>> {
        Ok(self.active())
    }

    async fn deactivate_key(&self, key: &ApiKey) -> store::Result<bool> {
        self.deactivations.lock().unwrap().push(key.clone());
        let mut keys = self.keys.lock().unwrap();
        Ok(keys
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, active)| std::mem::replace(active, false))
            .unwrap_or(false))
    }

    async fn mark_items_waiting(&self, login: &str, asset_ids: &[String]) -> store::Result<u64> {
        self.waiting
            .lock()
            .unwrap()
            .push((login.to_string(), asset_ids.to_vec()));
        Ok(asset_ids.len() as u64)
    }

    async fn save_market_prices(&self, login: &str, items: &[PricedItem]) -> store::Result<u64> {
        self.saved
            .lock()
            .unwrap()
            .push((login.to_string(), items.to_vec()));
        Ok(items.len() as u64)
    }
}

/// Hands out pre-registered fakes per login, or fresh defaults.
#[derive(Default)]
pub(crate) struct FakeFactory {
    sessions: Mutex<HashMap<String, (Arc<FakeIdentity>, Arc<FakeMarket>)>>,
    opened: AtomicUsize,
}

impl FakeFactory {
    pub(crate) fn register(&self, login: &str, identity: FakeIdentity, market: FakeMarket) {
        self.sessions
            .lock()
            .unwrap()
            .insert(login.to_string(), (Arc::new(identity), Arc::new(market)));
    }

    pub(crate) fn identity(&self, login: &str) -> Arc<FakeIdentity> {
        self.entry(login).0
    }

    pub(crate) fn market(&self, login: &str) -> Arc<FakeMarket> {
        self.entry(login).1
    }

    pub(crate) fn opened(&self) -> usize {
        count(&self.opened)
    }

    fn entry(&self, login: &str) -> (Arc<FakeIdentity>, Arc<FakeMarket>) {
        self.sessions
            .lock()
            .unwrap()
            .entry(login.to_string())
            .or_default()
            .clone()
    }
}

impl SessionFactory for FakeFactory {
    fn open(&self, account: &Account) -> crate::Result<Session> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let (identity, market) = self.entry(&account.login);
        Ok(Session { identity, market })
    }
}
