//! Boundaries the orchestration core talks through, and their implementations
//! on top of the `steam`, `market` and `store` crates.
use crate::Result;
use async_trait::async_trait;
use common::{Account, ApiKey, PricedItem, Settings};
use market::{Inventory, PriceLookup, RateLimits, SuccessResponse};
use std::sync::Arc;
use steam::Profile;

/// Session with the identity provider for one account.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn login(&self) -> steam::Result<()>;

    /// Must be safe to call more than once and without a prior login.
    async fn logout(&self);

    async fn profile(&self, steam_id: u64) -> steam::Result<Profile>;
}

/// Marketplace operations for one account.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn set_steam_api_key(&self, steam_api_key: &str) -> market::Result<SuccessResponse>;
    async fn ping(&self) -> market::Result<SuccessResponse>;
    async fn test(&self) -> market::Result<SuccessResponse>;
    async fn update_inventory(&self) -> market::Result<SuccessResponse>;
    async fn inventory(&self) -> market::Result<Inventory>;
    async fn prices_by_hash_names(
        &self,
        key: &ApiKey,
        hash_names: &[String],
    ) -> market::Result<PriceLookup>;
}

/// Persistent state shared by every bot.
#[async_trait]
pub trait Store: Send + Sync {
    async fn accounts(&self) -> store::Result<Vec<Account>>;
    async fn account_hash_names(&self, login: &str) -> store::Result<Vec<String>>;
    async fn active_keys(&self) -> store::Result<Vec<ApiKey>>;
    async fn deactivate_key(&self, key: &ApiKey) -> store::Result<bool>;
    async fn mark_items_waiting(&self, login: &str, asset_ids: &[String]) -> store::Result<u64>;
    async fn save_market_prices(&self, login: &str, items: &[PricedItem]) -> store::Result<u64>;
}

/// The remote clients one workflow works with.
#[derive(Clone)]
pub struct Session {
    pub identity: Arc<dyn Identity>,
    pub market: Arc<dyn Marketplace>,
}

pub trait SessionFactory: Send + Sync {
    fn open(&self, account: &Account) -> Result<Session>;
}

/// Builds real HTTP clients, routed through each account's proxy.
pub struct ClientFactory {
    settings: Arc<Settings>,
    limits: RateLimits,
}

impl ClientFactory {
    pub fn new(settings: Arc<Settings>) -> Self {
        let limits = RateLimits::new(settings.requests_per_second);
        Self { settings, limits }
    }
}

impl SessionFactory for ClientFactory {
    fn open(&self, account: &Account) -> Result<Session> {
        let identity = steam::Client::new(&self.settings.steam_api_host, account)?;
        let market = market::Client::new(
            &self.settings.market_host,
            &account.market_api_key,
            account.proxy.as_ref(),
            self.limits.clone(),
        )?;

        Ok(Session {
            identity: Arc::new(identity),
            market: Arc::new(market),
        })
    }
}

#[async_trait]
impl Identity for steam::Client {
    async fn login(&self) -> steam::Result<()> {
        steam::Client::login(self).await
    }

    async fn logout(&self) {
        steam::Client::logout(self).await;
    }

    async fn profile(&self, steam_id: u64) -> steam::Result<Profile> {
        steam::Client::profile(self, steam_id).await
    }
}

#[async_trait]
impl Marketplace for market::Client {
    async fn set_steam_api_key(&self, steam_api_key: &str) -> market::Result<SuccessResponse> {
        market::Client::set_steam_api_key(self, steam_api_key).await
    }

    async fn ping(&self) -> market::Result<SuccessResponse> {
        market::Client::ping(self).await
    }

    async fn test(&self) -> market::Result<SuccessResponse> {
        market::Client::test(self).await
    }

    async fn update_inventory(&self) -> market::Result<SuccessResponse> {
        market::Client::update_inventory(self).await
    }

    async fn inventory(&self) -> market::Result<Inventory> {
        market::Client::inventory(self).await
    }

    async fn prices_by_hash_names(
        &self,
        key: &ApiKey,
        hash_names: &[String],
    ) -> market::Result<PriceLookup> {
        market::Client::prices_by_hash_names(self, key, hash_names).await
    }
}

#[async_trait]
impl Store for store::Database {
    async fn accounts(&self) -> store::Result<Vec<Account>> {
        store::Database::accounts(self).await
    }

    async fn account_hash_names(&self, login: &str) -> store::Result<Vec<String>> {
        store::Database::account_hash_names(self, login).await
    }

    async fn active_keys(&self) -> store::Result<Vec<ApiKey>> {
        store::Database::active_keys(self).await
    }

    async fn deactivate_key(&self, key: &ApiKey) -> store::Result<bool> {
        store::Database::deactivate_key(self, key).await
    }

    async fn mark_items_waiting(&self, login: &str, asset_ids: &[String]) -> store::Result<u64> {
        store::Database::mark_items_waiting(self, login, asset_ids).await
    }

    async fn save_market_prices(&self, login: &str, items: &[PricedItem]) -> store::Result<u64> {
        store::Database::save_market_prices(self, login, items).await
    }
}
