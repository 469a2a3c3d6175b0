//! Per-account lifecycle: authenticate, prime key and inventory state,
//! collect prices once, then supervise the periodic loops until cancelled.
use crate::keys::KeyPool;
use crate::observe::observe;
use crate::prices::{priced_items, PriceCollector, PriceMap};
use crate::retry::{repeat_forever, retry_until};
use crate::service::{Identity, Marketplace, Session, Store};
use crate::Result;
use common::{Account, Settings};
use log::{error, info, warn};
use market::{Inventory, SuccessResponse};
use std::sync::{Arc, RwLock};
use strum_macros::Display;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum State {
    Created,
    Authenticating,
    KeySyncing,
    InventorySyncing,
    PriceCollecting,
    Supervising,
    Stopped,
}

pub struct AccountWorkflow {
    account: Account,
    identity: Arc<dyn Identity>,
    market: Arc<dyn Marketplace>,
    store: Arc<dyn Store>,
    settings: Arc<Settings>,
    state: watch::Sender<State>,
    prices: RwLock<Arc<PriceMap>>,
}

impl AccountWorkflow {
    pub fn new(
        account: Account,
        session: Session,
        store: Arc<dyn Store>,
        settings: Arc<Settings>,
    ) -> Self {
        let (state, _) = watch::channel(State::Created);
        Self {
            account,
            identity: session.identity,
            market: session.market,
            store,
            settings,
            state,
            prices: RwLock::new(Arc::default()),
        }
    }

    pub fn login(&self) -> &str {
        &self.account.login
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Prices from the latest completed collection cycle.
    pub fn prices(&self) -> Arc<PriceMap> {
        match self.prices.read() {
            Ok(prices) => Arc::clone(&prices),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Runs the workflow until `token` is cancelled or a step fails fatally.
    ///
    /// The session is released on every exit path before the state becomes
    /// [`State::Stopped`]. Cancellation is not an error.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        info!("[{}] Trying to start bot workflow...", self.login());

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("[{}] Bot workflow cancelled in {}", self.login(), self.state());
                Ok(())
            }
            result = self.lifecycle() => result,
        };

        if let Err(e) = &outcome {
            error!("[{}] Bot workflow failed in {}: {e}", self.login(), self.state());
        }

        self.identity.logout().await;
        self.set_state(State::Stopped);
        outcome
    }

    async fn lifecycle(&self) -> Result<()> {
        self.set_state(State::Authenticating);
        self.authenticate().await?;

        self.set_state(State::KeySyncing);
        self.sync_steam_api_key().await?;

        self.set_state(State::InventorySyncing);
        self.sync_inventory().await?;

        self.set_state(State::PriceCollecting);
        self.collect_prices().await?;

        self.set_state(State::Supervising);
        self.supervise().await
    }

    fn set_state(&self, state: State) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!("[{}] {previous} -> {state}", self.login());
        }
    }

    /// Logs in exactly once. Credential errors are fatal and never retried.
    async fn authenticate(&self) -> Result<()> {
        observe(self.login(), "login", self.identity.login()).await?;

        let profile = observe(
            self.login(),
            "profile",
            self.identity.profile(self.account.steam_id),
        )
        .await?;
        info!(
            "[{}] Bot workflow start successfully as {}",
            self.login(),
            profile.persona_name
        );
        Ok(())
    }

    async fn sync_steam_api_key(&self) -> Result<()> {
        retry_until(
            self.settings.set_steam_api_interval,
            |response: &SuccessResponse| response.success,
            || {
                observe(
                    self.login(),
                    "set_steam_api_key",
                    self.market.set_steam_api_key(&self.account.steam_api_key),
                )
            },
        )
        .await?;
        Ok(())
    }

    /// Refreshes the remote inventory, fetches it and marks the items found as waiting for a price.
    async fn sync_inventory(&self) -> Result<()> {
        let interval = self.settings.get_inventory_interval;

        retry_until(
            interval,
            |response: &SuccessResponse| response.success,
            || observe(self.login(), "update_inventory", self.market.update_inventory()),
        )
        .await?;

        let inventory = retry_until(
            interval,
            |inventory: &Inventory| inventory.success,
            || observe(self.login(), "inventory", self.market.inventory()),
        )
        .await?;

        let asset_ids: Vec<String> = inventory.items.into_iter().map(|item| item.id).collect();
        let count = observe(
            self.login(),
            "mark_items_waiting",
            self.store.mark_items_waiting(self.login(), &asset_ids),
        )
        .await?;

        info!(
            "[{}] Wait status update successfully for {count} of {} items",
            self.login(),
            asset_ids.len()
        );
        Ok(())
    }

    async fn collect_prices(&self) -> Result<()> {
        let hash_names = self.store.account_hash_names(self.login()).await?;
        let pool = KeyPool::snapshot(Arc::clone(&self.store)).await?;

        let prices = PriceCollector::new(
            self.login(),
            self.market.as_ref(),
            self.settings.hash_name_chunk,
        )
        .collect(&hash_names, &pool)
        .await;

        let priced = priced_items(&prices);
        let saved = observe(
            self.login(),
            "save_market_prices",
            self.store.save_market_prices(self.login(), &priced),
        )
        .await?;
        info!("[{}] Saved market prices for {saved} items", self.login());

        let prices = Arc::new(prices);
        match self.prices.write() {
            Ok(mut current) => *current = prices,
            Err(poisoned) => *poisoned.into_inner() = prices,
        }
        Ok(())
    }

    fn keep_alive(&self, operation: &str, response: market::Result<SuccessResponse>) -> Result<()> {
        if !response?.success {
            warn!("[{}] Market {operation} was not successful", self.login());
        }
        Ok(())
    }

    /// Runs the periodic loops side by side. The first loop error stops all of them.
    async fn supervise(&self) -> Result<()> {
        info!("[{}] Run market periodic tasks", self.login());
        let settings = &self.settings;

        let (never, ..) = tokio::try_join!(
            repeat_forever(settings.update_inventory_interval, || self.sync_inventory()),
            repeat_forever(settings.collect_prices_interval, || self.collect_prices()),
            repeat_forever(settings.ping_interval, || async {
                let response = observe(self.login(), "ping", self.market.ping()).await;
                self.keep_alive("ping", response)
            }),
            repeat_forever(settings.test_interval, || async {
                let response = observe(self.login(), "test", self.market.test()).await;
                self.keep_alive("test", response)
            }),
        )?;
        match never {}
    }
}
