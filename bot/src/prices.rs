//! Price collection fanned out over the key pool.
use crate::keys::{masked, KeyPool};
use crate::observe::observe;
use crate::service::Marketplace;
use common::{ApiKey, PricedItem};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use market::{Listing, PriceLookup};
use std::collections::HashMap;

/// Hash-name to its listings, cheapest first.
pub type PriceMap = HashMap<String, Vec<Listing>>;

pub struct PriceCollector<'a> {
    login: &'a str,
    market: &'a dyn Marketplace,
    chunk_size: usize,
}

impl<'a> PriceCollector<'a> {
    pub fn new(login: &'a str, market: &'a dyn Marketplace, chunk_size: usize) -> Self {
        Self {
            login,
            market,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Collects listings for as many of `hash_names` as the pool allows.
    ///
    /// Chunks are paired with keys round-robin and looked up concurrently.
    /// Hash-names that get no successful response are left out of the result.
    pub async fn collect(&self, hash_names: &[String], pool: &KeyPool) -> PriceMap {
        let mut prices = PriceMap::new();
        if pool.is_empty() {
            warn!("[{}] No active market keys, skipping price collection", self.login);
            return prices;
        }

        let mut lookups: FuturesUnordered<_> = hash_names
            .chunks(self.chunk_size)
            .zip(pool.cycle())
            .map(|(chunk, key)| self.lookup_chunk(pool, key, chunk))
            .collect();

        while let Some(lookup) = lookups.next().await {
            let Some(lookup) = lookup else { continue };
            for (hash_name, listings) in lookup.data {
                if !listings.is_empty() {
                    prices.insert(hash_name, listings);
                }
            }
        }

        info!(
            "[{}] Collected market prices for {}/{} items",
            self.login,
            prices.len(),
            hash_names.len()
        );
        prices
    }

    /// Looks up one chunk, failing over to the remaining keys in pool order
    /// when a key is rejected. Every key is tried at most once per chunk.
    async fn lookup_chunk(
        &self,
        pool: &KeyPool,
        assigned: &ApiKey,
        chunk: &[String],
    ) -> Option<PriceLookup> {
        let mut tried = Vec::new();
        let mut key = assigned.clone();

        loop {
            if pool.is_usable(&key).await {
                let lookup = observe(
                    self.login,
                    "lookup_prices",
                    self.market.prices_by_hash_names(&key, chunk),
                )
                .await;

                match lookup {
                    Ok(lookup) if lookup.has_bad_key() => {
                        warn!("[{}] Bad key error for {} key", self.login, masked(&key));
                        if let Err(e) = pool.deactivate(&key).await {
                            error!("[{}] Failed to deactivate key: {e}", self.login);
                        }
                    }
                    Ok(lookup) if lookup.success => return Some(lookup),
                    Ok(lookup) => {
                        warn!(
                            "[{}] Price lookup for {} items failed: {}",
                            self.login,
                            chunk.len(),
                            lookup.error.as_deref().unwrap_or("unknown error")
                        );
                        return None;
                    }
                    Err(e) => {
                        warn!("[{}] Price lookup for {} items failed: {e}", self.login, chunk.len());
                        return None;
                    }
                }
            }

            tried.push(key);
            key = pool.next_untried(&tried).await?;
            info!("[{}] Switch to another key: {}", self.login, masked(&key));
        }
    }
}

/// Market figures for every hash-name that has at least one listing.
pub fn priced_items(prices: &PriceMap) -> Vec<PricedItem> {
    let mut items: Vec<PricedItem> = prices
        .iter()
        .filter_map(|(hash_name, listings)| {
            let best = listings.first()?;
            let tied = listings.iter().take_while(|l| l.price == best.price).count();
            Some(PricedItem {
                hash_name: hash_name.clone(),
                min_price: best.price,
                market_id: best.id,
                count: i32::try_from(listings.len()).unwrap_or(i32::MAX),
                position: i32::try_from(tied + 1).unwrap_or(i32::MAX),
            })
        })
        .collect();

    items.sort_by(|a, b| a.hash_name.cmp(&b.hash_name));
    items
}
