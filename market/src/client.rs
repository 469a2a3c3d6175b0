use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::rate_limiter::RateLimits;
use crate::schema::{Inventory, PriceLookup, SuccessResponse};
use crate::Result;
use common::{ApiKey, Proxy};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(30);
const HASH_NAME_PARAM: &str = "list_hash_name[]";

/// Marketplace client bound to one account's API key.
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    host: String,
    api_key: String,
    limits: RateLimits,
}

impl Client {
    pub fn new(host: &str, api_key: &str, proxy: Option<&Proxy>, limits: RateLimits) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(TIMEOUT);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.url()?)?);
        }

        Ok(Self {
            client: builder.build()?,
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            limits,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        key: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        self.limits.wait(key).await;

        let mut url = Url::parse(&format!("{}{endpoint}", self.host))?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .extend_pairs(params);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        log::debug!("{endpoint} responded with {status}");

        // Failures such as a rejected key still come back as JSON bodies.
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(Error::Response(status, text)),
            Err(_) => Err(Error::Deserialize(text)),
        }
    }

    pub async fn ping(&self) -> Result<SuccessResponse> {
        self.get(Endpoint::Ping, &self.api_key, &[]).await
    }

    pub async fn test(&self) -> Result<SuccessResponse> {
        self.get(Endpoint::Test, &self.api_key, &[]).await
    }

    pub async fn set_steam_api_key(&self, steam_api_key: &str) -> Result<SuccessResponse> {
        self.get(
            Endpoint::SetSteamApiKey,
            &self.api_key,
            &[("steam-api-key", steam_api_key)],
        )
        .await
    }

    pub async fn update_inventory(&self) -> Result<SuccessResponse> {
        self.get(Endpoint::UpdateInventory, &self.api_key, &[]).await
    }

    pub async fn inventory(&self) -> Result<Inventory> {
        self.get(Endpoint::MyInventory, &self.api_key, &[]).await
    }

    /// Looks up the listings of `hash_names` using a pool `key` instead of the account's own.
    pub async fn prices_by_hash_names(
        &self,
        key: &ApiKey,
        hash_names: &[String],
    ) -> Result<PriceLookup> {
        let params: Vec<(&str, &str)> = hash_names
            .iter()
            .map(|name| (HASH_NAME_PARAM, name.as_str()))
            .collect();

        let lookup: PriceLookup = self
            .get(Endpoint::SearchByHashNames, key, &params)
            .await?;
        Ok(lookup.sorted())
    }
}
