use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MARKET_HOST: &str = "https://market.csgo.com";
const DEFAULT_STEAM_API_HOST: &str = "https://api.steampowered.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Environment variable {0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

/// Runtime settings of the bot fleet, read from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub market_host: String,
    pub steam_api_host: String,
    pub set_steam_api_interval: Duration,
    pub get_inventory_interval: Duration,
    pub update_inventory_interval: Duration,
    pub collect_prices_interval: Duration,
    pub ping_interval: Duration,
    pub test_interval: Duration,
    pub hash_name_chunk: usize,
    pub requests_per_second: usize,
    pub accounts: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            market_host: DEFAULT_MARKET_HOST.to_string(),
            steam_api_host: DEFAULT_STEAM_API_HOST.to_string(),
            set_steam_api_interval: Duration::from_secs(10),
            get_inventory_interval: Duration::from_secs(10),
            update_inventory_interval: Duration::from_secs(3600),
            collect_prices_interval: Duration::from_secs(900),
            ping_interval: Duration::from_secs(180),
            test_interval: Duration::from_secs(60),
            hash_name_chunk: 50,
            requests_per_second: 5,
            accounts: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |name: &'static str, default: Duration| {
            parsed::<u64, _>(&lookup, name)
                .map(|value| value.map(Duration::from_secs).unwrap_or(default))
        };

        let settings = Self {
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            market_host: lookup("MARKET_HOST").unwrap_or(defaults.market_host),
            steam_api_host: lookup("STEAM_API_HOST").unwrap_or(defaults.steam_api_host),
            set_steam_api_interval: secs(
                "MARKET_SET_STEAM_API_INTERVAL",
                defaults.set_steam_api_interval,
            )?,
            get_inventory_interval: secs(
                "MARKET_GET_INVENTORY_INTERVAL",
                defaults.get_inventory_interval,
            )?,
            update_inventory_interval: secs(
                "MARKET_UPDATE_INVENTORY_INTERVAL",
                defaults.update_inventory_interval,
            )?,
            collect_prices_interval: secs(
                "MARKET_COLLECT_PRICES_INTERVAL",
                defaults.collect_prices_interval,
            )?,
            ping_interval: secs("MARKET_PING_INTERVAL", defaults.ping_interval)?,
            test_interval: secs("MARKET_TEST_INTERVAL", defaults.test_interval)?,
            hash_name_chunk: parsed(&lookup, "MARKET_HASH_NAME_CHUNK")?
                .unwrap_or(defaults.hash_name_chunk),
            requests_per_second: parsed(&lookup, "MARKET_REQUESTS_PER_SECOND")?
                .unwrap_or(defaults.requests_per_second),
            accounts: lookup("BOT_ACCOUNTS").map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|login| !login.is_empty())
                    .map(String::from)
                    .collect()
            }),
        };

        if settings.hash_name_chunk == 0 {
            return Err(ConfigError::Invalid("MARKET_HASH_NAME_CHUNK", "0".into()));
        }
        if settings.requests_per_second == 0 {
            return Err(ConfigError::Invalid("MARKET_REQUESTS_PER_SECOND", "0".into()));
        }

        Ok(settings)
    }
}

fn parsed<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(name, raw.clone()))
        })
        .transpose()
}
