use derive_more::{Deref, Display, From, Into};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display as StrumDisplay, EnumIter};
use thiserror::Error;
use url::Url;

/// A marketplace API key from the shared pool. Identity is the key string itself.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deref, Display, From, Into)]
pub struct ApiKey(String);

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Proxy must look like host:port:username:password, got {0:?}")]
pub struct ProxyError(pub String);

/// SOCKS5 proxy an account's traffic is routed through.
#[derive(Clone, PartialEq, Eq)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Proxy {
    /// SOCKS5 url with the credentials percent-encoded.
    pub fn url(&self) -> Result<Url, ProxyError> {
        let invalid = || ProxyError(format!("{}:{}", self.host, self.port));
        let mut url =
            Url::parse(&format!("socks5://{}:{}", self.host, self.port)).map_err(|_| invalid())?;
        url.set_username(&self.username).map_err(|_| invalid())?;
        url.set_password(Some(&self.password)).map_err(|_| invalid())?;
        Ok(url)
    }
}

impl FromStr for Proxy {
    type Err = ProxyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.trim().split(':').collect();
        match parts.as_slice() {
            [host, port, username, password] if !host.is_empty() => {
                let proxy = Self {
                    host: host.to_string(),
                    port: port.parse().map_err(|_| ProxyError(raw.to_string()))?,
                    username: username.to_string(),
                    password: password.to_string(),
                };
                proxy.url().map_err(|_| ProxyError(raw.to_string()))?;
                Ok(proxy)
            }
            _ => Err(ProxyError(raw.to_string())),
        }
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Everything needed to run one bot. Immutable for the lifetime of its workflow.
#[derive(Clone)]
pub struct Account {
    pub login: String,
    pub password: String,
    pub steam_id: u64,
    pub steam_api_key: String,
    pub shared_secret: String,
    pub identity_secret: String,
    pub market_api_key: String,
    pub proxy: Option<Proxy>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("login", &self.login)
            .field("steam_id", &self.steam_id)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, StrumDisplay, EnumIter)]
pub enum ItemStatus {
    New,
    NotAtSteamInv,
    Check,
    /// Seen in the market inventory and waiting for a price.
    Wait,
}

impl ItemStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::New => 65536,
            Self::NotAtSteamInv => 131072,
            Self::Check => 262144,
            Self::Wait => 524288,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|status| status.code() == code)
    }
}

/// Market figures written back for one hash-name after a price cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedItem {
    pub hash_name: String,
    pub min_price: i64,
    pub market_id: Option<i64>,
    pub count: i32,
    pub position: i32,
}
