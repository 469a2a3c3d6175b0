//! Pieces shared by every crate of the workspace: environment bootstrap,
//! settings and the account/item/key model.
mod config;
mod model;

pub use config::{ConfigError, Settings};
pub use model::{Account, ApiKey, ItemStatus, PricedItem, Proxy, ProxyError};

use env_logger::{Builder, Env};

/// Loads `.env` (if present) and initialises the logger with an `info` default.
pub fn setup_env() {
    dotenvy::dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
