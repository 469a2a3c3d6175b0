//! Client for the item marketplace API: keep-alive calls, inventory sync and
//! price lookups by hash-name, paced per API key.
mod client;
mod endpoint;
mod error;
mod rate_limiter;
mod schema;

pub use client::Client;
pub use endpoint::Endpoint;
pub use error::Error;
pub use rate_limiter::RateLimits;
pub use schema::{
    Inventory, InventoryItem, Listing, PriceLookup, SuccessResponse, BAD_KEY_ERROR,
};

pub type Result<T> = std::result::Result<T, Error>;
