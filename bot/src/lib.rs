mod error;
pub mod keys;
pub mod manager;
pub mod observe;
pub mod prices;
pub mod retry;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use keys::KeyPool;
pub use manager::WorkflowManager;
pub use prices::{priced_items, PriceCollector, PriceMap};
pub use retry::{repeat_forever, retry_until};
pub use service::{ClientFactory, Identity, Marketplace, Session, SessionFactory, Store};
pub use workflow::{AccountWorkflow, State};

pub type Result<T> = std::result::Result<T, Error>;
