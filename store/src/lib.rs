//! PostgreSQL store for accounts, their items and the shared marketplace key pool.
mod db;
mod error;

pub use db::Database;
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
