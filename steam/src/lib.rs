//! Identity-provider client: opens and closes an account's session and reads
//! public profiles.
mod client;
mod endpoint;
mod error;

pub use client::{Client, Profile};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
