use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Marketplace error: {0}")]
    Market(#[from] market::Error),

    #[error("Identity error: {0}")]
    Steam(#[from] steam::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::Error),

    #[error("Workflow task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Workflow for {0} was stopped before it finished starting")]
    Cancelled(String),

    #[error("Workflow for {0} ended without reporting an outcome")]
    Aborted(String),
}

impl Error {
    /// Bad credentials are not transient and must never be retried.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::Steam(steam::Error::InvalidCredentials(_)))
    }
}
