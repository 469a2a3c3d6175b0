use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Response error:\nStatusCode: {0}\nText: {1}")]
    Response(reqwest::StatusCode, String),

    #[error("Failed to deserialize response: {0}")]
    Deserialize(String),

    /// Credentials were rejected. Retrying will not help.
    #[error("Invalid credentials for {0}")]
    InvalidCredentials(String),

    #[error("Profile not found: {0}")]
    NotFound(u64),

    #[error("Invalid proxy: {0}")]
    Proxy(#[from] common::ProxyError),
}
