use crate::endpoint::Endpoint;
use crate::{Error, Result};
use common::Account;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Profile {
    #[serde(rename = "steamid")]
    pub steam_id: String,
    #[serde(rename = "personaname", default)]
    pub persona_name: String,
    #[serde(rename = "profileurl", default)]
    pub profile_url: String,
}

#[derive(Deserialize)]
struct Summaries {
    response: Players,
}

#[derive(Deserialize)]
struct Players {
    #[serde(default)]
    players: Vec<Profile>,
}

/// Session with the identity provider for a single account.
pub struct Client {
    client: reqwest::Client,
    host: String,
    login: String,
    api_key: String,
    steam_id: u64,
    logged_in: AtomicBool,
}

impl Client {
    pub fn new(host: &str, account: &Account) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(TIMEOUT);
        if let Some(proxy) = &account.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.url()?)?);
        }

        Ok(Self {
            client: builder.build()?,
            host: host.trim_end_matches('/').to_string(),
            login: account.login.clone(),
            api_key: account.steam_api_key.clone(),
            steam_id: account.steam_id,
            logged_in: AtomicBool::new(false),
        })
    }

    /// Opens the session. Rejected credentials surface as [`Error::InvalidCredentials`].
    pub async fn login(&self) -> Result<()> {
        match self.profile(self.steam_id).await {
            Ok(profile) => {
                self.logged_in.store(true, Ordering::SeqCst);
                log::info!("Steam login complete for {} ({})", self.login, profile.persona_name);
                Ok(())
            }
            Err(Error::Response(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _))
            | Err(Error::NotFound(_)) => Err(Error::InvalidCredentials(self.login.clone())),
            Err(e) => Err(e),
        }
    }

    /// Closes the session. Returns whether a session was actually open.
    pub async fn logout(&self) -> bool {
        let was_open = self.logged_in.swap(false, Ordering::SeqCst);
        if was_open {
            log::info!("Steam logout complete for {}", self.login);
        }
        was_open
    }

    pub fn logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub async fn profile(&self, id: u64) -> Result<Profile> {
        let steam_id = id.to_string();
        let response = self
            .client
            .get(format!("{}{}", self.host, Endpoint::PlayerSummaries))
            .query(&[("key", self.api_key.as_str()), ("steamids", steam_id.as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::Response(status, text));
        }

        let summaries: Summaries =
            serde_json::from_str(&text).map_err(|_| Error::Deserialize(text))?;

        summaries
            .response
            .players
            .into_iter()
            .find(|profile| profile.steam_id == steam_id)
            .ok_or(Error::NotFound(id))
    }
}
