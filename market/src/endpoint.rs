use strum_macros::{Display, EnumString};

/// Marketplace API v2 endpoints used by the bots.
#[derive(EnumString, Display, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endpoint {
    #[strum(serialize = "/api/v2/ping")]
    Ping,
    #[strum(serialize = "/api/v2/test")]
    Test,
    #[strum(serialize = "/api/v2/set-steam-api-key")]
    SetSteamApiKey,
    #[strum(serialize = "/api/v2/update-inventory")]
    UpdateInventory,
    #[strum(serialize = "/api/v2/my-inventory")]
    MyInventory,
    #[strum(serialize = "/api/v2/search-list-items-by-hash-name-all")]
    SearchByHashNames,
}
