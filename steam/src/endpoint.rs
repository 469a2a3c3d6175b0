use strum_macros::{Display, EnumString};

/// Web API endpoints used by the identity client.
#[derive(EnumString, Display, Copy, Clone, Debug)]
pub enum Endpoint {
    #[strum(serialize = "/ISteamUser/GetPlayerSummaries/v2/")]
    PlayerSummaries,
}
