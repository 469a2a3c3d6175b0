use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Error text the marketplace returns when the key used for a request is rejected.
pub const BAD_KEY_ERROR: &str = "Bad KEY";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InventoryItem {
    pub id: String,
    #[serde(default)]
    pub market_hash_name: Option<String>,
    #[serde(default)]
    pub market_price: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Inventory {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One sell listing for a hash-name. Prices are in the market's minor currency unit.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Listing {
    #[serde(default)]
    pub id: Option<i64>,
    pub price: i64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PriceLookup {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "map_or_empty")]
    pub data: HashMap<String, Vec<Listing>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PriceLookup {
    pub fn has_bad_key(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| error.eq_ignore_ascii_case(BAD_KEY_ERROR))
    }

    /// Orders every hash-name's listings from cheapest to most expensive.
    pub(crate) fn sorted(mut self) -> Self {
        for listings in self.data.values_mut() {
            listings.sort_by_key(|listing| listing.price);
        }
        self
    }
}

/// The API sends `[]` instead of `{}` when nothing matched.
fn map_or_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<Listing>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrSeq {
        Map(HashMap<String, Vec<Listing>>),
        Seq(Vec<serde_json::Value>),
    }

    match MapOrSeq::deserialize(deserializer)? {
        MapOrSeq::Map(map) => Ok(map),
        MapOrSeq::Seq(seq) if seq.is_empty() => Ok(HashMap::new()),
        MapOrSeq::Seq(_) => Err(serde::de::Error::custom("expected an object of listings")),
    }
}
