//! Database operations for the bot fleet.
//!
//! Accounts and items are written by the admin side; the bots only read
//! accounts, move items through their statuses and record market figures.
use crate::{Error, Result};
use common::{Account, ApiKey, ItemStatus, PricedItem, Proxy};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;

const MAX_CONNECTIONS: u32 = 5;

#[derive(FromRow)]
struct AccountRow {
    login: String,
    password: String,
    steam_id: i64,
    steam_api: String,
    shared_secret: String,
    identity_secret: String,
    market_api_key: String,
    proxy: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        let proxy = row
            .proxy
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<Proxy>)
            .transpose()
            .map_err(|e| Error::InvalidRow(row.login.clone(), e.to_string()))?;

        Ok(Self {
            steam_id: u64::try_from(row.steam_id)
                .map_err(|_| Error::InvalidRow(row.login.clone(), "negative steam_id".into()))?,
            login: row.login,
            password: row.password,
            steam_api_key: row.steam_api,
            shared_secret: row.shared_secret,
            identity_secret: row.identity_secret,
            market_api_key: row.market_api_key,
            proxy,
        })
    }
}

/// Handles database operations for the bots.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to `url` and applies pending migrations.
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        log::info!("Connected to database");
        Ok(Self { pool })
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT login, password, steam_id, steam_api, shared_secret,
                   identity_secret, market_api_key, proxy
            FROM account
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Account::try_from)
        .collect()
    }

    pub async fn account_hash_names(&self, login: &str) -> Result<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT DISTINCT market_hash_name FROM item WHERE account_login = $1 ORDER BY 1",
        )
        .bind(login)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Active pool keys in insertion order.
    pub async fn active_keys(&self) -> Result<Vec<ApiKey>> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT key FROM market_key WHERE active ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(keys.into_iter().map(ApiKey::from).collect())
    }

    /// Returns whether the key was active before this call.
    pub async fn deactivate_key(&self, key: &ApiKey) -> Result<bool> {
        let result = sqlx::query("UPDATE market_key SET active = FALSE WHERE key = $1 AND active")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Moves `New` items found in the market inventory to `Wait`.
    pub async fn mark_items_waiting(&self, login: &str, asset_ids: &[String]) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE item SET status = $1
            WHERE account_login = $2 AND status = $3 AND asset_id = ANY($4)
            "#,
        )
        .bind(ItemStatus::Wait.code())
        .bind(login)
        .bind(ItemStatus::New.code())
        .bind(asset_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Records market figures for the account's items that are waiting for a price.
    pub async fn save_market_prices(&self, login: &str, items: &[PricedItem]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let hash_names: Vec<&str> = items.iter().map(|i| i.hash_name.as_str()).collect();
        let min_prices: Vec<i64> = items.iter().map(|i| i.min_price).collect();
        let market_ids: Vec<Option<i64>> = items.iter().map(|i| i.market_id).collect();
        let counts: Vec<i32> = items.iter().map(|i| i.count).collect();
        let positions: Vec<i32> = items.iter().map(|i| i.position).collect();

        let result = sqlx::query(
            r#"
            UPDATE item SET
                market_min_price = p.min_price,
                market_id = p.market_id,
                market_count = p.count,
                market_position = p.position,
                market_time = $1
            FROM UNNEST($2::text[], $3::bigint[], $4::bigint[], $5::int[], $6::int[])
                AS p(hash_name, min_price, market_id, count, position)
            WHERE item.account_login = $7
              AND item.market_hash_name = p.hash_name
              AND item.status = $8
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .bind(hash_names)
        .bind(min_prices)
        .bind(market_ids)
        .bind(counts)
        .bind(positions)
        .bind(login)
        .bind(ItemStatus::Wait.code())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(proxy: Option<&str>, steam_id: i64) -> AccountRow {
        AccountRow {
            login: "alice".into(),
            password: "pw".into(),
            steam_id,
            steam_api: "steam".into(),
            shared_secret: "s".into(),
            identity_secret: "i".into(),
            market_api_key: "m".into(),
            proxy: proxy.map(String::from),
        }
    }

    #[test]
    fn account_row_converts_with_proxy() {
        let account = Account::try_from(row(Some("1.2.3.4:1080:u:p"), 7)).unwrap();
        assert_eq!(account.steam_id, 7);
        assert_eq!(account.proxy.unwrap().port, 1080);
    }

    #[test]
    fn blank_proxy_means_direct_connection() {
        let account = Account::try_from(row(Some("  "), 7)).unwrap();
        assert!(account.proxy.is_none());
    }

    #[test]
    fn malformed_rows_are_rejected() {
        assert!(matches!(
            Account::try_from(row(Some("nope"), 7)),
            Err(Error::InvalidRow(login, _)) if login == "alice"
        ));
        assert!(Account::try_from(row(None, -1)).is_err());
    }
}
