use anyhow::Result;
use bot::{ClientFactory, WorkflowManager};
use common::Settings;
use log::{error, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();
    let settings = Arc::new(Settings::from_env()?);
    let store = Arc::new(store::Database::new(&settings.database_url).await?);

    let factory = Arc::new(ClientFactory::new(Arc::clone(&settings)));
    let manager = WorkflowManager::new(factory, store, Arc::clone(&settings));

    let accounts = manager.stored_accounts(settings.accounts.as_deref()).await?;
    if accounts.is_empty() {
        warn!("No accounts to start");
        return Ok(());
    }

    manager
        .run_until(accounts, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {e}");
            }
        })
        .await;

    Ok(())
}
