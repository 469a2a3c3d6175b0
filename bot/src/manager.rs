//! Registry of running account workflows.
use crate::service::{SessionFactory, Store};
use crate::workflow::{AccountWorkflow, State};
use crate::{Error, Result};
use common::{Account, Settings};
use futures::future::join_all;
use log::{error, info};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Handle {
    id: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Observes one freshly spawned workflow until it settles.
struct Startup {
    state: watch::Receiver<State>,
    done: oneshot::Receiver<Result<()>>,
}

impl Startup {
    async fn wait(mut self, login: &str) -> Result<()> {
        let supervising = match self
            .state
            .wait_for(|state| matches!(state, State::Supervising | State::Stopped))
            .await
        {
            Ok(state) => *state == State::Supervising,
            Err(_) => false,
        };
        if supervising {
            return Ok(());
        }

        match self.done.await {
            Ok(Ok(())) => Err(Error::Cancelled(login.to_string())),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Aborted(login.to_string())),
        }
    }
}

pub struct WorkflowManager {
    factory: Arc<dyn SessionFactory>,
    store: Arc<dyn Store>,
    settings: Arc<Settings>,
    registry: Arc<Mutex<HashMap<String, Handle>>>,
    next_id: AtomicU64,
}

impl WorkflowManager {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        store: Arc<dyn Store>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            factory,
            store,
            settings,
            registry: Arc::default(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Stored accounts, restricted to `only` when given.
    pub async fn stored_accounts(&self, only: Option<&[String]>) -> Result<Vec<Account>> {
        let accounts = self.store.accounts().await?;
        Ok(match only {
            Some(logins) => accounts
                .into_iter()
                .filter(|account| logins.contains(&account.login))
                .collect(),
            None => accounts,
        })
    }

    /// Starts `accounts` and keeps them running until `shutdown` resolves,
    /// then stops every workflow.
    ///
    /// `shutdown` is watched during startup too, so an account stuck before
    /// [`State::Supervising`] never blocks the stop.
    pub async fn run_until<F>(&self, accounts: Vec<Account>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tokio::select! {
            outcomes = self.start(accounts) => {
                for (login, outcome) in outcomes {
                    match outcome {
                        Ok(()) => info!("[{login}] Bot started"),
                        Err(e) => error!("[{login}] Bot failed to start: {e}"),
                    }
                }
                (&mut shutdown).await;
            }
            () = &mut shutdown => info!("Shutdown requested while bots were starting"),
        }

        info!("Shutting down {} bots", self.running().await.len());
        self.stop_all().await;
    }

    /// Spawns a workflow for every account that is not running yet.
    ///
    /// Waits until each new workflow reaches [`State::Supervising`] and returns
    /// one outcome per newly started account. Accounts that were already
    /// running are left untouched and are not part of the result.
    pub async fn start(&self, accounts: Vec<Account>) -> Vec<(String, Result<()>)> {
        let mut started = Vec::new();
        {
            let mut registry = self.registry.lock().await;
            for account in accounts {
                let login = account.login.clone();
                if registry.contains_key(&login) {
                    info!("[{login}] Bot workflow is already running");
                    continue;
                }
                let startup = self.spawn(account, &mut registry);
                started.push((login, startup));
            }
        }

        join_all(started.into_iter().map(|(login, startup)| async move {
            let outcome = match startup {
                Ok(startup) => startup.wait(&login).await,
                Err(e) => Err(e),
            };
            (login, outcome)
        }))
        .await
    }

    fn spawn(&self, account: Account, registry: &mut HashMap<String, Handle>) -> Result<Startup> {
        let session = self.factory.open(&account)?;
        let login = account.login.clone();
        let workflow = AccountWorkflow::new(
            account,
            session,
            Arc::clone(&self.store),
            Arc::clone(&self.settings),
        );

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let state = workflow.subscribe();
        let (done_tx, done) = oneshot::channel();

        let task = tokio::spawn({
            let token = token.clone();
            let registry = Arc::clone(&self.registry);
            let login = login.clone();
            async move {
                let result = workflow.run(token).await;
                drop(workflow);

                let mut registry = registry.lock().await;
                if registry.get(&login).is_some_and(|handle| handle.id == id) {
                    registry.remove(&login);
                }
                drop(registry);

                let _ = done_tx.send(result);
            }
        });

        registry.insert(login, Handle { id, token, task });
        Ok(Startup { state, done })
    }

    /// Cancels and forgets the given accounts, returning once each has logged out.
    /// Unknown logins are ignored.
    pub async fn stop(&self, logins: &[String]) {
        let handles: Vec<(String, Handle)> = {
            let mut registry = self.registry.lock().await;
            logins
                .iter()
                .filter_map(|login| registry.remove_entry(login))
                .collect()
        };

        for (_, handle) in &handles {
            handle.token.cancel();
        }

        join_all(handles.into_iter().map(|(login, handle)| async move {
            match handle.task.await {
                Ok(()) => info!("[{login}] Bot workflow stopped"),
                Err(e) => error!("[{login}] Bot workflow task failed: {e}"),
            }
        }))
        .await;
    }

    pub async fn stop_all(&self) {
        let logins = self.running().await;
        self.stop(&logins).await;
    }

    /// Logins with a live workflow, sorted.
    pub async fn running(&self) -> Vec<String> {
        let mut logins: Vec<String> = self.registry.lock().await.keys().cloned().collect();
        logins.sort();
        logins
    }

    pub async fn is_running(&self, login: &str) -> bool {
        self.registry.lock().await.contains_key(login)
    }
}
