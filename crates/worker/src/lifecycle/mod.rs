//! Worker lifecycle.
//!
//! A [`ServiceWorker`] owns one cache version. The host feeds it
//! [`WorkerEvent`]s through [`ServiceWorker::dispatch`] and acts on the
//! returned [`EventOutcome`]: activating when asked to, showing
//! notifications, opening windows.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Activated
//!               |
//!               +-> Redundant (install failed, nothing to fall back to)
//! ```

pub mod message;
pub mod notify;
pub mod stores;
pub mod sync;

pub use message::{MessageOutcome, ReplyPort, WorkerMessage};
pub use notify::{ClickAction, Notification};
pub use stores::{ActivationReport, InstallReport, StoreManager};
pub use sync::{SYNC_TAG, SyncReport};

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stowaway_core::{AppConfig, CacheDb, Error};
use tokio::sync::RwLock;

use crate::fetch::Network;
use crate::request::InterceptedRequest;
use crate::router::{FetchOutcome, Router};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to be activated.
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Events delivered by the host.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(InterceptedRequest),
    Sync { tag: String },
    Push { payload: Option<String> },
    NotificationClick { action: Option<String> },
    Message { data: serde_json::Value, reply: Option<ReplyPort> },
}

impl WorkerEvent {
    fn name(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Sync { .. } => "sync",
            WorkerEvent::Push { .. } => "push",
            WorkerEvent::NotificationClick { .. } => "notificationclick",
            WorkerEvent::Message { .. } => "message",
        }
    }
}

/// What the host should do once an event has been handled.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Synced(SyncReport),
    ShowNotification(Notification),
    NotificationClicked(ClickAction),
    Message(MessageOutcome),
}

pub struct ServiceWorker {
    config: AppConfig,
    db: CacheDb,
    network: Arc<dyn Network>,
    router: Router,
    stores: StoreManager,
    state: RwLock<WorkerState>,
    refreshing: AtomicBool,
    skip_waiting: AtomicBool,
}

impl ServiceWorker {
    pub fn new(config: AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let router = Router::new(db.clone(), network.clone(), &config);
        let stores = StoreManager::new(db.clone(), network.clone(), &config)?;
        Ok(Self {
            config,
            db,
            network,
            router,
            stores,
            state: RwLock::new(WorkerState::Parsed),
            refreshing: AtomicBool::new(false),
            skip_waiting: AtomicBool::new(false),
        })
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// `<slug>-<version>`, as reported to clients.
    pub fn version_id(&self) -> String {
        self.config.version_id()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The only owner of store deletion.
    pub fn stores(&self) -> &StoreManager {
        &self.stores
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// - `Error::InstallFailed` when install population fails
    /// - `Error::InvalidInput` when the event is not valid in the current state
    /// - `Error::FetchFailed` from a stale-while-revalidate fetch with no cached
    ///   copy and no network
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        tracing::debug!(event = event.name(), "dispatching");

        match event {
            WorkerEvent::Install => self.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.fetch(&request).await.map(EventOutcome::Fetched),
            WorkerEvent::Sync { tag } => {
                let report = sync::replay_pending(&self.db, self.network.as_ref(), &tag).await;
                Ok(EventOutcome::Synced(report))
            }
            WorkerEvent::Push { payload } => {
                let notification = notify::notification_for_push(&self.config, payload.as_deref());
                Ok(EventOutcome::ShowNotification(notification))
            }
            WorkerEvent::NotificationClick { action } => {
                Ok(EventOutcome::NotificationClicked(notify::click_action(action.as_deref(), &self.config.root_url)))
            }
            WorkerEvent::Message { data, reply } => Ok(EventOutcome::Message(self.message(&data, reply).await)),
        }
    }

    /// Wait for background revalidations to finish.
    pub async fn settle(&self) {
        self.router.settle().await;
    }

    /// Enter `next`, returning the state left behind.
    ///
    /// An `Activated` worker stays `Activated` for the whole refresh so
    /// fetches keep being intercepted; only one refresh runs at a time.
    async fn transition(&self, allowed: &[WorkerState], next: WorkerState) -> Result<WorkerState, Error> {
        let mut state = self.state.write().await;
        let previous = *state;
        if !allowed.contains(&previous) {
            return Err(Error::InvalidInput(format!("cannot move from {previous} to {next}")));
        }
        if previous == WorkerState::Activated {
            if self.refreshing.swap(true, Ordering::SeqCst) {
                return Err(Error::InvalidInput(format!("cannot move to {next}: a refresh is already running")));
            }
        } else {
            *state = next;
        }
        Ok(previous)
    }

    /// Leave a transition started from `previous`, landing in `next`.
    async fn finish(&self, previous: WorkerState, next: WorkerState) {
        if previous == WorkerState::Activated {
            self.refreshing.store(false, Ordering::SeqCst);
            return;
        }
        let mut state = self.state.write().await;
        tracing::info!(from = %*state, to = %next, "worker state changed");
        *state = next;
    }

    async fn install(&self) -> Result<InstallReport, Error> {
        let previous = self
            .transition(&[WorkerState::Parsed, WorkerState::Installed, WorkerState::Activated], WorkerState::Installing)
            .await?;

        tracing::info!(version = %self.version_id(), entries = self.config.manifest.len(), "installing");

        match self.stores.ensure_static_populated(&self.config.manifest).await {
            Ok(cached) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                self.finish(previous, WorkerState::Installed).await;
                Ok(InstallReport { store: self.config.static_store(), cached, skip_waiting: true })
            }
            Err(e) => {
                tracing::error!("install failed: {e}");
                self.finish(previous, WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    async fn activate(&self) -> Result<ActivationReport, Error> {
        let previous = self
            .transition(&[WorkerState::Installed, WorkerState::Activated], WorkerState::Activating)
            .await?;

        match self.stores.activate_latest().await {
            Ok(deleted) => {
                self.finish(previous, WorkerState::Activated).await;
                tracing::info!(deleted = deleted.len(), "activated, clients claimed");
                Ok(ActivationReport {
                    kept: self.stores.current().iter().map(|s| s.to_string()).collect(),
                    deleted,
                    clients_claimed: true,
                })
            }
            Err(e) => {
                tracing::error!("activation failed: {e}");
                self.finish(previous, previous).await;
                Err(e)
            }
        }
    }

    async fn fetch(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        if self.state().await != WorkerState::Activated {
            tracing::debug!(url = %request.url, "worker not active, not intercepting");
            return Ok(FetchOutcome::Passthrough);
        }
        self.router.route(request).await
    }

    async fn message(&self, data: &serde_json::Value, reply: Option<ReplyPort>) -> MessageOutcome {
        match WorkerMessage::parse(data) {
            Some(WorkerMessage::SkipWaiting) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                let activate_now = self.state().await == WorkerState::Installed;
                MessageOutcome::SkipWaiting { activate_now }
            }
            Some(WorkerMessage::GetVersion) => {
                let version = self.version_id();
                let replied = message::reply_version(reply, &version);
                MessageOutcome::Version { version, replied }
            }
            None => {
                tracing::debug!("ignoring unrecognized message");
                MessageOutcome::Ignored
            }
        }
    }
}
