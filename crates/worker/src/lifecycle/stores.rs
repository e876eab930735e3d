//! Cache store lifecycle: install-time population and activation-time pruning.

use futures_util::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use stowaway_core::{AppConfig, CacheDb, Error};
use url::Url;

use crate::fetch::{Network, resolve};
use crate::request::InterceptedRequest;

/// Result of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub store: String,
    pub cached: usize,
    /// The new version takes over without waiting for old clients to close.
    pub skip_waiting: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// Owns the versioned static and dynamic stores.
pub struct StoreManager {
    db: CacheDb,
    network: Arc<dyn Network>,
    origin: Url,
    static_store: String,
    dynamic_store: String,
}

impl StoreManager {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self { db, network, origin, static_store: config.static_store(), dynamic_store: config.dynamic_store() })
    }

    /// Names of the stores that belong to the running version.
    pub fn current(&self) -> [&str; 2] {
        [self.static_store.as_str(), self.dynamic_store.as_str()]
    }

    /// Fetch every manifest entry and write them all to the static store.
    ///
    /// All-or-nothing: a transport failure or non-ok status on any entry
    /// aborts before anything is written, and the static store is not
    /// created. Returns the number of entries written.
    pub async fn ensure_static_populated(&self, manifest: &[String]) -> Result<usize, Error> {
        let requests = manifest
            .iter()
            .map(|entry| {
                resolve(&self.origin, entry)
                    .map(InterceptedRequest::get)
                    .map_err(|e| Error::InstallFailed(format!("{entry}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fetched = try_join_all(requests.iter().map(|request| async move {
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
            if !response.is_ok() {
                return Err(Error::InstallFailed(format!("{}: status {}", request.url, response.status)));
            }
            Ok::<_, Error>((request.key(), response))
        }))
        .await?;

        self.db
            .put_entries(&self.static_store, fetched)
            .await
            .map_err(|e| Error::InstallFailed(format!("writing {}: {e}", self.static_store)))
    }

    /// Delete every store outside the current version pair.
    ///
    /// Idempotent; returns the names actually deleted by this call.
    pub async fn activate_latest(&self) -> Result<Vec<String>, Error> {
        let current = self.current();
        let mut deleted = Vec::new();

        for name in self.db.store_names().await? {
            if current.contains(&name.as_str()) {
                continue;
            }
            if self.db.delete_store(&name).await? {
                tracing::info!(store = %name, "removed stale cache store");
                deleted.push(name);
            }
        }

        Ok(deleted)
    }
}
