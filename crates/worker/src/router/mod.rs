//! Offline request router.
//!
//! Every intercepted request is classified and answered by one strategy:
//!
//! - **cache-first**: static assets; the network is only asked on a miss.
//! - **network-first**: API calls and page navigations; the cache is only
//!   consulted when the transport fails.
//! - **stale-while-revalidate**: everything else; the cached copy is returned
//!   at once and refreshed in the background.
//!
//! An HTTP error status from a reachable server is never a failure here and
//! is returned unchanged. Only stale-while-revalidate can reject, and only
//! when nothing was cached and the network failed too.

pub mod classify;
pub mod fallback;
mod strategy;

pub use classify::{Classifier, Route, Strategy};

use serde::Serialize;
use std::sync::Arc;
use stowaway_core::{AppConfig, CacheDb, CachedResponse, Error};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::fetch::Network;
use crate::request::InterceptedRequest;

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    Synthesized,
}

/// A response produced by one of the strategies.
#[derive(Debug, Clone)]
pub struct Routed {
    pub strategy: Strategy,
    pub source: ResponseSource,
    pub response: CachedResponse,
}

/// Result of handing a request to the router.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The router declined the request; the host sends it to the network itself.
    Passthrough,
    Responded(Routed),
}

/// Routes intercepted requests through the cache stores.
pub struct Router {
    db: CacheDb,
    network: Arc<dyn Network>,
    classifier: Classifier,
    static_store: String,
    dynamic_store: String,
    app_name: String,
    revalidations: Mutex<JoinSet<()>>,
}

impl Router {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: &AppConfig) -> Self {
        Self {
            db,
            network,
            classifier: Classifier::from_config(config),
            static_store: config.static_store(),
            dynamic_store: config.dynamic_store(),
            app_name: config.app_name.clone(),
            revalidations: Mutex::new(JoinSet::new()),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Answer an intercepted request.
    ///
    /// # Errors
    ///
    /// Returns `Error::FetchFailed` only from stale-while-revalidate when the
    /// dynamic store has no copy and the network fetch failed.
    pub async fn route(&self, request: &InterceptedRequest) -> Result<FetchOutcome, Error> {
        let strategy = match self.classifier.classify(request) {
            Route::Passthrough => {
                tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
                return Ok(FetchOutcome::Passthrough);
            }
            Route::Intercept(strategy) => strategy,
        };

        tracing::debug!(url = %request.url, %strategy, "intercepted");

        let routed = match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await?,
        };

        Ok(FetchOutcome::Responded(routed))
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.revalidations.lock().await);
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("revalidation task failed: {e}");
            }
        }
    }
}
