//! Background sync: best-effort replay of queued offline writes.

use serde::Serialize;
use stowaway_core::{CacheDb, PendingWrite};
use url::Url;

use crate::fetch::Network;
use crate::request::InterceptedRequest;

/// The only sync tag the worker reacts to.
pub const SYNC_TAG: &str = "background-sync";

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub tag: String,
    pub handled: bool,
    pub replayed: usize,
    pub failed: usize,
}

fn to_request(write: &PendingWrite) -> Option<InterceptedRequest> {
    let url = Url::parse(&write.url).ok()?;
    let mut request = InterceptedRequest::with_method(&write.method, url).ok()?;
    for (name, value) in &write.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = &write.body {
        request = request.with_body(body.clone());
    }
    Some(request)
}

/// Replay every queued write against the network.
///
/// A write leaves the queue once the server answered it, whatever the
/// status. Transport failures stay queued for the next sync. Nothing here
/// propagates an error.
pub async fn replay_pending(db: &CacheDb, network: &dyn Network, tag: &str) -> SyncReport {
    let mut report = SyncReport { tag: tag.to_string(), handled: tag == SYNC_TAG, replayed: 0, failed: 0 };
    if !report.handled {
        tracing::debug!(tag, "ignoring unknown sync tag");
        return report;
    }

    let pending = match db.pending_writes().await {
        Ok(pending) => pending,
        Err(e) => {
            tracing::error!("background sync could not read pending writes: {e}");
            return report;
        }
    };

    tracing::info!(count = pending.len(), "background sync started");

    for write in &pending {
        let Some(request) = to_request(write) else {
            tracing::warn!(id = write.id, method = %write.method, url = %write.url, "unreplayable pending write");
            report.failed += 1;
            continue;
        };

        match network.fetch(&request).await {
            Ok(response) => {
                tracing::debug!(id = write.id, status = response.status, "replayed pending write");
                if let Err(e) = db.remove_pending_write(write.id).await {
                    tracing::warn!(id = write.id, "replayed write could not be dequeued: {e}");
                }
                report.replayed += 1;
            }
            Err(e) => {
                tracing::warn!(id = write.id, "replay failed, keeping queued: {e}");
                report.failed += 1;
            }
        }
    }

    report
}
