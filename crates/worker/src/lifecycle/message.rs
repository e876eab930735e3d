//! Cross-context messages.
//!
//! Inbound messages are JSON objects tagged by `type`. Anything that does not
//! parse as a known message is ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Channel a client hands over to receive a reply.
pub type ReplyPort = oneshot::Sender<serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    #[serde(rename = "GET_VERSION")]
    GetVersion,
}

impl WorkerMessage {
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Waiting was skipped; `activate_now` is set when an installed worker
    /// was waiting and the host should activate it immediately.
    SkipWaiting { activate_now: bool },
    Version { version: String, replied: bool },
    Ignored,
}

/// Send `{ "version": ... }` over the reply port. Returns whether it was delivered.
pub fn reply_version(port: Option<ReplyPort>, version: &str) -> bool {
    let Some(port) = port else {
        tracing::warn!("GET_VERSION without a reply port");
        return false;
    };
    port.send(serde_json::json!({ "version": version })).is_ok()
}
