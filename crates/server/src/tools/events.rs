//! worker_sync, worker_push, worker_notification_click and worker_message
//! tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_worker::lifecycle::{ActivationReport, ClickAction, MessageOutcome, Notification, SYNC_TAG, SyncReport};
use stowaway_worker::{EventOutcome, ServiceWorker, WorkerEvent};
use tokio::sync::oneshot;

use super::json_result;
use super::lifecycle::activate;
use crate::error::HostError;

/// Parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync tag (default: "background-sync").
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_tag() -> String {
    SYNC_TAG.into()
}

/// Parameters for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Push payload text; a generic body is used when absent or empty.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Parameters for the worker_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerNotificationClickParams {
    /// Clicked action: "explore", "close", or absent for the notification body.
    #[serde(default)]
    pub action: Option<String>,
}

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message object, e.g. {"type": "GET_VERSION"}.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerPushOutput {
    pub show_notification: Notification,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerNotificationClickOutput {
    /// The clicked notification is always closed.
    pub notification_closed: bool,
    pub action: ClickAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerMessageOutput {
    pub outcome: MessageOutcome,
    /// Whatever the worker posted back on the reply port.
    pub reply: Option<serde_json::Value>,
    /// Present when the message caused the waiting worker to activate.
    pub activation: Option<ActivationReport>,
}

/// Implementation of the worker_sync tool.
pub async fn sync_impl(worker: &ServiceWorker, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let report: SyncReport = match worker.dispatch(WorkerEvent::Sync { tag: params.tag }).await? {
        EventOutcome::Synced(report) => report,
        _ => return Err(HostError::UnexpectedOutcome("sync").into()),
    };
    json_result(&report)
}

/// Implementation of the worker_push tool.
pub async fn push_impl(worker: &ServiceWorker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    match worker.dispatch(WorkerEvent::Push { payload: params.payload }).await? {
        EventOutcome::ShowNotification(notification) => {
            json_result(&WorkerPushOutput { show_notification: notification })
        }
        _ => Err(HostError::UnexpectedOutcome("push").into()),
    }
}

/// Implementation of the worker_notification_click tool.
pub async fn notification_click_impl(
    worker: &ServiceWorker, params: WorkerNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    match worker.dispatch(WorkerEvent::NotificationClick { action: params.action }).await? {
        EventOutcome::NotificationClicked(action) => {
            json_result(&WorkerNotificationClickOutput { notification_closed: true, action })
        }
        _ => Err(HostError::UnexpectedOutcome("notificationclick").into()),
    }
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let (tx, mut rx) = oneshot::channel();

    let outcome = match worker.dispatch(WorkerEvent::Message { data: params.data, reply: Some(tx) }).await? {
        EventOutcome::Message(outcome) => outcome,
        _ => return Err(HostError::UnexpectedOutcome("message").into()),
    };

    // replies are sent before dispatch returns
    let reply = rx.try_recv().ok();

    let activation = match outcome {
        MessageOutcome::SkipWaiting { activate_now: true } => Some(activate(worker).await?),
        _ => None,
    };

    json_result(&WorkerMessageOutput { outcome, reply, activation })
}
