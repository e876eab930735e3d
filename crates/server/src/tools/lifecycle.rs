//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_worker::lifecycle::{ActivationReport, InstallReport};
use stowaway_worker::{EventOutcome, ServiceWorker, WorkerEvent, WorkerState};

use super::json_result;
use crate::error::HostError;

/// Parameters for the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerInstallParams {
    /// Activate right away when the worker asks to skip waiting (default: true).
    #[serde(default = "default_true")]
    pub auto_activate: bool,
}

fn default_true() -> bool {
    true
}

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerInstallOutput {
    pub version: String,
    pub state: WorkerState,
    pub install: InstallReport,
    /// Present when the host activated the worker after install.
    pub activation: Option<ActivationReport>,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerActivateOutput {
    pub version: String,
    pub state: WorkerState,
    pub activation: ActivationReport,
}

pub(crate) async fn activate(worker: &ServiceWorker) -> Result<ActivationReport, McpError> {
    match worker.dispatch(WorkerEvent::Activate).await? {
        EventOutcome::Activated(report) => Ok(report),
        _ => Err(HostError::UnexpectedOutcome("activate").into()),
    }
}

/// Implementation of the worker_install tool.
pub async fn install_impl(worker: &ServiceWorker, params: WorkerInstallParams) -> Result<CallToolResult, McpError> {
    let install = match worker.dispatch(WorkerEvent::Install).await? {
        EventOutcome::Installed(report) => report,
        _ => return Err(HostError::UnexpectedOutcome("install").into()),
    };

    let activation = if params.auto_activate && install.skip_waiting && worker.state().await == WorkerState::Installed {
        tracing::info!("worker skipped waiting, activating");
        Some(activate(worker).await?)
    } else {
        None
    };

    let output = WorkerInstallOutput { version: worker.version_id(), state: worker.state().await, install, activation };
    json_result(&output)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let activation = activate(worker).await?;
    let output = WorkerActivateOutput { version: worker.version_id(), state: worker.state().await, activation };
    json_result(&output)
}
