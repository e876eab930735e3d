//! worker_fetch tool implementation.
//!
//! Hands one request to the worker. Requests the worker declines are sent to
//! the network by the host, the way a browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stowaway_core::{CachedResponse, Error};
use stowaway_worker::fetch::resolve;
use stowaway_worker::{
    EventOutcome, FetchOutcome, InterceptedRequest, Network, ResponseSource, ServiceWorker, Strategy, WorkerEvent,
};
use url::Url;

use super::json_result;
use crate::error::HostError;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers, e.g. {"Accept": "text/html"}.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,

    /// Wait for any background revalidation this request started.
    #[serde(default)]
    pub wait_for_revalidation: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFetchOutput {
    pub method: String,
    pub url: String,
    /// False when the worker declined the request and the host fetched it.
    pub intercepted: bool,
    pub strategy: Option<Strategy>,
    pub source: ResponseSource,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

fn build_request(worker: &ServiceWorker, params: &WorkerFetchParams) -> Result<InterceptedRequest, Error> {
    let origin = Url::parse(&worker.config().origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
    let url = resolve(&origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = InterceptedRequest::with_method(&params.method, url)?;
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = &params.body {
        request = request.with_body(body.clone());
    }
    Ok(request)
}

fn output(
    request: &InterceptedRequest, strategy: Option<Strategy>, source: ResponseSource, response: CachedResponse,
) -> WorkerFetchOutput {
    WorkerFetchOutput {
        method: request.method.to_string(),
        url: request.url.to_string(),
        intercepted: strategy.is_some(),
        strategy,
        source,
        status: response.status,
        content_type: response.content_type().map(String::from),
        body: response.text().into_owned(),
        headers: response.headers,
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;

    let routed = match worker.dispatch(WorkerEvent::Fetch(request.clone())).await? {
        EventOutcome::Fetched(outcome) => outcome,
        _ => return Err(HostError::UnexpectedOutcome("fetch").into()),
    };

    let result = match routed {
        FetchOutcome::Responded(routed) => output(&request, Some(routed.strategy), routed.source, routed.response),
        FetchOutcome::Passthrough => {
            let response = worker.network().fetch(&request).await?;
            output(&request, None, ResponseSource::Network, response)
        }
    };

    if params.wait_for_revalidation {
        worker.settle().await;
    }

    json_result(&result)
}
