//! Test doubles shared by the worker's unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stowaway_core::{AppConfig, CacheDb, CachedResponse, Error};

use crate::fetch::Network;
use crate::request::InterceptedRequest;

pub(crate) const ORIGIN: &str = "http://localhost:5000";

enum Reply {
    Respond(CachedResponse),
    Fail,
}

/// Network double: canned replies per URL, unknown URLs fail, every call is counted.
#[derive(Default)]
pub(crate) struct MockNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, url: &str, response: CachedResponse) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Respond(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.split_once(' ').is_some_and(|(_, u)| u == url)).count()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.split(' ').next().map(String::from))
            .collect()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<CachedResponse, Error> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(format!("{} {}", request.method, url));
        match self.replies.lock().unwrap().get(&url) {
            Some(Reply::Respond(response)) => Ok(response.clone()),
            Some(Reply::Fail) | None => Err(Error::FetchFailed(format!("offline: {url}"))),
        }
    }
}

pub(crate) fn url(path: &str) -> url::Url {
    crate::fetch::resolve(&url::Url::parse(ORIGIN).unwrap(), path).unwrap()
}

pub(crate) fn get(path: &str) -> InterceptedRequest {
    InterceptedRequest::get(url(path))
}

pub(crate) fn page(path: &str) -> InterceptedRequest {
    get(path).with_header("Accept", "text/html,application/xhtml+xml")
}

pub(crate) fn ok(body: &str) -> CachedResponse {
    CachedResponse::new(200, body)
}

pub(crate) async fn setup() -> (CacheDb, Arc<MockNetwork>, AppConfig) {
    let db = CacheDb::open_in_memory().await.unwrap();
    (db, MockNetwork::new(), AppConfig::default())
}
