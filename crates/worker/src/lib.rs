//! Offline-caching request router for stowaway.
//!
//! This crate provides the request model, the network seam, the routing
//! strategies and the worker lifecycle driven by the server.

pub mod fetch;
pub mod lifecycle;
pub mod request;
pub mod router;

#[cfg(test)]
mod testing;

pub use fetch::{FetchConfig, HttpNetwork, Network};
pub use lifecycle::{EventOutcome, ServiceWorker, WorkerEvent, WorkerState};
pub use request::InterceptedRequest;
pub use router::{Classifier, FetchOutcome, ResponseSource, Route, Routed, Router, Strategy};
