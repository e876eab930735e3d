//! Core types and shared functionality for stowaway.
//!
//! This crate provides:
//! - Cache store implementation with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedEntry, CachedResponse, PendingWrite, RequestKey};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
