//! SQLite-backed cache storage for the request router.
//!
//! This module provides durable, named cache stores using SQLite with async
//! access via tokio-rusqlite. It supports:
//!
//! - Entries keyed by request identity (method + URL, SHA-256 hashed)
//! - Store enumeration in creation order and cascading store deletion
//! - Transactional batch writes for all-or-nothing population
//! - A queue of pending writes for background sync
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod pending;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedEntry, CachedResponse, RequestKey};
pub use pending::PendingWrite;
