//! Cached request/response entries.
//!
//! An entry is keyed by request identity (method + URL) within a named
//! store. Writes are upserts: a re-fetch overwrites the previous response.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Request identity used for cache matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into().to_ascii_uppercase(), url: url.into() }
    }

    /// Shorthand for a GET identity.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Storage hash of this identity.
    pub fn hash(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A captured response: status, headers and the full body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup; first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// An entry read back from a store.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub store: String,
    pub key: RequestKey,
    pub response: CachedResponse,
    pub stored_at: String,
}

type RawEntry = (String, String, String, u16, String, Vec<u8>, String);

const SELECT_ENTRY: &str = "SELECT e.store, e.method, e.url, e.status, e.headers_json, e.body, e.stored_at
     FROM cache_entries e JOIN cache_stores s ON s.name = e.store";

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn into_entry(raw: RawEntry) -> Result<CachedEntry, Error> {
    let (store, method, url, status, headers_json, body, stored_at) = raw;
    let headers = serde_json::from_str(&headers_json)?;
    Ok(CachedEntry { store, key: RequestKey { method, url }, response: CachedResponse { status, headers, body }, stored_at })
}

fn upsert(conn: &rusqlite::Connection, store: &str, key: &RequestKey, response: &CachedResponse, now: &str) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![store, now],
    )?;
    conn.execute(
        "INSERT INTO cache_entries (store, key_hash, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            key.hash(),
            &key.method,
            &key.url,
            response.status,
            headers_json,
            &response.body,
            now
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or overwrite one entry, creating the store if needed.
    pub async fn put_entry(&self, store: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                upsert(&tx, &store, &key, &response, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries in one transaction.
    ///
    /// Either every entry is committed or none is.
    pub async fn put_entries(&self, store: &str, entries: Vec<(RequestKey, CachedResponse)>) -> Result<usize, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                for (key, response) in &entries {
                    upsert(&tx, &store, key, response, &now)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in one store.
    pub async fn match_in_store(&self, store: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE e.store = ?1 AND e.key_hash = ?2"))?;
                match stmt.query_row(params![store, hash], read_raw) {
                    Ok(raw) => into_entry(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request across every store, oldest store first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE e.key_hash = ?1 ORDER BY s.rowid ASC LIMIT 1"))?;
                match stmt.query_row(params![hash], read_raw) {
                    Ok(raw) => into_entry(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Request identities held by a store, in insertion order.
    pub async fn store_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM cache_entries WHERE store = ?1 ORDER BY rowid ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
