//! Queue of offline-originated writes awaiting background replay.
//!
//! The payloads are opaque: replay sends them back to the network as-is.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A queued write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub id: i64,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub queued_at: String,
}

impl CacheDb {
    /// Queue a write for the next background sync. Returns its id.
    pub async fn enqueue_pending_write(
        &self, method: &str, url: &str, headers: Vec<(String, String)>, body: Option<Vec<u8>>,
    ) -> Result<i64, Error> {
        let method = method.to_ascii_uppercase();
        let url = url.to_string();
        let headers_json = serde_json::to_string(&headers)?;
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_writes (method, url, headers_json, body, queued_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![method, url, headers_json, body, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// All queued writes, oldest first.
    pub async fn pending_writes(&self) -> Result<Vec<PendingWrite>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PendingWrite>, Error> {
                let mut stmt = conn
                    .prepare("SELECT id, method, url, headers_json, body, queued_at FROM pending_writes ORDER BY id ASC")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Option<Vec<u8>>>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, method, url, headers_json, body, queued_at)| -> Result<PendingWrite, Error> {
                        Ok(PendingWrite { id, method, url, headers: serde_json::from_str(&headers_json)?, body, queued_at })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Drop a write from the queue once it has been replayed.
    pub async fn remove_pending_write(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM pending_writes WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
