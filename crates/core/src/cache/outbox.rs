//! Durable outbox for submissions made while offline.
//!
//! Entries are grouped by sync tag and replayed by the worker's background
//! sync handler.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A queued submission waiting for connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PendingSubmission {
    pub id: i64,
    pub tag: String,
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub queued_at: String,
}

impl CacheDb {
    /// Queue a submission under a sync tag. Returns its id.
    pub async fn enqueue_submission(
        &self, tag: &str, method: &str, url: &str, content_type: Option<&str>, body: &[u8],
    ) -> Result<i64, Error> {
        let tag = tag.to_string();
        let method = method.to_ascii_uppercase();
        let url = url.to_string();
        let content_type = content_type.map(str::to_string);
        let body = body.to_vec();
        let queued_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO outbox (tag, method, url, content_type, body, queued_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![tag, method, url, content_type, body, queued_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Pending submissions for a tag, oldest first.
    pub async fn pending_submissions(&self, tag: &str) -> Result<Vec<PendingSubmission>, Error> {
        let tag = tag.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<PendingSubmission>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, tag, method, url, content_type, body, queued_at
                    FROM outbox WHERE tag = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map(params![tag], |row| {
                        Ok(PendingSubmission {
                            id: row.get(0)?,
                            tag: row.get(1)?,
                            method: row.get(2)?,
                            url: row.get(3)?,
                            content_type: row.get(4)?,
                            body: row.get(5)?,
                            queued_at: row.get(6)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a submission once it has been delivered.
    pub async fn remove_submission(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM outbox WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
