//! SQLite-backed [`CacheStorage`].
//!
//! Stores live in `cache_stores`; entries cascade with their store, so
//! deleting a store is a single statement.

use async_trait::async_trait;
use http::StatusCode;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::{CacheStorage, StoreInfo};
use crate::Error;
use crate::request::{WorkerRequest, WorkerResponse};

/// A row ready to be written into `cache_entries`.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &WorkerRequest, response: &WorkerResponse) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.header_pairs())
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: request.cache_key(),
            method: request.method.to_string(),
            url: request.url.to_string(),
            status: response.status.as_u16(),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

fn insert_store(conn: &rusqlite::Connection, name: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(conn: &rusqlite::Connection, store: &str, row: &EntryRow) -> Result<(), Error> {
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
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            &row.headers_json,
            &row.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn decode_response(status: u16, headers_json: &str, body: Vec<u8>) -> Result<WorkerResponse, Error> {
    let status = StatusCode::from_u16(status)
        .map_err(|e| Error::InvalidInput(format!("stored status {status} is invalid: {e}")))?;
    let pairs: Vec<(String, String)> = serde_json::from_str(headers_json)
        .map_err(|e| Error::InvalidInput(format!("stored headers are invalid: {e}")))?;
    Ok(WorkerResponse { status, headers: WorkerResponse::headers_from_pairs(&pairs), body: body.into() })
}

type RawEntry = (u16, String, Vec<u8>);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_store(conn, &name) })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, name: &str, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        let name = name.to_string();
        let key_hash = request.cache_key();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![name, key_hash],
                    read_raw,
                );
                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(|(status, headers, body)| decode_response(status, &headers, body))
            .transpose()
    }

    async fn match_any(&self, request: &WorkerRequest) -> Result<Option<WorkerResponse>, Error> {
        let key_hash = request.cache_key();
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.headers_json, e.body
                    FROM cache_entries e JOIN cache_stores s ON e.store = s.name
                    WHERE e.key_hash = ?1
                    ORDER BY s.rowid ASC LIMIT 1",
                    params![key_hash],
                    read_raw,
                );
                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(|(status, headers, body)| decode_response(status, &headers, body))
            .transpose()
    }

    async fn put(&self, name: &str, request: &WorkerRequest, response: &WorkerResponse) -> Result<(), Error> {
        let name = name.to_string();
        let row = EntryRow::new(request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_store(conn, &name)?;
                upsert_entry(conn, &name, &row)
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(WorkerRequest, WorkerResponse)]) -> Result<(), Error> {
        let name = name.to_string();
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::new(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                insert_store(&tx, &name)?;
                for row in &rows {
                    upsert_entry(&tx, &name, row)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn stats(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, COUNT(e.key_hash)
                    FROM cache_stores s LEFT JOIN cache_entries e ON e.store = s.name
                    GROUP BY s.name ORDER BY s.rowid ASC",
                )?;
                let stats = stmt
                    .query_map([], |row| Ok(StoreInfo { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> WorkerRequest {
        WorkerRequest::get(Url::parse("https://portfolio.test").unwrap().join(path).unwrap())
    }

    fn response(body: &'static str) -> WorkerResponse {
        let mut response = WorkerResponse::new(StatusCode::OK, body);
        response
            .headers
            .insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static("text/css"));
        response
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static-cache-v1.0", &request("/styles.css"), &response("body{}"))
            .await
            .unwrap();

        let hit = db
            .match_in("static-cache-v1.0", &request("/styles.css"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.status, StatusCode::OK);
        assert_eq!(hit.body.as_ref(), b"body{}");
        assert_eq!(hit.content_type(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_match_in_other_store_misses() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static-cache-v1.0", &request("/styles.css"), &response("a"))
            .await
            .unwrap();

        let miss = db
            .match_in("dynamic-cache-v1.0", &request("/styles.css"))
            .await
            .unwrap();
        assert!(miss.is_none());
        assert!(
            db.match_any(&request("/styles.css"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("first").await.unwrap();
        db.open("second").await.unwrap();
        db.put("second", &request("/a.js"), &response("second")).await.unwrap();
        db.put("first", &request("/a.js"), &response("first")).await.unwrap();

        let hit = db.match_any(&request("/a.js")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"first");
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic", &request("/x"), &response("old")).await.unwrap();
        db.put("dynamic", &request("/x"), &response("new")).await.unwrap();

        let hit = db.match_in("dynamic", &request("/x")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"new");
        assert_eq!(db.stats().await.unwrap()[0].entries, 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("leftover_v0", &request("/old.css"), &response("old")).await.unwrap();

        assert!(db.delete("leftover_v0").await.unwrap());
        assert!(!db.delete("leftover_v0").await.unwrap());
        assert!(db.keys().await.unwrap().is_empty());
        assert!(db.match_any(&request("/old.css")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_all_and_keys_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("static-cache-v1.0").await.unwrap();
        db.put_all(
            "dynamic-cache-v1.0",
            &[(request("/1.jpg"), response("1")), (request("/2.jpg"), response("2"))],
        )
        .await
        .unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["static-cache-v1.0", "dynamic-cache-v1.0"]);
        let stats = db.stats().await.unwrap();
        assert_eq!(stats[0], StoreInfo { name: "static-cache-v1.0".into(), entries: 0 });
        assert_eq!(stats[1], StoreInfo { name: "dynamic-cache-v1.0".into(), entries: 2 });
    }
}
