//! File-backed registry on sqlite.
//!
//! Several processes on one host can share a registry file: sqlite
//! serializes writers and WAL mode keeps readers from blocking them.

use async_trait::async_trait;
use parking_lot::Mutex;
use procreg_shared::errors::{ProcregError, ProcregResult};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{RegistryRepository, child_segment};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS registry_entries (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Clone, Debug)]
pub struct SqliteRegistry {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteRegistry {
    /// Open (or create) a registry file.
    pub fn open(path: &Path) -> ProcregResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProcregError::Registry(format!(
                    "failed to create registry dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            ProcregError::Registry(format!(
                "failed to open registry {}: {}",
                path.display(),
                e
            ))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(registry_err)?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .map_err(registry_err)?;

        tracing::debug!(path = %path.display(), "Opened sqlite registry");
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Private registry that lives as long as this value.
    pub fn open_in_memory() -> ProcregResult<Self> {
        let conn = Connection::open_in_memory().map_err(registry_err)?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> ProcregResult<Self> {
        conn.execute(SCHEMA, []).map_err(registry_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a statement batch on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> ProcregResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| ProcregError::Internal(format!("registry task failed: {}", e)))?
        .map_err(registry_err)
    }
}

fn registry_err(e: rusqlite::Error) -> ProcregError {
    ProcregError::Registry(e.to_string())
}

#[async_trait]
impl RegistryRepository for SqliteRegistry {
    async fn get(&self, key: &str) -> ProcregResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM registry_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
    }

    async fn put(&self, key: &str, value: &str) -> ProcregResult<()> {
        let (key, value) = (key.to_string(), value.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO registry_entries (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, key: &str) -> ProcregResult<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let prefix = format!("{}/", key);
            conn.execute(
                "DELETE FROM registry_entries
                 WHERE key = ?1 OR substr(key, 1, length(?2)) = ?2",
                params![key, prefix],
            )
            .map(|_| ())
        })
        .await
    }

    async fn list_children(&self, key: &str) -> ProcregResult<Vec<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let prefix = format!("{}/", key);
            let mut stmt = conn.prepare(
                "SELECT key FROM registry_entries WHERE substr(key, 1, length(?1)) = ?1",
            )?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let children: BTreeSet<String> = keys
                .iter()
                .filter_map(|k| child_segment(&key, k))
                .map(str::to_string)
                .collect();
            Ok(children.into_iter().collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_and_subtree_delete() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        registry.put("/r/a", "x").await.unwrap();
        registry.put("/r/a/u1", "DONE").await.unwrap();
        registry.put("/r/ab", "y").await.unwrap();

        let mut children = registry.list_children("/r").await.unwrap();
        children.sort();
        assert_eq!(children, vec!["a", "ab"]);

        registry.delete("/r/a").await.unwrap();
        assert_eq!(registry.get("/r/a").await.unwrap(), None);
        assert_eq!(registry.get("/r/a/u1").await.unwrap(), None);
        assert_eq!(registry.get("/r/ab").await.unwrap().as_deref(), Some("y"));

        registry.delete("/r/a").await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        registry.put("/r/a", "1").await.unwrap();
        registry.put("/r/a", "2").await.unwrap();
        assert_eq!(registry.get("/r/a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_file_shared_between_handles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("registry.db");

        let writer = SqliteRegistry::open(&path).unwrap();
        writer.put("/r/a", "x").await.unwrap();

        let reader = SqliteRegistry::open(&path).unwrap();
        assert_eq!(reader.get("/r/a").await.unwrap().as_deref(), Some("x"));
        assert_eq!(reader.path(), Some(path.as_path()));
    }
}
