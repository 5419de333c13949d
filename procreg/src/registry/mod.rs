//! Registry client contract.
//!
//! The registry is the system of record for in-flight executions. It is a
//! hierarchical key-value store addressed by `/`-separated paths, in the
//! manner of etcd or ZooKeeper. The manager only needs four primitives.
//!
//! Implementations:
//! - [`MemoryRegistry`]: in-process, for single-node deployments and tests
//! - [`SqliteRegistry`]: file-backed, shared by processes on one host

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

use async_trait::async_trait;
use procreg_shared::errors::ProcregResult;

pub use memory::MemoryRegistry;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRegistry;

/// Registry client used by the manager.
///
/// Every call is a synchronous round trip from the caller's point of view.
/// Transient failures are the implementation's concern: whatever error it
/// returns is surfaced to the signal's caller unmodified.
#[async_trait]
pub trait RegistryRepository: Send + Sync + 'static {
    /// Read the value at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> ProcregResult<Option<String>>;

    /// Create or overwrite the value at `key`.
    async fn put(&self, key: &str, value: &str) -> ProcregResult<()>;

    /// Remove `key` and everything below it.
    ///
    /// Succeeds if the key does not exist.
    async fn delete(&self, key: &str) -> ProcregResult<()>;

    /// Names of the direct children of `key`.
    ///
    /// A point-in-time snapshot, not a watch: children may be created or
    /// removed before the caller reads them. Order is unspecified.
    async fn list_children(&self, key: &str) -> ProcregResult<Vec<String>>;
}

/// Direct child name of `parent` that `key` lies under, if any.
pub(crate) fn child_segment<'a>(parent: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(parent)?.strip_prefix('/')?;
    let segment = rest.split('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_segment() {
        assert_eq!(child_segment("/a", "/a/b"), Some("b"));
        assert_eq!(child_segment("/a", "/a/b/c"), Some("b"));
        assert_eq!(child_segment("/a", "/ab/c"), None);
        assert_eq!(child_segment("/a", "/a"), None);
        assert_eq!(child_segment("/a", "/b/c"), None);
    }
}
