//! In-memory registry.

use async_trait::async_trait;
use parking_lot::RwLock;
use procreg_shared::errors::ProcregResult;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{RegistryRepository, child_segment};

/// In-process registry backed by an ordered map.
///
/// Cloning shares the underlying map, so a clone handed to another task
/// sees the same entries. Parent nodes are implicit: writing `/a/b/c`
/// makes `b` a child of `/a` even if `/a/b` has no value.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, including nested ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl RegistryRepository for MemoryRegistry {
    async fn get(&self, key: &str) -> ProcregResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> ProcregResult<()> {
        tracing::trace!(key, "registry put");
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> ProcregResult<()> {
        let prefix = format!("{}/", key);
        let mut entries = self.entries.write();
        entries.remove(key);
        entries.retain(|k, _| !k.starts_with(&prefix));
        tracing::trace!(key, "registry delete");
        Ok(())
    }

    async fn list_children(&self, key: &str) -> ProcregResult<Vec<String>> {
        let prefix = format!("{}/", key);
        let entries = self.entries.read();
        let children: BTreeSet<&str> = entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| child_segment(key, k))
            .collect();
        Ok(children.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let registry = MemoryRegistry::new();
        assert_eq!(registry.get("/r/a").await.unwrap(), None);

        registry.put("/r/a", "1").await.unwrap();
        registry.put("/r/a", "2").await.unwrap();
        assert_eq!(registry.get("/r/a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_only() {
        let registry = MemoryRegistry::new();
        registry.put("/r/a", "x").await.unwrap();
        registry.put("/r/a/u1", "DONE").await.unwrap();
        registry.put("/r/ab", "y").await.unwrap();

        registry.delete("/r/a").await.unwrap();

        assert_eq!(registry.get("/r/a").await.unwrap(), None);
        assert_eq!(registry.get("/r/a/u1").await.unwrap(), None);
        assert_eq!(registry.get("/r/ab").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let registry = MemoryRegistry::new();
        registry.delete("/r/missing").await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_list_children_direct_only() {
        let registry = MemoryRegistry::new();
        registry.put("/r/a", "x").await.unwrap();
        registry.put("/r/a/u1", "DONE").await.unwrap();
        registry.put("/r/b", "y").await.unwrap();
        registry.put("/other/c", "z").await.unwrap();

        let mut children = registry.list_children("/r").await.unwrap();
        children.sort();
        assert_eq!(children, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.list_children("/r/a").await.unwrap(), vec!["u1"]);
        assert!(registry.list_children("/none").await.unwrap().is_empty());
    }
}
