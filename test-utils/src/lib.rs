//! Test helpers shared by procreg crates.
//!
//! [`RecordingRegistry`] wraps an in-memory registry, counts every call,
//! and can inject the races and failures a remote registry produces.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use procreg::{
    ExecutionContext, MemoryRegistry, ProcessRegistryManager, ProcregError, ProcregResult,
    RegistryRepository, SummaryReport, UnitId,
};

/// Calls observed by a [`RecordingRegistry`].
#[derive(Debug, Default)]
pub struct CallCounts {
    pub get: AtomicUsize,
    pub put: AtomicUsize,
    pub delete: AtomicUsize,
    pub list_children: AtomicUsize,
}

impl CallCounts {
    pub fn gets(&self) -> usize {
        self.get.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.put.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_children.load(Ordering::SeqCst)
    }

    /// Writes of any kind (put or delete).
    pub fn writes(&self) -> usize {
        self.puts() + self.deletes()
    }
}

#[derive(Default)]
struct Faults {
    /// Keys removed right after the next children scan of their parent.
    vanish_after_list: HashSet<String>,
    fail_puts: bool,
    put_delay: Option<Duration>,
}

/// Registry wrapper that records calls and injects faults.
#[derive(Clone, Default)]
pub struct RecordingRegistry {
    inner: MemoryRegistry,
    calls: Arc<CallCounts>,
    faults: Arc<Mutex<Faults>>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Backing store, for reads that should not be counted.
    pub fn inner(&self) -> &MemoryRegistry {
        &self.inner
    }

    /// Delete `key` right after the next `list_children` of its parent
    /// returns, as if another node removed it concurrently.
    pub fn vanish_after_list(&self, key: impl Into<String>) {
        self.faults.lock().vanish_after_list.insert(key.into());
    }

    /// Make every subsequent `put` fail with a registry error.
    pub fn fail_puts(&self, fail: bool) {
        self.faults.lock().fail_puts = fail;
    }

    /// Sleep before each `put`, widening race windows.
    pub fn delay_puts(&self, delay: Duration) {
        self.faults.lock().put_delay = Some(delay);
    }
}

#[async_trait]
impl RegistryRepository for RecordingRegistry {
    async fn get(&self, key: &str) -> ProcregResult<Option<String>> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> ProcregResult<()> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        let (fail, delay) = {
            let faults = self.faults.lock();
            (faults.fail_puts, faults.put_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ProcregError::Registry(format!(
                "injected put failure for {}",
                key
            )));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> ProcregResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn list_children(&self, key: &str) -> ProcregResult<Vec<String>> {
        self.calls.list_children.fetch_add(1, Ordering::SeqCst);
        let children = self.inner.list_children(key).await?;

        let vanishing: Vec<String> = {
            let mut faults = self.faults.lock();
            let matched: Vec<String> = faults
                .vanish_after_list
                .iter()
                .filter(|k| k.rsplit_once('/').map(|(parent, _)| parent) == Some(key))
                .cloned()
                .collect();
            for k in &matched {
                faults.vanish_after_list.remove(k);
            }
            matched
        };
        for k in vanishing {
            self.inner.delete(&k).await?;
        }

        Ok(children)
    }
}

/// Manager over a fresh recording registry.
pub fn recording_manager() -> (ProcessRegistryManager, RecordingRegistry) {
    let registry = RecordingRegistry::new();
    let manager = ProcessRegistryManager::new(Arc::new(registry.clone()));
    (manager, registry)
}

/// Summary report for `execution_id` with the given unit ids.
pub fn summary(execution_id: &str, units: &[&str]) -> SummaryReport {
    SummaryReport::new(ExecutionContext::new(
        execution_id,
        units.iter().map(|u| UnitId::from(*u)).collect(),
    ))
}
