//! Configuration for the process registry.

use procreg_shared::constants::namespace::EXECUTION_NODES;
use procreg_shared::errors::{ProcregError, ProcregResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::Codec;
use crate::layout::RegistryLayout;
use crate::registry::{MemoryRegistry, RegistryRepository};

/// What the manager does with a completion signal.
///
/// The engine is expected to emit completion only after every unit is
/// done, but nothing in the signal proves it. This policy decides whether
/// the manager trusts the signal or checks the recorded statuses first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Delete the record on completion regardless of unit statuses.
    #[default]
    Unconditional,
    /// Refuse to delete while any unit is not `DONE`.
    RequireAllDone,
}

impl std::str::FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconditional" => Ok(CompletionPolicy::Unconditional),
            "require-all-done" => Ok(CompletionPolicy::RequireAllDone),
            other => Err(format!("unknown completion policy '{}'", other)),
        }
    }
}

/// Registry backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendOptions {
    /// In-process registry, lost on exit.
    #[default]
    Memory,
    /// Sqlite file shared by processes on this host.
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcregOptions {
    /// Registry path under which executions are stored.
    ///
    /// Default: /execution_nodes
    #[serde(default = "default_namespace_root")]
    pub namespace_root: String,

    #[serde(default)]
    pub completion_policy: CompletionPolicy,

    /// Encoding of registry values. Every node on a registry must agree.
    #[serde(default)]
    pub codec: Codec,

    #[serde(default)]
    pub backend: BackendOptions,
}

fn default_namespace_root() -> String {
    EXECUTION_NODES.to_string()
}

impl Default for ProcregOptions {
    fn default() -> Self {
        Self {
            namespace_root: default_namespace_root(),
            completion_policy: CompletionPolicy::default(),
            codec: Codec::default(),
            backend: BackendOptions::default(),
        }
    }
}

impl ProcregOptions {
    pub fn from_yaml_str(yaml: &str) -> ProcregResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ProcregError::Config(format!("invalid options: {}", e)))
    }

    pub fn from_yaml_file(path: &Path) -> ProcregResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProcregError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn layout(&self) -> ProcregResult<RegistryLayout> {
        RegistryLayout::new(self.namespace_root.clone())
    }

    /// Build the configured registry backend.
    pub fn open_registry(&self) -> ProcregResult<Arc<dyn RegistryRepository>> {
        match &self.backend {
            BackendOptions::Memory => Ok(Arc::new(MemoryRegistry::new())),
            #[cfg(feature = "sqlite")]
            BackendOptions::Sqlite { path } => {
                Ok(Arc::new(crate::registry::SqliteRegistry::open(path)?))
            }
            #[cfg(not(feature = "sqlite"))]
            BackendOptions::Sqlite { .. } => Err(ProcregError::Config(
                "sqlite backend requires the `sqlite` feature".to_string(),
            )),
        }
    }
}
