//! Execution and unit identifiers.

use procreg_shared::constants::unit_id::DIGEST_HEX_LEN;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifier of one distributed SQL execution.
///
/// Used verbatim as the registry key segment under the namespace root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier (ULID, sortable by creation time).
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of one routed unit, unique within its execution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a stable identifier from the unit's route.
    ///
    /// The same (data source, SQL) pair always yields the same id, so every
    /// node reporting on that unit agrees on its key.
    pub fn for_route(data_source: &str, sql: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data_source.as_bytes());
        hasher.update([0u8]);
        hasher.update(sql.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..DIGEST_HEX_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ExecutionId::generate();
        let b = ExecutionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 26);
    }

    #[test]
    fn test_route_id_is_stable() {
        let a = UnitId::for_route("ds_0", "SELECT * FROM t_order_0");
        let b = UnitId::for_route("ds_0", "SELECT * FROM t_order_0");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_route_id_separates_fields() {
        // "ds_0" + "1SELECT" must not collide with "ds_01" + "SELECT"
        let a = UnitId::for_route("ds_0", "1SELECT 1");
        let b = UnitId::for_route("ds_01", "SELECT 1");
        assert_ne!(a, b);
    }
}
