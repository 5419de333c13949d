//! Registry key space.
//!
//! ```text
//! {root}/                      # /execution_nodes
//! ├── {execution_id}           # record header (metadata + expected units)
//! │   ├── {unit_id}            # status reported for one unit
//! │   └── {unit_id}
//! └── {execution_id}
//! ```

use procreg_shared::constants::namespace::{EXECUTION_NODES, SEPARATOR};
use procreg_shared::errors::{ProcregError, ProcregResult};

use crate::model::{ExecutionId, UnitId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryLayout {
    root: String,
}

impl RegistryLayout {
    /// Create a layout rooted at `root`. Trailing separators are ignored.
    pub fn new(root: impl Into<String>) -> ProcregResult<Self> {
        let root = root.into();
        let trimmed = root.trim_end_matches(SEPARATOR);
        if !trimmed.starts_with(SEPARATOR) {
            return Err(ProcregError::Config(format!(
                "namespace root must be absolute: '{}'",
                root
            )));
        }
        Ok(Self {
            root: trimmed.to_string(),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Key of an execution's record: {root}/{execution_id}
    pub fn execution_key(&self, execution_id: &ExecutionId) -> ProcregResult<String> {
        check_segment(execution_id.as_str())?;
        Ok(format!("{}{}{}", self.root, SEPARATOR, execution_id))
    }

    /// Key of one unit's status: {root}/{execution_id}/{unit_id}
    pub fn unit_key(&self, execution_id: &ExecutionId, unit_id: &UnitId) -> ProcregResult<String> {
        check_segment(unit_id.as_str())?;
        Ok(format!(
            "{}{}{}",
            self.execution_key(execution_id)?,
            SEPARATOR,
            unit_id
        ))
    }
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self {
            root: EXECUTION_NODES.to_string(),
        }
    }
}

fn check_segment(segment: &str) -> ProcregResult<()> {
    if segment.is_empty() {
        return Err(ProcregError::InvalidKey("empty identifier".to_string()));
    }
    if segment.contains(SEPARATOR) {
        return Err(ProcregError::InvalidKey(format!(
            "identifier '{}' contains '{}'",
            segment, SEPARATOR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let layout = RegistryLayout::default();
        let id = ExecutionId::from("abc");
        assert_eq!(layout.root(), "/execution_nodes");
        assert_eq!(layout.execution_key(&id).unwrap(), "/execution_nodes/abc");
        assert_eq!(
            layout.unit_key(&id, &UnitId::from("u1")).unwrap(),
            "/execution_nodes/abc/u1"
        );
    }

    #[test]
    fn test_custom_root_trims_separator() {
        let layout = RegistryLayout::new("/proxy/execution_nodes/").unwrap();
        assert_eq!(layout.root(), "/proxy/execution_nodes");
    }

    #[test]
    fn test_relative_root_rejected() {
        assert!(matches!(
            RegistryLayout::new("execution_nodes"),
            Err(ProcregError::Config(_))
        ));
        assert!(RegistryLayout::new("/").is_err());
    }

    #[test]
    fn test_bad_segments_rejected() {
        let layout = RegistryLayout::default();
        assert!(matches!(
            layout.execution_key(&ExecutionId::from("")),
            Err(ProcregError::InvalidKey(_))
        ));
        assert!(matches!(
            layout.unit_key(&ExecutionId::from("abc"), &UnitId::from("a/b")),
            Err(ProcregError::InvalidKey(_))
        ));
    }
}
