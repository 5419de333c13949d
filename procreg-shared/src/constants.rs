//! Shared constants
//!
//! These values must agree between every node writing to the same registry.

/// Registry key space
pub mod namespace {
    /// Root node under which every in-flight execution is a direct child
    pub const EXECUTION_NODES: &str = "/execution_nodes";

    /// Separator between path segments
    pub const SEPARATOR: char = '/';
}

/// Environment variables
pub mod envs {
    /// Path of the sqlite registry file used by the CLI
    pub const PROCREG_DB: &str = "PROCREG_DB";

    /// Path of a YAML options file
    pub const PROCREG_CONFIG: &str = "PROCREG_CONFIG";

    /// Directory for daily log files; logs go to stderr when unset
    pub const PROCREG_LOG_DIR: &str = "PROCREG_LOG_DIR";
}

/// Unit identifier derivation
pub mod unit_id {
    /// Number of hex characters kept from the route digest
    pub const DIGEST_HEX_LEN: usize = 16;
}
