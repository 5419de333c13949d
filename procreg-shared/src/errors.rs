//! Error types for the process registry.

use thiserror::Error;

/// Result alias used across procreg crates.
pub type ProcregResult<T> = Result<T, ProcregError>;

/// Errors raised while tracking executions in the registry.
///
/// Two classes exist. Contract violations (`MissingContext`, `RecordNotFound`,
/// `UnknownUnit`, `InvalidKey`) are upstream programming errors and are never
/// retried. Everything else is a failure of a collaborator (registry, codec,
/// configuration) and is surfaced to the caller unmodified.
#[derive(Debug, Error)]
pub enum ProcregError {
    /// Summary signal without an execution identifier or context.
    #[error("missing execution context: {0}")]
    MissingContext(String),

    /// Unit report for an execution that has no record.
    #[error("no record for execution {0}")]
    RecordNotFound(String),

    /// Unit report for a unit outside the execution's initial unit set.
    #[error("unit {unit_id} is not part of execution {execution_id}")]
    UnknownUnit {
        execution_id: String,
        unit_id: String,
    },

    /// Identifier that cannot be used as a registry path segment.
    #[error("invalid registry key: {0}")]
    InvalidKey(String),

    /// Completion refused because some units are not done.
    #[error("execution {execution_id} still has pending units: {}", .pending.join(", "))]
    IncompleteExecution {
        execution_id: String,
        pending: Vec<String>,
    },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProcregError {
    /// True for errors caused by a caller breaking the signal contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ProcregError::MissingContext(_)
                | ProcregError::RecordNotFound(_)
                | ProcregError::UnknownUnit { .. }
                | ProcregError::InvalidKey(_)
        )
    }
}
