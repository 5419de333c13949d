//! Procreg - cluster-wide registry of running SQL executions
//!
//! Every node of a database-middleware cluster splits a statement into
//! routed units and reports their progress as lifecycle signals. This crate
//! turns those signals into per-execution records in a shared registry so
//! that any node can answer "show running executions".
//!
//! - [`model`]: execution records and identifiers
//! - [`registry`]: the registry client contract and its implementations
//! - [`management`]: the signal handlers and the subscriber loop
//! - [`options`]: configuration

pub mod codec;
pub mod events;
pub mod layout;
pub mod management;
pub mod model;
pub mod options;
pub mod registry;
pub mod util;

pub use codec::Codec;
pub use events::{
    CompletionReport, ProcessEvent, ProcessListResponse, SummaryReport, UnitReportEvent,
};
pub use layout::RegistryLayout;
pub use management::{ProcessRegistryManager, ProcessSubscriber, SubscriberHandle, SubscriberStats};
pub use model::{ExecutionContext, ExecutionId, ExecutionRecord, UnitId, UnitStatus};
pub use options::{BackendOptions, CompletionPolicy, ProcregOptions};
pub use procreg_shared::constants;
pub use procreg_shared::errors::{ProcregError, ProcregResult};
pub use registry::{MemoryRegistry, RegistryRepository};
#[cfg(feature = "sqlite")]
pub use registry::SqliteRegistry;
