//! Execution record model.
//!
//! Pure data held for one in-flight execution:
//!
//! - **ExecutionId** / **UnitId**: opaque identifiers, used as registry path segments
//! - **UnitStatus**: per-unit progress (`PENDING` until reported `DONE`)
//! - **ExecutionRecord**: the aggregate persisted in the registry
//! - **ExecutionContext**: what the engine hands over when an execution starts

mod ids;
mod record;
mod status;

pub use ids::{ExecutionId, UnitId};
pub use record::{ExecutionContext, ExecutionRecord, ExecutionUnit};
pub use status::UnitStatus;
