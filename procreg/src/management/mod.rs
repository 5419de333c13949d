//! Execution lifecycle management.
//!
//! # Overview
//!
//! - **ProcessRegistryManager**: applies lifecycle signals to the registry
//! - **ProcessSubscriber**: drives a manager from an event channel
//!
//! Per execution the record moves through:
//!
//! ```text
//! ABSENT --summary--> ACTIVE --unit report--> ACTIVE --completion--> ABSENT
//! ```
//!
//! A unit report against ABSENT is a contract violation. A completion
//! against ABSENT is a no-op.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use procreg::events::{CompletionReport, SummaryReport, UnitReportEvent};
//! use procreg::model::{ExecutionContext, UnitId};
//! use procreg::registry::MemoryRegistry;
//! use procreg::ProcessRegistryManager;
//!
//! # async fn run() -> procreg::ProcregResult<()> {
//! let manager = ProcessRegistryManager::new(Arc::new(MemoryRegistry::new()));
//!
//! let context = ExecutionContext::new("id", vec![UnitId::from("u1")]);
//! manager.handle_execution_summary(SummaryReport::new(context)).await?;
//! manager.handle_unit_report(UnitReportEvent::done("id", "u1")).await?;
//! manager.handle_execution_completion(CompletionReport::new("id")).await?;
//! # Ok(())
//! # }
//! ```

mod manager;
mod subscriber;

pub use manager::ProcessRegistryManager;
pub use subscriber::{ProcessSubscriber, SubscriberHandle, SubscriberStats};
