//! Lifecycle signals consumed by the manager.
//!
//! The set is closed: every signal the engine can emit is a variant of
//! [`ProcessEvent`], and the manager maps each variant to one handler.

use serde::{Deserialize, Serialize};

use crate::model::{ExecutionContext, ExecutionId, ExecutionRecord, UnitId, UnitStatus};

/// Emitted once when an execution starts.
///
/// `context` is optional on the wire so that a malformed signal can be
/// represented and rejected by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    #[serde(default)]
    pub context: Option<ExecutionContext>,
}

impl SummaryReport {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context: Some(context),
        }
    }
}

/// Emitted by whichever node finished one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReportEvent {
    pub execution_id: ExecutionId,
    pub unit_id: UnitId,
    #[serde(default = "default_report_status")]
    pub status: UnitStatus,
}

fn default_report_status() -> UnitStatus {
    UnitStatus::Done
}

impl UnitReportEvent {
    pub fn new(
        execution_id: impl Into<ExecutionId>,
        unit_id: impl Into<UnitId>,
        status: UnitStatus,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            unit_id: unit_id.into(),
            status,
        }
    }

    pub fn done(execution_id: impl Into<ExecutionId>, unit_id: impl Into<UnitId>) -> Self {
        Self::new(execution_id, unit_id, UnitStatus::Done)
    }
}

/// Emitted once when an execution finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub execution_id: ExecutionId,
}

impl CompletionReport {
    pub fn new(execution_id: impl Into<ExecutionId>) -> Self {
        Self {
            execution_id: execution_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessEvent {
    /// Cluster-wide "show running executions".
    ListRequest,
    Summary(SummaryReport),
    UnitReport(UnitReportEvent),
    Completion(CompletionReport),
}

impl ProcessEvent {
    /// Execution the signal is about, if any.
    pub fn execution_id(&self) -> Option<&ExecutionId> {
        match self {
            ProcessEvent::ListRequest => None,
            ProcessEvent::Summary(report) => report.context.as_ref().map(|c| &c.execution_id),
            ProcessEvent::UnitReport(report) => Some(&report.execution_id),
            ProcessEvent::Completion(report) => Some(&report.execution_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ProcessEvent::ListRequest => "list_request",
            ProcessEvent::Summary(_) => "summary",
            ProcessEvent::UnitReport(_) => "unit_report",
            ProcessEvent::Completion(_) => "completion",
        }
    }
}

impl From<SummaryReport> for ProcessEvent {
    fn from(report: SummaryReport) -> Self {
        ProcessEvent::Summary(report)
    }
}

impl From<UnitReportEvent> for ProcessEvent {
    fn from(report: UnitReportEvent) -> Self {
        ProcessEvent::UnitReport(report)
    }
}

impl From<CompletionReport> for ProcessEvent {
    fn from(report: CompletionReport) -> Self {
        ProcessEvent::Completion(report)
    }
}

/// Answer to a list request: every record readable at scan time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessListResponse {
    pub records: Vec<ExecutionRecord>,
}

impl ProcessListResponse {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, execution_id: &ExecutionId) -> Option<&ExecutionRecord> {
        self.records.iter().find(|r| &r.execution_id == execution_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_from_yaml() {
        let yaml = r#"
- event: summary
  context:
    execution_id: exec-1
    sql: SELECT 1
    units: [u1, u2]
- event: unit_report
  execution_id: exec-1
  unit_id: u1
- event: completion
  execution_id: exec-1
- event: list_request
"#;
        let events: Vec<ProcessEvent> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(events.len(), 4);
        let ProcessEvent::Summary(summary) = &events[0] else {
            panic!("expected summary, got {:?}", events[0]);
        };
        let context = summary.context.as_ref().unwrap();
        assert_eq!(context.units, vec![UnitId::from("u1"), UnitId::from("u2")]);
        assert_eq!(events[1], UnitReportEvent::done("exec-1", "u1").into());
        assert_eq!(events[2].execution_id(), Some(&ExecutionId::from("exec-1")));
        assert_eq!(events[3], ProcessEvent::ListRequest);
    }

    #[test]
    fn test_summary_without_context_parses() {
        let events: Vec<ProcessEvent> = serde_yaml::from_str("- event: summary\n").unwrap();
        assert_eq!(events[0], ProcessEvent::Summary(SummaryReport { context: None }));
        assert_eq!(events[0].execution_id(), None);
        assert_eq!(events[0].kind(), "summary");
    }
}
