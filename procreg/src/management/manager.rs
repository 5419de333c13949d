//! Process registry manager implementation.

use std::sync::Arc;

use procreg_shared::errors::{ProcregError, ProcregResult};

use crate::codec::Codec;
use crate::events::{
    CompletionReport, ProcessEvent, ProcessListResponse, SummaryReport, UnitReportEvent,
};
use crate::layout::RegistryLayout;
use crate::model::{ExecutionId, ExecutionRecord, UnitId};
use crate::options::{CompletionPolicy, ProcregOptions};
use crate::registry::RegistryRepository;

/// Mediates between lifecycle signals and the shared registry.
///
/// Cloneable via `Arc`, so one manager can serve many concurrent handlers.
///
/// # Design
///
/// - **Header + unit keys**: the summary writes the record header at
///   `{root}/{execution_id}`; each unit report writes only its own status at
///   `{root}/{execution_id}/{unit_id}`. Reports for different units touch
///   different keys, so concurrent reports from different nodes commute
///   and no status is lost.
/// - **Merge on read**: `load` and list requests combine the header with the
///   unit keys. A unit without a key is `PENDING`.
/// - **No local state**: everything lives in the registry, so any node can
///   answer a list request.
#[derive(Clone)]
pub struct ProcessRegistryManager {
    registry: Arc<dyn RegistryRepository>,
    layout: RegistryLayout,
    codec: Codec,
    completion_policy: CompletionPolicy,
}

impl std::fmt::Debug for ProcessRegistryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistryManager")
            .field("layout", &self.layout)
            .field("codec", &self.codec)
            .field("completion_policy", &self.completion_policy)
            .finish_non_exhaustive()
    }
}

impl ProcessRegistryManager {
    /// Manager with the default layout, codec and completion policy.
    pub fn new(registry: Arc<dyn RegistryRepository>) -> Self {
        Self {
            registry,
            layout: RegistryLayout::default(),
            codec: Codec::default(),
            completion_policy: CompletionPolicy::default(),
        }
    }

    pub fn with_options(
        registry: Arc<dyn RegistryRepository>,
        options: &ProcregOptions,
    ) -> ProcregResult<Self> {
        Ok(Self {
            registry,
            layout: options.layout()?,
            codec: options.codec,
            completion_policy: options.completion_policy,
        })
    }

    pub fn with_completion_policy(mut self, policy: CompletionPolicy) -> Self {
        self.completion_policy = policy;
        self
    }

    pub fn with_layout(mut self, layout: RegistryLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    pub fn completion_policy(&self) -> CompletionPolicy {
        self.completion_policy
    }

    /// Dispatch one signal to its handler.
    ///
    /// Only list requests produce a response.
    pub async fn handle(&self, event: ProcessEvent) -> ProcregResult<Option<ProcessListResponse>> {
        match event {
            ProcessEvent::ListRequest => self.handle_list_request().await.map(Some),
            ProcessEvent::Summary(report) => {
                self.handle_execution_summary(report).await.map(|_| None)
            }
            ProcessEvent::UnitReport(report) => {
                self.handle_unit_report(report).await.map(|_| None)
            }
            ProcessEvent::Completion(report) => {
                self.handle_execution_completion(report).await.map(|_| None)
            }
        }
    }

    /// Collect every record readable right now.
    ///
    /// Best effort: an execution removed between the children scan and its
    /// read is skipped, and so is a record that cannot be decoded.
    pub async fn handle_list_request(&self) -> ProcregResult<ProcessListResponse> {
        let children = self.registry.list_children(self.layout.root()).await?;

        let mut records = Vec::with_capacity(children.len());
        for child in children {
            let execution_id = ExecutionId::from(child);
            match self.load(&execution_id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {
                    tracing::debug!(
                        execution_id = %execution_id,
                        "Execution vanished during list, skipping"
                    );
                }
                Err(ProcregError::Codec(e)) => {
                    tracing::warn!(
                        execution_id = %execution_id,
                        error = %e,
                        "Skipping undecodable execution record"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        // Oldest first, like a process list
        records.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.execution_id.cmp(&b.execution_id))
        });

        tracing::debug!(count = records.len(), "Listed running executions");
        Ok(ProcessListResponse { records })
    }

    /// Create the record for a starting execution, every unit `PENDING`.
    ///
    /// # Errors
    ///
    /// `MissingContext` if the report has no context or an empty execution
    /// id; `InvalidKey` if an identifier cannot be a registry path segment.
    /// Nothing is written in either case.
    pub async fn handle_execution_summary(&self, report: SummaryReport) -> ProcregResult<()> {
        let context = report.context.ok_or_else(|| {
            ProcregError::MissingContext("summary report carries no execution context".into())
        })?;
        if context.execution_id.is_empty() {
            return Err(ProcregError::MissingContext(
                "summary report carries no execution id".into(),
            ));
        }

        let key = self.layout.execution_key(&context.execution_id)?;
        for unit in &context.units {
            self.layout.unit_key(&context.execution_id, unit)?;
        }

        let record = ExecutionRecord::from_context(&context);
        let value = self.codec.encode_record(&record)?;
        self.registry.put(&key, &value).await?;

        tracing::debug!(
            execution_id = %context.execution_id,
            units = record.unit_count(),
            "Registered execution"
        );
        Ok(())
    }

    /// Record the status reported for one unit.
    ///
    /// Writes only the unit's own key; the record header is read to check
    /// that the execution exists and the unit belongs to it. The header is
    /// read again after the write, and a status that landed after the
    /// execution was completed is deleted.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if no summary was registered for the execution,
    /// `UnknownUnit` if the unit is not part of its initial set. Nothing is
    /// written in either case.
    pub async fn handle_unit_report(&self, report: UnitReportEvent) -> ProcregResult<()> {
        let key = self.layout.execution_key(&report.execution_id)?;
        let unit_key = self.layout.unit_key(&report.execution_id, &report.unit_id)?;

        let Some(value) = self.registry.get(&key).await? else {
            return Err(ProcregError::RecordNotFound(report.execution_id.to_string()));
        };
        let header = self.codec.decode_record(&value)?;
        if !header.contains_unit(&report.unit_id) {
            return Err(ProcregError::UnknownUnit {
                execution_id: report.execution_id.to_string(),
                unit_id: report.unit_id.to_string(),
            });
        }

        let status = self.codec.encode_status(report.status)?;
        self.registry.put(&unit_key, &status).await?;

        // A completion may have deleted the execution while the put was in flight
        if self.registry.get(&key).await?.is_none() {
            self.registry.delete(&unit_key).await?;
            tracing::debug!(
                execution_id = %report.execution_id,
                unit_id = %report.unit_id,
                "Execution completed during unit report, removed late status"
            );
            return Ok(());
        }

        tracing::debug!(
            execution_id = %report.execution_id,
            unit_id = %report.unit_id,
            status = %report.status,
            "Recorded unit status"
        );
        Ok(())
    }

    /// Remove a finished execution's record.
    ///
    /// A no-op if the record is already gone. Under
    /// [`CompletionPolicy::RequireAllDone`] the record is kept and
    /// `IncompleteExecution` returned while any unit is not `DONE`.
    pub async fn handle_execution_completion(&self, report: CompletionReport) -> ProcregResult<()> {
        let key = self.layout.execution_key(&report.execution_id)?;

        let Some(value) = self.registry.get(&key).await? else {
            tracing::debug!(
                execution_id = %report.execution_id,
                "Completion for untracked execution, nothing to delete"
            );
            return Ok(());
        };

        if self.completion_policy == CompletionPolicy::RequireAllDone {
            let header = self.codec.decode_record(&value)?;
            let record = self
                .merge_unit_statuses(&report.execution_id, header)
                .await?;
            if !record.all_done() {
                let pending = record
                    .pending_units()
                    .into_iter()
                    .map(|unit| unit.to_string())
                    .collect();
                return Err(ProcregError::IncompleteExecution {
                    execution_id: report.execution_id.to_string(),
                    pending,
                });
            }
        }

        self.registry.delete(&key).await?;
        tracing::debug!(execution_id = %report.execution_id, "Removed execution");
        Ok(())
    }

    /// Read an execution's current record, merged with its unit statuses.
    ///
    /// Returns `Ok(None)` if the execution is not tracked.
    pub async fn load(&self, execution_id: &ExecutionId) -> ProcregResult<Option<ExecutionRecord>> {
        let key = self.layout.execution_key(execution_id)?;
        let Some(value) = self.registry.get(&key).await? else {
            return Ok(None);
        };
        let header = self.codec.decode_record(&value)?;
        self.merge_unit_statuses(execution_id, header)
            .await
            .map(Some)
    }

    /// Overlay the statuses stored under the execution's unit keys.
    async fn merge_unit_statuses(
        &self,
        execution_id: &ExecutionId,
        mut record: ExecutionRecord,
    ) -> ProcregResult<ExecutionRecord> {
        let key = self.layout.execution_key(execution_id)?;
        let children = self.registry.list_children(&key).await?;

        for child in children {
            let unit_id = UnitId::from(child);
            if !record.contains_unit(&unit_id) {
                tracing::warn!(
                    execution_id = %execution_id,
                    unit_id = %unit_id,
                    "Ignoring status for unit outside the initial set"
                );
                continue;
            }

            let unit_key = self.layout.unit_key(execution_id, &unit_id)?;
            // Deleted since the scan: the whole execution is going away
            let Some(value) = self.registry.get(&unit_key).await? else {
                continue;
            };
            let status = self.codec.decode_status(&value)?;
            record.set_status(&unit_id, status);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionContext, UnitStatus};
    use crate::registry::MemoryRegistry;

    fn manager() -> (ProcessRegistryManager, MemoryRegistry) {
        let registry = MemoryRegistry::new();
        let manager = ProcessRegistryManager::new(Arc::new(registry.clone()));
        (manager, registry)
    }

    fn summary(id: &str, units: &[&str]) -> SummaryReport {
        SummaryReport::new(ExecutionContext::new(
            id,
            units.iter().map(|u| UnitId::from(*u)).collect(),
        ))
    }

    #[tokio::test]
    async fn test_summary_report_complete_scenario() {
        let (manager, registry) = manager();
        let id = ExecutionId::from("id");

        manager.handle_execution_summary(summary("id", &["u1"])).await.unwrap();
        let record = manager.load(&id).await.unwrap().unwrap();
        assert_eq!(record.status(&"u1".into()), Some(UnitStatus::Pending));

        manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap();
        let record = manager.load(&id).await.unwrap().unwrap();
        assert_eq!(record.status(&"u1".into()), Some(UnitStatus::Done));
        assert_eq!(record.unit_count(), 1);

        manager
            .handle_execution_completion(CompletionReport::new("id"))
            .await
            .unwrap();
        assert!(manager.load(&id).await.unwrap().is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_summary_without_context_is_contract_violation() {
        let (manager, registry) = manager();
        let err = manager
            .handle_execution_summary(SummaryReport { context: None })
            .await
            .unwrap_err();
        assert!(matches!(err, ProcregError::MissingContext(_)));
        assert!(err.is_contract_violation());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_summary_with_empty_id_is_rejected() {
        let (manager, registry) = manager();
        let err = manager
            .handle_execution_summary(summary("", &["u1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcregError::MissingContext(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_summary_with_bad_unit_id_writes_nothing() {
        let (manager, registry) = manager();
        let err = manager
            .handle_execution_summary(summary("id", &["ok", "bad/unit"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcregError::InvalidKey(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_unit_report_without_record_fails() {
        let (manager, registry) = manager();
        let err = manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcregError::RecordNotFound(ref id) if id == "id"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_unit_report_for_unknown_unit_fails() {
        let (manager, registry) = manager();
        manager.handle_execution_summary(summary("id", &["u1"])).await.unwrap();

        let err = manager
            .handle_unit_report(UnitReportEvent::done("id", "u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcregError::UnknownUnit { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_rereport_overwrites() {
        let (manager, _registry) = manager();
        manager
            .handle_execution_summary(summary("id", &["u1", "u2"]))
            .await
            .unwrap();

        manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap();
        manager
            .handle_unit_report(UnitReportEvent::new("id", "u1", UnitStatus::Pending))
            .await
            .unwrap();
        manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap();

        let record = manager.load(&"id".into()).await.unwrap().unwrap();
        assert_eq!(record.unit_count(), 2);
        assert_eq!(record.status(&"u1".into()), Some(UnitStatus::Done));
        assert_eq!(record.status(&"u2".into()), Some(UnitStatus::Pending));
    }

    #[tokio::test]
    async fn test_completion_of_absent_execution_is_noop() {
        let (manager, _registry) = manager();
        manager
            .handle_execution_completion(CompletionReport::new("missing"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unconditional_completion_ignores_pending_units() {
        let (manager, registry) = manager();
        manager
            .handle_execution_summary(summary("id", &["u1", "u2"]))
            .await
            .unwrap();

        manager
            .handle_execution_completion(CompletionReport::new("id"))
            .await
            .unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_require_all_done_keeps_incomplete_record() {
        let (manager, registry) = manager();
        let manager = manager.with_completion_policy(CompletionPolicy::RequireAllDone);
        manager
            .handle_execution_summary(summary("id", &["u1", "u2"]))
            .await
            .unwrap();
        manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap();

        let err = manager
            .handle_execution_completion(CompletionReport::new("id"))
            .await
            .unwrap_err();
        match err {
            ProcregError::IncompleteExecution { pending, .. } => {
                assert_eq!(pending, vec!["u2".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(manager.load(&"id".into()).await.unwrap().is_some());

        manager
            .handle_unit_report(UnitReportEvent::done("id", "u2"))
            .await
            .unwrap();
        manager
            .handle_execution_completion(CompletionReport::new("id"))
            .await
            .unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_returns_response_only_for_list() {
        let (manager, _registry) = manager();
        let response = manager
            .handle(ProcessEvent::Summary(summary("id", &["u1"])))
            .await
            .unwrap();
        assert!(response.is_none());

        let response = manager.handle(ProcessEvent::ListRequest).await.unwrap().unwrap();
        assert_eq!(response.len(), 1);
        assert!(response.get(&"id".into()).is_some());
    }

    #[tokio::test]
    async fn test_list_orders_by_start_time() {
        let (manager, _registry) = manager();
        let mut older = ExecutionContext::new("b-older", vec![UnitId::from("u1")]);
        older.start_time -= chrono::Duration::seconds(30);
        let newer = ExecutionContext::new("a-newer", vec![UnitId::from("u1")]);

        manager.handle_execution_summary(SummaryReport::new(newer)).await.unwrap();
        manager.handle_execution_summary(SummaryReport::new(older)).await.unwrap();

        let response = manager.handle_list_request().await.unwrap();
        let ids: Vec<&str> = response
            .records
            .iter()
            .map(|r| r.execution_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b-older", "a-newer"]);
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_record() {
        let (manager, registry) = manager();
        manager.handle_execution_summary(summary("good", &["u1"])).await.unwrap();
        registry
            .put("/execution_nodes/broken", "{: not yaml [")
            .await
            .unwrap();

        let response = manager.handle_list_request().await.unwrap();
        assert_eq!(response.len(), 1);
        assert!(response.get(&"good".into()).is_some());
    }

    #[tokio::test]
    async fn test_json_codec_and_custom_root() {
        let registry = MemoryRegistry::new();
        let manager = ProcessRegistryManager::new(Arc::new(registry.clone()))
            .with_codec(Codec::Json)
            .with_layout(RegistryLayout::new("/proxy/nodes").unwrap());

        manager.handle_execution_summary(summary("id", &["u1"])).await.unwrap();
        manager
            .handle_unit_report(UnitReportEvent::done("id", "u1"))
            .await
            .unwrap();

        assert_eq!(
            registry.get("/proxy/nodes/id/u1").await.unwrap().as_deref(),
            Some("\"DONE\"")
        );
        let record = manager.load(&"id".into()).await.unwrap().unwrap();
        assert!(record.all_done());
    }
}
