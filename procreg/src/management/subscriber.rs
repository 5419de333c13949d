//! Event loop feeding lifecycle signals to a manager.
//!
//! Signals for different executions are handled in parallel. Signals for
//! the same execution run one after another in arrival order, so a unit
//! report never overtakes the summary it depends on.

use std::collections::HashMap;

use procreg_shared::errors::{ProcregError, ProcregResult};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use super::ProcessRegistryManager;
use crate::events::{ProcessEvent, ProcessListResponse};
use crate::model::ExecutionId;

/// Number of signals between sweeps of finished execution lanes.
const LANE_SWEEP_INTERVAL: u64 = 256;

/// Counters returned when the subscriber stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    pub handled: u64,
    pub failed: u64,
    pub contract_violations: u64,
}

enum Outcome {
    Handled,
    Failed { contract_violation: bool },
}

impl SubscriberStats {
    fn record(&mut self, result: Result<Outcome, JoinError>) {
        match result {
            Ok(Outcome::Handled) => self.handled += 1,
            Ok(Outcome::Failed { contract_violation }) => {
                self.failed += 1;
                if contract_violation {
                    self.contract_violations += 1;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Signal handler task panicked");
                self.failed += 1;
            }
        }
    }
}

pub struct ProcessSubscriber {
    manager: ProcessRegistryManager,
}

impl ProcessSubscriber {
    pub fn new(manager: ProcessRegistryManager) -> Self {
        Self { manager }
    }

    /// Start the event loop on the current runtime.
    ///
    /// `capacity` bounds both the queued signals and the handlers in flight.
    /// While `capacity` handlers are running the loop stops taking signals,
    /// so posting blocks once the queue behind them is full as well.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn spawn(self, capacity: usize) -> SubscriberHandle {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(self.manager, event_rx, response_tx, capacity));

        SubscriberHandle {
            events: event_tx,
            responses: response_rx,
            task,
        }
    }
}

/// Handle to a running subscriber.
///
/// Dropping every sender (including the one held here, via `shutdown`)
/// stops the loop once queued signals are handled.
pub struct SubscriberHandle {
    events: mpsc::Sender<ProcessEvent>,
    responses: mpsc::UnboundedReceiver<ProcessListResponse>,
    task: JoinHandle<SubscriberStats>,
}

impl SubscriberHandle {
    /// Queue a signal.
    pub async fn post(&self, event: impl Into<ProcessEvent>) -> ProcregResult<()> {
        self.events
            .send(event.into())
            .await
            .map_err(|_| ProcregError::Internal("subscriber has stopped".into()))
    }

    /// Additional sender for producers on other tasks.
    pub fn sender(&self) -> mpsc::Sender<ProcessEvent> {
        self.events.clone()
    }

    /// Next list response, or `None` once the subscriber has stopped.
    pub async fn next_response(&mut self) -> Option<ProcessListResponse> {
        self.responses.recv().await
    }

    /// Stop accepting signals, wait for in-flight handlers and return counters.
    pub async fn shutdown(self) -> ProcregResult<SubscriberStats> {
        drop(self.events);
        self.task
            .await
            .map_err(|e| ProcregError::Internal(format!("subscriber task failed: {}", e)))
    }
}

async fn run(
    manager: ProcessRegistryManager,
    mut events: mpsc::Receiver<ProcessEvent>,
    responses: mpsc::UnboundedSender<ProcessListResponse>,
    max_in_flight: usize,
) -> SubscriberStats {
    let mut stats = SubscriberStats::default();
    let mut tasks: JoinSet<Outcome> = JoinSet::new();
    // Completion signal of the latest handler queued for each execution
    let mut lanes: HashMap<ExecutionId, oneshot::Receiver<()>> = HashMap::new();
    let mut received: u64 = 0;

    tracing::debug!(max_in_flight, "Process subscriber started");

    loop {
        tokio::select! {
            event = events.recv(), if tasks.len() < max_in_flight => {
                let Some(event) = event else {
                    break;
                };
                received += 1;
                if received.is_multiple_of(LANE_SWEEP_INTERVAL) {
                    sweep_lanes(&mut lanes);
                }

                let previous = match event.execution_id().cloned() {
                    Some(execution_id) => {
                        let (done_tx, done_rx) = oneshot::channel();
                        let previous = lanes.insert(execution_id, done_rx);
                        Some((previous, done_tx))
                    }
                    None => None,
                };

                let manager = manager.clone();
                let responses = responses.clone();
                tasks.spawn(async move {
                    let done_tx = match previous {
                        Some((previous, done_tx)) => {
                            if let Some(previous) = previous {
                                // Err means the previous handler is gone, which is just as good
                                let _ = previous.await;
                            }
                            Some(done_tx)
                        }
                        None => None,
                    };
                    let outcome = handle_one(&manager, event, &responses).await;
                    drop(done_tx);
                    outcome
                });
            }
            Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                stats.record(result);
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        stats.record(result);
    }

    tracing::debug!(
        handled = stats.handled,
        failed = stats.failed,
        "Process subscriber stopped"
    );
    stats
}

async fn handle_one(
    manager: &ProcessRegistryManager,
    event: ProcessEvent,
    responses: &mpsc::UnboundedSender<ProcessListResponse>,
) -> Outcome {
    let kind = event.kind();
    let execution_id = event.execution_id().map(ToString::to_string);

    match manager.handle(event).await {
        Ok(Some(response)) => {
            if responses.send(response).is_err() {
                tracing::debug!("No receiver for list response, dropping it");
            }
            Outcome::Handled
        }
        Ok(None) => Outcome::Handled,
        Err(e) if e.is_contract_violation() => {
            tracing::error!(
                signal = kind,
                execution_id = ?execution_id,
                error = %e,
                "Lifecycle signal violates the event contract"
            );
            Outcome::Failed {
                contract_violation: true,
            }
        }
        Err(e) => {
            tracing::warn!(
                signal = kind,
                execution_id = ?execution_id,
                error = %e,
                "Failed to handle lifecycle signal"
            );
            Outcome::Failed {
                contract_violation: false,
            }
        }
    }
}

/// Forget lanes whose last handler has finished.
fn sweep_lanes(lanes: &mut HashMap<ExecutionId, oneshot::Receiver<()>>) {
    lanes.retain(|_, done| matches!(done.try_recv(), Err(oneshot::error::TryRecvError::Empty)));
}
