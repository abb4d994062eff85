use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config;
use crate::harness::compare::compare;
use crate::harness::types::{ComparisonRecord, HarnessError, HarnessResult, Outcome, SnapshotPair};
use crate::instance::Instance;
use crate::recorder::Recorder;

/// A single named behaviour, executed identically against each instance
#[async_trait]
pub trait Scenario: Send + Sync {
    async fn run(&self, instance: &dyn Instance) -> HarnessResult<Outcome>;
}

/// Run a scenario against one instance, converting any fault into an Outcome.
///
/// Returned errors, panics and timeout expiry all become a failure Outcome
/// carrying the fault's message.
pub async fn run_isolated(scenario: &dyn Scenario, instance: &dyn Instance, timeout: Duration) -> Outcome {
    let guarded = AssertUnwindSafe(scenario.run(instance)).catch_unwind();

    match tokio::time::timeout(timeout, guarded).await {
        Ok(Ok(Ok(outcome))) => {
            debug!(instance = instance.name(), succeeded = outcome.succeeded, "scenario finished");
            outcome
        }
        Ok(Ok(Err(err))) => {
            warn!(instance = instance.name(), "scenario failed: {}", err);
            Outcome::failure(err.to_string())
        }
        Ok(Err(panic)) => {
            let message = format!("scenario panicked: {}", panic_message(panic.as_ref()));
            warn!(instance = instance.name(), "{}", message);
            Outcome::failure(message)
        }
        Err(_) => {
            let err = HarnessError::Timeout(timeout);
            warn!(instance = instance.name(), "{}", err);
            Outcome::failure(err.to_string())
        }
    }
}

/// Run a scenario against both instances concurrently.
///
/// Neither branch can abort or cancel the other; both Outcomes are fully
/// resolved when this returns.
pub async fn run_both(
    scenario: &dyn Scenario,
    baseline: &dyn Instance,
    candidate: &dyn Instance,
    timeout: Duration,
) -> (Outcome, Outcome) {
    tokio::join!(
        run_isolated(scenario, baseline, timeout),
        run_isolated(scenario, candidate, timeout),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Screenshot both instances; `None` unless both captures succeed
async fn capture_snapshots(baseline: &dyn Instance, candidate: &dyn Instance) -> Option<SnapshotPair> {
    match tokio::join!(baseline.screenshot_page(), candidate.screenshot_page()) {
        (Ok(baseline), Ok(candidate)) => Some(SnapshotPair { baseline, candidate }),
        (Err(err), _) | (_, Err(err)) => {
            warn!("Failed to capture snapshots: {}", err);
            None
        }
    }
}

/// Dual-target executor: runs scenarios side by side and records mismatches.
///
/// `run` takes `&mut self` so a harness has at most one comparison in flight;
/// both instances share navigation state and must not be driven by two
/// scenarios at once.
pub struct SideBySide {
    recorder: Recorder,
    timeout: Duration,
}

impl SideBySide {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            recorder,
            timeout: config::scenario_timeout(),
        }
    }

    /// Override the per-instance scenario timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Hand the record to the recorder on the blocking pool
    async fn persist(&self, record: &ComparisonRecord) {
        let recorder = self.recorder.clone();
        let record = record.clone();
        let span = tracing::Span::current();
        let task = tokio::task::spawn_blocking(move || span.in_scope(|| recorder.record_if_mismatched(&record)));
        if let Err(err) = task.await {
            warn!("Recorder task failed: {}", err);
        }
    }

    /// Run `scenario` on both instances, compare, and record any mismatch.
    ///
    /// Never fails because of a scenario: faults on either side surface only
    /// in the returned record's outcomes.
    pub async fn run(
        &mut self,
        scenario: &dyn Scenario,
        baseline: &dyn Instance,
        candidate: &dyn Instance,
        scenario_id: &str,
    ) -> ComparisonRecord {
        let span = info_span!("side_by_side", scenario_id);
        async {
            let observed_at = Utc::now();
            let (baseline_outcome, candidate_outcome) =
                run_both(scenario, baseline, candidate, self.timeout).await;

            let comparison = compare(&baseline_outcome, &candidate_outcome);
            let mut record = ComparisonRecord::new(
                scenario_id,
                baseline_outcome,
                candidate_outcome,
                comparison,
                observed_at,
            );

            if record.is_identical {
                info!("Behaviour identical");
            } else {
                warn!(differences = record.mismatch_reasons.len(), "Behaviour differs");
                let snapshots = capture_snapshots(baseline, candidate).await;
                record = record.with_snapshots(snapshots);
                self.persist(&record).await;
            }
            record
        }
        .instrument(span)
        .await
    }
}
