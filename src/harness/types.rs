use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::instance::InstanceError;

/// Result of running one scenario against one application instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Whether the scenario judged the run successful
    pub succeeded: bool,

    /// Text of the final assistant response (may be empty)
    #[serde(default)]
    pub response_text: String,

    /// Error detected in the response or escaped from the scenario.
    /// Independent of `succeeded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Whether a permission prompt was shown during the run
    pub permission_was_prompted: bool,

    /// When the outcome was observed
    pub observed_at: DateTime<Utc>,
}

impl Outcome {
    /// Outcome for a run that completed normally
    pub fn success(response_text: impl Into<String>, permission_was_prompted: bool) -> Self {
        Self {
            succeeded: true,
            response_text: response_text.into(),
            error_message: None,
            permission_was_prompted,
            observed_at: Utc::now(),
        }
    }

    /// Synthesized outcome for a run that raised, panicked or timed out
    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            response_text: String::new(),
            error_message: Some(error_message.into()),
            permission_was_prompted: false,
            observed_at: Utc::now(),
        }
    }
}

/// Comparator verdict for one pair of outcomes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comparison {
    /// True iff `mismatch_reasons` is empty
    pub is_identical: bool,

    /// One human-readable reason per diverging field, in check order
    pub mismatch_reasons: Vec<String>,
}

/// PNG screenshots of both instances taken after a mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub baseline: Vec<u8>,
    pub candidate: Vec<u8>,
}

/// Result of comparing both instances for one named scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    /// Unique identifier of the scenario invocation
    pub scenario_id: String,

    pub baseline_outcome: Outcome,

    pub candidate_outcome: Outcome,

    /// True iff `mismatch_reasons` is empty
    pub is_identical: bool,

    pub mismatch_reasons: Vec<String>,

    /// When the comparison started
    pub observed_at: DateTime<Utc>,

    /// Present only when `is_identical` is false. Never serialized into the ledger.
    #[serde(skip)]
    pub snapshots: Option<SnapshotPair>,
}

impl ComparisonRecord {
    /// Assemble a record from both outcomes and the comparator's verdict
    pub fn new(
        scenario_id: impl Into<String>,
        baseline_outcome: Outcome,
        candidate_outcome: Outcome,
        comparison: Comparison,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            baseline_outcome,
            candidate_outcome,
            is_identical: comparison.is_identical,
            mismatch_reasons: comparison.mismatch_reasons,
            observed_at,
            snapshots: None,
        }
    }

    /// Attach snapshots; ignored for identical records
    pub fn with_snapshots(mut self, snapshots: Option<SnapshotPair>) -> Self {
        if !self.is_identical {
            self.snapshots = snapshots;
        }
        self
    }

    /// Copy suitable for the ledger (snapshot bytes removed)
    pub fn without_snapshots(&self) -> Self {
        Self {
            snapshots: None,
            ..self.clone()
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A browser-automation primitive failed
    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),

    /// A scenario exceeded its time budget
    #[error("Scenario timed out after {0:?}")]
    Timeout(Duration),

    /// The permission mode button never reached the requested mode
    #[error("Failed to switch to {target}. Current mode: {current}")]
    ModeSwitch { target: String, current: String },

    /// Scenario-specific failure
    #[error("Scenario error: {0}")]
    Scenario(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
