//! Persistence of mismatching comparisons.
//!
//! A mismatch is appended to the ledger (snapshots stripped) and, when
//! snapshots were captured, both images plus a manifest are written to the
//! scenario's own directory. Storage problems are logged and swallowed: the
//! comparison verdict has already been decided and must not be masked.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config;
use crate::harness::types::{ComparisonRecord, HarnessResult, SnapshotPair};
use crate::ledger::{JsonLedger, LedgerStore};
use crate::session::ReportLayout;

/// Owner of the difference ledger and the snapshot directories
#[derive(Clone)]
pub struct Recorder {
    ledger: Arc<dyn LedgerStore>,
    layout: ReportLayout,
}

impl Recorder {
    pub fn new(ledger: Arc<dyn LedgerStore>, layout: ReportLayout) -> Self {
        Self { ledger, layout }
    }

    /// Recorder backed by the JSON ledger inside `layout`
    pub fn in_layout(layout: ReportLayout) -> Self {
        let ledger = Arc::new(JsonLedger::new(layout.ledger_path()));
        Self::new(ledger, layout)
    }

    pub fn ledger(&self) -> Arc<dyn LedgerStore> {
        Arc::clone(&self.ledger)
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Persist `record` if it is a mismatch. Never fails.
    pub fn record_if_mismatched(&self, record: &ComparisonRecord) {
        if record.is_identical {
            debug!(scenario_id = %record.scenario_id, "identical, nothing to record");
            return;
        }

        match self.append(record) {
            Ok(total) => {
                info!(
                    scenario_id = %record.scenario_id,
                    differences = record.mismatch_reasons.len(),
                    ledger_entries = total,
                    "Recorded difference"
                );
                for reason in &record.mismatch_reasons {
                    info!("  - {}", reason);
                }
            }
            Err(err) => {
                warn!(scenario_id = %record.scenario_id, "Failed to record difference: {}", err);
            }
        }

        if let Some(snapshots) = &record.snapshots {
            match self.write_snapshots(record, snapshots) {
                Ok(dir) => debug!(scenario_id = %record.scenario_id, "Snapshots saved to {}", dir.display()),
                Err(err) => {
                    warn!(scenario_id = %record.scenario_id, "Failed to save snapshots: {}", err)
                }
            }
        }
    }

    /// Reset the ledger to empty
    pub fn clear(&self) -> HarnessResult<()> {
        self.ledger.save(&[])
    }

    /// Load, append, rewrite. Returns the new entry count.
    fn append(&self, record: &ComparisonRecord) -> HarnessResult<usize> {
        let mut entries = self.ledger.load()?;
        entries.push(record.without_snapshots());
        self.ledger.save(&entries)?;
        Ok(entries.len())
    }

    fn write_snapshots(&self, record: &ComparisonRecord, snapshots: &SnapshotPair) -> HarnessResult<PathBuf> {
        let dir = self.layout.snapshot_dir(&record.scenario_id);
        fs::create_dir_all(&dir)?;

        let (baseline_path, candidate_path) = self.layout.snapshot_paths(&record.scenario_id);
        fs::write(&baseline_path, &snapshots.baseline)?;
        fs::write(&candidate_path, &snapshots.candidate)?;

        let manifest = serde_json::json!({
            "scenarioId": record.scenario_id,
            "observedAt": record.observed_at,
            "baseline": config::BASELINE_SNAPSHOT_FILE,
            "candidate": config::CANDIDATE_SNAPSHOT_FILE,
            "mismatchReasons": record.mismatch_reasons,
        });
        fs::write(dir.join("manifest.json"), serde_json::to_string_pretty(&manifest)?)?;

        Ok(dir)
    }
}
