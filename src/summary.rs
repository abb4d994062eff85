//! Markdown summary of the difference ledger.

use chrono::SecondsFormat;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{BASELINE_DISPLAY_NAME, CANDIDATE_DISPLAY_NAME};
use crate::harness::types::{ComparisonRecord, HarnessResult, Outcome};
use crate::ledger::{JsonLedger, LedgerStore};
use crate::session::ReportLayout;

/// Rendered when the ledger is empty or absent
pub const NO_DIFFERENCES: &str =
    "# Test Results\n\nNo differences found between Old App and Spicy Claude!";

/// Renders the ledger and keeps the summary file in sync with it
pub struct SummaryGenerator {
    ledger: Arc<dyn LedgerStore>,
    summary_path: PathBuf,
}

impl SummaryGenerator {
    pub fn new(ledger: Arc<dyn LedgerStore>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            ledger,
            summary_path: summary_path.into(),
        }
    }

    /// Generator for the JSON ledger and summary file inside `layout`
    pub fn for_layout(layout: &ReportLayout) -> Self {
        Self::new(Arc::new(JsonLedger::new(layout.ledger_path())), layout.summary_path())
    }

    /// Render the whole ledger and overwrite the summary file with it.
    ///
    /// A summary write failure is logged; the rendered text is still returned.
    pub fn generate(&self) -> HarnessResult<String> {
        let entries = self.ledger.load()?;
        let summary = render_summary(&entries);

        let written = self
            .summary_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&self.summary_path, &summary));
        match written {
            Ok(()) => info!(entries = entries.len(), "Summary written to {}", self.summary_path.display()),
            Err(err) => warn!("Failed to write summary {}: {}", self.summary_path.display(), err),
        }

        Ok(summary)
    }
}

/// Render ledger entries as Markdown. Deterministic for a given ledger.
pub fn render_summary(entries: &[ComparisonRecord]) -> String {
    if entries.is_empty() {
        return NO_DIFFERENCES.to_string();
    }

    let mut summary = String::from("# Test Results: Behavioral Differences\n\n");
    summary.push_str(&format!("**Total Tests with Differences**: {}\n\n", entries.len()));

    for (index, entry) in entries.iter().enumerate() {
        summary.push_str(&format!("## {}. Test: {}\n\n", index + 1, entry.scenario_id));
        summary.push_str(&format!(
            "**Timestamp**: {}\n\n",
            entry.observed_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));

        render_outcome(&mut summary, BASELINE_DISPLAY_NAME, &entry.baseline_outcome);
        render_outcome(&mut summary, CANDIDATE_DISPLAY_NAME, &entry.candidate_outcome);

        summary.push_str("### Differences\n");
        for reason in &entry.mismatch_reasons {
            summary.push_str(&format!("- {}\n", reason));
        }
        summary.push_str("\n---\n\n");
    }

    summary
}

fn render_outcome(summary: &mut String, name: &str, outcome: &Outcome) {
    summary.push_str(&format!("### {} Result\n", name));
    summary.push_str(&format!("- **Success**: {}\n", outcome.succeeded));
    summary.push_str(&format!("- **Permission Prompted**: {}\n", outcome.permission_was_prompted));
    if let Some(error) = &outcome.error_message {
        summary.push_str(&format!("- **Error**: {}\n", error));
    }
    summary.push('\n');
}
