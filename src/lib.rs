//! Parity Harness - side-by-side behavioural comparison of two chat applications.
//!
//! This crate provides:
//! - A dual-target executor running one scenario against a baseline and a
//!   candidate instance concurrently, with per-instance fault isolation
//! - A deterministic comparator classifying field-level mismatches
//! - A recorder persisting mismatches to a JSON ledger plus paired snapshots
//! - A Markdown summary of the ledger
//! - Chat helpers and scenarios over an abstract browser-automation [`Instance`]
//!
//! # Example
//!
//! ```rust,no_run
//! use parity_harness::{ChatScenario, MockBehavior, MockInstance, Recorder, ReportLayout, SideBySide};
//!
//! # async fn demo() {
//! let old_app = MockInstance::new("old-app", MockBehavior::default());
//! let spicy = MockInstance::new("spicy-claude", MockBehavior::default());
//! let mut harness = SideBySide::new(Recorder::in_layout(ReportLayout::new()));
//!
//! let scenario = ChatScenario::write_file("W1-write-tmp", "/tmp/parity-w1.txt", "hello");
//! let record = harness.run(&scenario, &old_app, &spicy, &scenario.id).await;
//! assert!(record.is_identical, "{:?}", record.mismatch_reasons);
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod harness;
pub mod instance;
pub mod ledger;
pub mod recorder;
pub mod scenarios;
pub mod session;
pub mod summary;

// Re-export harness types
pub use harness::{
    Comparison, ComparisonRecord, HarnessError, HarnessResult, Outcome, Scenario, SideBySide,
    SnapshotPair, compare, run_both, run_isolated,
};

// Re-export the automation collaborator
pub use instance::{Instance, InstanceError, InstanceResult, MockBehavior, MockInstance};

// Re-export persistence
pub use ledger::{JsonLedger, LedgerStore, MemoryLedger};
pub use recorder::Recorder;
pub use session::ReportLayout;
pub use summary::{SummaryGenerator, render_summary};

// Re-export scenarios
pub use chat::{ChatResponse, PermissionMode};
pub use scenarios::{ChatScenario, Check, PromptAction};
