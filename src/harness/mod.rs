pub mod compare;
pub mod executor;
pub mod types;

pub use compare::compare;
pub use executor::{Scenario, SideBySide, run_both, run_isolated};
pub use types::{Comparison, ComparisonRecord, HarnessError, HarnessResult, Outcome, SnapshotPair};
