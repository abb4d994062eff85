use crate::harness::types::{Comparison, Outcome};

/// One field-level check: returns a mismatch reason when its condition holds
type Check = fn(&Outcome, &Outcome) -> Option<String>;

/// Checks in emission order. Every check runs for every pair.
const CHECKS: [Check; 5] = [
    success_mismatch,
    permission_mismatch,
    error_on_baseline_only,
    error_on_candidate_only,
    different_errors,
];

/// Compare two outcomes field by field.
///
/// Pure and total: all applicable reasons are collected in fixed order, and the
/// pair is identical iff no reason was produced.
pub fn compare(baseline: &Outcome, candidate: &Outcome) -> Comparison {
    let mismatch_reasons: Vec<String> = CHECKS
        .iter()
        .filter_map(|check| check(baseline, candidate))
        .collect();

    Comparison {
        is_identical: mismatch_reasons.is_empty(),
        mismatch_reasons,
    }
}

fn success_mismatch(baseline: &Outcome, candidate: &Outcome) -> Option<String> {
    (baseline.succeeded != candidate.succeeded).then(|| {
        format!(
            "SUCCESS MISMATCH: Old={}, Spicy={}",
            baseline.succeeded, candidate.succeeded
        )
    })
}

fn permission_mismatch(baseline: &Outcome, candidate: &Outcome) -> Option<String> {
    (baseline.permission_was_prompted != candidate.permission_was_prompted).then(|| {
        format!(
            "PERMISSION PROMPT MISMATCH: Old={}, Spicy={}",
            baseline.permission_was_prompted, candidate.permission_was_prompted
        )
    })
}

fn error_on_baseline_only(baseline: &Outcome, candidate: &Outcome) -> Option<String> {
    match (&baseline.error_message, &candidate.error_message) {
        (Some(error), None) => Some(format!("ERROR IN OLD APP ONLY: {}", error)),
        _ => None,
    }
}

fn error_on_candidate_only(baseline: &Outcome, candidate: &Outcome) -> Option<String> {
    match (&baseline.error_message, &candidate.error_message) {
        (None, Some(error)) => Some(format!("ERROR IN SPICY CLAUDE ONLY: {}", error)),
        _ => None,
    }
}

fn different_errors(baseline: &Outcome, candidate: &Outcome) -> Option<String> {
    match (&baseline.error_message, &candidate.error_message) {
        (Some(old), Some(new)) if old != new => Some(format!(
            "DIFFERENT ERROR MESSAGES:\n  Old: {}\n  Spicy: {}",
            old, new
        )),
        _ => None,
    }
}
