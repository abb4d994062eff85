//! Storage for the difference ledger.
//!
//! The ledger is an ordered, append-only list of mismatching comparisons that
//! persists across runs. It is always read in full and rewritten in full; the
//! harness runs one scenario at a time, so no locking is attempted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::harness::types::{ComparisonRecord, HarnessResult};

/// Whole-ledger storage
pub trait LedgerStore: Send + Sync {
    /// Every recorded entry, oldest first. An absent ledger is empty.
    fn load(&self) -> HarnessResult<Vec<ComparisonRecord>>;

    /// Replace the stored ledger with `entries`
    fn save(&self, entries: &[ComparisonRecord]) -> HarnessResult<()>;
}

/// Ledger stored as one pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonLedger {
    fn load(&self) -> HarnessResult<Vec<ComparisonRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &[ComparisonRecord]) -> HarnessResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

/// In-memory ledger for tests
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<ComparisonRecord>,
    saves: usize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored entries
    pub fn entries(&self) -> Vec<ComparisonRecord> {
        self.lock().entries.clone()
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryLedger {
    fn load(&self) -> HarnessResult<Vec<ComparisonRecord>> {
        Ok(self.entries())
    }

    fn save(&self, entries: &[ComparisonRecord]) -> HarnessResult<()> {
        let mut state = self.lock();
        state.entries = entries.to_vec();
        state.saves += 1;
        Ok(())
    }
}
