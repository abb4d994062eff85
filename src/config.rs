//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the parity harness, supporting:
//! - Environment variables for all configurable values
//! - Defaults matching the timings the chat applications are known to need
//! - Cached global access through [`get`]
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PARITY_REPORT_DIR` | Directory holding the ledger, summary and screenshots | `tests/reports` |
//! | `PARITY_SCENARIO_TIMEOUT` | Per-instance scenario timeout in seconds | `120` |
//! | `PARITY_RESPONSE_TIMEOUT` | Wait for a chat response to finish, in seconds | `30` |
//! | `PARITY_MODE_SWITCH_ATTEMPTS` | Clicks allowed when cycling the permission mode | `4` |
//! | `PARITY_MODE_SWITCH_PAUSE` | Pause between mode clicks in milliseconds | `200` |
//!
//! # Example
//!
//! ```bash
//! export PARITY_REPORT_DIR="/var/tmp/parity-reports"
//! export PARITY_SCENARIO_TIMEOUT=180
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default report directory
pub const DEFAULT_REPORT_DIR: &str = "tests/reports";

/// Default per-instance scenario timeout (seconds). Model responses can take 60-90s.
pub const DEFAULT_SCENARIO_TIMEOUT: u64 = 120;

/// Default chat response timeout (seconds)
pub const DEFAULT_RESPONSE_TIMEOUT: u64 = 30;

/// Default number of clicks when switching permission mode
pub const DEFAULT_MODE_SWITCH_ATTEMPTS: u32 = 4;

/// Default pause between permission mode clicks (milliseconds)
pub const DEFAULT_MODE_SWITCH_PAUSE: u64 = 200;

/// Ledger file name inside the report directory
pub const LEDGER_FILE: &str = "differences.json";

/// Summary file name inside the report directory
pub const SUMMARY_FILE: &str = "DIFFERENCES-SUMMARY.md";

/// Screenshot subdirectory inside the report directory
pub const SCREENSHOT_DIR: &str = "screenshots";

/// Snapshot file name for the baseline instance
pub const BASELINE_SNAPSHOT_FILE: &str = "old-app.png";

/// Snapshot file name for the candidate instance
pub const CANDIDATE_SNAPSHOT_FILE: &str = "spicy-claude.png";

/// Display name of the baseline instance in reports
pub const BASELINE_DISPLAY_NAME: &str = "Old App";

/// Display name of the candidate instance in reports
pub const CANDIDATE_DISPLAY_NAME: &str = "Spicy Claude";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the report directory
pub const ENV_REPORT_DIR: &str = "PARITY_REPORT_DIR";

/// Environment variable for the scenario timeout
pub const ENV_SCENARIO_TIMEOUT: &str = "PARITY_SCENARIO_TIMEOUT";

/// Environment variable for the response timeout
pub const ENV_RESPONSE_TIMEOUT: &str = "PARITY_RESPONSE_TIMEOUT";

/// Environment variable for mode switch attempts
pub const ENV_MODE_SWITCH_ATTEMPTS: &str = "PARITY_MODE_SWITCH_ATTEMPTS";

/// Environment variable for the mode switch pause
pub const ENV_MODE_SWITCH_PAUSE: &str = "PARITY_MODE_SWITCH_PAUSE";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for the harness
#[derive(Debug, Clone)]
pub struct Config {
    /// Report storage settings
    pub report: ReportSettings,
    /// Timing settings for scenario execution
    pub harness: HarnessSettings,
}

/// Report-related settings
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Root directory for the ledger, summary and screenshots
    pub dir: PathBuf,
}

/// Scenario execution settings
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Timeout applied to each instance's scenario run
    pub scenario_timeout: Duration,
    /// Timeout for a chat response to complete
    pub response_timeout: Duration,
    /// Clicks allowed when cycling the permission mode
    pub mode_switch_attempts: u32,
    /// Pause between permission mode clicks
    pub mode_switch_pause: Duration,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Create configuration from any variable lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            report: ReportSettings::from_lookup(&lookup),
            harness: HarnessSettings::from_lookup(&lookup),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            report: ReportSettings::defaults(),
            harness: HarnessSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ReportSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dir: lookup(ENV_REPORT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
        }
    }

    pub fn defaults() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl HarnessSettings {
    /// Create harness settings from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Create harness settings from any variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            scenario_timeout: Duration::from_secs(
                parse_value(lookup(ENV_SCENARIO_TIMEOUT)).unwrap_or(DEFAULT_SCENARIO_TIMEOUT),
            ),
            response_timeout: Duration::from_secs(
                parse_value(lookup(ENV_RESPONSE_TIMEOUT)).unwrap_or(DEFAULT_RESPONSE_TIMEOUT),
            ),
            mode_switch_attempts: parse_value(lookup(ENV_MODE_SWITCH_ATTEMPTS))
                .unwrap_or(DEFAULT_MODE_SWITCH_ATTEMPTS),
            mode_switch_pause: Duration::from_millis(
                parse_value(lookup(ENV_MODE_SWITCH_PAUSE)).unwrap_or(DEFAULT_MODE_SWITCH_PAUSE),
            ),
        }
    }

    /// Create harness settings with hardcoded defaults
    pub fn defaults() -> Self {
        Self {
            scenario_timeout: Duration::from_secs(DEFAULT_SCENARIO_TIMEOUT),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT),
            mode_switch_attempts: DEFAULT_MODE_SWITCH_ATTEMPTS,
            mode_switch_pause: Duration::from_millis(DEFAULT_MODE_SWITCH_PAUSE),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Parse a variable's value, ignoring unset or malformed values
fn parse_value<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Get the permission mode switch budget as (attempts, pause)
pub fn mode_switch() -> (u32, Duration) {
    let harness = &get().harness;
    (harness.mode_switch_attempts, harness.mode_switch_pause)
}

/// Get the report directory (convenience function)
pub fn report_dir() -> PathBuf {
    get().report.dir.clone()
}

/// Get the scenario timeout (convenience function)
pub fn scenario_timeout() -> Duration {
    get().harness.scenario_timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.report.dir, PathBuf::from(DEFAULT_REPORT_DIR));
        assert_eq!(config.harness.scenario_timeout, Duration::from_secs(120));
        assert_eq!(config.harness.response_timeout, Duration::from_secs(30));
        assert_eq!(config.harness.mode_switch_attempts, 4);
        assert_eq!(config.harness.mode_switch_pause, Duration::from_millis(200));
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_value_ignores_malformed_values() {
        assert_eq!(parse_value::<u64>(Some("not-a-number".to_string())), None);
        assert_eq!(parse_value::<u64>(Some(" 42 ".to_string())), Some(42));
        assert_eq!(parse_value::<u32>(None), None);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_REPORT_DIR, "/var/tmp/parity"),
            (ENV_SCENARIO_TIMEOUT, "180"),
            (ENV_MODE_SWITCH_ATTEMPTS, "6"),
            (ENV_MODE_SWITCH_PAUSE, "50"),
            (ENV_RESPONSE_TIMEOUT, "soon"),
        ]));
        assert_eq!(config.report.dir, PathBuf::from("/var/tmp/parity"));
        assert_eq!(config.harness.scenario_timeout, Duration::from_secs(180));
        assert_eq!(config.harness.mode_switch_attempts, 6);
        assert_eq!(config.harness.mode_switch_pause, Duration::from_millis(50));
        // Malformed values fall back to the default
        assert_eq!(config.harness.response_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_lookup_matches_defaults() {
        let config = Config::from_lookup(|_| None);
        let defaults = Config::defaults();
        assert_eq!(config.report.dir, defaults.report.dir);
        assert_eq!(config.harness.mode_switch_attempts, defaults.harness.mode_switch_attempts);
        assert_eq!(config.harness.mode_switch_pause, defaults.harness.mode_switch_pause);
    }
}
