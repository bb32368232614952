use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Debounce between emissions in `Continuous` mode.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(2);
/// Acceptance window opened by a manual capture trigger.
pub const DEFAULT_MANUAL_WINDOW: Duration = Duration::from_millis(500);

/// Operating mode of a scanning session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Emit exactly one value, then stop.
    #[default]
    Once,
    /// Emit each distinct value no more than once.
    OncePerValue,
    /// Keep emitting, at most once per `min_interval`.
    Continuous,
    /// Emit only inside the window opened by a capture trigger.
    Manual,
}

impl ScanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanMode::Once => "once",
            ScanMode::OncePerValue => "once_per_value",
            ScanMode::Continuous => "continuous",
            ScanMode::Manual => "manual",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArbiterCfg {
    pub mode: ScanMode,
    /// Continuous: minimum spacing between emissions.
    /// Manual: maximum delay after the trigger.
    pub min_interval: Duration,
}

impl ArbiterCfg {
    pub fn new(mode: ScanMode, min_interval: Duration) -> Self {
        Self { mode, min_interval }
    }

    #[inline]
    pub(crate) fn min_interval_nanos(&self) -> i128 {
        i128::try_from(self.min_interval.as_nanos()).unwrap_or(i128::MAX)
    }
}

impl Default for ArbiterCfg {
    fn default() -> Self {
        Self {
            mode: ScanMode::Once,
            min_interval: DEFAULT_SCAN_INTERVAL,
        }
    }
}
