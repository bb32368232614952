//! Session configuration.
//!
//! The `[scan]` TOML table is read into a raw mirror first, then converted
//! into a typed `ScanConfig` with parsed mode and durations.

use std::{fs, path::Path, time::Duration};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use scan_arbiter_core::{ArbiterCfg, ScanMode, DEFAULT_MANUAL_WINDOW, DEFAULT_SCAN_INTERVAL};

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid scan mode '{0}'")]
    InvalidMode(String),

    #[error("invalid duration '{0}': {1}")]
    InvalidDuration(String, #[source] humantime::DurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Fully-typed session configuration, fixed for the life of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    pub mode: ScanMode,
    /// Debounce between emissions in continuous mode.
    pub scan_interval: Duration,
    /// How long after a capture trigger manual mode accepts a result.
    pub manual_window: Duration,
    pub vibrate_on_success: bool,
    /// Value delivered by `ScanSession::simulate` when no camera is present.
    pub simulated_data: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Once,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            manual_window: DEFAULT_MANUAL_WINDOW,
            vibrate_on_success: true,
            simulated_data: None,
        }
    }
}

impl ScanConfig {
    pub fn with_mode(mode: ScanMode) -> Self {
        Self { mode, ..Self::default() }
    }

    /// Core arbiter cfg. Manual mode gates on the manual window, every other
    /// mode on the scan interval.
    pub fn arbiter_cfg(&self) -> ArbiterCfg {
        let min_interval = match self.mode {
            ScanMode::Manual => self.manual_window,
            _ => self.scan_interval,
        };
        ArbiterCfg::new(self.mode, min_interval)
    }

    /// Parse a TOML document containing a `[scan]` table. A missing table
    /// yields the defaults.
    pub fn from_toml_str(txt: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(txt)?;
        file.scan.unwrap_or_default().try_into()
    }
}

/// Load and parse the scan configuration from `path`.
pub fn load_scan_config(path: &Path) -> Result<ScanConfig, ConfigError> {
    debug!("Reading scan config from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let cfg = ScanConfig::from_toml_str(&txt)?;
    info!("Loaded scan config from {:?} (mode={})", path, cfg.mode);
    Ok(cfg)
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    scan: Option<ScanStub>,
}

/// Mirror of the `[scan]` table
#[derive(Debug, Default, Deserialize)]
struct ScanStub {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    scan_interval: Option<String>,
    #[serde(default)]
    manual_window: Option<String>,
    #[serde(default)]
    vibrate_on_success: Option<bool>,
    #[serde(default)]
    simulated_data: Option<String>,
}

impl TryFrom<ScanStub> for ScanConfig {
    type Error = ConfigError;

    fn try_from(stub: ScanStub) -> Result<Self, Self::Error> {
        let d = ScanConfig::default();
        let mode = match stub.mode {
            Some(m) => parse_mode(&m)?,
            None => d.mode,
        };
        let scan_interval = match stub.scan_interval {
            Some(s) => parse_duration(&s)?,
            None => d.scan_interval,
        };
        let manual_window = match stub.manual_window {
            Some(s) => parse_duration(&s)?,
            None => d.manual_window,
        };
        Ok(ScanConfig {
            mode,
            scan_interval,
            manual_window,
            vibrate_on_success: stub.vibrate_on_success.unwrap_or(d.vibrate_on_success),
            simulated_data: stub.simulated_data.filter(|s| !s.is_empty()),
        })
    }
}

fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(s).map_err(|e| ConfigError::InvalidDuration(s.to_string(), e))
}

/// Accepts `"once_per_value"`, `"oncePerValue"`, `"once-per-code"` and so on.
pub fn parse_mode(s: &str) -> Result<ScanMode, ConfigError> {
    let key: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match key.as_str() {
        "once" => Ok(ScanMode::Once),
        "oncepervalue" | "oncepercode" => Ok(ScanMode::OncePerValue),
        "continuous" => Ok(ScanMode::Continuous),
        "manual" => Ok(ScanMode::Manual),
        _ => Err(ConfigError::InvalidMode(s.to_string())),
    }
}
