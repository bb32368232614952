//! scan_arbiter_session
//!
//! Capture-pipeline facing layer for `scan_arbiter_core`.
//!
//! Responsibilities:
//! - own one session's `ArbiterState` behind a lock
//! - preprocess and validate recognizer candidates via adapters
//! - invoke arbiter core decision logic
//! - deliver results and failures to the completion sink
//!
//! Non-goals:
//! - no camera, OCR or decoding
//! - no async

pub mod adapter;
pub mod clock;
pub mod config;
pub mod error;
pub mod session;

pub use adapter::{select_candidate, AcceptAll, CandidateFilter, FnFilter};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{load_scan_config, parse_mode, ConfigError, ScanConfig};
pub use error::ScanError;
pub use session::{
    Feedback, FnFeedback, NoFeedback, RestoreError, ScanResult, ScanSession, ScanValue,
    SessionSnapshot, Sink,
};

pub use scan_arbiter_core::{Decision, RecognitionPass, ScanMode, Timestamp};
