pub mod candidate;
pub mod cfg;
pub mod state;
pub mod decide;

pub use candidate::{RecognitionEvent, RecognitionPass};
pub use cfg::{ArbiterCfg, ScanMode, DEFAULT_MANUAL_WINDOW, DEFAULT_SCAN_INTERVAL};
pub use state::{ArbiterState, Timestamp};
pub use decide::{Decision, ScanArbiter, decide_emission};
