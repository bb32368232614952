use thiserror::Error;

/// Failures reported by the capture pipeline. These go straight to the
/// completion sink and never pass through the arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The camera could not be accessed.
    #[error("camera input is not available")]
    BadInput,

    /// The camera cannot produce the requested kinds of codes.
    #[error("camera output cannot scan the requested types")]
    BadOutput,

    #[error("scanner initialization failed: {0}")]
    InitError(String),

    #[error("camera permission denied")]
    PermissionDenied,
}
