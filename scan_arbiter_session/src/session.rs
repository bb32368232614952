//! One scanning session around a `ScanArbiter`.
//!
//! The session is the glue the capture pipeline talks to:
//! - owns the arbiter state behind a single lock
//! - runs candidate preprocessing and validation
//! - invokes the completion sink and success feedback on emit
//! - forwards upstream failures on the same sink, bypassing the arbiter
//!
//! No IO. No threads. Recognition callbacks from any thread funnel through
//! the one mutex, so decisions are serialized per session.

use std::fmt;
use std::hash::Hash;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use scan_arbiter_core::{
    ArbiterState, Decision, RecognitionPass, ScanArbiter, ScanMode, Timestamp,
};

use crate::adapter::{select_candidate, AcceptAll, CandidateFilter};
use crate::clock::{Clock, MonotonicClock};
use crate::config::ScanConfig;
use crate::error::ScanError;

/// Values a session can arbitrate.
pub trait ScanValue: Eq + Hash + Clone + fmt::Debug + Send + 'static {}

impl<T> ScanValue for T where T: Eq + Hash + Clone + fmt::Debug + Send + 'static {}

/// A successful scan handed to the completion sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanResult<T> {
    pub value: T,
    pub observed_at: Timestamp,
}

/// Completion sink: receives every emitted result and every upstream failure.
pub type Sink<T> = Box<dyn Fn(Result<ScanResult<T>, ScanError>) + Send + Sync>;

/// User-facing confirmation on a successful scan (haptics, sound).
pub trait Feedback: Send + Sync {
    fn on_success(&self);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn on_success(&self) {}
}

/// Adapts a closure into `Feedback`.
pub struct FnFeedback<F>(pub F);

impl<F> Feedback for FnFeedback<F>
where
    F: Fn() + Send + Sync,
{
    fn on_success(&self) {
        (self.0)()
    }
}

/// Arbiter state exported for storage-agnostic persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Eq + Hash"
))]
pub struct SessionSnapshot<T> {
    pub mode: ScanMode,
    pub state: ArbiterState<T>,
}

impl<T: Eq + Hash> PartialEq for SessionSnapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.state == other.state
    }
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("snapshot was taken in {found} mode, session runs in {expected} mode")]
    ModeMismatch { expected: ScanMode, found: ScanMode },

    #[error("snapshot decode error: {0}")]
    Json(#[from] serde_json::Error),
}

struct Inner<T> {
    arbiter: ScanArbiter<T>,
    capturing: bool,
}

pub struct ScanSession<T> {
    config: ScanConfig,
    inner: Mutex<Inner<T>>,
    filter: Box<dyn CandidateFilter<T>>,
    feedback: Box<dyn Feedback>,
    clock: Box<dyn Clock>,
    sink: Sink<T>,
}

impl<T: ScanValue> ScanSession<T> {
    /// Start a session. Every candidate is accepted until a filter is set.
    pub fn new<S>(config: ScanConfig, sink: S) -> Self
    where
        S: Fn(Result<ScanResult<T>, ScanError>) + Send + Sync + 'static,
    {
        info!(
            "scan session started (mode={}, interval={:?}, manual_window={:?})",
            config.mode, config.scan_interval, config.manual_window
        );
        Self {
            inner: Mutex::new(Inner {
                arbiter: ScanArbiter::new(config.arbiter_cfg()),
                capturing: true,
            }),
            config,
            filter: Box::new(AcceptAll),
            feedback: Box::new(NoFeedback),
            clock: Box::new(MonotonicClock::new()),
            sink: Box::new(sink),
        }
    }

    pub fn with_filter<F: CandidateFilter<T> + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_feedback<F: Feedback + 'static>(mut self, feedback: F) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn mode(&self) -> ScanMode {
        self.config.mode
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Submit the candidates of one recognition pass, stamped with the
    /// session clock.
    pub fn submit_candidates<I>(&self, candidates: I) -> Decision
    where
        I: IntoIterator<Item = T>,
    {
        self.submit_pass(RecognitionPass::with_candidates(candidates, self.clock.now()))
    }

    /// Submit one recognition pass. Only the first candidate surviving
    /// preprocessing and validation is arbitrated; on emit the sink fires
    /// after the lock is released.
    pub fn submit_pass(&self, pass: RecognitionPass<T>) -> Decision {
        let Some(event) = select_candidate(&*self.filter, pass) else {
            return Decision::Suppress;
        };

        let decision = {
            let mut inner = self.inner.lock();
            if !inner.capturing {
                debug!("capture paused, dropping {:?}", event.value);
                return Decision::Suppress;
            }
            inner.arbiter.evaluate(&event.value, event.observed_at)
        };

        if decision.is_emit() {
            self.deliver(ScanResult {
                value: event.value,
                observed_at: event.observed_at,
            });
        }
        decision
    }

    /// Clear accepted values, the finished flag and the debounce clock.
    pub fn reset(&self) {
        self.inner.lock().arbiter.reset();
        info!("scan session reset");
    }

    /// Open the manual capture window now. No-op outside manual mode.
    pub fn arm_manual_capture(&self) {
        self.arm_manual_capture_at(self.clock.now());
    }

    pub fn arm_manual_capture_at(&self, now: Timestamp) {
        if self.config.mode != ScanMode::Manual {
            debug!("ignoring manual capture trigger in {} mode", self.config.mode);
            return;
        }
        self.inner.lock().arbiter.arm_manual_capture(now);
        info!("manual capture armed at {}", now);
    }

    /// Whether the pipeline should bother recognizing the next frame.
    pub fn should_process_frame(&self) -> bool {
        let inner = self.inner.lock();
        inner.capturing && !inner.arbiter.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().arbiter.is_finished()
    }

    pub fn pause_capture(&self) {
        self.inner.lock().capturing = false;
    }

    pub fn resume_capture(&self) {
        self.inner.lock().capturing = true;
    }

    /// Report an upstream failure to the sink. Arbiter state is untouched.
    pub fn fail(&self, err: ScanError) {
        warn!("scan failed: {}", err);
        (self.sink)(Err(err));
    }

    pub fn snapshot(&self) -> SessionSnapshot<T> {
        let inner = self.inner.lock();
        SessionSnapshot {
            mode: inner.arbiter.mode(),
            state: inner.arbiter.state().clone(),
        }
    }

    /// Replace arbiter state with a snapshot taken in the same mode.
    pub fn restore(&self, snap: SessionSnapshot<T>) -> Result<(), RestoreError> {
        if snap.mode != self.config.mode {
            warn!("rejecting {} snapshot for {} session", snap.mode, self.config.mode);
            return Err(RestoreError::ModeMismatch {
                expected: self.config.mode,
                found: snap.mode,
            });
        }
        let mut inner = self.inner.lock();
        inner.arbiter = ScanArbiter::from_parts(self.config.arbiter_cfg(), snap.state);
        Ok(())
    }

    fn deliver(&self, result: ScanResult<T>) {
        if self.config.vibrate_on_success {
            self.feedback.on_success();
        }
        (self.sink)(Ok(result));
    }
}

impl<T> ScanSession<T>
where
    T: ScanValue + Serialize + DeserializeOwned,
{
    pub fn snapshot_json(&self) -> Result<String, RestoreError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn restore_json(&self, json: &str) -> Result<(), RestoreError> {
        let snap: SessionSnapshot<T> = serde_json::from_str(json)?;
        self.restore(snap)
    }
}

impl<T> ScanSession<T>
where
    T: ScanValue + From<String>,
{
    /// Deliver the configured simulated value as a successful scan, for
    /// environments without a camera. Returns false when none is configured.
    pub fn simulate(&self) -> bool {
        self.simulate_at(self.clock.now())
    }

    pub fn simulate_at(&self, now: Timestamp) -> bool {
        let Some(data) = self.config.simulated_data.clone() else {
            return false;
        };
        self.inner.lock().arbiter.stamp_emit(now);
        debug!("delivering simulated scan {:?}", data);
        self.deliver(ScanResult {
            value: T::from(data),
            observed_at: now,
        });
        true
    }
}

impl<T> fmt::Debug for ScanSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
