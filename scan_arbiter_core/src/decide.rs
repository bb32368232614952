//scan_arbiter_core/decide.rs

use std::hash::Hash;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    cfg::{ArbiterCfg, ScanMode},
    state::{ArbiterState, Timestamp},
};

/// Arbiter decision for one recognition event.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Decision {
    Emit,
    Suppress,
}

impl Decision {
    #[inline]
    pub fn is_emit(self) -> bool {
        self == Decision::Emit
    }
}

/// Decide whether `value`, observed at `now`, becomes a scan result.
///
/// Total over (cfg, state, value, now). On `Emit` the state records the
/// emission; on `Suppress` it is left untouched.
pub fn decide_emission<T>(
    value: &T,
    now: Timestamp,
    cfg: &ArbiterCfg,
    state: &mut ArbiterState<T>,
) -> Decision
where
    T: Eq + Hash + Clone,
{
    let interval = cfg.min_interval_nanos();
    let elapsed = state.elapsed_since_emit(now);

    let accept = match cfg.mode {
        ScanMode::Once => !state.finished,
        ScanMode::Manual => !state.finished && elapsed.is_some_and(|e| e <= interval),
        ScanMode::OncePerValue => !state.accepted_values.contains(value),
        ScanMode::Continuous => elapsed.map_or(true, |e| e >= interval),
    };

    if !accept {
        return Decision::Suppress;
    }

    match cfg.mode {
        ScanMode::Once | ScanMode::Manual => state.finished = true,
        ScanMode::OncePerValue => {
            state.accepted_values.insert(value.clone());
        }
        ScanMode::Continuous => {}
    }
    state.last_emit_at = Some(now);
    Decision::Emit
}

/// Arbiter for a single scanning session: immutable cfg plus owned state.
///
/// All methods take `&mut self`; callers sharing an arbiter across threads
/// serialize access themselves (the session crate wraps it in a mutex).
#[derive(Clone, Debug)]
pub struct ScanArbiter<T> {
    cfg: ArbiterCfg,
    state: ArbiterState<T>,
}

impl<T> ScanArbiter<T>
where
    T: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new(cfg: ArbiterCfg) -> Self {
        Self {
            cfg,
            state: ArbiterState::default(),
        }
    }

    /// Rebuild an arbiter around previously exported state.
    pub fn from_parts(cfg: ArbiterCfg, state: ArbiterState<T>) -> Self {
        Self { cfg, state }
    }

    pub fn cfg(&self) -> &ArbiterCfg {
        &self.cfg
    }

    pub fn mode(&self) -> ScanMode {
        self.cfg.mode
    }

    pub fn state(&self) -> &ArbiterState<T> {
        &self.state
    }

    pub fn into_state(self) -> ArbiterState<T> {
        self.state
    }

    /// True once a terminal mode has emitted; nothing more is emitted until reset.
    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Open the manual acceptance window at `now`. No-op outside `Manual` mode.
    pub fn arm_manual_capture(&mut self, now: Timestamp) {
        if self.cfg.mode != ScanMode::Manual {
            return;
        }
        self.state.reset();
        self.state.last_emit_at = Some(now);
    }

    pub fn evaluate(&mut self, value: &T, now: Timestamp) -> Decision {
        let decision = decide_emission(value, now, &self.cfg, &mut self.state);
        debug!(
            "scan arbiter [{}] {:?} at {}: {:?}",
            self.cfg.mode, value, now, decision
        );
        decision
    }

    /// Move the debounce clock without a mode decision (results injected
    /// outside the recognition pipeline).
    pub fn stamp_emit(&mut self, now: Timestamp) {
        self.state.last_emit_at = Some(now);
    }
}
