//! Candidate adapter layer: turn raw recognizer output into at most one
//! arbiter input per recognition pass.
//!
//! Products provide a `CandidateFilter` (or build one from closures with
//! `FnFilter`) to preprocess and validate candidates. The arbiter itself never
//! looks at content beyond exact equality.

use std::fmt;
use std::marker::PhantomData;

use scan_arbiter_core::{RecognitionEvent, RecognitionPass};

/// Trait: preprocess and validate candidates before they reach the arbiter.
pub trait CandidateFilter<T>: Send + Sync {
    /// Transform a raw candidate. Identity by default.
    fn preprocess(&self, candidate: T) -> T {
        candidate
    }

    fn validate(&self, candidate: &T) -> bool;
}

/// Filter that forwards every candidate unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<T> CandidateFilter<T> for AcceptAll {
    fn validate(&self, _candidate: &T) -> bool {
        true
    }
}

/// Filter built from a preprocess closure and a validate closure.
pub struct FnFilter<T, P, V> {
    preprocess: P,
    validate: V,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T, V> FnFilter<T, fn(T) -> T, V>
where
    V: Fn(&T) -> bool + Send + Sync,
{
    /// Validation only; candidates pass through unchanged.
    pub fn validating(validate: V) -> Self {
        FnFilter {
            preprocess: identity::<T>,
            validate,
            _marker: PhantomData,
        }
    }
}

impl<T, P, V> FnFilter<T, P, V>
where
    P: Fn(T) -> T + Send + Sync,
    V: Fn(&T) -> bool + Send + Sync,
{
    pub fn new(preprocess: P, validate: V) -> Self {
        FnFilter {
            preprocess,
            validate,
            _marker: PhantomData,
        }
    }
}

impl<T, P, V> CandidateFilter<T> for FnFilter<T, P, V>
where
    P: Fn(T) -> T + Send + Sync,
    V: Fn(&T) -> bool + Send + Sync,
{
    fn preprocess(&self, candidate: T) -> T {
        (self.preprocess)(candidate)
    }

    fn validate(&self, candidate: &T) -> bool {
        (self.validate)(candidate)
    }
}

impl<T, P, V> fmt::Debug for FnFilter<T, P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter").finish_non_exhaustive()
    }
}

fn identity<T>(c: T) -> T {
    c
}

/// Helper: pick the event to arbitrate for one pass.
pub fn select_candidate<T, F>(filter: &F, pass: RecognitionPass<T>) -> Option<RecognitionEvent<T>>
where
    F: CandidateFilter<T> + ?Sized,
{
    pass.select(|c| filter.preprocess(c), |c| filter.validate(c))
}
