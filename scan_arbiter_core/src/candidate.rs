use crate::state::Timestamp;

/// One candidate handed to the arbiter.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionEvent<T> {
    pub value: T,
    pub observed_at: Timestamp,
}

impl<T> RecognitionEvent<T> {
    pub fn new(value: T, observed_at: Timestamp) -> Self {
        RecognitionEvent { value, observed_at }
    }
}

/// All candidates produced by one recognition pass over a frame, in the
/// order the recognition engine reported them.
#[derive(Clone, Debug)]
pub struct RecognitionPass<T> {
    pub candidates: Vec<T>,
    pub observed_at: Timestamp,
}

impl<T> RecognitionPass<T> {
    pub fn new(observed_at: Timestamp) -> Self {
        RecognitionPass {
            candidates: Vec::new(),
            observed_at,
        }
    }

    pub fn with_candidates(candidates: impl IntoIterator<Item = T>, observed_at: Timestamp) -> Self {
        RecognitionPass {
            candidates: candidates.into_iter().collect(),
            observed_at,
        }
    }

    pub fn push(&mut self, candidate: T) {
        self.candidates.push(candidate);
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Preprocess candidates in order and return the first that passes
    /// `validate`. At most one event per pass reaches the arbiter.
    pub fn select<P, V>(self, mut preprocess: P, mut validate: V) -> Option<RecognitionEvent<T>>
    where
        P: FnMut(T) -> T,
        V: FnMut(&T) -> bool,
    {
        let observed_at = self.observed_at;
        self.candidates
            .into_iter()
            .map(|c| preprocess(c))
            .find(|c| validate(c))
            .map(|value| RecognitionEvent { value, observed_at })
    }

    /// `select` without preprocessing.
    pub fn first_valid<V>(self, validate: V) -> Option<RecognitionEvent<T>>
    where
        V: FnMut(&T) -> bool,
    {
        self.select(|c| c, validate)
    }
}
