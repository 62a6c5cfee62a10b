//! Ordered "first success of N" evaluation.
//!
//! Endpoint probing, backend sequencing, next-page detection and per-field
//! selector resolution all share the same shape: try candidates strictly in
//! priority order, stop at the first acceptable one, and report what happened
//! to the rest. [`first_success`] covers the effectful (async, fallible) case;
//! [`first_match`] covers pure lookups.

use std::future::Future;

/// Why a candidate did not win.
#[derive(Debug)]
pub enum Rejection<T, E> {
    /// The attempt completed but the acceptance predicate refused its value.
    Unaccepted(T),
    /// The attempt itself failed.
    Failed(E),
}

/// Result of a [`first_success`] run.
#[derive(Debug)]
pub struct FirstSuccess<C, T, E> {
    /// The first accepted candidate and its value, if any.
    pub winner: Option<(C, T)>,
    /// Every candidate evaluated before the winner (or all of them on
    /// exhaustion), in evaluation order.
    pub rejected: Vec<(C, Rejection<T, E>)>,
}

impl<C, T, E> FirstSuccess<C, T, E> {
    /// Returns `true` when every candidate was evaluated without a winner.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.winner.is_none()
    }

    /// Consumes the run and returns the winner's value, or the first value
    /// that completed but fell short of the predicate.
    pub fn into_best_effort(self) -> Option<T> {
        if let Some((_, value)) = self.winner {
            return Some(value);
        }
        self.rejected
            .into_iter()
            .find_map(|(_, rejection)| match rejection {
                Rejection::Unaccepted(value) => Some(value),
                Rejection::Failed(_) => None,
            })
    }
}

/// Evaluates `attempt` for each candidate in order and returns as soon as
/// `accept` approves a value.
///
/// Each attempt receives its own clone of the candidate, so attempts share no
/// state through this function. Later candidates are never evaluated once a
/// winner is found.
pub async fn first_success<C, T, E, I, F, Fut, P>(
    candidates: I,
    mut attempt: F,
    mut accept: P,
) -> FirstSuccess<C, T, E>
where
    C: Clone,
    I: IntoIterator<Item = C>,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&T) -> bool,
{
    let mut rejected = Vec::new();

    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(value) if accept(&value) => {
                return FirstSuccess {
                    winner: Some((candidate, value)),
                    rejected,
                };
            }
            Ok(value) => rejected.push((candidate, Rejection::Unaccepted(value))),
            Err(err) => rejected.push((candidate, Rejection::Failed(err))),
        }
    }

    FirstSuccess {
        winner: None,
        rejected,
    }
}

/// Returns the first `Some` produced by `probe`, evaluating alternatives in
/// order and stopping at the first hit.
pub fn first_match<A, T, I, F>(alternatives: I, probe: F) -> Option<T>
where
    I: IntoIterator<Item = A>,
    F: FnMut(A) -> Option<T>,
{
    alternatives.into_iter().find_map(probe)
}
