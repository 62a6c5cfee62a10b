//! Backend sequencing.
//!
//! In automatic mode backends are tried strictly in priority order and the
//! first whose record count exceeds the acceptance threshold wins. Running out
//! of backends is not an error: the report carries no records and a trail
//! explaining every attempt. Forcing a single backend disables fallback and
//! surfaces its failure to the caller.

use std::fmt;
use std::future::Future;

use shelfscan_core::RawRecord;
use tracing::Instrument;

use crate::attempt::{first_success, Rejection};
use crate::backend::{BackendKind, Backends};
use crate::browser::BrowserLauncher;
use crate::error::ScraperError;

/// Which backends a run may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Auto,
    Forced(BackendKind),
}

impl Selection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Selection::Auto => "auto",
            Selection::Forced(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one backend attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    BelowThreshold,
    Failed(String),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("accepted"),
            Verdict::BelowThreshold => f.write_str("below_threshold"),
            Verdict::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDiagnostic {
    pub backend: BackendKind,
    pub records: usize,
    pub verdict: Verdict,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<RawRecord>,
    /// The backend whose records were returned; `None` when every backend
    /// was exhausted.
    pub accepted: Option<BackendKind>,
    /// One entry per backend attempted, in order.
    pub trail: Vec<AttemptDiagnostic>,
}

impl RunReport {
    /// `true` when every backend was tried and none was accepted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.accepted.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    threshold: usize,
    order: Vec<BackendKind>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            order: BackendKind::DEFAULT_ORDER.to_vec(),
        }
    }

    /// Overrides the automatic-mode priority order.
    #[must_use]
    pub fn with_order(mut self, order: Vec<BackendKind>) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// A result is accepted when it has strictly more records than the
    /// threshold.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        count > self.threshold
    }

    /// Runs the configured backends against `source_url`.
    ///
    /// # Errors
    ///
    /// Only in forced mode, when the pinned backend fails.
    pub async fn run<L: BrowserLauncher>(
        &self,
        backends: &Backends<L>,
        source_url: &str,
        page_budget: u32,
        selection: Selection,
    ) -> Result<RunReport, ScraperError> {
        let span = tracing::info_span!(
            "extraction_run",
            source_url,
            mode = selection.as_str(),
            page_budget
        );
        self.run_with(selection, |kind| {
            backends.attempt(kind, source_url, page_budget)
        })
        .instrument(span)
        .await
    }

    /// Sequencing core with the backend invocation abstracted as `attempt`.
    ///
    /// # Errors
    ///
    /// Only in forced mode, when `attempt` fails.
    pub async fn run_with<F, Fut>(
        &self,
        selection: Selection,
        mut attempt: F,
    ) -> Result<RunReport, ScraperError>
    where
        F: FnMut(BackendKind) -> Fut,
        Fut: Future<Output = Result<Vec<RawRecord>, ScraperError>>,
    {
        match selection {
            Selection::Forced(kind) => {
                tracing::info!(backend = %kind, "running pinned backend");
                match attempt(kind).await {
                    Ok(records) => {
                        let verdict = if self.accepts(records.len()) {
                            Verdict::Accepted
                        } else {
                            Verdict::BelowThreshold
                        };
                        tracing::info!(
                            backend = %kind,
                            records = records.len(),
                            %verdict,
                            "pinned backend finished"
                        );
                        Ok(RunReport {
                            trail: vec![AttemptDiagnostic {
                                backend: kind,
                                records: records.len(),
                                verdict,
                            }],
                            accepted: Some(kind),
                            records,
                        })
                    }
                    Err(e) => {
                        tracing::error!(backend = %kind, error = %e, "pinned backend failed");
                        Err(e)
                    }
                }
            }
            Selection::Auto => Ok(self.run_auto(&mut attempt).await),
        }
    }

    async fn run_auto<F, Fut>(&self, attempt: &mut F) -> RunReport
    where
        F: FnMut(BackendKind) -> Fut,
        Fut: Future<Output = Result<Vec<RawRecord>, ScraperError>>,
    {
        let run = first_success(self.order.iter().copied(), attempt, |records| {
            self.accepts(records.len())
        })
        .await;

        let mut trail: Vec<AttemptDiagnostic> = run
            .rejected
            .into_iter()
            .map(|(backend, rejection)| match rejection {
                Rejection::Unaccepted(records) => {
                    tracing::info!(
                        backend = %backend,
                        records = records.len(),
                        threshold = self.threshold,
                        "backend below threshold"
                    );
                    AttemptDiagnostic {
                        backend,
                        records: records.len(),
                        verdict: Verdict::BelowThreshold,
                    }
                }
                Rejection::Failed(e) => {
                    tracing::warn!(backend = %backend, error = %e, "backend failed");
                    AttemptDiagnostic {
                        backend,
                        records: 0,
                        verdict: Verdict::Failed(e.to_string()),
                    }
                }
            })
            .collect();

        match run.winner {
            Some((backend, records)) => {
                tracing::info!(backend = %backend, records = records.len(), "backend accepted");
                trail.push(AttemptDiagnostic {
                    backend,
                    records: records.len(),
                    verdict: Verdict::Accepted,
                });
                RunReport {
                    records,
                    accepted: Some(backend),
                    trail,
                }
            }
            None => {
                tracing::warn!(attempts = trail.len(), "all backends exhausted");
                RunReport {
                    records: Vec::new(),
                    accepted: None,
                    trail,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
