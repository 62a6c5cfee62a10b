pub mod attempt;
pub mod backend;
pub mod browser;
pub mod clean;
pub mod client;
pub mod error;
pub mod listing;
pub mod orchestrator;
pub mod pagination;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod standardize;
pub mod types;

pub use backend::{BackendKind, BackendSettings, Backends, UnknownBackend};
pub use browser::{default_launcher, BrowserLauncher, BrowserOptions, BrowserSession};
pub use client::{HttpSettings, StorefrontClient};
pub use error::ScraperError;
pub use orchestrator::{AttemptDiagnostic, Orchestrator, RunReport, Selection, Verdict};
pub use pipeline::process;
