//! Error taxonomy for Ponto.
//!
//! Three classes matter to the orchestrator: configuration problems are
//! fatal and surface before any external call; external-action failures
//! are recorded and retried inside the relevant window; scheduling
//! failures degrade to warnings. "Entry not observed yet" is not an
//! error at all and is modeled as `Ok(None)` at the observer trait.

use thiserror::Error;

/// All Ponto errors.
#[derive(Debug, Error)]
pub enum PontoError {
    /// Invalid or missing configuration. Fatal: nothing external is
    /// attempted once this is raised.
    #[error("config error: {0}")]
    Config(String),

    /// A durable store (holidays, schedules, execution state) failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The external action executor reported failure or timed out.
    #[error("action failed: {0}")]
    Action(String),

    /// The entry observer failed outright (not "no entry yet").
    #[error("observer error: {0}")]
    Observer(String),

    /// Downstream sync push failed.
    #[error("sync failed: {0}")]
    Sync(String),

    /// One-shot trigger registration failed in every available mode.
    #[error("scheduling failed: {0}")]
    Scheduling(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PontoError>;
