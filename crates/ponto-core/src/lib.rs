//! # Ponto Core
//!
//! Shared foundation for the Ponto attendance automation system:
//! value types, clock arithmetic, configuration, the error taxonomy,
//! and the collaborator traits that connect the decision core to the
//! host environment (the thing that actually clocks in/out).
//!
//! Nothing in this crate performs I/O against external systems. All
//! side effects live behind the traits in [`traits`].

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::PontoConfig;
pub use error::{PontoError, Result};
pub use types::{
    ActionKind, ActionRecord, ActionStatus, ActionWindow, DailySchedule, DayState, Disposition,
    ExecutionState, InvocationReport, TaskKind,
};
