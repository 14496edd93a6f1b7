//! # Ponto Scheduler
//!
//! The scheduling half of the attendance core:
//! - [`plan`]: randomized, duration-exact daily time plans, generated
//!   once per date and reused on every later invocation.
//! - [`window`]: pure "may I act now" clock gating, deliberately
//!   independent from "have I acted" state.
//! - [`state`]: SQLite-backed per-date execution state, the idempotency
//!   guard for external actions.
//! - [`store`]: JSON persistence for the daily plans.
//! - [`trigger`]: capped one-shot re-invocation arming against the OS
//!   scheduler.
//!
//! None of the stores take locks against concurrent processes. The
//! external scheduler is expected to serialize invocations for a given
//! date; overlapping runs are an unhandled hazard, same as in the
//! system this replaces.

pub mod plan;
pub mod state;
pub mod store;
pub mod trigger;
pub mod window;

pub use plan::ScheduleGenerator;
pub use state::ExecutionStateStore;
pub use store::ScheduleStore;
pub use trigger::{ArmedTrigger, DeferredTriggerScheduler};
pub use window::{GatedAction, TimeWindowGate, WindowCheck};
