//! # Ponto Agent
//!
//! The decision layer of the attendance core:
//! - [`reconciler`]: turns the externally observed real entry time into
//!   the authoritative exit deadline and a "should I act now" verdict.
//! - [`orchestrator`]: the per-date state machine. One invocation, at
//!   most one external clock action, every path reported with a reason.
//! - [`notify`]: webhook delivery of invocation reports.

pub mod notify;
pub mod orchestrator;
pub mod reconciler;

pub use notify::WebhookNotifier;
pub use orchestrator::{Collaborators, DailyOrchestrator};
pub use reconciler::{EntryReconciler, ReconcileVerdict};
