//! Collaborator traits: the seams between the decision core and the
//! host environment.
//!
//! The core never talks to the timesheet systems directly. It decides,
//! then calls one of these. Implementations live in the binary (command
//! runners, webhook notifier, systemd-run scheduler) or in tests
//! (mocks). Every call is expected to be bounded by a timeout on the
//! implementation side; the orchestrator treats a timeout like any
//! other failure.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::error::Result;
use crate::types::{ActionKind, DailySchedule, InvocationReport};

/// Performs the actual external-system interaction ("begin work" /
/// "end work"). The browser automation, login flow, and page selectors
/// live behind this.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(&self, kind: ActionKind) -> Result<()>;
}

/// Reads the authoritative begin-work record from the external system.
///
/// `Ok(None)` means "no entry registered yet today". That is a
/// legitimate outcome, not an error, and it suppresses the exit action.
#[async_trait]
pub trait EntryObserver: Send + Sync {
    async fn fetch_real_entry(&self, date: NaiveDate) -> Result<Option<NaiveTime>>;
}

/// Propagates the day's four timestamps to the secondary record-keeping
/// system.
#[async_trait]
pub trait DownstreamSync: Send + Sync {
    async fn push(&self, date: NaiveDate, schedule: &DailySchedule) -> Result<()>;
}

/// Consumes invocation reports for human-facing notification. Not part
/// of the decision logic; notifier failures are logged, never acted on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &InvocationReport) -> Result<()>;
}

/// One-shot future invocation registration with the OS.
///
/// `elevated` requests the privileged registration mode (runs with the
/// workstation locked / user logged out). The trigger scheduler retries
/// without it when the privileged mode is unavailable.
#[async_trait]
pub trait OsScheduler: Send + Sync {
    async fn register_once(&self, task: &str, when_today: NaiveTime, elevated: bool) -> Result<()>;

    /// Cancel a previously registered trigger. Cancelling a task that
    /// does not exist is not an error.
    async fn cancel(&self, task: &str) -> Result<()>;
}
