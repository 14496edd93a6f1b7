//! Core value types shared across the workspace.
//!
//! Components never share mutable state; they exchange copies of the
//! structures below. Durable ownership lives with the stores in
//! `ponto-calendar` and `ponto-scheduler`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// What the action executor is asked to do against the external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Signal "begin work" (clock in).
    Begin,
    /// Signal "end work" (clock out).
    End,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Begin => "begin",
            ActionKind::End => "end",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-date tasks tracked in the execution state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Entry,
    Exit,
    Sync,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Entry => "entry",
            TaskKind::Exit => "exit",
            TaskKind::Sync => "sync",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(TaskKind::Entry),
            "exit" => Some(TaskKind::Exit),
            "sync" => Some(TaskKind::Sync),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single attempted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Success => "success",
            ActionStatus::Failed => "failed",
        }
    }
}

/// One recorded attempt for a task on a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub status: ActionStatus,
    pub timestamp: DateTime<Utc>,
    /// Free-form detail (error text, the time signaled, etc).
    #[serde(default)]
    pub details: String,
}

/// Per-date execution state: which tasks have been attempted and how
/// they went. Upsert semantics; records are never deleted automatically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionState {
    pub records: BTreeMap<TaskKind, ActionRecord>,
}

impl ExecutionState {
    /// True once a success has been recorded for the task. A failed
    /// record keeps the task eligible for retry.
    pub fn succeeded(&self, task: TaskKind) -> bool {
        self.records
            .get(&task)
            .is_some_and(|r| r.status == ActionStatus::Success)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Where the day's state machine currently sits.
    pub fn day_state(&self) -> DayState {
        if self.succeeded(TaskKind::Sync) {
            DayState::Synced
        } else if self.succeeded(TaskKind::Exit) {
            DayState::ExitDone
        } else if self.succeeded(TaskKind::Entry) {
            DayState::EntryDone
        } else {
            DayState::NotStarted
        }
    }
}

/// Per-date state machine position: NotStarted -> EntryDone -> ExitDone
/// -> Synced (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayState {
    NotStarted,
    EntryDone,
    ExitDone,
    Synced,
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayState::NotStarted => "not started",
            DayState::EntryDone => "entry done",
            DayState::ExitDone => "exit done",
            DayState::Synced => "synced",
        };
        f.write_str(s)
    }
}

/// Permitted wall-clock range for attempting an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionWindow {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
}

impl ActionWindow {
    pub fn new(earliest: NaiveTime, latest: NaiveTime) -> Self {
        Self { earliest, latest }
    }

    /// Inclusive on both ends, same as the original tolerance rules.
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.earliest && t <= self.latest
    }
}

impl fmt::Display for ActionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            clock::fmt_hm(self.earliest),
            clock::fmt_hm(self.latest)
        )
    }
}

/// The four timestamps of one work day.
///
/// Created once per date by the schedule generator and immutable
/// afterwards, except that reconciliation overwrites `exit` with the
/// deadline derived from the observed real entry (and sets
/// `reconciled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    pub date: NaiveDate,
    pub entry: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    pub exit: NaiveTime,
    /// True once `exit` reflects the observed entry rather than the
    /// randomized estimate.
    #[serde(default)]
    pub reconciled: bool,
}

impl DailySchedule {
    /// Minutes worked before lunch.
    pub fn morning_minutes(&self) -> i64 {
        clock::minutes_between(self.lunch_start, self.entry)
    }

    /// Minutes worked after lunch.
    pub fn afternoon_minutes(&self) -> i64 {
        clock::minutes_between(self.exit, self.lunch_end)
    }

    /// Lunch break length in minutes.
    pub fn lunch_minutes(&self) -> i64 {
        clock::minutes_between(self.lunch_end, self.lunch_start)
    }

    /// Total worked minutes (lunch excluded).
    pub fn worked_minutes(&self) -> i64 {
        self.morning_minutes() + self.afternoon_minutes()
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entry {} | lunch {}-{} | exit {}{}",
            clock::fmt_hm(self.entry),
            clock::fmt_hm(self.lunch_start),
            clock::fmt_hm(self.lunch_end),
            clock::fmt_hm(self.exit),
            if self.reconciled { " (reconciled)" } else { "" }
        )
    }
}

/// How an invocation ended, at the coarsest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Weekend or holiday: zero external calls were made.
    NotABusinessDay,
    /// The system switch in config is off.
    Disabled,
    /// The skip-today switch in config is on.
    SkippedToday,
    /// An external action (entry or exit, possibly plus sync) was attempted.
    Acted,
    /// Nothing to do right now; `reason` says why.
    Waiting,
    /// Entry, exit, and sync have all succeeded for the date.
    Complete,
}

/// What one orchestrator invocation decided and did. This is the value
/// handed to the notifier and printed by the CLI; every code path
/// produces one, with a reason, so there are no silent no-ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationReport {
    pub date: NaiveDate,
    pub disposition: Disposition,
    /// Day state after this invocation.
    pub state: DayState,
    /// Which task was attempted, if any.
    pub attempted: Option<TaskKind>,
    /// Outcome of the attempted task.
    pub outcome: Option<ActionStatus>,
    pub reason: String,
    /// The day's plan, when one exists.
    pub schedule: Option<DailySchedule>,
}

impl InvocationReport {
    pub fn new(date: NaiveDate, disposition: Disposition, state: DayState, reason: impl Into<String>) -> Self {
        Self {
            date,
            disposition,
            state,
            attempted: None,
            outcome: None,
            reason: reason.into(),
            schedule: None,
        }
    }
}

impl fmt::Display for InvocationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] state: {}", self.date, self.state)?;
        match (self.attempted, self.outcome) {
            (Some(task), Some(outcome)) => {
                write!(f, " | attempted {}: {}", task, outcome.as_str())?
            }
            (Some(task), None) => write!(f, " | attempted {}", task)?,
            _ => write!(f, " | no action attempted")?,
        }
        write!(f, " | {}", self.reason)?;
        if let Some(s) = &self.schedule {
            write!(f, " | plan: {}", s)?;
        }
        Ok(())
    }
}
