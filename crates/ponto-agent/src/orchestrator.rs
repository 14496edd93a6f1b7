//! The per-date orchestration state machine.
//!
//! Each invocation walks the same ladder: business-day gate, then
//! "have I acted" (execution state) AND "may I act" (time window), then
//! at most one external clock action. Sync rides along only after a
//! successful exit and is the one task that may be retried on its own.
//! Failure of any external call becomes a recorded outcome, never an
//! escaped error.
//!
//! The advisory action hint from the invocation surface is logged and
//! ignored: state and windows alone decide, so a stale or wrong hint
//! cannot cause a duplicate clock signal.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use ponto_calendar::{DayVerdict, HolidayCalendar};
use ponto_core::clock;
use ponto_core::config::PontoConfig;
use ponto_core::error::{PontoError, Result};
use ponto_core::traits::{ActionExecutor, DownstreamSync, EntryObserver, Notifier, OsScheduler};
use ponto_core::types::{
    ActionKind, ActionStatus, DailySchedule, DayState, Disposition, ExecutionState,
    InvocationReport, TaskKind,
};
use ponto_scheduler::{
    ArmedTrigger, DeferredTriggerScheduler, ExecutionStateStore, GatedAction, ScheduleGenerator,
    ScheduleStore, TimeWindowGate,
};

use crate::reconciler::EntryReconciler;

/// The host-environment collaborators, wired up once by the binary and
/// passed in by value. No hidden globals.
pub struct Collaborators {
    pub executor: Arc<dyn ActionExecutor>,
    pub observer: Arc<dyn EntryObserver>,
    pub sync: Arc<dyn DownstreamSync>,
    pub os_scheduler: Arc<dyn OsScheduler>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// Drives one date through NotStarted -> EntryDone -> ExitDone ->
/// Synced, one invocation at a time.
pub struct DailyOrchestrator<R: Rng> {
    config: PontoConfig,
    calendar: HolidayCalendar,
    gate: TimeWindowGate,
    generator: ScheduleGenerator<R>,
    state: ExecutionStateStore,
    reconciler: EntryReconciler,
    trigger: DeferredTriggerScheduler,
    executor: Arc<dyn ActionExecutor>,
    observer: Arc<dyn EntryObserver>,
    sync: Arc<dyn DownstreamSync>,
    notifier: Option<Arc<dyn Notifier>>,
    call_timeout: Duration,
}

impl DailyOrchestrator<StdRng> {
    /// Open the orchestrator with entropy-seeded randomness.
    pub fn open(config: PontoConfig, data_dir: &Path, collab: Collaborators) -> Result<Self> {
        Self::with_rng(config, data_dir, collab, StdRng::from_entropy())
    }
}

impl<R: Rng> DailyOrchestrator<R> {
    /// Open with an injected RNG (tests seed this for exact plans).
    ///
    /// Config validation happens here, before anything external can be
    /// reached: an invalid config never gets to act.
    pub fn with_rng(
        config: PontoConfig,
        data_dir: &Path,
        collab: Collaborators,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;

        let calendar = HolidayCalendar::open(data_dir);
        let gate = TimeWindowGate::new(&config.windows);
        let generator = ScheduleGenerator::new(
            ScheduleStore::new(data_dir),
            config.randomization.clone(),
            config.work_hours.clone(),
            rng,
        );
        let state = ExecutionStateStore::open(&data_dir.join("state.db"))?;
        let call_timeout = Duration::from_secs(config.external.timeout_secs);
        let reconciler = EntryReconciler::new(
            collab.observer.clone(),
            ScheduleStore::new(data_dir),
            config.work_hours.clone(),
            call_timeout,
        );
        let trigger = DeferredTriggerScheduler::new(config.trigger.clone(), collab.os_scheduler);

        Ok(Self {
            config,
            calendar,
            gate,
            generator,
            state,
            reconciler,
            trigger,
            executor: collab.executor,
            observer: collab.observer,
            sync: collab.sync,
            notifier: collab.notifier,
            call_timeout,
        })
    }

    /// One invocation: decide, perform at most one clock action, record
    /// the outcome, notify. Always returns a report with a reason.
    pub async fn run(
        &mut self,
        date: NaiveDate,
        now: NaiveTime,
        hint: Option<TaskKind>,
    ) -> Result<InvocationReport> {
        if let Some(hint) = hint {
            tracing::debug!("Advisory hint '{hint}' received; state and windows decide anyway");
        }

        let report = self.decide_and_act(date, now).await?;
        tracing::info!("📋 {report}");

        // Notification is reporting, not decision logic: only action
        // outcomes are worth a push, and notifier failure never changes
        // the result.
        if report.disposition == Disposition::Acted {
            self.dispatch_report(&report).await;
        }
        Ok(report)
    }

    async fn decide_and_act(&mut self, date: NaiveDate, now: NaiveTime) -> Result<InvocationReport> {
        if !self.config.system.enabled {
            return Ok(self.report(date, Disposition::Disabled, "system disabled in config"));
        }
        if self.config.system.skip_today {
            return Ok(self.report(date, Disposition::SkippedToday, "skip_today set in config"));
        }

        let verdict = self.calendar.is_business_day(date);
        if !verdict.is_business_day() {
            // Zero external calls on a day off.
            return Ok(self.report(date, Disposition::NotABusinessDay, verdict.to_string()));
        }

        let state = self.state.get(date);

        if !state.succeeded(TaskKind::Entry) {
            let check = self.gate.check(GatedAction::Entry, now);
            if !check.within {
                return Ok(self.report(date, Disposition::Waiting, check.reason));
            }
            let schedule = self.generator.generate(date)?;
            return self.attempt_entry(date, now, schedule).await;
        }

        if !state.succeeded(TaskKind::Exit) {
            let check = self.gate.check(GatedAction::ExitVerification, now);
            if !check.within {
                return Ok(self.report(
                    date,
                    Disposition::Waiting,
                    format!("entry already completed; {}", check.reason),
                ));
            }
            // The plan must exist before reconciliation can overwrite
            // its exit (and before sync can push it).
            self.generator.generate(date)?;

            let verdict = match self.reconciler.verify(date, now).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("⚠️ Exit verification unavailable: {e}");
                    return Ok(self.report(
                        date,
                        Disposition::Waiting,
                        format!("exit verification unavailable: {e}"),
                    ));
                }
            };
            if !verdict.should_act {
                return Ok(self.report(date, Disposition::Waiting, verdict.reason));
            }
            return self.attempt_exit_then_sync(date, now).await;
        }

        if !state.succeeded(TaskKind::Sync) {
            // Exit is in but a previous sync attempt did not stick.
            // Sync retries alone; the exit is never re-attempted.
            return self.attempt_sync_only(date).await;
        }

        Ok(self.report(date, Disposition::Complete, "all tasks complete for today"))
    }

    async fn attempt_entry(
        &mut self,
        date: NaiveDate,
        now: NaiveTime,
        schedule: DailySchedule,
    ) -> Result<InvocationReport> {
        match self.call_executor(ActionKind::Begin).await {
            Ok(()) => {
                self.state.record(
                    date,
                    TaskKind::Entry,
                    ActionStatus::Success,
                    &format!("signaled at {}", clock::fmt_hm(now)),
                )?;

                // Arm the one-shot re-invocation around the estimated
                // deadline. The triggered run re-verifies against the
                // observed entry, so an estimate is good enough here.
                let provisional =
                    clock::add_minutes(schedule.entry, self.config.work_hours.total_minutes());
                let mut reason = format!(
                    "entry signaled (planned entry {})",
                    clock::fmt_hm(schedule.entry)
                );
                match self.trigger.arm(provisional).await {
                    Ok(armed) => {
                        reason.push_str(&format!(
                            "; exit trigger armed for {}",
                            clock::fmt_hm(armed.at)
                        ));
                    }
                    Err(e) => {
                        // Degraded, not fatal: the recurring scheduler
                        // will still hit the verification window.
                        tracing::warn!("⚠️ {e}");
                        reason.push_str(&format!("; exit trigger not armed: {e}"));
                    }
                }

                let mut report = self.report(date, Disposition::Acted, reason);
                report.attempted = Some(TaskKind::Entry);
                report.outcome = Some(ActionStatus::Success);
                Ok(report)
            }
            Err(e) => {
                self.state
                    .record(date, TaskKind::Entry, ActionStatus::Failed, &e.to_string())?;
                let mut report = self.report(
                    date,
                    Disposition::Acted,
                    format!("entry failed: {e}; eligible for retry while the window is open"),
                );
                report.attempted = Some(TaskKind::Entry);
                report.outcome = Some(ActionStatus::Failed);
                Ok(report)
            }
        }
    }

    async fn attempt_exit_then_sync(
        &mut self,
        date: NaiveDate,
        now: NaiveTime,
    ) -> Result<InvocationReport> {
        match self.call_executor(ActionKind::End).await {
            Ok(()) => {
                self.state.record(
                    date,
                    TaskKind::Exit,
                    ActionStatus::Success,
                    &format!("signaled at {}", clock::fmt_hm(now)),
                )?;

                let mut report = match self.push_downstream(date).await {
                    Ok(()) => {
                        self.state
                            .record(date, TaskKind::Sync, ActionStatus::Success, "")?;
                        self.report(date, Disposition::Acted, "exit signaled and day synced")
                    }
                    Err(e) => {
                        // Exit stays recorded; sync stays unrecorded and
                        // is retried by a later invocation on its own.
                        tracing::warn!("⚠️ Downstream sync failed: {e}");
                        self.report(
                            date,
                            Disposition::Acted,
                            format!("exit signaled; downstream sync failed ({e}), will retry"),
                        )
                    }
                };
                report.attempted = Some(TaskKind::Exit);
                report.outcome = Some(ActionStatus::Success);
                Ok(report)
            }
            Err(e) => {
                self.state
                    .record(date, TaskKind::Exit, ActionStatus::Failed, &e.to_string())?;
                let mut report = self.report(
                    date,
                    Disposition::Acted,
                    format!("exit failed: {e}; eligible for retry while the window is open"),
                );
                report.attempted = Some(TaskKind::Exit);
                report.outcome = Some(ActionStatus::Failed);
                Ok(report)
            }
        }
    }

    async fn attempt_sync_only(&mut self, date: NaiveDate) -> Result<InvocationReport> {
        let mut report = match self.push_downstream(date).await {
            Ok(()) => {
                self.state
                    .record(date, TaskKind::Sync, ActionStatus::Success, "retried")?;
                let mut r = self.report(date, Disposition::Acted, "day synced on retry");
                r.outcome = Some(ActionStatus::Success);
                r
            }
            Err(e) => {
                tracing::warn!("⚠️ Downstream sync retry failed: {e}");
                let mut r = self.report(
                    date,
                    Disposition::Acted,
                    format!("downstream sync failed again ({e}), will retry"),
                );
                r.outcome = Some(ActionStatus::Failed);
                r
            }
        };
        report.attempted = Some(TaskKind::Sync);
        Ok(report)
    }

    /// Compute today's exit trigger and register it, preferring the
    /// observed entry over the plan estimate. This is the standalone
    /// "arm" flow run from the CLI late in the afternoon.
    pub async fn arm_exit_trigger(&mut self, date: NaiveDate) -> Result<ArmedTrigger> {
        let observed = tokio::time::timeout(self.call_timeout, self.observer.fetch_real_entry(date))
            .await
            .map_err(|_| PontoError::Observer("entry observation timed out".into()))??;

        let base = match observed {
            Some(real) => {
                tracing::info!("Arming from observed entry {}", clock::fmt_hm(real));
                real
            }
            None => {
                let plan = self.generator.generate(date)?;
                tracing::info!(
                    "No entry observed yet; arming from planned entry {}",
                    clock::fmt_hm(plan.entry)
                );
                plan.entry
            }
        };
        self.trigger
            .arm(clock::add_minutes(base, self.config.work_hours.total_minutes()))
            .await
    }

    /// Day overview for the status CLI: calendar verdict, state machine
    /// position, raw records, and the plan if one exists.
    pub fn status(
        &self,
        date: NaiveDate,
    ) -> (DayVerdict, DayState, ExecutionState, Option<DailySchedule>) {
        let verdict = self.calendar.is_business_day(date);
        let state = self.state.get(date);
        let day_state = state.day_state();
        (verdict, day_state, state, self.generator.existing(date))
    }

    /// Get or create the plan for a date (the `plan` CLI command).
    pub fn plan(&mut self, date: NaiveDate) -> Result<DailySchedule> {
        self.generator.generate(date)
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut HolidayCalendar {
        &mut self.calendar
    }

    fn report(
        &self,
        date: NaiveDate,
        disposition: Disposition,
        reason: impl Into<String>,
    ) -> InvocationReport {
        let mut report = InvocationReport::new(
            date,
            disposition,
            self.state.get(date).day_state(),
            reason,
        );
        report.schedule = self.generator.existing(date);
        report
    }

    async fn call_executor(&self, kind: ActionKind) -> Result<()> {
        tracing::info!("🕐 Signaling '{kind}' to the external system");
        tokio::time::timeout(self.call_timeout, self.executor.perform(kind))
            .await
            .map_err(|_| PontoError::Action(format!("'{kind}' timed out")))?
    }

    async fn push_downstream(&mut self, date: NaiveDate) -> Result<()> {
        // Refreshed read so a reconciled exit is what gets pushed.
        let schedule = match self.generator.existing(date) {
            Some(s) => s,
            None => self.generator.generate(date)?,
        };
        tokio::time::timeout(self.call_timeout, self.sync.push(date, &schedule))
            .await
            .map_err(|_| PontoError::Sync("downstream push timed out".into()))?
    }

    async fn dispatch_report(&self, report: &InvocationReport) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        match tokio::time::timeout(self.call_timeout, notifier.notify(report)).await {
            Ok(Ok(())) => tracing::debug!("📣 Report dispatched"),
            Ok(Err(e)) => tracing::warn!("⚠️ Notifier failed: {e}"),
            Err(_) => tracing::warn!("⚠️ Notifier timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ponto_core::clock::hm;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockExecutor {
        calls: Mutex<Vec<ActionKind>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ActionExecutor for MockExecutor {
        async fn perform(&self, kind: ActionKind) -> Result<()> {
            self.calls.lock().unwrap().push(kind);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PontoError::Action("portal unreachable".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockObserver {
        entry: Mutex<Option<NaiveTime>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EntryObserver for MockObserver {
        async fn fetch_real_entry(&self, _date: NaiveDate) -> Result<Option<NaiveTime>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(*self.entry.lock().unwrap())
        }
    }

    #[derive(Default)]
    struct MockSync {
        pushed: Mutex<Vec<DailySchedule>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl DownstreamSync for MockSync {
        async fn push(&self, _date: NaiveDate, schedule: &DailySchedule) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PontoError::Sync("records system down".into()));
            }
            self.pushed.lock().unwrap().push(schedule.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockOs {
        registered: Mutex<Vec<(String, NaiveTime)>>,
    }

    #[async_trait]
    impl OsScheduler for MockOs {
        async fn register_once(&self, task: &str, when: NaiveTime, _elevated: bool) -> Result<()> {
            self.registered.lock().unwrap().push((task.to_string(), when));
            Ok(())
        }

        async fn cancel(&self, _task: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        orchestrator: DailyOrchestrator<StdRng>,
        executor: Arc<MockExecutor>,
        observer: Arc<MockObserver>,
        sync: Arc<MockSync>,
        os: Arc<MockOs>,
        dir: std::path::PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn fixture(name: &str) -> Fixture {
        fixture_with_config(name, PontoConfig::default())
    }

    fn fixture_with_config(name: &str, config: PontoConfig) -> Fixture {
        let dir = std::env::temp_dir().join(format!("ponto-orch-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let executor = Arc::new(MockExecutor::default());
        let observer = Arc::new(MockObserver::default());
        let sync = Arc::new(MockSync::default());
        let os = Arc::new(MockOs::default());
        let orchestrator = DailyOrchestrator::with_rng(
            config,
            &dir,
            Collaborators {
                executor: executor.clone(),
                observer: observer.clone(),
                sync: sync.clone(),
                os_scheduler: os.clone(),
                notifier: None,
            },
            StdRng::seed_from_u64(42),
        )
        .unwrap();
        Fixture {
            orchestrator,
            executor,
            observer,
            sync,
            os,
            dir,
        }
    }

    /// 2026-03-02, a plain Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    /// 2026-03-07, a Saturday.
    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_entry_attempted_inside_window() {
        let mut f = fixture("scenario-a");
        let report = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::Acted);
        assert_eq!(report.attempted, Some(TaskKind::Entry));
        assert_eq!(report.outcome, Some(ActionStatus::Success));
        assert_eq!(report.state, DayState::EntryDone);
        assert_eq!(*f.executor.calls.lock().unwrap(), vec![ActionKind::Begin]);

        let schedule = report.schedule.expect("plan must exist after entry");
        assert!(schedule.entry >= hm(8, 50) && schedule.entry <= hm(9, 5));
    }

    #[tokio::test]
    async fn test_scenario_b_entry_never_reattempted_after_success() {
        let mut f = fixture("scenario-b");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        let second = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        assert_eq!(second.disposition, Disposition::Waiting);
        assert_eq!(second.attempted, None);
        assert_eq!(second.state, DayState::EntryDone);
        assert!(second.reason.contains("already completed"));
        // Only the first invocation touched the executor.
        assert_eq!(f.executor.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_c_exit_at_deadline_tolerance_edge() {
        let mut f = fixture("scenario-c");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        *f.observer.entry.lock().unwrap() = Some(hm(8, 55));

        // Deadline 17:55; 18:00 is exactly 5 minutes past, inside the band.
        let report = f.orchestrator.run(monday(), hm(18, 0), None).await.unwrap();

        assert_eq!(report.attempted, Some(TaskKind::Exit));
        assert_eq!(report.outcome, Some(ActionStatus::Success));
        assert_eq!(report.state, DayState::Synced);
        assert_eq!(
            *f.executor.calls.lock().unwrap(),
            vec![ActionKind::Begin, ActionKind::End]
        );

        // Sync received the reconciled exit, not the randomized one.
        let pushed = f.sync.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].exit, hm(17, 55));
        assert!(pushed[0].reconciled);
    }

    #[tokio::test]
    async fn test_scenario_d_saturday_makes_zero_external_calls() {
        let mut f = fixture("scenario-d");
        let report = f.orchestrator.run(saturday(), hm(8, 55), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::NotABusinessDay);
        assert!(report.reason.contains("Saturday"));
        assert!(f.executor.calls.lock().unwrap().is_empty());
        assert_eq!(f.observer.calls.load(Ordering::SeqCst), 0);
        assert!(f.sync.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manual_holiday_blocks_the_day() {
        let mut f = fixture("holiday");
        f.orchestrator
            .calendar_mut()
            .add_manual_holiday(monday(), "Local feast")
            .unwrap();
        let report = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::NotABusinessDay);
        assert!(report.reason.contains("Local feast"));
        assert!(f.executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outside_entry_window_waits() {
        let mut f = fixture("entry-window");
        let early = f.orchestrator.run(monday(), hm(7, 30), None).await.unwrap();
        assert_eq!(early.disposition, Disposition::Waiting);
        assert!(early.reason.contains("too early"));

        let late = f.orchestrator.run(monday(), hm(10, 0), None).await.unwrap();
        assert_eq!(late.disposition, Disposition::Waiting);
        assert!(late.reason.contains("too late"));
        assert!(f.executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_failure_is_recorded_and_retried() {
        let mut f = fixture("entry-retry");
        f.executor.fail.store(true, Ordering::SeqCst);
        let failed = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        assert_eq!(failed.outcome, Some(ActionStatus::Failed));
        assert_eq!(failed.state, DayState::NotStarted);

        f.executor.fail.store(false, Ordering::SeqCst);
        let retried = f.orchestrator.run(monday(), hm(8, 58), None).await.unwrap();
        assert_eq!(retried.outcome, Some(ActionStatus::Success));
        assert_eq!(retried.state, DayState::EntryDone);
        assert_eq!(f.executor.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_plan_is_not_redrawn_on_retry() {
        let mut f = fixture("plan-stable");
        f.executor.fail.store(true, Ordering::SeqCst);
        let first = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        f.executor.fail.store(false, Ordering::SeqCst);
        let second = f.orchestrator.run(monday(), hm(8, 58), None).await.unwrap();
        assert_eq!(first.schedule, second.schedule);
    }

    #[tokio::test]
    async fn test_no_observation_suppresses_exit() {
        let mut f = fixture("no-observation");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        // Observer still reports no entry.
        let report = f.orchestrator.run(monday(), hm(18, 0), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::Waiting);
        assert!(report.reason.contains("entry not yet observed"));
        // Begin happened earlier; End never did.
        assert_eq!(*f.executor.calls.lock().unwrap(), vec![ActionKind::Begin]);
    }

    #[tokio::test]
    async fn test_too_early_for_deadline_waits() {
        let mut f = fixture("deadline-early");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        // Late entry observed: deadline 18:30. At 17:00 it is far too early.
        *f.observer.entry.lock().unwrap() = Some(hm(9, 30));
        let report = f.orchestrator.run(monday(), hm(17, 0), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::Waiting);
        assert_eq!(*f.executor.calls.lock().unwrap(), vec![ActionKind::Begin]);
    }

    #[tokio::test]
    async fn test_sync_failure_retries_without_reattempting_exit() {
        let mut f = fixture("sync-retry");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        *f.observer.entry.lock().unwrap() = Some(hm(8, 55));

        f.sync.fail.store(true, Ordering::SeqCst);
        let exit_run = f.orchestrator.run(monday(), hm(18, 0), None).await.unwrap();
        assert_eq!(exit_run.attempted, Some(TaskKind::Exit));
        assert_eq!(exit_run.outcome, Some(ActionStatus::Success));
        assert_eq!(exit_run.state, DayState::ExitDone);
        assert!(exit_run.reason.contains("sync failed"));

        f.sync.fail.store(false, Ordering::SeqCst);
        let sync_run = f.orchestrator.run(monday(), hm(18, 10), None).await.unwrap();
        assert_eq!(sync_run.attempted, Some(TaskKind::Sync));
        assert_eq!(sync_run.state, DayState::Synced);
        // Exactly one Begin and one End across all invocations.
        assert_eq!(
            *f.executor.calls.lock().unwrap(),
            vec![ActionKind::Begin, ActionKind::End]
        );
    }

    #[tokio::test]
    async fn test_completed_day_is_a_noop() {
        let mut f = fixture("complete");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();
        *f.observer.entry.lock().unwrap() = Some(hm(8, 55));
        f.orchestrator.run(monday(), hm(18, 0), None).await.unwrap();

        let report = f.orchestrator.run(monday(), hm(18, 30), None).await.unwrap();
        assert_eq!(report.disposition, Disposition::Complete);
        assert_eq!(f.executor.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_hint_never_overrides_state_and_windows() {
        let mut f = fixture("hint");
        // An "exit" hint during the entry window on an empty day still
        // results in the entry action.
        let report = f
            .orchestrator
            .run(monday(), hm(8, 55), Some(TaskKind::Exit))
            .await
            .unwrap();
        assert_eq!(report.attempted, Some(TaskKind::Entry));
    }

    #[tokio::test]
    async fn test_disabled_system_does_nothing() {
        let mut config = PontoConfig::default();
        config.system.enabled = false;
        let mut f = fixture_with_config("disabled", config);
        let report = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::Disabled);
        assert!(f.executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skip_today_does_nothing() {
        let mut config = PontoConfig::default();
        config.system.skip_today = true;
        let mut f = fixture_with_config("skip", config);
        let report = f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        assert_eq!(report.disposition, Disposition::SkippedToday);
        assert!(f.executor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_success_arms_exit_trigger_within_ceiling() {
        let mut f = fixture("arm-on-entry");
        f.orchestrator.run(monday(), hm(8, 55), None).await.unwrap();

        let registered = f.os.registered.lock().unwrap();
        assert_eq!(registered.len(), 1);
        // Plan entry is inside 08:50-09:05, so entry + 9h lands inside
        // 17:50-18:05 and never past the ceiling.
        assert!(registered[0].1 <= hm(18, 5));
        assert!(registered[0].1 >= hm(17, 50));
    }

    #[tokio::test]
    async fn test_arm_exit_trigger_prefers_observation() {
        let mut f = fixture("arm-observed");
        *f.observer.entry.lock().unwrap() = Some(hm(8, 51));
        let armed = f.orchestrator.arm_exit_trigger(monday()).await.unwrap();
        assert_eq!(armed.at, hm(17, 51));

        *f.observer.entry.lock().unwrap() = None;
        let fallback = f.orchestrator.arm_exit_trigger(monday()).await.unwrap();
        let plan = f.orchestrator.plan(monday()).unwrap();
        assert_eq!(
            fallback.at,
            clock::add_minutes(plan.entry, 540).min(hm(18, 5))
        );
    }

    #[tokio::test]
    async fn test_invalid_config_is_fatal_before_anything_external() {
        let mut config = PontoConfig::default();
        config.work_hours.work_minutes = 0;
        let dir = std::env::temp_dir().join("ponto-orch-invalid");
        std::fs::remove_dir_all(&dir).ok();
        let result = DailyOrchestrator::with_rng(
            config,
            &dir,
            Collaborators {
                executor: Arc::new(MockExecutor::default()),
                observer: Arc::new(MockObserver::default()),
                sync: Arc::new(MockSync::default()),
                os_scheduler: Arc::new(MockOs::default()),
                notifier: None,
            },
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(PontoError::Config(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
