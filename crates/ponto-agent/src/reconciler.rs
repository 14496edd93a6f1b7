//! Exit reconciliation.
//!
//! The randomized plan is only an estimate; the external system of
//! record knows when entry actually happened. Before any exit, the real
//! entry time is fetched, the deadline recomputed (entry + 8h work + 1h
//! lunch), and the plan's exit overwritten with it so downstream
//! reporting reflects observed truth. No entry observed means no exit,
//! ever; the core never fabricates a fallback entry time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use ponto_core::clock;
use ponto_core::config::WorkHoursConfig;
use ponto_core::error::{PontoError, Result};
use ponto_core::traits::EntryObserver;
use ponto_scheduler::ScheduleStore;

/// The reconciler's answer for one moment in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileVerdict {
    pub should_act: bool,
    pub real_entry: Option<NaiveTime>,
    pub exit_deadline: Option<NaiveTime>,
    pub reason: String,
}

impl ReconcileVerdict {
    fn no_entry() -> Self {
        Self {
            should_act: false,
            real_entry: None,
            exit_deadline: None,
            reason: "entry not yet observed".into(),
        }
    }
}

/// Computes the authoritative exit deadline from the observed entry.
pub struct EntryReconciler {
    observer: Arc<dyn EntryObserver>,
    schedules: ScheduleStore,
    work_hours: WorkHoursConfig,
    observer_timeout: Duration,
}

impl EntryReconciler {
    pub fn new(
        observer: Arc<dyn EntryObserver>,
        schedules: ScheduleStore,
        work_hours: WorkHoursConfig,
        observer_timeout: Duration,
    ) -> Self {
        Self {
            observer,
            schedules,
            work_hours,
            observer_timeout,
        }
    }

    /// Fetch the real entry, derive the deadline, persist it onto the
    /// day's plan, and decide whether `now` is the moment to act.
    ///
    /// Tolerance rule: within the band either side of the deadline is
    /// "on time"; past the band still acts (late beats never); before
    /// the band waits.
    pub async fn verify(&self, date: NaiveDate, now: NaiveTime) -> Result<ReconcileVerdict> {
        let observed = tokio::time::timeout(self.observer_timeout, self.observer.fetch_real_entry(date))
            .await
            .map_err(|_| PontoError::Observer("entry observation timed out".into()))??;

        let Some(real_entry) = observed else {
            tracing::info!("No entry registered yet for {date}; exit suppressed");
            return Ok(ReconcileVerdict::no_entry());
        };

        let exit_deadline = clock::add_minutes(real_entry, self.work_hours.total_minutes());
        let diff = clock::minutes_between(now, exit_deadline);
        let tolerance = i64::from(self.work_hours.tolerance_minutes);

        // The plan's randomized exit was an estimate; replace it with
        // the observed-entry deadline for sync and reporting.
        if !self.schedules.update_exit(date, exit_deadline)? {
            tracing::warn!("No stored plan for {date} to reconcile");
        }

        let (should_act, reason) = if diff < -tolerance {
            (
                false,
                format!(
                    "{} minutes before exit deadline {} (entry observed {})",
                    -diff,
                    clock::fmt_hm(exit_deadline),
                    clock::fmt_hm(real_entry)
                ),
            )
        } else if diff > tolerance {
            (
                true,
                format!(
                    "exit deadline {} passed {diff} minutes ago; firing late rather than never",
                    clock::fmt_hm(exit_deadline)
                ),
            )
        } else {
            (
                true,
                format!(
                    "within ±{tolerance} minutes of exit deadline {} (diff {diff:+})",
                    clock::fmt_hm(exit_deadline)
                ),
            )
        };

        tracing::info!(
            "🔎 Reconciled {date}: entry {} deadline {} now {} -> act: {should_act}",
            clock::fmt_hm(real_entry),
            clock::fmt_hm(exit_deadline),
            clock::fmt_hm(now)
        );

        Ok(ReconcileVerdict {
            should_act,
            real_entry: Some(real_entry),
            exit_deadline: Some(exit_deadline),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ponto_core::clock::hm;
    use ponto_core::types::DailySchedule;

    struct FixedObserver(Option<NaiveTime>);

    #[async_trait]
    impl EntryObserver for FixedObserver {
        async fn fetch_real_entry(&self, _date: NaiveDate) -> ponto_core::Result<Option<NaiveTime>> {
            Ok(self.0)
        }
    }

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn reconciler(name: &str, observed: Option<NaiveTime>) -> (EntryReconciler, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("ponto-reconcile-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let store = ScheduleStore::new(&dir);
        store
            .upsert(&DailySchedule {
                date: d(),
                entry: hm(8, 52),
                lunch_start: hm(12, 25),
                lunch_end: hm(13, 25),
                exit: hm(17, 52),
                reconciled: false,
            })
            .unwrap();
        let r = EntryReconciler::new(
            Arc::new(FixedObserver(observed)),
            ScheduleStore::new(&dir),
            WorkHoursConfig::default(),
            Duration::from_secs(5),
        );
        (r, dir)
    }

    #[tokio::test]
    async fn test_absent_entry_suppresses_exit() {
        let (r, dir) = reconciler("absent", None);
        let verdict = r.verify(d(), hm(18, 0)).await.unwrap();
        assert!(!verdict.should_act);
        assert_eq!(verdict.reason, "entry not yet observed");
        assert!(verdict.exit_deadline.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_too_early_waits() {
        // Entry 08:55 -> deadline 17:55. At 17:49 we are 6 minutes out.
        let (r, dir) = reconciler("early", Some(hm(8, 55)));
        let verdict = r.verify(d(), hm(17, 49)).await.unwrap();
        assert!(!verdict.should_act);
        assert_eq!(verdict.exit_deadline, Some(hm(17, 55)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_within_tolerance_acts() {
        let (r, dir) = reconciler("band", Some(hm(8, 55)));
        for now in [hm(17, 50), hm(17, 55), hm(18, 0)] {
            let verdict = r.verify(d(), now).await.unwrap();
            assert!(verdict.should_act, "now {now}");
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_past_deadline_fires_late() {
        let (r, dir) = reconciler("late", Some(hm(8, 55)));
        let verdict = r.verify(d(), hm(18, 30)).await.unwrap();
        assert!(verdict.should_act);
        assert!(verdict.reason.contains("late"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_deadline_written_back_to_plan() {
        let (r, dir) = reconciler("writeback", Some(hm(8, 55)));
        r.verify(d(), hm(18, 0)).await.unwrap();
        let stored = ScheduleStore::new(&dir).get(d()).unwrap();
        assert_eq!(stored.exit, hm(17, 55));
        assert!(stored.reconciled);
        // The randomized fields are untouched.
        assert_eq!(stored.entry, hm(8, 52));
        std::fs::remove_dir_all(&dir).ok();
    }
}
