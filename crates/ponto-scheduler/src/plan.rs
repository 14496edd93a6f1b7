//! Daily plan generation.
//!
//! Two uniform draws (entry, lunch start), everything else derived so
//! the total always comes out exact: lunch is exactly
//! `lunch_minutes` long, and the afternoon absorbs whatever the morning
//! did not cover of `work_minutes`. Re-running on the same date returns
//! the stored plan unchanged, so times already acted upon are never
//! redrawn.

use chrono::{NaiveDate, NaiveTime};
use rand::Rng;

use ponto_core::clock;
use ponto_core::config::{RandomizationConfig, WorkHoursConfig};
use ponto_core::error::Result;
use ponto_core::types::DailySchedule;

use crate::store::ScheduleStore;

/// Generates and stores one immutable plan per date.
///
/// The RNG is injected so tests can seed it and assert exact output.
pub struct ScheduleGenerator<R: Rng> {
    store: ScheduleStore,
    randomization: RandomizationConfig,
    work_hours: WorkHoursConfig,
    rng: R,
}

impl<R: Rng> ScheduleGenerator<R> {
    pub fn new(
        store: ScheduleStore,
        randomization: RandomizationConfig,
        work_hours: WorkHoursConfig,
        rng: R,
    ) -> Self {
        Self {
            store,
            randomization,
            work_hours,
            rng,
        }
    }

    /// The stored plan for a date, without generating one.
    pub fn existing(&self, date: NaiveDate) -> Option<DailySchedule> {
        self.store.get(date)
    }

    /// Get or create the plan for a date. Idempotent: once a plan
    /// exists it is returned as stored, random state untouched.
    pub fn generate(&mut self, date: NaiveDate) -> Result<DailySchedule> {
        if let Some(existing) = self.store.get(date) {
            tracing::debug!("Reusing stored plan for {date}: {existing}");
            return Ok(existing);
        }

        let entry = self.draw(self.randomization.entry_earliest, self.randomization.entry_latest);
        let lunch_start = self.draw(self.randomization.lunch_earliest, self.randomization.lunch_latest);
        let lunch_end = clock::add_minutes(lunch_start, i64::from(self.work_hours.lunch_minutes));

        let morning_minutes = clock::minutes_between(lunch_start, entry);
        let afternoon_minutes = i64::from(self.work_hours.work_minutes) - morning_minutes;
        let exit = clock::add_minutes(lunch_end, afternoon_minutes);

        let schedule = DailySchedule {
            date,
            entry,
            lunch_start,
            lunch_end,
            exit,
            reconciled: false,
        };
        self.store.upsert(&schedule)?;
        tracing::info!("📋 Plan generated for {date}: {schedule}");
        Ok(schedule)
    }

    /// Uniform draw at minute resolution, both bounds inclusive.
    fn draw(&mut self, earliest: NaiveTime, latest: NaiveTime) -> NaiveTime {
        let lo = clock::minute_of_day(earliest);
        let hi = clock::minute_of_day(latest);
        let minute = self.rng.gen_range(lo..=hi);
        clock::from_minute_of_day(minute)
    }
}
