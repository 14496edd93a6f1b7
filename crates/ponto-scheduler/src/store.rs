//! File-based schedule store.
//! Plans are one date-keyed JSON document plus a human-readable text
//! file for the current day, so the times survive crashes and can be
//! read without tooling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ponto_core::clock;
use ponto_core::error::{PontoError, Result};
use ponto_core::types::DailySchedule;

/// File-based schedule store.
pub struct ScheduleStore {
    json_path: PathBuf,
    text_path: PathBuf,
}

impl ScheduleStore {
    /// Create a new schedule store in the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            json_path: dir.join("schedules.json"),
            text_path: dir.join("plan-of-day.txt"),
        }
    }

    /// Load all stored schedules.
    pub fn load_all(&self) -> BTreeMap<NaiveDate, DailySchedule> {
        if !self.json_path.exists() {
            return BTreeMap::new();
        }
        match std::fs::read_to_string(&self.json_path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse schedules.json: {e}");
                BTreeMap::new()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read schedules.json: {e}");
                BTreeMap::new()
            }
        }
    }

    /// The stored schedule for one date, if any.
    pub fn get(&self, date: NaiveDate) -> Option<DailySchedule> {
        self.load_all().remove(&date)
    }

    /// Insert or replace a schedule, rewriting the plan text file.
    pub fn upsert(&self, schedule: &DailySchedule) -> Result<()> {
        let mut all = self.load_all();
        all.insert(schedule.date, schedule.clone());
        let json = serde_json::to_string_pretty(&all)
            .map_err(|e| PontoError::Storage(format!("Serialize schedules: {e}")))?;
        std::fs::write(&self.json_path, &json)
            .map_err(|e| PontoError::Storage(format!("Write schedules: {e}")))?;
        self.write_plan_text(schedule);
        tracing::debug!("💾 Saved schedule for {}", schedule.date);
        Ok(())
    }

    /// Overwrite the stored exit time for a date with the reconciled
    /// deadline. Returns `Ok(false)` when no schedule exists for the
    /// date.
    pub fn update_exit(&self, date: NaiveDate, exit: chrono::NaiveTime) -> Result<bool> {
        let mut all = self.load_all();
        let Some(schedule) = all.get_mut(&date) else {
            return Ok(false);
        };
        schedule.exit = exit;
        schedule.reconciled = true;
        let updated = schedule.clone();
        let json = serde_json::to_string_pretty(&all)
            .map_err(|e| PontoError::Storage(format!("Serialize schedules: {e}")))?;
        std::fs::write(&self.json_path, &json)
            .map_err(|e| PontoError::Storage(format!("Write schedules: {e}")))?;
        self.write_plan_text(&updated);
        Ok(true)
    }

    /// Best-effort plain-text rendition of the day's plan.
    fn write_plan_text(&self, s: &DailySchedule) {
        let text = format!(
            "Plan of day {}\n\n\
             entry:        {}\n\
             lunch start:  {}\n\
             lunch end:    {}\n\
             exit:         {}{}\n",
            s.date,
            clock::fmt_hm(s.entry),
            clock::fmt_hm(s.lunch_start),
            clock::fmt_hm(s.lunch_end),
            clock::fmt_hm(s.exit),
            if s.reconciled { " (reconciled)" } else { "" },
        );
        if let Err(e) = std::fs::write(&self.text_path, text) {
            tracing::warn!("⚠️ Failed to write plan text: {e}");
        }
    }
}
