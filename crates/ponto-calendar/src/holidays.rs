//! Holiday sets and the business-day verdict.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use ponto_core::error::Result;

use crate::store::HolidayStore;

/// Where a holiday entry came from. National and state sets are
/// externally supplied and read-only here; manual entries are the
/// user's own and mutable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayCategory {
    National,
    State,
    Manual,
}

impl HolidayCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayCategory::National => "national",
            HolidayCategory::State => "state",
            HolidayCategory::Manual => "manual",
        }
    }
}

impl fmt::Display for HolidayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
}

/// One year's holidays, grouped by category. Within a category, dates
/// are unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YearHolidays {
    #[serde(default)]
    pub national: Vec<HolidayEntry>,
    #[serde(default)]
    pub state: Vec<HolidayEntry>,
    #[serde(default)]
    pub manual: Vec<HolidayEntry>,
}

/// Year-keyed holiday data, the shape persisted to holidays.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidaySet(pub BTreeMap<i32, YearHolidays>);

/// Verdict for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayVerdict {
    BusinessDay,
    Weekend { weekday: String },
    Holiday { name: String, category: HolidayCategory },
}

impl DayVerdict {
    pub fn is_business_day(&self) -> bool {
        matches!(self, DayVerdict::BusinessDay)
    }

    /// Short machine-facing reason, mirrored into reports.
    pub fn reason(&self) -> &'static str {
        match self {
            DayVerdict::BusinessDay => "business day",
            DayVerdict::Weekend { .. } => "weekend",
            DayVerdict::Holiday { .. } => "holiday",
        }
    }
}

impl fmt::Display for DayVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayVerdict::BusinessDay => f.write_str("business day"),
            DayVerdict::Weekend { weekday } => write!(f, "weekend ({weekday})"),
            DayVerdict::Holiday { name, category } => write!(f, "holiday: {name} ({category})"),
        }
    }
}

/// Business-day calendar over a persisted holiday set.
pub struct HolidayCalendar {
    store: HolidayStore,
    set: HolidaySet,
}

impl HolidayCalendar {
    /// Open the calendar, loading whatever holiday data exists in
    /// `dir`.
    pub fn open(dir: &Path) -> Self {
        let store = HolidayStore::new(dir);
        let set = store.load();
        Self { store, set }
    }

    /// Is this date a business day? Weekends win over everything, then
    /// the year's national, state, and manual lists are scanned in that
    /// order; the first exact date match decides.
    pub fn is_business_day(&self, date: NaiveDate) -> DayVerdict {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return DayVerdict::Weekend {
                weekday: weekday_name(date.weekday()).to_string(),
            };
        }

        if let Some(year) = self.set.0.get(&date.year()) {
            let layers = [
                (HolidayCategory::National, &year.national),
                (HolidayCategory::State, &year.state),
                (HolidayCategory::Manual, &year.manual),
            ];
            for (category, entries) in layers {
                if let Some(hit) = entries.iter().find(|h| h.date == date) {
                    return DayVerdict::Holiday {
                        name: hit.name.clone(),
                        category,
                    };
                }
            }
        }

        DayVerdict::BusinessDay
    }

    /// Add a manual holiday. Idempotent: returns `Ok(false)` without
    /// touching the store when a manual entry already exists for that
    /// date.
    pub fn add_manual_holiday(&mut self, date: NaiveDate, name: &str) -> Result<bool> {
        let year = self.set.0.entry(date.year()).or_default();
        if year.manual.iter().any(|h| h.date == date) {
            tracing::info!("Manual holiday {date} already exists");
            return Ok(false);
        }
        year.manual.push(HolidayEntry {
            date,
            name: name.to_string(),
        });
        self.store.save(&self.set)?;
        tracing::info!("📅 Manual holiday added: {date} ({name})");
        Ok(true)
    }

    /// Remove a manual holiday. Returns `Ok(false)` when no manual
    /// entry exists for that date. National and state entries are not
    /// removable through this API.
    pub fn remove_manual_holiday(&mut self, date: NaiveDate) -> Result<bool> {
        let Some(year) = self.set.0.get_mut(&date.year()) else {
            return Ok(false);
        };
        let before = year.manual.len();
        year.manual.retain(|h| h.date != date);
        if year.manual.len() == before {
            return Ok(false);
        }
        self.store.save(&self.set)?;
        tracing::info!("📅 Manual holiday removed: {date}");
        Ok(true)
    }

    /// The year's entries, for CLI listing.
    pub fn year(&self, year: i32) -> Option<&YearHolidays> {
        self.set.0.get(&year)
    }
}

fn weekday_name(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(name: &str) -> (HolidayCalendar, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("ponto-cal-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        (HolidayCalendar::open(&dir), dir)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekend_regardless_of_holiday_data() {
        let (mut cal, dir) = calendar("weekend");
        // Saturday 2026-03-07 is also registered as a manual holiday;
        // the weekend rule still wins.
        cal.add_manual_holiday(d(2026, 3, 7), "Some Saturday").unwrap();
        let verdict = cal.is_business_day(d(2026, 3, 7));
        assert_eq!(verdict.reason(), "weekend");
        assert_eq!(
            verdict,
            DayVerdict::Weekend {
                weekday: "Saturday".into()
            }
        );
        let sunday = cal.is_business_day(d(2026, 3, 8));
        assert!(!sunday.is_business_day());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_holiday_layers_and_precedence() {
        let (mut cal, dir) = calendar("layers");
        let date = d(2026, 4, 21);
        cal.set.0.entry(2026).or_default().national.push(HolidayEntry {
            date,
            name: "Tiradentes".into(),
        });
        // A manual duplicate on the same date; national is scanned
        // first and wins.
        cal.add_manual_holiday(date, "Shadowed").unwrap();

        match cal.is_business_day(date) {
            DayVerdict::Holiday { name, category } => {
                assert_eq!(name, "Tiradentes");
                assert_eq!(category, HolidayCategory::National);
            }
            other => panic!("expected holiday, got {other:?}"),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_plain_weekday_is_business_day() {
        let (cal, dir) = calendar("plain");
        assert!(cal.is_business_day(d(2026, 3, 2)).is_business_day()); // a Monday
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_manual_add_is_idempotent() {
        let (mut cal, dir) = calendar("idem");
        let date = d(2026, 5, 4);
        assert!(cal.add_manual_holiday(date, "Bridge day").unwrap());
        assert!(!cal.add_manual_holiday(date, "Bridge day again").unwrap());
        let year = cal.year(2026).unwrap();
        assert_eq!(year.manual.len(), 1);
        assert_eq!(year.manual[0].name, "Bridge day");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_remove_manual() {
        let (mut cal, dir) = calendar("remove");
        let date = d(2026, 5, 4);
        assert!(!cal.remove_manual_holiday(date).unwrap());
        cal.add_manual_holiday(date, "Bridge day").unwrap();
        assert!(cal.remove_manual_holiday(date).unwrap());
        assert!(cal.is_business_day(date).is_business_day());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unseeded_year_degrades_to_weekend_rule() {
        let (mut cal, dir) = calendar("unseeded");
        cal.set.0.entry(2026).or_default().national.push(HolidayEntry {
            date: d(2026, 1, 1),
            name: "New Year".into(),
        });
        // 2027 was never seeded: Jan 1st 2027 (a Friday) evaluates as a
        // plain business day.
        assert!(cal.is_business_day(d(2027, 1, 1)).is_business_day());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = std::env::temp_dir().join("ponto-cal-roundtrip");
        std::fs::remove_dir_all(&dir).ok();
        {
            let mut cal = HolidayCalendar::open(&dir);
            cal.add_manual_holiday(d(2026, 6, 11), "Local feast").unwrap();
        }
        let cal = HolidayCalendar::open(&dir);
        assert!(!cal.is_business_day(d(2026, 6, 11)).is_business_day());
        std::fs::remove_dir_all(&dir).ok();
    }
}
