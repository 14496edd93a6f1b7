//! # Ponto Calendar
//!
//! Decides whether a date is a business day: Saturday/Sunday are never
//! business days, then the year's national, state, and manual holiday
//! lists are scanned in that order for an exact date match.
//!
//! Holiday data is looked up strictly by calendar year. If next year's
//! set is not seeded before the year boundary, every day of the new
//! year is evaluated with the weekend rule only until the set is
//! supplied. That is an operational risk inherent to the design, not
//! something this crate papers over.

pub mod holidays;
pub mod store;

pub use holidays::{DayVerdict, HolidayCalendar, HolidayCategory, HolidayEntry, YearHolidays};
pub use store::HolidayStore;
