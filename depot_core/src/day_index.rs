//! Day-index normalization.
//!
//! Maps a civil date plus a half-day slot onto a continuous day offset
//! relative to a reference date. Only the slot carries sub-day resolution;
//! any time-of-day on the inputs is discarded.

use crate::TimeSlot;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// Anything that can be reduced to a local calendar date
pub trait CivilDate {
    fn civil_date(&self) -> NaiveDate;
}

impl CivilDate for NaiveDate {
    fn civil_date(&self) -> NaiveDate {
        *self
    }
}

impl CivilDate for NaiveDateTime {
    fn civil_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CivilDate for DateTime<Tz> {
    fn civil_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Days from `reference` midnight to `date` midnight, plus 0.5 for night
///
/// With no reference the event's own date is used, giving 0 or 0.5.
pub fn day_offset(date: impl CivilDate, slot: TimeSlot, reference: Option<NaiveDate>) -> f64 {
    let date = date.civil_date();
    let reference = reference.unwrap_or(date);
    (date - reference).num_days() as f64 + slot.day_fraction()
}

/// `floor(offset / 7)`; negative for offsets before the reference
pub fn week_index(day_offset: f64) -> i64 {
    (day_offset / 7.0).floor() as i64
}
