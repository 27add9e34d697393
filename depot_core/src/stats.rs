//! Adherence statistics over morning dose entries.

use crate::{DoseEvent, TimeSlot};
use chrono::{Duration, NaiveDate};

/// Share of morning slots actually dosed, plus the current run of doses
#[derive(Clone, Debug, PartialEq)]
pub struct AdherenceStats {
    /// Percent of morning entries in the last 30 days with a non-zero dose
    pub last_30_days: f64,
    /// Percent of morning entries in the last 10 days with a non-zero dose
    pub last_10_days: f64,
    /// Consecutive most recent morning entries with a non-zero dose
    pub streak: usize,
}

/// Compute adherence relative to `today`
///
/// Only morning entries count. A window with no entries reports 0%.
pub fn adherence(events: &[DoseEvent], today: NaiveDate) -> AdherenceStats {
    let mut mornings: Vec<&DoseEvent> = events
        .iter()
        .filter(|e| e.slot == TimeSlot::Morning)
        .collect();
    // Newest first
    mornings.sort_by(|a, b| b.date.cmp(&a.date));

    let streak = mornings
        .iter()
        .take_while(|e| !e.dose_mass.is_zero())
        .count();

    AdherenceStats {
        last_30_days: dosed_percentage(&mornings, today - Duration::days(30)),
        last_10_days: dosed_percentage(&mornings, today - Duration::days(10)),
        streak,
    }
}

fn dosed_percentage(mornings: &[&DoseEvent], since: NaiveDate) -> f64 {
    let (total, dosed) = mornings
        .iter()
        .filter(|e| e.date >= since)
        .fold((0usize, 0usize), |(total, dosed), e| {
            (total + 1, dosed + usize::from(!e.dose_mass.is_zero()))
        });

    if total == 0 {
        0.0
    } else {
        dosed as f64 / total as f64 * 100.0
    }
}
