//! Recurrence engine for depot, release and serum estimates.
//!
//! This module implements the single-pass recurrence:
//! - Decay the carried depot mass and add the new dose
//! - Derive the first-order release rate from the depot mass
//! - Fold release and fractional clearance into the serum estimate
//!
//! Each step only looks at the current event and the previously folded one.

use crate::{AnnotatedDose, DoseEvent, ModelConstants};
use std::f64::consts::LN_2;

/// Depot mass right after `dose_mass` is added at `day_offset`
///
/// `previous` is the preceding event's `(day_offset, depot_mass)`. Elapsed
/// time of zero gives a decay factor of one, so duplicate offsets just add.
pub fn depot_mass(
    dose_mass: f64,
    day_offset: f64,
    previous: Option<(f64, f64)>,
    half_life_days: f64,
) -> f64 {
    match previous {
        None => dose_mass,
        Some((previous_offset, previous_depot)) => {
            let elapsed = day_offset - previous_offset;
            previous_depot * 0.5_f64.powf(elapsed / half_life_days) + dose_mass
        }
    }
}

/// First-order release rate of the bioactive fraction
pub fn release_rate(depot_mass: f64, constants: &ModelConstants) -> f64 {
    depot_mass * LN_2 / constants.half_life_days() * constants.ester_free_fraction()
}

/// Serum estimate after one half-day step
///
/// Half of the step's release is assumed to have reached circulation by the
/// sampling point. The first event folds against the baseline level.
pub fn serum_level(
    release_rate: f64,
    previous_serum: Option<f64>,
    constants: &ModelConstants,
) -> f64 {
    let previous = previous_serum.unwrap_or_else(|| constants.baseline_serum_level());
    previous + release_rate / 2.0 * constants.distribution_factor()
        - previous * constants.clearance_fraction()
}

/// Fold one event against the previously folded one
pub fn step(
    event: DoseEvent,
    previous: Option<&AnnotatedDose>,
    constants: &ModelConstants,
) -> AnnotatedDose {
    let depot = depot_mass(
        event.dose_mass.mg(),
        event.day_offset,
        previous.map(|p| (p.event().day_offset, p.depot_mass())),
        constants.half_life_days(),
    );
    let release = release_rate(depot, constants);
    let serum = serum_level(release, previous.map(AnnotatedDose::serum_level), constants);

    AnnotatedDose::new(event, depot, release, serum)
}

/// Recompute every derived field over the whole dose history
///
/// Events are stably sorted by day offset (ties keep input order) and folded
/// from the baseline. The output is a total function of the input events and
/// the constants.
pub fn recompute(
    events: impl IntoIterator<Item = DoseEvent>,
    constants: &ModelConstants,
) -> Vec<AnnotatedDose> {
    let mut events: Vec<DoseEvent> = events.into_iter().collect();
    sort_chronologically(&mut events);

    let annotated = events
        .into_iter()
        .fold(Vec::new(), |mut folded: Vec<AnnotatedDose>, event| {
            let next = step(event, folded.last(), constants);
            folded.push(next);
            folded
        });

    tracing::debug!("Recomputed {} dose events", annotated.len());
    annotated
}

/// Refold only the serum estimates, e.g. after the clearance fraction changed
///
/// Depot mass and release rate are kept as-is. The fold restarts from the
/// baseline at the first event.
pub fn recompute_serum(
    annotated: Vec<AnnotatedDose>,
    constants: &ModelConstants,
) -> Vec<AnnotatedDose> {
    let mut annotated = annotated;
    annotated.sort_by(|a, b| a.event().day_offset.total_cmp(&b.event().day_offset));

    let refolded = annotated
        .into_iter()
        .fold(Vec::new(), |mut folded: Vec<AnnotatedDose>, dose| {
            let serum = serum_level(
                dose.release_rate(),
                folded.last().map(AnnotatedDose::serum_level),
                constants,
            );
            folded.push(dose.with_serum_level(serum));
            folded
        });

    tracing::debug!(
        "Refolded serum levels for {} events (clearance {})",
        refolded.len(),
        constants.clearance_fraction()
    );
    refolded
}

/// Serum estimate at the latest event, or the baseline with no history
pub fn current_level(annotated: &[AnnotatedDose], constants: &ModelConstants) -> f64 {
    annotated
        .last()
        .map(AnnotatedDose::serum_level)
        .unwrap_or_else(|| constants.baseline_serum_level())
}

/// Stable ascending sort by day offset
pub fn sort_chronologically(events: &mut [DoseEvent]) {
    events.sort_by(|a, b| a.day_offset.total_cmp(&b.day_offset));
}
