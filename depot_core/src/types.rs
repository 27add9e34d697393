//! Core domain types for the depot tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Time slots and injection sites
//! - Validated dose masses
//! - Unannotated dose events (raw input to the engine)
//! - Annotated dose events (output of a full recompute)

use crate::model::DOSE_CONCENTRATION_MG_PER_ML;
use crate::{day_index, Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Time Slots and Sites
// ============================================================================

/// Half-day slot a dose is logged against
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Night,
}

impl TimeSlot {
    /// The other slot of the same day
    pub fn paired(self) -> Self {
        match self {
            TimeSlot::Morning => TimeSlot::Night,
            TimeSlot::Night => TimeSlot::Morning,
        }
    }

    /// Fraction of a day this slot adds to the day offset
    pub fn day_fraction(self) -> f64 {
        match self {
            TimeSlot::Morning => 0.0,
            TimeSlot::Night => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Night => "night",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(TimeSlot::Morning),
            "night" => Ok(TimeSlot::Night),
            other => Err(Error::Parse(format!(
                "Unknown time slot '{}' (expected morning or night)",
                other
            ))),
        }
    }
}

/// Injection location label
///
/// Carried through the engine untouched; it has no computational role.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InjectionSite {
    #[serde(rename = "VG-D")]
    VgD,
    #[serde(rename = "VG-S")]
    VgS,
    #[serde(rename = "DT-S")]
    DtS,
    #[serde(rename = "DT-D")]
    DtD,
    #[serde(rename = "NO")]
    NoSite,
}

impl InjectionSite {
    pub const ALL: [InjectionSite; 5] = [
        InjectionSite::VgD,
        InjectionSite::VgS,
        InjectionSite::DtS,
        InjectionSite::DtD,
        InjectionSite::NoSite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InjectionSite::VgD => "VG-D",
            InjectionSite::VgS => "VG-S",
            InjectionSite::DtS => "DT-S",
            InjectionSite::DtD => "DT-D",
            InjectionSite::NoSite => "NO",
        }
    }
}

impl fmt::Display for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InjectionSite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        InjectionSite::ALL
            .into_iter()
            .find(|site| site.label() == wanted)
            .ok_or_else(|| {
                Error::Parse(format!(
                    "Unknown injection site '{}' (expected one of VG-D, VG-S, DT-S, DT-D, NO)",
                    s.trim()
                ))
            })
    }
}

// ============================================================================
// Dose Mass
// ============================================================================

/// Administered ester mass in milligrams
///
/// Always finite and non-negative. Zero is a valid value and marks a
/// deliberately skipped slot.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DoseMass(f64);

impl DoseMass {
    pub const ZERO: DoseMass = DoseMass(0.0);

    pub fn new(mg: f64) -> Result<Self> {
        if mg.is_finite() && mg >= 0.0 {
            Ok(DoseMass(mg))
        } else {
            Err(Error::InvalidDoseMass(mg))
        }
    }

    pub fn mg(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Injected oil volume in mL
    pub fn volume_ml(self) -> f64 {
        self.0 / DOSE_CONCENTRATION_MG_PER_ML
    }
}

impl TryFrom<f64> for DoseMass {
    type Error = Error;

    fn try_from(mg: f64) -> Result<Self> {
        DoseMass::new(mg)
    }
}

impl From<DoseMass> for f64 {
    fn from(mass: DoseMass) -> f64 {
        mass.0
    }
}

// ============================================================================
// Dose Events
// ============================================================================

/// A dose record before the recurrence has run over it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseEvent {
    pub id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub site: InjectionSite,
    pub dose_mass: DoseMass,
    /// Days since the ledger origin's local midnight, +0.5 for night
    pub day_offset: f64,
    /// Zero-dose placeholder filling the paired slot of a real dose
    #[serde(default)]
    pub is_synthetic: bool,
}

impl DoseEvent {
    /// Build a real dose event, validating the mass and computing the day
    /// offset against `reference` (the event's own date when absent).
    pub fn new(
        date: NaiveDate,
        slot: TimeSlot,
        site: InjectionSite,
        mass_mg: f64,
        reference: Option<NaiveDate>,
    ) -> Result<Self> {
        let dose_mass = DoseMass::new(mass_mg)?;
        Ok(DoseEvent {
            id: Uuid::new_v4(),
            date,
            slot,
            site,
            dose_mass,
            day_offset: day_index::day_offset(date, slot, reference),
            is_synthetic: false,
        })
    }

    /// Zero-dose placeholder at the other slot of this event's date
    pub fn paired_placeholder(&self) -> DoseEvent {
        let slot = self.slot.paired();
        DoseEvent {
            id: Uuid::new_v4(),
            date: self.date,
            slot,
            site: self.site,
            dose_mass: DoseMass::ZERO,
            day_offset: self.day_offset - self.slot.day_fraction() + slot.day_fraction(),
            is_synthetic: true,
        }
    }

    pub fn week_index(&self) -> i64 {
        day_index::week_index(self.day_offset)
    }
}

/// A dose event with every derived field computed by the engine
///
/// Only the engine can construct this type, so derived values can never be
/// read off a record that has not been folded.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedDose {
    event: DoseEvent,
    week_index: i64,
    depot_mass: f64,
    release_rate: f64,
    serum_level: f64,
}

impl AnnotatedDose {
    pub(crate) fn new(
        event: DoseEvent,
        depot_mass: f64,
        release_rate: f64,
        serum_level: f64,
    ) -> Self {
        AnnotatedDose {
            week_index: event.week_index(),
            event,
            depot_mass,
            release_rate,
            serum_level,
        }
    }

    pub(crate) fn with_serum_level(self, serum_level: f64) -> Self {
        AnnotatedDose {
            serum_level,
            ..self
        }
    }

    pub fn event(&self) -> &DoseEvent {
        &self.event
    }

    /// Drop the derived fields, e.g. to feed the record back into a recompute
    pub fn into_event(self) -> DoseEvent {
        self.event
    }

    pub fn week_index(&self) -> i64 {
        self.week_index
    }

    /// Compound mass still sequestered at the depot after this event
    pub fn depot_mass(&self) -> f64 {
        self.depot_mass
    }

    pub fn release_rate(&self) -> f64 {
        self.release_rate
    }

    /// Estimated circulating level at this event's timestamp
    pub fn serum_level(&self) -> f64 {
        self.serum_level
    }
}
