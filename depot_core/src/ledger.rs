//! Dose ledger with paired placeholder bookkeeping.
//!
//! The ledger owns the raw dose events. Recording a real dose onto a date
//! whose other slot is empty adds a zero-mass synthetic placeholder there,
//! and deleting a real dose removes its placeholder with it. Deleting a
//! placeholder on its own, or a real dose whose counterpart is also real,
//! leaves that slot empty. The recurrence engine never sees this
//! bookkeeping; it only receives the resulting events.

use crate::{
    engine, AnnotatedDose, DoseEvent, DoseMass, Error, InjectionSite, ModelConstants, Result,
    TimeSlot,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All recorded dose events plus the date offsets are measured from
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DoseLedger {
    /// Date of the first dose ever recorded; fixed until the ledger empties
    #[serde(default)]
    pub origin: Option<NaiveDate>,
    #[serde(default)]
    pub entries: Vec<DoseEvent>,
}

impl DoseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&DoseEvent> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Record a real dose and return its id
    ///
    /// A synthetic placeholder already holding the same slot is replaced.
    /// If nothing occupies the other slot of the same date, a placeholder is
    /// created there.
    pub fn record(
        &mut self,
        date: NaiveDate,
        slot: TimeSlot,
        site: InjectionSite,
        mass_mg: f64,
    ) -> Result<Uuid> {
        let origin = self.origin.unwrap_or(date);
        let event = DoseEvent::new(date, slot, site, mass_mg, Some(origin))?;
        let id = event.id;
        self.origin = Some(origin);

        if let Some(pos) = self.position_of(date, slot, true) {
            let replaced = self.entries.remove(pos);
            tracing::debug!("Real dose replaces placeholder {}", replaced.id);
        }

        let has_counterpart = self
            .entries
            .iter()
            .any(|e| e.date == date && e.slot == slot.paired());
        let placeholder = (!has_counterpart).then(|| event.paired_placeholder());

        tracing::info!(
            "Recorded {} mg at {} {} ({})",
            event.dose_mass.mg(),
            date,
            slot,
            site
        );
        self.entries.push(event);
        if let Some(placeholder) = placeholder {
            tracing::debug!(
                "Added placeholder {} at {} {}",
                placeholder.id,
                date,
                placeholder.slot
            );
            self.entries.push(placeholder);
        }

        Ok(id)
    }

    /// Delete an entry and, for a real dose, the placeholder paired with it
    ///
    /// Returns every removed entry, the requested one first.
    pub fn delete(&mut self, id: Uuid) -> Result<Vec<DoseEvent>> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(Error::UnknownDose(id))?;
        let removed = self.entries.remove(pos);

        let paired = if removed.is_synthetic {
            None
        } else {
            self.position_of(removed.date, removed.slot.paired(), true)
                .map(|p| self.entries.remove(p))
        };

        if self.entries.is_empty() {
            self.origin = None;
        }

        tracing::info!("Deleted dose {} at {} {}", removed.id, removed.date, removed.slot);
        let mut out = vec![removed];
        out.extend(paired);
        Ok(out)
    }

    /// Change the mass of an entry; an edited placeholder becomes a real entry
    pub fn edit_mass(&mut self, id: Uuid, mass_mg: f64) -> Result<()> {
        let mass = DoseMass::new(mass_mg)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::UnknownDose(id))?;

        tracing::info!(
            "Edited dose {}: {} mg -> {} mg",
            id,
            entry.dose_mass.mg(),
            mass.mg()
        );
        entry.dose_mass = mass;
        entry.is_synthetic = false;
        Ok(())
    }

    /// Full recompute of every derived field
    pub fn annotate(&self, constants: &ModelConstants) -> Vec<AnnotatedDose> {
        engine::recompute(self.entries.iter().cloned(), constants)
    }

    /// Serum estimate at the latest entry, or the baseline when empty
    pub fn current_estimate(&self, constants: &ModelConstants) -> f64 {
        engine::current_level(&self.annotate(constants), constants)
    }

    fn position_of(&self, date: NaiveDate, slot: TimeSlot, synthetic: bool) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.date == date && e.slot == slot && e.is_synthetic == synthetic)
    }
}
