//! CSV import of raw dose history and export of annotated history.

use crate::{AnnotatedDose, DoseLedger, Error, InjectionSite, Result, TimeSlot};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row in the exported CSV
#[derive(Debug, Serialize)]
struct ExportRow {
    id: String,
    date: String,
    time_of_day: &'static str,
    site: &'static str,
    amount: f64,
    volume_ml: f64,
    day_number: f64,
    week_number: i64,
    in_oil: f64,
    released: f64,
    serum_level: f64,
    auto_filled: bool,
}

impl From<&AnnotatedDose> for ExportRow {
    fn from(dose: &AnnotatedDose) -> Self {
        let event = dose.event();
        ExportRow {
            id: event.id.to_string(),
            date: event.date.format(DATE_FORMAT).to_string(),
            time_of_day: event.slot.as_str(),
            site: event.site.label(),
            amount: event.dose_mass.mg(),
            volume_ml: event.dose_mass.volume_ml(),
            day_number: event.day_offset,
            week_number: dose.week_index(),
            in_oil: dose.depot_mass(),
            released: dose.release_rate(),
            serum_level: dose.serum_level(),
            auto_filled: event.is_synthetic,
        }
    }
}

/// A raw dose row accepted on import
#[derive(Debug, Deserialize)]
struct ImportRow {
    date: String,
    time_of_day: String,
    site: String,
    amount: f64,
}

/// Parsed import row, ready to record
#[derive(Debug)]
struct RawDose {
    date: NaiveDate,
    slot: TimeSlot,
    site: InjectionSite,
    mass_mg: f64,
}

impl TryFrom<ImportRow> for RawDose {
    type Error = Error;

    fn try_from(row: ImportRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT)
            .map_err(|e| Error::Parse(format!("Invalid date '{}': {}", row.date, e)))?;

        Ok(RawDose {
            date,
            slot: row.time_of_day.parse()?,
            site: row.site.parse()?,
            mass_mg: row.amount,
        })
    }
}

/// Write the annotated history to a CSV file, replacing any existing file
///
/// Returns the number of rows written.
pub fn export_csv(annotated: &[AnnotatedDose], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for dose in annotated {
        writer.serialize(ExportRow::from(dose))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} dose events to {:?}", annotated.len(), path);
    Ok(annotated.len())
}

/// Record every valid row of a raw dose CSV into the ledger
///
/// Expects `date,time_of_day,site,amount` columns. Rows are recorded in
/// chronological order so placeholders pair up the same way as manual entry.
/// Malformed rows, including negative amounts, are logged and skipped.
/// Returns the number of rows recorded.
pub fn import_csv(ledger: &mut DoseLedger, path: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut doses = Vec::new();
    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        match result {
            Ok(row) => match RawDose::try_from(row) {
                Ok(dose) => doses.push(dose),
                Err(e) => tracing::warn!("Skipping CSV line {}: {}", line, e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV line {}: {}", line, e),
        }
    }

    doses.sort_by_key(|d| (d.date, d.slot == TimeSlot::Night));

    let mut count = 0;
    for dose in doses {
        match ledger.record(dose.date, dose.slot, dose.site, dose.mass_mg) {
            Ok(_) => count += 1,
            Err(e) => tracing::warn!("Skipping dose on {} {}: {}", dose.date, dose.slot, e),
        }
    }

    tracing::info!("Imported {} doses from {:?}", count, path);
    Ok(count)
}
