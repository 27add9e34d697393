//! Dose ledger persistence with file locking.
//!
//! The ledger is kept as a single JSON document. Writes go through a temp
//! file and an atomic rename so a crash never leaves a half-written ledger.

use crate::{DoseLedger, Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl DoseLedger {
    /// Load the ledger from a file with shared locking
    ///
    /// Returns an empty ledger if the file doesn't exist. A file that exists
    /// but cannot be read or parsed is an error: falling back to an empty
    /// ledger here would let the next save wipe the dose history.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No ledger file found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let mut ledger: DoseLedger = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse ledger file {:?}: {}", path, e);
            Error::Json(e)
        })?;

        // Older files may lack an origin; stored offsets count from the earliest date
        if ledger.origin.is_none() {
            ledger.origin = ledger.entries.iter().map(|e| e.date).min();
            if let Some(origin) = ledger.origin {
                tracing::warn!("Ledger {:?} has no origin, using earliest date {}", path, origin);
            }
        }

        tracing::debug!("Loaded {} ledger entries from {:?}", ledger.len(), path);
        Ok(ledger)
    }

    /// Save the ledger to a file with exclusive locking
    ///
    /// Atomically writes the ledger by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "ledger path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old ledger file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} ledger entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Load the ledger, modify it, and save it back
    ///
    /// Nothing is written when `f` fails, so a rejected edit leaves the
    /// persisted ledger untouched.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut DoseLedger) -> Result<T>,
    {
        let mut ledger = Self::load(path)?;
        let out = f(&mut ledger)?;
        ledger.save(path)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InjectionSite, TimeSlot};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        let mut ledger = DoseLedger::new();
        ledger
            .record(date(2024, 6, 1), TimeSlot::Morning, InjectionSite::VgD, 25.0)
            .unwrap();
        ledger
            .record(date(2024, 6, 2), TimeSlot::Night, InjectionSite::DtD, 0.0)
            .unwrap();

        ledger.save(&ledger_path).unwrap();
        let loaded = DoseLedger::load(&ledger_path).unwrap();

        assert_eq!(loaded, ledger);
        assert_eq!(loaded.origin, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("nonexistent.json");

        let ledger = DoseLedger::load(&ledger_path).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.origin, None);
    }

    #[test]
    fn test_corrupted_ledger_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("corrupted.json");
        std::fs::write(&ledger_path, "{ invalid json }").unwrap();

        let result = DoseLedger::load(&ledger_path);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_origin_is_taken_from_earliest_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        let mut ledger = DoseLedger::new();
        ledger
            .record(date(2024, 6, 3), TimeSlot::Morning, InjectionSite::VgD, 25.0)
            .unwrap();
        ledger
            .record(date(2024, 6, 5), TimeSlot::Morning, InjectionSite::VgD, 25.0)
            .unwrap();
        ledger.origin = None;
        ledger.save(&ledger_path).unwrap();

        let mut loaded = DoseLedger::load(&ledger_path).unwrap();
        assert_eq!(loaded.origin, Some(date(2024, 6, 3)));

        let id = loaded
            .record(date(2024, 6, 7), TimeSlot::Night, InjectionSite::VgD, 25.0)
            .unwrap();
        assert_eq!(loaded.get(id).unwrap().day_offset, 4.5);
    }

    #[test]
    fn test_negative_mass_on_disk_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        let mut ledger = DoseLedger::new();
        ledger
            .record(date(2024, 6, 1), TimeSlot::Morning, InjectionSite::VgD, 25.0)
            .unwrap();
        ledger.save(&ledger_path).unwrap();

        let tampered = std::fs::read_to_string(&ledger_path)
            .unwrap()
            .replace("25.0", "-25.0");
        std::fs::write(&ledger_path, tampered).unwrap();

        assert!(DoseLedger::load(&ledger_path).is_err());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        let id = DoseLedger::update(&ledger_path, |ledger| {
            ledger.record(date(2024, 6, 1), TimeSlot::Morning, InjectionSite::VgS, 40.0)
        })
        .unwrap();

        let loaded = DoseLedger::load(&ledger_path).unwrap();
        assert_eq!(loaded.get(id).unwrap().dose_mass.mg(), 40.0);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        DoseLedger::update(&ledger_path, |ledger| {
            ledger.record(date(2024, 6, 1), TimeSlot::Morning, InjectionSite::VgS, 40.0)
        })
        .unwrap();
        let before = std::fs::read_to_string(&ledger_path).unwrap();

        let result = DoseLedger::update(&ledger_path, |ledger| {
            ledger.record(date(2024, 6, 2), TimeSlot::Morning, InjectionSite::VgS, 10.0)?;
            ledger.delete(uuid::Uuid::new_v4())
        });
        assert!(matches!(result, Err(Error::UnknownDose(_))));
        assert_eq!(std::fs::read_to_string(&ledger_path).unwrap(), before);
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger_path = temp_dir.path().join("ledger.json");

        DoseLedger::default().save(&ledger_path).unwrap();

        // Verify ledger file exists and no stray temp files remain
        assert!(ledger_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "ledger.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only ledger.json, found extras: {:?}",
            extras
        );
    }
}
