#![forbid(unsafe_code)]

//! Core domain model and dose recurrence engine for the depot tracker.
//!
//! This crate provides:
//! - Domain types (time slots, injection sites, dose events)
//! - Day-index normalization
//! - The depot / release / serum recurrence engine
//! - Dose ledger with paired placeholder bookkeeping
//! - Persistence (ledger file, CSV import/export)
//! - Adherence statistics

pub mod types;
pub mod error;
pub mod model;
pub mod config;
pub mod logging;
pub mod day_index;
pub mod engine;
pub mod ledger;
pub mod store;
pub mod csv_io;
pub mod stats;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use model::ModelConstants;
pub use config::Config;
pub use day_index::{day_offset, week_index, CivilDate};
pub use engine::{current_level, recompute, recompute_serum};
pub use ledger::DoseLedger;
pub use csv_io::{export_csv, import_csv};
pub use stats::{adherence, AdherenceStats};
