use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use depot_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Depot injection tracker with serum level estimates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a dose (a placeholder is added for the other slot of the day)
    Record {
        /// Date of the dose (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Time slot (morning, night)
        #[arg(long, default_value = "morning")]
        slot: TimeSlot,

        /// Injection site (VG-D, VG-S, DT-S, DT-D, NO)
        #[arg(long, default_value = "NO")]
        site: InjectionSite,

        /// Dose in mg (0 logs a skipped slot)
        #[arg(long, allow_negative_numbers = true)]
        mass: f64,
    },

    /// Change the mass of a recorded entry
    Edit {
        id: Uuid,

        /// New dose in mg
        #[arg(long, allow_negative_numbers = true)]
        mass: f64,
    },

    /// Delete an entry and its paired placeholder
    Delete { id: Uuid },

    /// Show the annotated dose history (default)
    History {
        /// Only show morning entries
        #[arg(long)]
        morning_only: bool,
    },

    /// Show the current serum estimate and adherence stats
    Estimate {
        /// Reference date for adherence windows (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Export the annotated history to CSV
    Export { path: PathBuf },

    /// Import raw doses (date,time_of_day,site,amount) from CSV
    Import { path: PathBuf },

    /// Set the clearance fraction (0 to 1) in the config file
    SetClearance {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    depot_core::logging::init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let config = Config::load_or_default(&config_path)?;

    // Determine data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let ledger_path = data_dir.join("ledger.json");
    tracing::debug!("Using ledger at {:?}", ledger_path);

    match cli.command {
        Some(Commands::Record {
            date,
            slot,
            site,
            mass,
        }) => cmd_record(&ledger_path, date.unwrap_or_else(today), slot, site, mass),
        Some(Commands::Edit { id, mass }) => cmd_edit(&ledger_path, id, mass),
        Some(Commands::Delete { id }) => cmd_delete(&ledger_path, id),
        Some(Commands::History { morning_only }) => {
            cmd_history(&ledger_path, &config, morning_only)
        }
        Some(Commands::Estimate { today: at }) => {
            cmd_estimate(&ledger_path, &config, at.unwrap_or_else(today))
        }
        Some(Commands::Export { path }) => cmd_export(&ledger_path, &config, &path),
        Some(Commands::Import { path }) => cmd_import(&ledger_path, &path),
        Some(Commands::SetClearance { value }) => cmd_set_clearance(config, &config_path, value),
        None => cmd_history(&ledger_path, &config, false),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn cmd_record(
    ledger_path: &Path,
    date: NaiveDate,
    slot: TimeSlot,
    site: InjectionSite,
    mass: f64,
) -> Result<()> {
    let id = DoseLedger::update(ledger_path, |ledger| ledger.record(date, slot, site, mass))?;

    println!("✓ Recorded {} mg on {} ({}, {})", mass, date, slot, site);
    println!("  id: {}", id);
    Ok(())
}

fn cmd_edit(ledger_path: &Path, id: Uuid, mass: f64) -> Result<()> {
    DoseLedger::update(ledger_path, |ledger| ledger.edit_mass(id, mass))?;

    println!("✓ Updated {} to {} mg", id, mass);
    Ok(())
}

fn cmd_delete(ledger_path: &Path, id: Uuid) -> Result<()> {
    let removed = DoseLedger::update(ledger_path, |ledger| ledger.delete(id))?;

    println!("✓ Deleted {} entr{}", removed.len(), if removed.len() == 1 { "y" } else { "ies" });
    for event in &removed {
        println!("  {} {} {} mg", event.date, event.slot, event.dose_mass.mg());
    }
    Ok(())
}

fn cmd_history(ledger_path: &Path, config: &Config, morning_only: bool) -> Result<()> {
    let ledger = DoseLedger::load(ledger_path)?;
    let constants = config.model_constants()?;

    if ledger.is_empty() {
        println!("No doses recorded yet.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<10}  {:<7}  {:<4}  {:>7}  {:>5}  {:>6}  {:>4}  {:>8}  {:>8}  {:>8}",
        "id", "date", "slot", "site", "mg", "mL", "day", "week", "in oil", "released", "serum"
    );
    for dose in ledger.annotate(&constants) {
        let event = dose.event();
        if morning_only && event.slot != TimeSlot::Morning {
            continue;
        }
        println!(
            "{:<36}  {:<10}  {:<7}  {:<4}  {:>7.2}  {:>5.2}  {:>6.1}  {:>4}  {:>8.2}  {:>8.2}  {:>8.2}{}",
            event.id,
            event.date,
            event.slot,
            event.site,
            event.dose_mass.mg(),
            event.dose_mass.volume_ml(),
            event.day_offset,
            dose.week_index(),
            dose.depot_mass(),
            dose.release_rate(),
            dose.serum_level(),
            if event.is_synthetic { "  (auto)" } else { "" }
        );
    }
    Ok(())
}

fn cmd_estimate(ledger_path: &Path, config: &Config, today: NaiveDate) -> Result<()> {
    let ledger = DoseLedger::load(ledger_path)?;
    let constants = config.model_constants()?;

    let level = ledger.current_estimate(&constants);
    let stats = adherence(&ledger.entries, today);

    println!("Current estimate: {:.2} ng/dL", level);
    println!("  Clearance fraction: {:.3}", constants.clearance_fraction());
    println!();
    println!("Shot stats (as of {})", today);
    println!("  30d: {:.0}%", stats.last_30_days);
    println!("  10d: {:.0}%", stats.last_10_days);
    println!("  Streak: {}", stats.streak);
    Ok(())
}

fn cmd_export(ledger_path: &Path, config: &Config, path: &Path) -> Result<()> {
    let ledger = DoseLedger::load(ledger_path)?;
    let constants = config.model_constants()?;

    let count = export_csv(&ledger.annotate(&constants), path)?;
    println!("✓ Exported {} entries to {}", count, path.display());
    Ok(())
}

fn cmd_import(ledger_path: &Path, path: &Path) -> Result<()> {
    let count = DoseLedger::update(ledger_path, |ledger| import_csv(ledger, path))?;

    println!("✓ Imported {} doses from {}", count, path.display());
    Ok(())
}

fn cmd_set_clearance(mut config: Config, config_path: &Path, value: f64) -> Result<()> {
    let previous = config.model.clearance_fraction;
    config.set_clearance_fraction(value)?;
    config.save_to(config_path)?;

    println!("✓ Clearance fraction: {} -> {}", previous, value);
    Ok(())
}
