use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use ponto::{config, matcher, timesheet, Embedding, EnrollmentRecord, Store, TimeEntry};

#[derive(Parser)]
#[command(name = "ponto")]
#[command(version, about = "Facial-recognition employee time clock")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a face embedding for an employee
    Enroll {
        /// Employee id
        #[arg(short, long)]
        employee: String,
        /// Employee display name
        #[arg(short, long)]
        name: String,
        /// JSON file holding the embedding (array of numbers)
        #[arg(short, long)]
        file: PathBuf,
        /// Capture model and version that produced the embedding
        #[arg(long, default_value = "faceapi-0.22")]
        algorithm: String,
        /// Optional reference to the source photo
        #[arg(long)]
        photo: Option<String>,
    },
    /// Match a captured embedding against enrolled employees and badge
    Recognize {
        /// JSON file holding the candidate embedding
        #[arg(short, long)]
        file: PathBuf,
        /// Report the match without recording a time entry
        #[arg(long)]
        preview: bool,
    },
    /// Remove all enrolled biometrics for an employee
    Clear {
        /// Employee id
        #[arg(short, long)]
        employee: String,
    },
    /// Remove the entire company store
    Purge,
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;
    let store = Store::default_location();

    match cli.command {
        Commands::Enroll {
            employee,
            name,
            file,
            algorithm,
            photo,
        } => enroll(&cfg, &store, &employee, &name, &file, &algorithm, photo),
        Commands::Recognize { file, preview } => recognize(&cfg, &store, &file, preview),
        Commands::Clear { employee } => clear(&cfg, &store, &employee),
        Commands::Purge => purge(&cfg, &store),
        Commands::Config => open_config(),
    }
}

fn read_embedding(file: &PathBuf) -> Result<Embedding> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading embedding file {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("embedding file is not valid JSON")?;
    Ok(Embedding::from_json(&value)?)
}

fn enroll(
    cfg: &config::Config,
    store: &Store,
    employee_id: &str,
    name: &str,
    file: &PathBuf,
    algorithm: &str,
    photo: Option<String>,
) -> Result<()> {
    let embedding = read_embedding(file)?;

    // Reject degenerate captures up front rather than at match time.
    embedding
        .normalize()
        .context("embedding cannot be enrolled")?;

    let record = EnrollmentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        employee_name: name.to_string(),
        embedding: embedding.vector.to_vec(),
        algorithm: algorithm.to_string(),
        captured_at: Utc::now(),
        source_photo: photo,
    };

    store
        .save_enrollment(&cfg.company, record)
        .context("saving enrollment record")?;

    info!("enrolled {} ({}) with {} components", name, employee_id, embedding.len());
    Ok(())
}

fn recognize(cfg: &config::Config, store: &Store, file: &PathBuf, preview: bool) -> Result<()> {
    let candidate = read_embedding(file)?;

    let pool = store
        .load_enrollments(&cfg.company)
        .context("loading enrollments")?;
    info!(
        "matching against {} enrollment(s), threshold {:.2}",
        pool.len(),
        cfg.threshold
    );

    let result = match matcher::find_best_match(&candidate, &pool, cfg.threshold) {
        Ok(r) => r,
        Err(matcher::MatchError::InvalidEmbedding) => {
            anyhow::bail!("Invalid embedding: zero magnitude");
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.matched {
        // Recoverable for the kiosk: it retries on the next frame.
        return Ok(());
    }

    let employee_id = result.employee_id.as_deref().unwrap_or_default();
    let entries = store.load_entries(&cfg.company).context("loading time entries")?;
    let now = Utc::now();
    let recorded = timesheet::recorded_today(&entries, employee_id, now);

    let Some(next) = timesheet::next_record_type(&recorded) else {
        warn!("all records for today already made for {}", employee_id);
        return Ok(());
    };

    if preview {
        info!("next record would be: {}", next.label());
        return Ok(());
    }

    let entry = TimeEntry {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        record_type: next,
        timestamp: now,
        device_id: cfg.device.clone(),
        similarity: result.similarity,
    };
    store
        .append_entry(&cfg.company, entry)
        .context("recording time entry")?;

    info!("recorded: {}", next.label());
    Ok(())
}

fn clear(cfg: &config::Config, store: &Store, employee_id: &str) -> Result<()> {
    let removed = store
        .clear_employee(&cfg.company, employee_id)
        .context("clearing biometrics")?;
    info!("removed {} enrollment(s) for {}", removed, employee_id);
    Ok(())
}

fn purge(cfg: &config::Config, store: &Store) -> Result<()> {
    store.purge(&cfg.company).context("purging store")?;
    info!("store purged for company {}", cfg.company);
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
