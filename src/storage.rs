use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::STORE_PREFIX;
use crate::timesheet::RecordType;

/// One enrolled face. Several records may exist per employee as biometrics
/// are re-captured over time; all of them are candidates at match time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub embedding: Vec<f32>,
    /// Capture model and version, e.g. "faceapi-0.22".
    pub algorithm: String,
    pub captured_at: DateTime<Utc>,
    pub source_photo: Option<String>,
}

/// One badge event, appended to the company journal after a confident match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub employee_id: String,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub similarity: f32,
}

/// File-backed store, one directory per company id. Small postcard-encoded
/// files, rewritten whole on every change.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the build-time default prefix.
    pub fn default_location() -> Self {
        Self::open(*STORE_PREFIX)
    }

    fn company_dir(&self, company: &str) -> PathBuf {
        self.root.join(company)
    }

    pub fn load_enrollments(&self, company: &str) -> Result<Vec<EnrollmentRecord>> {
        read_file(&self.company_dir(company).join("enrollments.bin"))
    }

    pub fn save_enrollment(&self, company: &str, record: EnrollmentRecord) -> Result<()> {
        let mut records = self.load_enrollments(company)?;
        records.push(record);
        write_file(&self.company_dir(company).join("enrollments.bin"), &records)
    }

    /// Drop every enrollment belonging to one employee (biometrics cleared or
    /// employee removed). Returns how many records were removed.
    pub fn clear_employee(&self, company: &str, employee_id: &str) -> Result<usize> {
        let mut records = self.load_enrollments(company)?;
        let before = records.len();
        records.retain(|r| r.employee_id != employee_id);
        let removed = before - records.len();
        if removed > 0 {
            write_file(&self.company_dir(company).join("enrollments.bin"), &records)?;
        }
        Ok(removed)
    }

    pub fn load_entries(&self, company: &str) -> Result<Vec<TimeEntry>> {
        read_file(&self.company_dir(company).join("entries.bin"))
    }

    pub fn append_entry(&self, company: &str, entry: TimeEntry) -> Result<()> {
        let mut entries = self.load_entries(company)?;
        entries.push(entry);
        write_file(&self.company_dir(company).join("entries.bin"), &entries)
    }

    /// Remove everything stored for a company.
    pub fn purge(&self, company: &str) -> Result<()> {
        let dir = self.company_dir(company);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
        }
        Ok(())
    }
}

fn read_file<T: serde::de::DeserializeOwned>(file: &Path) -> Result<Vec<T>> {
    if !file.exists() {
        return Ok(vec![]);
    }
    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(postcard::from_bytes(&data)?)
}

fn write_file<T: Serialize>(file: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = postcard::to_allocvec(items)?;
    std::fs::write(file, data).with_context(|| format!("writing {}", file.display()))?;
    Ok(())
}
