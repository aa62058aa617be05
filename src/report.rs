//! Repair report accumulation and CSV output.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::{RepairOutcome, RepairStatus};

/// Ordered, append-only collection of per-artist outcomes. Rows are written
/// once and never removed or overwritten.
#[derive(Debug, Default)]
pub struct RepairReport {
    rows: Vec<RepairOutcome>,
}

impl RepairReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: RepairOutcome) {
        self.rows.push(outcome);
    }

    pub fn rows(&self) -> &[RepairOutcome] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fixed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status == RepairStatus::Fixed.as_str())
            .count()
    }

    /// Writes header plus one row per processed artist.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {} failed", path.display()))?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("writing {} failed", path.display()))?;
        Ok(())
    }
}
