//! File-based holiday store.
//! The whole set is one year-keyed JSON document, human-editable and
//! git-friendly. Reads are lenient: a missing or corrupt file yields an
//! empty set with a warning, which degrades the calendar to
//! weekend-only checking.

use std::path::{Path, PathBuf};

use ponto_core::error::{PontoError, Result};

use crate::holidays::HolidaySet;

/// File-based holiday store.
pub struct HolidayStore {
    path: PathBuf,
}

impl HolidayStore {
    /// Create a new holiday store in the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            path: dir.join("holidays.json"),
        }
    }

    /// Load the holiday set from disk.
    pub fn load(&self) -> HolidaySet {
        if !self.path.exists() {
            tracing::warn!(
                "⚠️ No holiday file at {}; only the weekend rule applies",
                self.path.display()
            );
            return HolidaySet::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("⚠️ Failed to parse holidays.json: {e}");
                HolidaySet::default()
            }),
            Err(e) => {
                tracing::warn!("⚠️ Failed to read holidays.json: {e}");
                HolidaySet::default()
            }
        }
    }

    /// Save the holiday set to disk.
    pub fn save(&self, set: &HolidaySet) -> Result<()> {
        let json = serde_json::to_string_pretty(set)
            .map_err(|e| PontoError::Storage(format!("Serialize holidays: {e}")))?;
        std::fs::write(&self.path, &json)
            .map_err(|e| PontoError::Storage(format!("Write holidays: {e}")))?;
        tracing::debug!("💾 Saved holidays to {}", self.path.display());
        Ok(())
    }
}
