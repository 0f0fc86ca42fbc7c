//! Copy-on-reload calibration handle.
//!
//! Readers take an `Arc` to the current table and keep querying that
//! generation even if a reload publishes a new one meanwhile. A reload parses
//! and validates the complete new table before the swap; on failure the
//! previous table stays in place.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use flap_advisor::{CalibrationError, CalibrationTable};

#[derive(Debug)]
pub struct SharedCalibration {
    current: RwLock<Arc<CalibrationTable>>,
}

impl SharedCalibration {
    pub fn new(table: CalibrationTable) -> Self {
        SharedCalibration { current: RwLock::new(Arc::new(table)) }
    }

    /// Start from the factory table compiled into the instrument.
    pub fn with_builtin() -> Self {
        Self::new(CalibrationTable::builtin())
    }

    /// The table generation readers should use right now.
    pub fn current(&self) -> Arc<CalibrationTable> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publish `table`, returning the generation it replaced.
    pub fn replace(&self, table: CalibrationTable) -> Arc<CalibrationTable> {
        let next = Arc::new(table);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Load `path` and publish it. On error nothing changes.
    pub fn reload_from_path(&self, path: &Path) -> Result<(), CalibrationError> {
        let table = flap_advisor::load_from_path(path)?;
        tracing::info!(
            path = %path.display(),
            positions = table.flap_entries().len(),
            breakpoints = table.weights().len(),
            bands = table.bands().len(),
            "Calibration loaded"
        );
        self.replace(table);
        Ok(())
    }
}

impl Default for SharedCalibration {
    fn default() -> Self {
        Self::with_builtin()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
