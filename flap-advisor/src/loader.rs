//! JSON calibration document (`flapDescriptor.json`).
//!
//! ```json
//! {
//!   "flap2symbol": { "tolerance": 6, "table": [ { "position": 94, "symbol": "L" } ] },
//!   "speedpolar": {
//!     "empty_mass_kg": 373.15,
//!     "weights": [390, 430, 550, 600],
//!     "ranges": [ { "wk": "L", "speeds": [ { "min": 0, "max": 76 }, null, null, null ] } ]
//!   }
//! }
//! ```
//!
//! A speed slot of `null`, or one with a negative bound (the legacy
//! `{"min": -1, "max": -1}` marker), means "not applicable at this weight".

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::table::{CalibrationError, CalibrationTable, FlapPositionEntry, SpeedBand, SpeedRange};

#[derive(Serialize, Deserialize)]
struct Document {
    flap2symbol: PositionSection,
    speedpolar: PolarSection,
}

#[derive(Serialize, Deserialize)]
struct PositionSection {
    tolerance: i32,
    table: Vec<PositionRow>,
}

#[derive(Serialize, Deserialize)]
struct PositionRow {
    position: i32,
    symbol: String,
}

#[derive(Serialize, Deserialize)]
struct PolarSection {
    empty_mass_kg: f64,
    weights: Vec<f64>,
    ranges: Vec<BandRow>,
}

#[derive(Serialize, Deserialize)]
struct BandRow {
    wk: String,
    speeds: Vec<Option<SpeedRow>>,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct SpeedRow {
    min: f64,
    max: f64,
}

// ── Loading ───────────────────────────────────────────────────────────────────

pub fn load_from_str(text: &str) -> Result<CalibrationTable, CalibrationError> {
    into_table(serde_json::from_str(text)?)
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<CalibrationTable, CalibrationError> {
    into_table(serde_json::from_reader(reader)?)
}

pub fn load_from_path(path: &Path) -> Result<CalibrationTable, CalibrationError> {
    let text = std::fs::read_to_string(path).map_err(|source| CalibrationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&text)
}

fn into_table(doc: Document) -> Result<CalibrationTable, CalibrationError> {
    let entries = doc
        .flap2symbol
        .table
        .into_iter()
        .map(|r| FlapPositionEntry { position: r.position, symbol: r.symbol })
        .collect();

    let bands = doc
        .speedpolar
        .ranges
        .into_iter()
        .map(|b| SpeedBand {
            symbol: b.wk,
            ranges: b
                .speeds
                .into_iter()
                .map(|s| s.filter(|r| r.min >= 0.0 && r.max >= 0.0).map(|r| SpeedRange::new(r.min, r.max)))
                .collect(),
        })
        .collect();

    CalibrationTable::new(
        doc.speedpolar.empty_mass_kg,
        doc.flap2symbol.tolerance,
        entries,
        doc.speedpolar.weights,
        bands,
    )
}

// ── Writing ───────────────────────────────────────────────────────────────────

impl CalibrationTable {
    /// Render the table in the document format read by [`load_from_str`].
    pub fn to_json_pretty(&self) -> Result<String, CalibrationError> {
        let doc = Document {
            flap2symbol: PositionSection {
                tolerance: self.tolerance(),
                table: self
                    .flap_entries()
                    .iter()
                    .map(|e| PositionRow { position: e.position, symbol: e.symbol.clone() })
                    .collect(),
            },
            speedpolar: PolarSection {
                empty_mass_kg: self.empty_mass_kg(),
                weights: self.weights().to_vec(),
                ranges: self
                    .bands()
                    .iter()
                    .map(|b| BandRow {
                        wk: b.symbol.clone(),
                        speeds: b
                            .ranges
                            .iter()
                            .map(|r| r.map(|r| SpeedRow { min: r.min, max: r.max }))
                            .collect(),
                    })
                    .collect(),
            },
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
