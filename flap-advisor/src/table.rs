//! Calibration data model and the factory default table.

use std::path::PathBuf;

use thiserror::Error;

// ── Model ─────────────────────────────────────────────────────────────────────

/// Reference lever position for one flap symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FlapPositionEntry {
    pub position: i32,
    pub symbol: String,
}

/// Closed speed interval in km/h.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    pub fn new(min: f64, max: f64) -> Self {
        SpeedRange { min, max }
    }

    pub fn contains(&self, speed: f64) -> bool {
        speed >= self.min && speed <= self.max
    }
}

/// One flap symbol's speed ranges, one slot per weight breakpoint.
/// `None` marks a breakpoint where the symbol is not applicable.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedBand {
    pub symbol: String,
    pub ranges: Vec<Option<SpeedRange>>,
}

/// Complete, validated calibration for one aircraft.
///
/// Instances are immutable; a reload builds a new table and replaces the old
/// one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    empty_mass_kg: f64,
    tolerance: i32,
    flap_entries: Vec<FlapPositionEntry>,
    weights: Vec<f64>,
    bands: Vec<SpeedBand>,
}

// ── CalibrationError ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("cannot read calibration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed calibration document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("calibration has no weight breakpoints")]
    NoBreakpoints,
    #[error("weight breakpoint {index} ({value} kg) must be positive and finite")]
    InvalidBreakpoint { index: usize, value: f64 },
    #[error("weight breakpoint {index} is not above its predecessor")]
    UnorderedBreakpoints { index: usize },
    #[error("band '{symbol}' has {found} speed ranges, expected {expected}")]
    RangeCountMismatch {
        symbol: String,
        expected: usize,
        found: usize,
    },
    #[error("band '{symbol}' range at breakpoint {column} has min above max")]
    InvertedRange { symbol: String, column: usize },
    #[error("position tolerance {0} is negative")]
    NegativeTolerance(i32),
    #[error("flap symbol at {0} is empty")]
    EmptySymbol(String),
}

// ── Construction ─────────────────────────────────────────────────────────────

impl CalibrationTable {
    /// Validate and assemble a table.
    pub fn new(
        empty_mass_kg: f64,
        tolerance: i32,
        flap_entries: Vec<FlapPositionEntry>,
        weights: Vec<f64>,
        bands: Vec<SpeedBand>,
    ) -> Result<Self, CalibrationError> {
        if tolerance < 0 {
            return Err(CalibrationError::NegativeTolerance(tolerance));
        }
        if let Some(i) = flap_entries.iter().position(|e| e.symbol.is_empty()) {
            return Err(CalibrationError::EmptySymbol(format!("position entry {i}")));
        }

        if weights.is_empty() {
            return Err(CalibrationError::NoBreakpoints);
        }
        for (index, &value) in weights.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalibrationError::InvalidBreakpoint { index, value });
            }
            if index > 0 && value <= weights[index - 1] {
                return Err(CalibrationError::UnorderedBreakpoints { index });
            }
        }

        for (i, band) in bands.iter().enumerate() {
            if band.symbol.is_empty() {
                return Err(CalibrationError::EmptySymbol(format!("band {i}")));
            }
            if band.ranges.len() != weights.len() {
                return Err(CalibrationError::RangeCountMismatch {
                    symbol: band.symbol.clone(),
                    expected: weights.len(),
                    found: band.ranges.len(),
                });
            }
            // `!(a <= b)` also rejects NaN bounds.
            if let Some(column) = band
                .ranges
                .iter()
                .position(|r| r.is_some_and(|r| !(r.min <= r.max)))
            {
                return Err(CalibrationError::InvertedRange {
                    symbol: band.symbol.clone(),
                    column,
                });
            }
        }

        Ok(CalibrationTable { empty_mass_kg, tolerance, flap_entries, weights, bands })
    }

    /// Factory calibration compiled into the instrument.
    pub fn builtin() -> Self {
        const POSITIONS: [(i32, &str); 8] = [
            (94, "L"),
            (167, "+2"),
            (243, "+1"),
            (84, "0"),
            (156, "-1"),
            (191, "-2"),
            (230, "S"),
            (250, "S1"),
        ];
        // (symbol, [(min, max) per weight])
        const BANDS: [(&str, [(f64, f64); 4]); 8] = [
            ("L",  [(0.0, 76.0),    (0.0, 80.0),    (0.0, 90.0),    (0.0, 94.0)]),
            ("+2", [(76.0, 80.0),   (80.0, 83.0),   (90.0, 94.0),   (94.0, 98.0)]),
            ("+1", [(80.0, 90.0),   (83.0, 94.0),   (94.0, 106.0),  (98.0, 111.0)]),
            ("0",  [(90.0, 122.0),  (94.0, 128.0),  (106.0, 145.0), (111.0, 151.0)]),
            ("-1", [(122.0, 150.0), (128.0, 158.0), (145.0, 179.0), (151.0, 187.0)]),
            ("-2", [(150.0, 169.0), (158.0, 178.0), (179.0, 201.0), (187.0, 210.0)]),
            ("S",  [(169.0, 188.0), (178.0, 198.0), (201.0, 224.0), (210.0, 234.0)]),
            // Top band: upper edge is the never-exceed speed, not a flap boundary.
            ("S1", [(188.0, 280.0), (198.0, 280.0), (224.0, 280.0), (234.0, 280.0)]),
        ];

        CalibrationTable {
            empty_mass_kg: 373.15,
            tolerance: 6,
            flap_entries: POSITIONS
                .iter()
                .map(|&(position, symbol)| FlapPositionEntry { position, symbol: symbol.to_string() })
                .collect(),
            weights: vec![390.0, 430.0, 550.0, 600.0],
            bands: BANDS
                .iter()
                .map(|(symbol, ranges)| SpeedBand {
                    symbol: symbol.to_string(),
                    ranges: ranges.iter().map(|&(min, max)| Some(SpeedRange::new(min, max))).collect(),
                })
                .collect(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn empty_mass_kg(&self) -> f64 {
        self.empty_mass_kg
    }

    pub fn tolerance(&self) -> i32 {
        self.tolerance
    }

    pub fn flap_entries(&self) -> &[FlapPositionEntry] {
        &self.flap_entries
    }

    /// Weight breakpoints in kg, strictly increasing.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Speed bands in evaluation order.
    pub fn bands(&self) -> &[SpeedBand] {
        &self.bands
    }
}
