//! Derived flap advisory over the live flight state.
//!
//! This is what the display refresher and the reporter read: the current
//! airspeed in km/h, the symbol of the lever position actually set, and the
//! optimal symbol for the present weight and speed.

use std::sync::Arc;

use flap_advisor::FlapMatch;
use flight_schema::FlightState;
use serde::Serialize;

use crate::calibration::SharedCalibration;
use crate::state::FlightStateStore;

/// An owned flap symbol and its table index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlapAdvice {
    pub symbol: String,
    pub index: usize,
}

impl From<FlapMatch<'_>> for FlapAdvice {
    fn from(m: FlapMatch<'_>) -> Self {
        FlapAdvice { symbol: m.symbol.to_string(), index: m.index }
    }
}

/// One consistent sample: a single store snapshot evaluated against a single
/// calibration generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorySample {
    pub state: FlightState,
    pub optimal: Option<FlapAdvice>,
    pub actual: Option<FlapAdvice>,
}

pub struct Advisor {
    store: Arc<FlightStateStore>,
    calibration: Arc<SharedCalibration>,
    pilot_mass_kg: f64,
}

impl Advisor {
    pub fn new(
        store: Arc<FlightStateStore>,
        calibration: Arc<SharedCalibration>,
        pilot_mass_kg: f64,
    ) -> Self {
        Advisor { store, calibration, pilot_mass_kg }
    }

    pub fn calibration(&self) -> &SharedCalibration {
        &self.calibration
    }

    pub fn ias_kmh(&self) -> f64 {
        f64::from(self.store.ias_ms()) * 3.6
    }

    /// Symbol for the lever position currently reported on the bus.
    pub fn actual_flap(&self) -> Option<FlapAdvice> {
        let table = self.calibration.current();
        table.symbol_for_position(self.store.flap_raw()).map(FlapAdvice::from)
    }

    /// Optimal symbol for the current all-up weight and indicated airspeed.
    pub fn target_flap(&self) -> Option<FlapAdvice> {
        let state = self.store.snapshot();
        let table = self.calibration.current();
        table
            .optimal_symbol(state.total_mass_kg(self.pilot_mass_kg), state.ias_kmh())
            .map(FlapAdvice::from)
    }

    pub fn sample(&self) -> AdvisorySample {
        let state = self.store.snapshot();
        let table = self.calibration.current();
        AdvisorySample {
            state,
            optimal: table
                .optimal_symbol(state.total_mass_kg(self.pilot_mass_kg), state.ias_kmh())
                .map(FlapAdvice::from),
            actual: table.symbol_for_position(state.flap_raw).map(FlapAdvice::from),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
