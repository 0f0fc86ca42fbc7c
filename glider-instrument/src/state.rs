//! Shared flight-state store.
//!
//! One instance is created at start-up and handed to the bus listener and to
//! every reader. Each access takes the same lock for a plain field copy, so a
//! reader never sees a half-written value. Separate calls are not atomic with
//! respect to each other; use [`FlightStateStore::snapshot`] when several
//! fields must come from the same moment.

use std::sync::{Mutex, MutexGuard, PoisonError};

use can_telemetry::Value;
use flight_schema::{Channel, FlightState};

#[derive(Debug, Default)]
pub struct FlightStateStore {
    inner: Mutex<FlightState>,
}

impl FlightStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections are single assignments, so a poisoned lock still
    // guards a consistent struct.
    fn lock(&self) -> MutexGuard<'_, FlightState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Updates ───────────────────────────────────────────────────────────────
    //
    // A channel of the wrong kind for the call is ignored.

    pub fn update_float(&self, channel: Channel, value: f32) {
        let mut s = self.lock();
        match channel {
            Channel::Ias         => s.ias_ms = value,
            Channel::Tas         => s.tas_ms = value,
            Channel::Cas         => s.cas_ms = value,
            Channel::Altitude    => s.altitude_m = value,
            Channel::Vario       => s.vario_ms = value,
            Channel::GroundSpeed => s.ground_speed_ms = value,
            Channel::Track       => s.track_deg = value,
            _ => {}
        }
    }

    pub fn update_double(&self, channel: Channel, value: f64) {
        let mut s = self.lock();
        match channel {
            Channel::Latitude  => s.latitude = value,
            Channel::Longitude => s.longitude = value,
            _ => {}
        }
    }

    pub fn update_u16(&self, channel: Channel, value: u16) {
        let mut s = self.lock();
        match channel {
            Channel::DryAndBallastMass => s.dry_and_ballast_mass_dkg = value,
            Channel::Enl               => s.enl = value,
            _ => {}
        }
    }

    pub fn update_int(&self, channel: Channel, value: i32) {
        if channel == Channel::Flap {
            self.lock().flap_raw = value;
        }
    }

    /// Route a decoded value to the matching typed update.
    pub fn apply(&self, channel: Channel, value: Value) {
        match value {
            Value::Float(v)  => self.update_float(channel, v),
            Value::Double(v) => self.update_double(channel, v),
            Value::U16(v)    => self.update_u16(channel, v),
            Value::Int(v)    => self.update_int(channel, v),
        }
    }

    /// Update by upstream channel key. Unknown keys are a no-op.
    pub fn update_by_name(&self, name: &str, value: Value) {
        if let Some(channel) = Channel::from_name(name) {
            self.apply(channel, value);
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Copy of the whole state taken under one lock.
    pub fn snapshot(&self) -> FlightState {
        *self.lock()
    }

    pub fn ias_ms(&self) -> f32 {
        self.lock().ias_ms
    }

    pub fn flap_raw(&self) -> i32 {
        self.lock().flap_raw
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
