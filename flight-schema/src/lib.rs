//! Shared flight-state definitions used by the bus codec, the advisory
//! engine consumers and the instrument runtime.
//!
//! Channel wire names are part of the compatibility contract with the
//! upstream telemetry source; do not rename.

use serde::{Deserialize, Serialize};

/// Latest known value of every telemetry channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlightState {
    // ── Air data ──────────────────────────────────────────────────────────────
    pub ias_ms: f32,
    pub tas_ms: f32,
    pub cas_ms: f32,
    pub altitude_m: f32,
    pub vario_ms: f32,

    // ── Flaps ─────────────────────────────────────────────────────────────────
    /// Raw lever sensor reading, not a symbol.
    pub flap_raw: i32,

    // ── Position ──────────────────────────────────────────────────────────────
    pub latitude: f64,
    pub longitude: f64,
    pub ground_speed_ms: f32,
    pub track_deg: f32,

    // ── Mass / engine ─────────────────────────────────────────────────────────
    /// Dry mass plus water ballast in decikilograms.
    pub dry_and_ballast_mass_dkg: u16,
    /// Engine noise level.
    pub enl: u16,
}

impl FlightState {
    /// Indicated airspeed in km/h.
    pub fn ias_kmh(&self) -> f64 {
        f64::from(self.ias_ms) * 3.6
    }

    /// All-up weight in kg: dry + ballast plus the pilot.
    pub fn total_mass_kg(&self, pilot_mass_kg: f64) -> f64 {
        f64::from(self.dry_and_ballast_mass_dkg) / 10.0 + pilot_mass_kg
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

/// One named field of [`FlightState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Ias,
    Tas,
    Cas,
    Altitude,
    Vario,
    Flap,
    Latitude,
    Longitude,
    GroundSpeed,
    Track,
    DryAndBallastMass,
    Enl,
}

impl Channel {
    pub const ALL: [Channel; 12] = [
        Channel::Ias,
        Channel::Tas,
        Channel::Cas,
        Channel::Altitude,
        Channel::Vario,
        Channel::Flap,
        Channel::Latitude,
        Channel::Longitude,
        Channel::GroundSpeed,
        Channel::Track,
        Channel::DryAndBallastMass,
        Channel::Enl,
    ];

    /// Upstream channel key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ias               => "ias",
            Self::Tas               => "tas",
            Self::Cas               => "cas",
            Self::Altitude          => "alt",
            Self::Vario             => "vario",
            Self::Flap              => "flap",
            Self::Latitude          => "lat",
            Self::Longitude         => "lon",
            Self::GroundSpeed       => "gs",
            Self::Track             => "tt",
            Self::DryAndBallastMass => "dry_and_ballast_mass",
            Self::Enl               => "enl",
        }
    }

    /// Reverse of [`Channel::name`]. Unknown keys yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
