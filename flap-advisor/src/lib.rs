//! Flap advisory for the glider instrument.
//!
//! A [`CalibrationTable`] maps raw lever positions to flap symbols and holds
//! the per-weight speed bands from the aircraft's flap polar. The engine
//! queries ([`CalibrationTable::symbol_for_position`],
//! [`CalibrationTable::optimal_symbol`]) are pure and never fail: "no advisory"
//! is an ordinary `None`.

pub mod engine;
pub mod loader;
pub mod table;

pub use engine::FlapMatch;
pub use loader::{load_from_path, load_from_reader, load_from_str};
pub use table::{CalibrationError, CalibrationTable, FlapPositionEntry, SpeedBand, SpeedRange};
