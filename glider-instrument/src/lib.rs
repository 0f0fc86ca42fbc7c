//! Glider flight instrument runtime.
//!
//! A background listener decodes CAN telemetry into the shared
//! [`FlightStateStore`]; the [`Advisor`] evaluates the flap calibration
//! against it, and the [`Reporter`] prints the result periodically. Unit tests
//! drive the listener through `MockBus`; production uses `UdpBus` fed by a
//! SocketCAN gateway.

pub mod advisor;
pub mod bus_shim;
pub mod calibration;
pub mod config;
pub mod listener;
pub mod logging;
pub mod report;
pub mod state;

// ── Re-exports used by the binary and integration tests ──────────────────────

pub use advisor::{Advisor, AdvisorySample, FlapAdvice};
pub use bus_shim::{FrameSource, MockBus, UdpBus};
pub use calibration::SharedCalibration;
pub use config::{InstrumentConfig, ReportFormat};
pub use listener::{BusListener, PollOutcome};
pub use report::{report_json, report_text, Reporter};
pub use state::FlightStateStore;
