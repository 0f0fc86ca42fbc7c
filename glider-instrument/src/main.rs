// glider-instrument/src/main.rs
// Listens for flight telemetry from the CAN gateway and prints the flight
// state with the optimal and actual flap symbol once per report interval.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use glider_instrument::config::{
    DEFAULT_BIND, DEFAULT_BUS_TIMEOUT, DEFAULT_PILOT_MASS_KG, DEFAULT_REPORT_INTERVAL,
};
use glider_instrument::{
    logging, Advisor, BusListener, FlightStateStore, InstrumentConfig, ReportFormat, Reporter,
    SharedCalibration, UdpBus,
};

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "glider-instrument", about = "CAN telemetry listener and flap advisor")]
struct Args {
    /// UDP address the CAN gateway forwards frames to
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Flap calibration JSON; reloaded when the file changes
    #[arg(short, long)]
    calibration: Option<PathBuf>,

    /// Bounded wait for the next bus frame, in milliseconds
    #[arg(long, default_value_t = DEFAULT_BUS_TIMEOUT.as_millis() as u64)]
    bus_timeout_ms: u64,

    /// Interval between reports, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REPORT_INTERVAL.as_millis() as u64)]
    report_interval_ms: u64,

    /// Pilot mass added to dry + ballast mass
    #[arg(long, default_value_t = DEFAULT_PILOT_MASS_KG)]
    pilot_mass_kg: f64,

    /// Report format: text or json
    #[arg(long, default_value = "text")]
    report_format: ReportFormat,
}

impl From<Args> for InstrumentConfig {
    fn from(a: Args) -> Self {
        InstrumentConfig {
            bind: a.bind,
            calibration_path: a.calibration,
            bus_timeout: Duration::from_millis(a.bus_timeout_ms),
            report_interval: Duration::from_millis(a.report_interval_ms),
            pilot_mass_kg: a.pilot_mass_kg,
            report_format: a.report_format,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    logging::init_logging().map_err(|e| anyhow!("Failed to initialise logging: {e}"))?;
    let config = InstrumentConfig::from(Args::parse());

    let store = Arc::new(FlightStateStore::new());
    let calibration = Arc::new(load_calibration(&config));

    let bus = UdpBus::bind(&config.bind)
        .with_context(|| format!("Cannot bind CAN gateway socket {}", config.bind))?;
    tracing::info!(bind = %config.bind, "Listening for CAN frames");

    let listener = BusListener::new(bus, Arc::clone(&store), config.bus_timeout)
        .spawn()
        .context("Failed to start bus listener")?;

    let advisor = Advisor::new(store, calibration, config.pilot_mass_kg);
    let mut reporter = Reporter::new(advisor, config.report_format, config.report_interval, io::stdout());
    if let Some(path) = &config.calibration_path {
        reporter = reporter.watch_calibration(path.clone());
    }
    reporter.spawn().context("Failed to start reporter")?;

    listener
        .join()
        .map_err(|_| anyhow!("Bus listener thread panicked"))
}

/// The configured table if it loads, otherwise the built-in one.
fn load_calibration(config: &InstrumentConfig) -> SharedCalibration {
    let shared = SharedCalibration::with_builtin();
    match &config.calibration_path {
        Some(path) => {
            if let Err(e) = shared.reload_from_path(path) {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Calibration load failed; using built-in table"
                );
            }
        }
        None => tracing::info!("No calibration file given; using built-in table"),
    }
    shared
}
