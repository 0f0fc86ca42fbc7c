//! Periodic flight-state report.
//!
//! Text layout is consumed by an external log collector; field order, units
//! and precision must not change:
//! ```text
//! FlightData: IAS=<km/h>, TAS=.., CAS=.., ALT=.., Vario=.., Flap=<raw>, Lat=<7dp>, Lon=<7dp>, GS=.., TT=.., Dry + Ballast Mass=<kg>, ENL=..
//! Flaps: Optimal=<symbol|N/A>, Actual=<symbol|N/A>
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use crate::advisor::{Advisor, AdvisorySample, FlapAdvice};
use crate::config::ReportFormat;

const NOT_AVAILABLE: &str = "N/A";

/// Two-line text report.
pub fn report_text(sample: &AdvisorySample) -> String {
    let s = &sample.state;
    format!(
        "FlightData: IAS={:.2}, TAS={:.2}, CAS={:.2}, ALT={:.2}, Vario={:.2}, Flap={}, \
         Lat={:.7}, Lon={:.7}, GS={:.2}, TT={:.2}, Dry + Ballast Mass={}, ENL={}\n\
         Flaps: Optimal={}, Actual={}\n",
        s.ias_kmh(),
        s.tas_ms,
        s.cas_ms,
        s.altitude_m,
        s.vario_ms,
        s.flap_raw,
        s.latitude,
        s.longitude,
        s.ground_speed_ms,
        s.track_deg,
        s.dry_and_ballast_mass_dkg / 10,
        s.enl,
        symbol_or_na(&sample.optimal),
        symbol_or_na(&sample.actual),
    )
}

/// One JSON object per line.
pub fn report_json(sample: &AdvisorySample) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(sample)?;
    line.push('\n');
    Ok(line)
}

fn symbol_or_na(advice: &Option<FlapAdvice>) -> &str {
    advice.as_ref().map_or(NOT_AVAILABLE, |a| a.symbol.as_str())
}

// ── Reporter ──────────────────────────────────────────────────────────────────

pub struct Reporter<W> {
    advisor: Advisor,
    format: ReportFormat,
    interval: Duration,
    out: W,
    watched: Option<WatchedFile>,
}

struct WatchedFile {
    path: PathBuf,
    modified: Option<SystemTime>,
}

fn modified_time(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl<W: Write> Reporter<W> {
    pub fn new(advisor: Advisor, format: ReportFormat, interval: Duration, out: W) -> Self {
        Reporter { advisor, format, interval, out, watched: None }
    }

    /// Reload the calibration whenever `path` changes on disk.
    ///
    /// The file's current modification time is taken as already loaded.
    pub fn watch_calibration(mut self, path: PathBuf) -> Self {
        let modified = modified_time(&path);
        self.watched = Some(WatchedFile { path, modified });
        self
    }

    /// Check the watched calibration file, then write one report.
    pub fn tick(&mut self) -> io::Result<()> {
        self.check_calibration();

        let sample = self.advisor.sample();
        let text = match self.format {
            ReportFormat::Text => report_text(&sample),
            ReportFormat::Json => report_json(&sample).map_err(io::Error::from)?,
        };
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    fn check_calibration(&mut self) {
        let Some(watched) = self.watched.as_mut() else { return };
        let modified = modified_time(&watched.path);
        if modified.is_none() || modified == watched.modified {
            return;
        }
        // Record the change even on failure so a bad file is reported once.
        watched.modified = modified;
        if let Err(e) = self.advisor.calibration().reload_from_path(&watched.path) {
            tracing::warn!(
                path = %watched.path.display(),
                error = %e,
                "Calibration reload failed; keeping previous table"
            );
        }
    }
}

impl<W: Write + Send + 'static> Reporter<W> {
    /// Report every interval on a dedicated thread.
    pub fn spawn(mut self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("reporter".to_string()).spawn(move || loop {
            thread::sleep(self.interval);
            if let Err(e) = self.tick() {
                tracing::warn!(error = %e, "Report write failed");
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
