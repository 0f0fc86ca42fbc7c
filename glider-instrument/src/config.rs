//! Runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// UDP address the SocketCAN gateway forwards frames to.
pub const DEFAULT_BIND: &str = "0.0.0.0:11898";
/// Bounded wait for the next bus frame.
pub const DEFAULT_BUS_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(1000);
/// Added to dry + ballast mass to get all-up weight.
pub const DEFAULT_PILOT_MASS_KG: f64 = 84.0;

/// Output format of the periodic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown report format '{other}' (expected text or json)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentConfig {
    pub bind: String,
    /// Calibration document; the built-in table is used when absent or invalid.
    pub calibration_path: Option<PathBuf>,
    pub bus_timeout: Duration,
    pub report_interval: Duration,
    pub pilot_mass_kg: f64,
    pub report_format: ReportFormat,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            calibration_path: None,
            bus_timeout: DEFAULT_BUS_TIMEOUT,
            report_interval: DEFAULT_REPORT_INTERVAL,
            pilot_mass_kg: DEFAULT_PILOT_MASS_KG,
            report_format: ReportFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_bus_conventions() {
        let c = InstrumentConfig::default();
        assert_eq!(c.bus_timeout, Duration::from_secs(1));
        assert_eq!(c.report_interval, Duration::from_secs(1));
        assert!((c.pilot_mass_kg - 84.0).abs() < f64::EPSILON);
        assert_eq!(c.report_format, ReportFormat::Text);
        assert!(c.calibration_path.is_none());
    }

    #[test]
    fn report_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
        assert!("csv".parse::<ReportFormat>().is_err());
    }
}
