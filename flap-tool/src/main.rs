// flap-tool/src/main.rs
// Bench tool for the glider instrument: validates flap calibration files,
// queries the advisory and injects telemetry frames onto the UDP bus.

use anyhow::{anyhow, bail, Context, Result};
use can_telemetry::{encode_frame, Decoder, TelemetryFrame, Value, MESSAGE_TABLE};
use clap::{Parser, Subcommand};
use flap_advisor::CalibrationTable;
use flight_schema::Channel;
use std::net::UdpSocket;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "flap-tool", about = "Flap calibration and CAN telemetry bench tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate a calibration file, then print a summary
    Check {
        file: PathBuf,
    },

    /// Print the built-in calibration table as JSON
    Defaults,

    /// Optimal flap symbol for an all-up weight and indicated airspeed
    Advise {
        /// All-up weight in kg
        #[arg(short, long)]
        weight: f64,

        /// Indicated airspeed in km/h
        #[arg(short, long)]
        speed: f64,

        /// Calibration file (built-in table if omitted)
        #[arg(short, long)]
        calibration: Option<PathBuf>,
    },

    /// Flap symbol for a raw lever position
    Position {
        raw: i32,

        /// Calibration file (built-in table if omitted)
        #[arg(short, long)]
        calibration: Option<PathBuf>,
    },

    /// Encode one channel value and send it as a gateway datagram
    Send {
        /// Instrument address, e.g. 127.0.0.1:11898
        #[arg(short, long)]
        target: String,

        /// Channel name (ias, tas, cas, alt, vario, flap, lat, lon, gs, tt,
        /// dry_and_ballast_mass, enl)
        #[arg(short, long)]
        channel: String,

        /// Value in the channel's wire units
        #[arg(short, long, allow_hyphen_values = true)]
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    match Args::parse().command {
        Command::Check { file } => {
            let table = load_table(Some(&file))?;
            print!("{}", summarize(&table));
        }
        Command::Defaults => {
            println!("{}", CalibrationTable::builtin().to_json_pretty()?);
        }
        Command::Advise { weight, speed, calibration } => {
            let table = load_table(calibration.as_deref())?;
            println!("{}", advise(&table, weight, speed));
        }
        Command::Position { raw, calibration } => {
            let table = load_table(calibration.as_deref())?;
            println!("{}", position(&table, raw));
        }
        Command::Send { target, channel, value } => {
            let frame = build_frame(&channel, &value)?;
            let socket = UdpSocket::bind("0.0.0.0:0").context("Cannot open UDP socket")?;
            socket
                .send_to(&frame.to_datagram(), &target)
                .with_context(|| format!("Cannot send to {target}"))?;
            eprintln!("Sent id {} ({channel}={value}) to {target}", frame.id);
        }
    }
    Ok(())
}

fn load_table(path: Option<&Path>) -> Result<CalibrationTable> {
    match path {
        Some(p) => flap_advisor::load_from_path(p)
            .with_context(|| format!("Invalid calibration {}", p.display())),
        None => Ok(CalibrationTable::builtin()),
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

pub fn summarize(table: &CalibrationTable) -> String {
    let mut out = format!(
        "empty mass: {} kg\ntolerance: {}\npositions: {}\nweights: {:?}\nbands: {}\n",
        table.empty_mass_kg(),
        table.tolerance(),
        table.flap_entries().len(),
        table.weights(),
        table.bands().len(),
    );
    for band in table.bands() {
        let applicable = band.ranges.iter().filter(|r| r.is_some()).count();
        out.push_str(&format!("  {:<4} {applicable}/{} columns\n", band.symbol, band.ranges.len()));
    }
    out
}

pub fn advise(table: &CalibrationTable, weight_kg: f64, speed_kmh: f64) -> String {
    table
        .optimal_symbol(weight_kg, speed_kmh)
        .map_or_else(|| "N/A".to_string(), |m| m.symbol.to_string())
}

pub fn position(table: &CalibrationTable, raw: i32) -> String {
    table
        .symbol_for_position(raw)
        .map_or_else(|| "N/A".to_string(), |m| m.symbol.to_string())
}

// ---------------------------------------------------------------------------
// Frame injection
// ---------------------------------------------------------------------------

/// Parses `value` according to the decoder bound to `channel`.
pub fn build_frame(channel: &str, value: &str) -> Result<TelemetryFrame> {
    let channel = Channel::from_name(channel).ok_or_else(|| anyhow!("Unknown channel '{channel}'"))?;
    let decoder = MESSAGE_TABLE
        .iter()
        .find(|(_, _, c)| *c == channel)
        .map(|&(_, d, _)| d)
        .ok_or_else(|| anyhow!("Channel {channel} has no bus identifier"))?;

    let parsed = match decoder {
        Decoder::Float => Value::Float(value.parse().with_context(|| format!("'{value}' is not a float"))?),
        Decoder::FixedDouble => Value::Double(value.parse().with_context(|| format!("'{value}' is not a number"))?),
        Decoder::U16 => Value::U16(value.parse().with_context(|| format!("'{value}' is not a u16"))?),
        Decoder::Byte => Value::Int(value.parse().with_context(|| format!("'{value}' is not an integer"))?),
    };
    match encode_frame(channel, parsed) {
        Some(frame) => Ok(frame),
        None => bail!("Value {value} does not fit channel {channel}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
