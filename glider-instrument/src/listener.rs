//! Bus listener loop.
//!
//! Waits (bounded) for a frame, dispatches it through the identifier table to
//! the matching store update, and goes back to waiting. A timeout is the
//! normal idle case. Extended-format frames and unknown identifiers are
//! filtered out silently.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use can_telemetry::{decode_frame, TelemetryFrame};
use flight_schema::Channel;

use crate::bus_shim::FrameSource;
use crate::state::FlightStateStore;

/// Pause after a transport error before waiting again.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Result of one wait/dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Timeout,
    Applied(Channel),
    Ignored,
}

pub struct BusListener<S> {
    source: S,
    store: Arc<FlightStateStore>,
    timeout: Duration,
}

impl<S: FrameSource> BusListener<S> {
    pub fn new(source: S, store: Arc<FlightStateStore>, timeout: Duration) -> Self {
        BusListener { source, store, timeout }
    }

    /// Apply one received frame to the store.
    pub fn handle_frame(&self, frame: &TelemetryFrame) -> PollOutcome {
        match decode_frame(frame) {
            Some((channel, value)) => {
                tracing::trace!(id = frame.id, %channel, ?value, "Frame applied");
                self.store.apply(channel, value);
                PollOutcome::Applied(channel)
            }
            None => PollOutcome::Ignored,
        }
    }

    /// One WAITING → DISPATCHING cycle.
    pub fn poll_once(&mut self) -> io::Result<PollOutcome> {
        match self.source.receive(self.timeout)? {
            Some(frame) => Ok(self.handle_frame(&frame)),
            None => Ok(PollOutcome::Timeout),
        }
    }

    /// Listen for the life of the process.
    pub fn run(mut self) {
        tracing::info!(timeout_ms = self.timeout.as_millis() as u64, "Bus listener started");
        loop {
            if let Err(e) = self.poll_once() {
                tracing::warn!(error = %e, "Bus receive failed");
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
}

impl<S: FrameSource + 'static> BusListener<S> {
    /// Start [`BusListener::run`] on its own thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("can_rx".to_string())
            .spawn(move || self.run())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
