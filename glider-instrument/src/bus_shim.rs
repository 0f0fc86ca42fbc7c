//! Bus abstraction layer.
//!
//! The listener reads frames through the `FrameSource` trait so that unit
//! tests can feed `MockBus` without a CAN gateway.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::mpsc;
use std::time::Duration;

use can_telemetry::{TelemetryFrame, DATAGRAM_LEN};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Source of bus frames.
pub trait FrameSource: Send {
    /// Block for at most `timeout` waiting for the next frame.
    ///
    /// `Ok(None)` means nothing usable arrived in time; that is the normal idle
    /// case, not an error.
    fn receive(&mut self, timeout: Duration) -> io::Result<Option<TelemetryFrame>>;
}

// ── MockBus ───────────────────────────────────────────────────────────────────

/// Test implementation fed through an mpsc channel.
pub struct MockBus {
    rx: mpsc::Receiver<TelemetryFrame>,
}

impl MockBus {
    /// Returns the sending half used to inject frames, and the bus.
    pub fn channel() -> (mpsc::Sender<TelemetryFrame>, MockBus) {
        let (tx, rx) = mpsc::channel();
        (tx, MockBus { rx })
    }
}

impl FrameSource for MockBus {
    fn receive(&mut self, timeout: Duration) -> io::Result<Option<TelemetryFrame>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock bus sender dropped"))
            }
        }
    }
}

// ── UdpBus ────────────────────────────────────────────────────────────────────

/// Frames forwarded by a SocketCAN-to-UDP gateway, one `struct can_frame`
/// per datagram.
pub struct UdpBus {
    socket: UdpSocket,
    read_timeout: Option<Duration>,
    buf: [u8; 64],
}

impl UdpBus {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Ok(Self::from_socket(UdpSocket::bind(addr)?))
    }

    pub fn from_socket(socket: UdpSocket) -> Self {
        UdpBus { socket, read_timeout: None, buf: [0u8; 64] }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl FrameSource for UdpBus {
    fn receive(&mut self, timeout: Duration) -> io::Result<Option<TelemetryFrame>> {
        // A zero read timeout is rejected by the OS.
        let timeout = timeout.max(Duration::from_millis(1));
        if self.read_timeout != Some(timeout) {
            self.socket.set_read_timeout(Some(timeout))?;
            self.read_timeout = Some(timeout);
        }

        match self.socket.recv_from(&mut self.buf) {
            Ok((n, from)) => match TelemetryFrame::from_datagram(&self.buf[..n]) {
                Ok(frame) => Ok(Some(frame)),
                Err(e) => {
                    tracing::debug!(%from, len = n, expected = DATAGRAM_LEN, error = %e, "Dropped datagram");
                    Ok(None)
                }
            },
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
