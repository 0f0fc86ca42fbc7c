//! CAN telemetry codec for the glider instrument bus.
//!
//! Every frame carries an 8-byte payload. Bytes 0..4 belong to the producer's
//! own framing and are ignored; the value lives at offset 4.
//!
//! Payload layout (big-endian):
//! ```text
//! [0..4]  reserved    : producer counter / service bytes, never validated
//! [4..8]  f32         : IEEE-754 single            (Decoder::Float)
//! [4..8]  i32 / 1e7   : fixed-point degrees         (Decoder::FixedDouble)
//! [4..6]  u16         : unsigned                    (Decoder::U16)
//! [4]     u8          : zero-extended               (Decoder::Byte)
//! ```
//!
//! On the UDP transport a frame travels as the 16-byte Linux `struct can_frame`
//! image (little-endian host order):
//! ```text
//! [0..4]   can_id  : u32  bit31 = EFF, bit30 = RTR, bit29 = ERR
//! [4]      len     : u8   (0..=8)
//! [5..8]   padding
//! [8..16]  data    : [u8; 8]
//! ```

use flight_schema::Channel;
use thiserror::Error;

/// Size of a SocketCAN `struct can_frame` datagram.
pub const DATAGRAM_LEN: usize = 16;

/// Offset of the decoded value inside the payload.
pub const VALUE_OFFSET: usize = 4;

const CAN_EFF_FLAG: u32 = 0x8000_0000;
const CAN_RTR_FLAG: u32 = 0x4000_0000;
const CAN_ERR_FLAG: u32 = 0x2000_0000;
const CAN_SFF_MASK: u32 = 0x0000_07FF;
const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Fixed-point scale of latitude / longitude frames.
const FIXED_DEGREE_SCALE: f64 = 1e7;

/// Frame payload. Fixed-size, so the offset-4 readers can never run short.
pub type Payload = [u8; 8];

// ── TelemetryFrame ───────────────────────────────────────────────────────────

/// One frame as received from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame {
    pub id: u32,
    pub data: Payload,
    /// 29-bit extended addressing.
    pub extended: bool,
}

impl TelemetryFrame {
    /// Standard-format (11-bit) frame.
    pub fn standard(id: u32, data: Payload) -> Self {
        TelemetryFrame { id, data, extended: false }
    }

    /// Extended-format (29-bit) frame.
    pub fn extended(id: u32, data: Payload) -> Self {
        TelemetryFrame { id, data, extended: true }
    }

    /// Parse a SocketCAN `struct can_frame` datagram.
    pub fn from_datagram(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < DATAGRAM_LEN {
            return Err(FrameError::TooShort(buf.len()));
        }

        let can_id = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if can_id & CAN_ERR_FLAG != 0 {
            return Err(FrameError::ErrorFrame);
        }
        if can_id & CAN_RTR_FLAG != 0 {
            return Err(FrameError::RemoteFrame);
        }

        let len = buf[4];
        if usize::from(len) > 8 {
            return Err(FrameError::BadLength(len));
        }

        let extended = can_id & CAN_EFF_FLAG != 0;
        let id = if extended { can_id & CAN_EFF_MASK } else { can_id & CAN_SFF_MASK };

        // Bytes past `len` are left zeroed.
        let mut data = [0u8; 8];
        let len = usize::from(len);
        data[..len].copy_from_slice(&buf[8..8 + len]);

        Ok(TelemetryFrame { id, data, extended })
    }

    /// Serialize into a SocketCAN `struct can_frame` datagram (len = 8).
    pub fn to_datagram(&self) -> [u8; DATAGRAM_LEN] {
        let can_id = if self.extended {
            (self.id & CAN_EFF_MASK) | CAN_EFF_FLAG
        } else {
            self.id & CAN_SFF_MASK
        };
        let mut out = [0u8; DATAGRAM_LEN];
        out[0..4].copy_from_slice(&can_id.to_le_bytes());
        out[4] = 8;
        out[8..16].copy_from_slice(&self.data);
        out
    }
}

// ── FrameError ───────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("datagram too short: {0} bytes (expected {})", DATAGRAM_LEN)]
    TooShort(usize),
    #[error("data length code {0} exceeds 8")]
    BadLength(u8),
    #[error("bus error frame")]
    ErrorFrame,
    #[error("remote transmission request")]
    RemoteFrame,
}

// ── Decoders ─────────────────────────────────────────────────────────────────

/// Big-endian IEEE-754 single at offset 4.
pub fn decode_f32(payload: &Payload) -> f32 {
    f32::from_be_bytes(value_word(payload))
}

/// Big-endian two's-complement i32 at offset 4, scaled by 1e-7 (degrees).
pub fn decode_fixed_double(payload: &Payload) -> f64 {
    f64::from(i32::from_be_bytes(value_word(payload))) / FIXED_DEGREE_SCALE
}

/// Big-endian u16 at offset 4.
pub fn decode_u16(payload: &Payload) -> u16 {
    u16::from_be_bytes([payload[VALUE_OFFSET], payload[VALUE_OFFSET + 1]])
}

/// Single byte at offset 4, zero-extended.
pub fn decode_u8_as_int(payload: &Payload) -> i32 {
    i32::from(payload[VALUE_OFFSET])
}

fn value_word(payload: &Payload) -> [u8; 4] {
    [
        payload[VALUE_OFFSET],
        payload[VALUE_OFFSET + 1],
        payload[VALUE_OFFSET + 2],
        payload[VALUE_OFFSET + 3],
    ]
}

// ── Encoders (bytes 0..4 are left untouched) ─────────────────────────────────

pub fn encode_f32(payload: &mut Payload, value: f32) {
    payload[VALUE_OFFSET..].copy_from_slice(&value.to_be_bytes());
}

/// Rounds to the nearest 1e-7 degree; out-of-range values saturate.
pub fn encode_fixed_double(payload: &mut Payload, value: f64) {
    let raw = (value * FIXED_DEGREE_SCALE).round() as i32;
    payload[VALUE_OFFSET..].copy_from_slice(&raw.to_be_bytes());
}

pub fn encode_u16(payload: &mut Payload, value: u16) {
    payload[VALUE_OFFSET..VALUE_OFFSET + 2].copy_from_slice(&value.to_be_bytes());
}

pub fn encode_u8(payload: &mut Payload, value: u8) {
    payload[VALUE_OFFSET] = value;
}

// ── Decoder / Value ──────────────────────────────────────────────────────────

/// Which offset-4 reader a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Float,
    FixedDouble,
    U16,
    Byte,
}

/// A decoded channel value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    Double(f64),
    U16(u16),
    Int(i32),
}

impl Decoder {
    pub fn decode(self, payload: &Payload) -> Value {
        match self {
            Self::Float       => Value::Float(decode_f32(payload)),
            Self::FixedDouble => Value::Double(decode_fixed_double(payload)),
            Self::U16         => Value::U16(decode_u16(payload)),
            Self::Byte        => Value::Int(decode_u8_as_int(payload)),
        }
    }

    /// Write `value` into `payload`. Returns `false` if the value kind does
    /// not match this decoder.
    pub fn encode(self, payload: &mut Payload, value: Value) -> bool {
        match (self, value) {
            (Self::Float, Value::Float(v))        => encode_f32(payload, v),
            (Self::FixedDouble, Value::Double(v)) => encode_fixed_double(payload, v),
            (Self::U16, Value::U16(v))            => encode_u16(payload, v),
            (Self::Byte, Value::Int(v)) => match u8::try_from(v) {
                Ok(b) => encode_u8(payload, b),
                Err(_) => return false,
            },
            _ => return false,
        }
        true
    }
}

// ── Message table ────────────────────────────────────────────────────────────

/// Standard-format identifiers understood by the instrument.
///
/// Compatibility contract with the upstream telemetry producer; identifiers
/// and channel bindings must not change.
pub const MESSAGE_TABLE: [(u32, Decoder, Channel); 12] = [
    (315,  Decoder::Float,       Channel::Ias),
    (316,  Decoder::Float,       Channel::Tas),
    (317,  Decoder::Float,       Channel::Cas),
    (322,  Decoder::Float,       Channel::Altitude),
    (340,  Decoder::Byte,        Channel::Flap),
    (354,  Decoder::Float,       Channel::Vario),
    (1036, Decoder::FixedDouble, Channel::Latitude),
    (1037, Decoder::FixedDouble, Channel::Longitude),
    (1039, Decoder::Float,       Channel::GroundSpeed),
    (1040, Decoder::Float,       Channel::Track),
    (1506, Decoder::U16,         Channel::Enl),
    (1515, Decoder::U16,         Channel::DryAndBallastMass),
];

/// Decoder and channel bound to a standard-format identifier.
pub fn lookup(id: u32) -> Option<(Decoder, Channel)> {
    MESSAGE_TABLE
        .iter()
        .find(|(mid, _, _)| *mid == id)
        .map(|&(_, decoder, channel)| (decoder, channel))
}

/// Decode a frame into its channel update.
///
/// Extended-format frames and unmapped identifiers yield `None`; both are
/// expected traffic on a shared bus and are simply filtered out.
pub fn decode_frame(frame: &TelemetryFrame) -> Option<(Channel, Value)> {
    if frame.extended {
        return None;
    }
    let (decoder, channel) = lookup(frame.id)?;
    Some((channel, decoder.decode(&frame.data)))
}

/// Build the standard frame that carries `value` on `channel`.
///
/// Returns `None` if the channel has no identifier or the value kind does not
/// match its decoder.
pub fn encode_frame(channel: Channel, value: Value) -> Option<TelemetryFrame> {
    let &(id, decoder, _) = MESSAGE_TABLE.iter().find(|(_, _, c)| *c == channel)?;
    let mut data = [0u8; 8];
    decoder.encode(&mut data, value).then(|| TelemetryFrame::standard(id, data))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_with(value: [u8; 4]) -> Payload {
        // Fill the reserved bytes with noise; decoders must ignore them.
        [0xDE, 0xAD, 0xBE, 0xEF, value[0], value[1], value[2], value[3]]
    }

    #[test]
    fn decode_f32_reads_big_endian_at_offset_4() {
        let p = payload_with(25.5f32.to_be_bytes());
        assert_eq!(decode_f32(&p), 25.5);
    }

    #[test]
    fn decode_fixed_double_scales_signed_value() {
        let p = payload_with((-261_367_000i32).to_be_bytes());
        assert!((decode_fixed_double(&p) - -26.1367).abs() < 1e-9);

        let p = payload_with(482_411_234i32.to_be_bytes());
        assert!((decode_fixed_double(&p) - 48.2411234).abs() < 1e-9);
    }

    #[test]
    fn decode_u16_reads_two_bytes() {
        let p = payload_with([0x0C, 0xBD, 0xFF, 0xFF]);
        assert_eq!(decode_u16(&p), 3261);
    }

    #[test]
    fn decode_byte_zero_extends() {
        let p = payload_with([0xFA, 0, 0, 0]);
        assert_eq!(decode_u8_as_int(&p), 250);
    }

    #[test]
    fn reserved_bytes_do_not_affect_decoding() {
        let a = [0, 0, 0, 0, 0x42, 0x20, 0, 0];
        let b = [0xFF, 0x01, 0x7F, 0x80, 0x42, 0x20, 0, 0];
        assert_eq!(decode_f32(&a), decode_f32(&b));
        assert_eq!(decode_u16(&a), decode_u16(&b));
    }

    #[test]
    fn u16_reencoding_round_trips() {
        for v in [0u16, 1, 0x00FF, 0x0100, 3900, 0x7FFF, 0x8000, u16::MAX] {
            let mut p = [0x11; 8];
            encode_u16(&mut p, v);
            assert_eq!(decode_u16(&p), v);
            assert_eq!(&p[..4], &[0x11; 4], "reserved bytes must be untouched");
        }
    }

    #[test]
    fn fixed_double_encoding_rounds_to_1e7() {
        let mut p = [0u8; 8];
        encode_fixed_double(&mut p, 7.12345678);
        assert!((decode_fixed_double(&p) - 7.1234568).abs() < 1e-12);
    }

    #[test]
    fn message_table_identifiers_are_unique() {
        for (i, (id, _, _)) in MESSAGE_TABLE.iter().enumerate() {
            assert!(MESSAGE_TABLE[i + 1..].iter().all(|(other, _, _)| other != id));
        }
    }

    #[test]
    fn lookup_matches_upstream_mapping() {
        assert_eq!(lookup(315), Some((Decoder::Float, Channel::Ias)));
        assert_eq!(lookup(340), Some((Decoder::Byte, Channel::Flap)));
        assert_eq!(lookup(1036), Some((Decoder::FixedDouble, Channel::Latitude)));
        assert_eq!(lookup(1515), Some((Decoder::U16, Channel::DryAndBallastMass)));
        assert_eq!(lookup(1506), Some((Decoder::U16, Channel::Enl)));
        assert_eq!(lookup(0), None);
        assert_eq!(lookup(999), None);
    }

    #[test]
    fn decode_frame_filters_extended_and_unknown() {
        let data = payload_with(30.0f32.to_be_bytes());
        assert_eq!(
            decode_frame(&TelemetryFrame::standard(315, data)),
            Some((Channel::Ias, Value::Float(30.0)))
        );
        assert_eq!(decode_frame(&TelemetryFrame::extended(315, data)), None);
        assert_eq!(decode_frame(&TelemetryFrame::standard(314, data)), None);
    }

    #[test]
    fn encode_frame_uses_reverse_table() {
        let f = encode_frame(Channel::Flap, Value::Int(94)).unwrap();
        assert_eq!(f.id, 340);
        assert!(!f.extended);
        assert_eq!(decode_frame(&f), Some((Channel::Flap, Value::Int(94))));

        // Wrong value kind for the channel's decoder.
        assert_eq!(encode_frame(Channel::Flap, Value::Float(1.0)), None);
        // Byte channel cannot carry values outside 0..=255.
        assert_eq!(encode_frame(Channel::Flap, Value::Int(300)), None);
    }

    #[test]
    fn datagram_round_trip_preserves_format() {
        let f = TelemetryFrame::standard(1037, payload_with([1, 2, 3, 4]));
        assert_eq!(TelemetryFrame::from_datagram(&f.to_datagram()), Ok(f));

        let e = TelemetryFrame::extended(0x18FF_50E5, [9; 8]);
        assert_eq!(TelemetryFrame::from_datagram(&e.to_datagram()), Ok(e));
    }

    #[test]
    fn datagram_short_len_zero_fills() {
        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0..4].copy_from_slice(&340u32.to_le_bytes());
        buf[4] = 5;
        buf[8..16].copy_from_slice(&[1, 2, 3, 4, 94, 0xAA, 0xAA, 0xAA]);
        let f = TelemetryFrame::from_datagram(&buf).unwrap();
        assert_eq!(f.data, [1, 2, 3, 4, 94, 0, 0, 0]);
        assert_eq!(decode_u8_as_int(&f.data), 94);
    }

    #[test]
    fn datagram_rejects_malformed() {
        assert_eq!(TelemetryFrame::from_datagram(&[]), Err(FrameError::TooShort(0)));
        assert_eq!(TelemetryFrame::from_datagram(&[0; 15]), Err(FrameError::TooShort(15)));

        let mut buf = [0u8; DATAGRAM_LEN];
        buf[4] = 9;
        assert_eq!(TelemetryFrame::from_datagram(&buf), Err(FrameError::BadLength(9)));

        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0..4].copy_from_slice(&(CAN_ERR_FLAG | 1).to_le_bytes());
        assert_eq!(TelemetryFrame::from_datagram(&buf), Err(FrameError::ErrorFrame));

        let mut buf = [0u8; DATAGRAM_LEN];
        buf[0..4].copy_from_slice(&(CAN_RTR_FLAG | 315).to_le_bytes());
        assert_eq!(TelemetryFrame::from_datagram(&buf), Err(FrameError::RemoteFrame));
    }
}
