//! ClipCast frame types and protocol constants.
//!
//! Every message on the wire is one frame: a 5-byte header (type byte plus
//! big-endian payload length) followed by the payload verbatim.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Total size of the frame header in bytes: 1 type byte + 4 length bytes.
pub const FRAME_HEADER_SIZE: usize = 5;

/// Hard cap on the payload length of any accepted frame.
///
/// Frames declaring a larger payload are skipped (payload drained, connection
/// kept) so a misbehaving peer cannot force an unbounded allocation.
pub const MAX_PAYLOAD_LEN: u32 = 10 * 1024 * 1024;

// ── Frame type codes ──────────────────────────────────────────────────────────

/// All frame type codes understood by this version of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Peer → engine: "store this payload as the text to paste".
    TextForPaste = 0x01,
    /// Engine → peers: "this text was just captured, update your pasteable text".
    CapturedText = 0x02,
}

impl TryFrom<u8> for FrameType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(FrameType::TextForPaste),
            0x02 => Ok(FrameType::CapturedText),
            _ => Err(()),
        }
    }
}

// ── Frame header ──────────────────────────────────────────────────────────────

/// Decoded 5-byte frame header.
///
/// The type is kept as the raw wire byte: frames with an unknown type must
/// still pass the header stage so their payload can be drained and skipped
/// (forward-compatible leniency, not a validation gate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw frame type byte as received.
    pub type_byte: u8,
    /// Length of the payload in bytes (not including this header).
    pub payload_len: u32,
}

impl FrameHeader {
    /// Returns the typed frame type, or `None` for an unknown type byte.
    pub fn frame_type(&self) -> Option<FrameType> {
        FrameType::try_from(self.type_byte).ok()
    }

    /// Whether the declared payload length exceeds [`MAX_PAYLOAD_LEN`].
    pub fn exceeds_cap(&self) -> bool {
        self.payload_len > MAX_PAYLOAD_LEN
    }
}
