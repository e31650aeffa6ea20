//! # clipcast-core
//!
//! Shared wire protocol for ClipCast: the frame types and the binary codec
//! used by every peer on the network.
//!
//! This crate knows nothing about sockets, clipboards, or hotkeys; it works
//! on in-memory buffers and generic async byte streams only.
//!
//! # Protocol overview (for beginners)
//!
//! ClipCast moves exactly one kind of thing around: text. A machine that
//! captures a text selection broadcasts it to every connected peer; each peer
//! stores the latest broadcast so the user can paste it locally. All traffic
//! is a stream of frames with a fixed 5-byte header:
//!
//! ```text
//! [1-byte type][4-byte payload length, big endian][payload bytes]
//! ```
//!
//! Two frame types exist today. `TextForPaste` (0x01) travels from a peer to
//! the engine ("store this as the thing to paste"); `CapturedText` (0x02)
//! travels from the engine to every peer ("this was just captured, update
//! your pasteable text"). Frames with an unknown type byte are skipped, not
//! fatal, so new frame types can be introduced without breaking old peers.

pub mod protocol;

pub use protocol::codec::{
    decode_frame, decode_header, drain_frame_payload, encode_frame, encode_header,
    read_frame_header, read_frame_payload, write_frame, CodecError,
};
pub use protocol::frame::{FrameHeader, FrameType, FRAME_HEADER_SIZE, MAX_PAYLOAD_LEN};
