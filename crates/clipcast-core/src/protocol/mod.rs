//! Protocol module containing the frame types and the binary codec.

pub mod codec;
pub mod frame;

pub use codec::{
    decode_frame, decode_header, drain_frame_payload, encode_frame, encode_header,
    read_frame_header, read_frame_payload, write_frame, CodecError,
};
pub use frame::*;
