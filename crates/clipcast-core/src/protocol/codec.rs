//! Binary codec for ClipCast frames.
//!
//! Wire layout of every frame:
//!
//! ```text
//! offset 0      frame type (u8)
//! offset 1..5   payload length (u32, big endian)
//! offset 5..    payload, exactly `payload length` bytes
//! ```
//!
//! The pure functions ([`encode_frame`], [`decode_header`], [`decode_frame`])
//! work on in-memory buffers. The async functions ([`read_frame_header`],
//! [`read_frame_payload`], [`drain_frame_payload`], [`write_frame`]) work on
//! any async byte stream and suspend until enough bytes are available or the
//! stream ends.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::frame::{FrameHeader, FrameType, FRAME_HEADER_SIZE, MAX_PAYLOAD_LEN};

/// Scratch buffer size used when draining a skipped payload.
const DRAIN_CHUNK: usize = 8 * 1024;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors produced while encoding, decoding, or transporting frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The peer closed the connection cleanly on a frame boundary.
    #[error("peer closed the connection")]
    Disconnected,

    /// The connection closed partway through a frame header.
    #[error("connection closed mid-header after {received} of {} bytes", FRAME_HEADER_SIZE)]
    TruncatedHeader { received: usize },

    /// A buffer was too short to contain a complete header.
    #[error("insufficient data: needed {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The connection closed partway through a declared payload.
    #[error("connection closed mid-payload after {received} of {expected} bytes")]
    IncompleteBody { expected: usize, received: usize },

    /// A payload length beyond what this codec will buffer or describe.
    #[error("payload length {declared} exceeds the {max} byte limit")]
    PayloadTooLarge { declared: u64, max: u64 },

    /// A buffer-level decode where the declared length disagrees with the
    /// bytes actually present.
    #[error("payload length mismatch: declared {declared}, available {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// Underlying transport failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Pure buffer codec ─────────────────────────────────────────────────────────

/// Encodes one complete frame into a contiguous buffer.
///
/// # Errors
///
/// Fails with [`CodecError::PayloadTooLarge`] only when the payload cannot be
/// described by the 4-byte length field. The [`MAX_PAYLOAD_LEN`] acceptance
/// cap is receive-side policy and is deliberately not enforced here.
pub fn encode_frame(frame_type: FrameType, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let payload_len = describable_len(payload)?;
    let mut bytes = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    bytes.push(frame_type as u8);
    bytes.extend_from_slice(&payload_len.to_be_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Encodes just the 5-byte header announcing `payload_len` payload bytes.
pub fn encode_header(frame_type: FrameType, payload_len: u32) -> [u8; FRAME_HEADER_SIZE] {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    header[0] = frame_type as u8;
    header[1..FRAME_HEADER_SIZE].copy_from_slice(&payload_len.to_be_bytes());
    header
}

/// Decodes a frame header from the first [`FRAME_HEADER_SIZE`] bytes of `bytes`.
///
/// Unknown type bytes are preserved, not rejected; callers decide whether to
/// interpret or drain the payload.
///
/// # Errors
///
/// Fails with [`CodecError::InsufficientData`] if fewer than
/// [`FRAME_HEADER_SIZE`] bytes are available.
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader, CodecError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(CodecError::InsufficientData {
            needed: FRAME_HEADER_SIZE,
            available: bytes.len(),
        });
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[1..FRAME_HEADER_SIZE]);
    Ok(FrameHeader {
        type_byte: bytes[0],
        payload_len: u32::from_be_bytes(len_bytes),
    })
}

/// Decodes one complete frame from an in-memory buffer, returning the header
/// and a view of the payload.
///
/// # Errors
///
/// Fails if the buffer is shorter than a header, the declared length exceeds
/// [`MAX_PAYLOAD_LEN`], or the declared length disagrees with the bytes
/// actually present after the header.
pub fn decode_frame(bytes: &[u8]) -> Result<(FrameHeader, &[u8]), CodecError> {
    let header = decode_header(bytes)?;
    if header.exceeds_cap() {
        return Err(CodecError::PayloadTooLarge {
            declared: u64::from(header.payload_len),
            max: u64::from(MAX_PAYLOAD_LEN),
        });
    }
    let declared = header.payload_len as usize;
    let available = bytes.len() - FRAME_HEADER_SIZE;
    if declared != available {
        return Err(CodecError::PayloadLengthMismatch {
            declared,
            available,
        });
    }
    Ok((header, &bytes[FRAME_HEADER_SIZE..]))
}

// ── Async stream codec ────────────────────────────────────────────────────────

/// Reads exactly one frame header from `reader`.
///
/// Distinguishes a clean peer close on a frame boundary
/// ([`CodecError::Disconnected`]) from a close partway through a header
/// ([`CodecError::TruncatedHeader`]).
pub async fn read_frame_header<R>(reader: &mut R) -> Result<FrameHeader, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    let received = read_full(reader, &mut header).await?;
    if received == 0 {
        return Err(CodecError::Disconnected);
    }
    if received < FRAME_HEADER_SIZE {
        return Err(CodecError::TruncatedHeader { received });
    }
    decode_header(&header)
}

/// Reads exactly `payload_len` payload bytes from `reader`.
///
/// Refuses lengths above [`MAX_PAYLOAD_LEN`] before allocating anything, so a
/// hostile declared length can never drive the buffer size. Callers that want
/// to keep the connection alive for an oversized frame should
/// [`drain_frame_payload`] instead.
pub async fn read_frame_payload<R>(reader: &mut R, payload_len: u32) -> Result<Vec<u8>, CodecError>
where
    R: AsyncRead + Unpin,
{
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge {
            declared: u64::from(payload_len),
            max: u64::from(MAX_PAYLOAD_LEN),
        });
    }
    let expected = payload_len as usize;
    let mut payload = vec![0u8; expected];
    let received = read_full(reader, &mut payload).await?;
    if received < expected {
        return Err(CodecError::IncompleteBody { expected, received });
    }
    Ok(payload)
}

/// Discards exactly `payload_len` bytes from `reader`.
///
/// Keeps the stream aligned on frame boundaries when a payload is skipped
/// (oversized or unknown-type frames). Reads through a fixed scratch buffer,
/// so the discarded length never drives an allocation.
pub async fn drain_frame_payload<R>(reader: &mut R, payload_len: u32) -> Result<(), CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut scratch = [0u8; DRAIN_CHUNK];
    let expected = payload_len as usize;
    let mut remaining = expected;
    while remaining > 0 {
        let chunk = remaining.min(scratch.len());
        let received = reader.read(&mut scratch[..chunk]).await?;
        if received == 0 {
            return Err(CodecError::IncompleteBody {
                expected,
                received: expected - remaining,
            });
        }
        remaining -= received;
    }
    Ok(())
}

/// Writes one frame to `writer`: header, then payload, then flush.
///
/// Any transport failure is returned to the caller; it is never fatal at this
/// layer.
pub async fn write_frame<W>(
    writer: &mut W,
    frame_type: FrameType,
    payload: &[u8],
) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    let payload_len = describable_len(payload)?;
    writer.write_all(&encode_header(frame_type, payload_len)).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Returns the payload length as a `u32`, or fails if it cannot fit the
/// 4-byte length field.
fn describable_len(payload: &[u8]) -> Result<u32, CodecError> {
    u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge {
        declared: payload.len() as u64,
        max: u64::from(u32::MAX),
    })
}

/// Reads until `buf` is full, returning the number of bytes actually read.
///
/// The result is less than `buf.len()` only if the stream ended first; that
/// distinction lets callers tell a clean close from a truncated frame.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let received = reader.read(&mut buf[filled..]).await?;
        if received == 0 {
            break;
        }
        filled += received;
    }
    Ok(filled)
}
