//! On-disk encoding of a store [`Snapshot`].
//!
//! Wire format: `[4-byte magic "PDSK"][u32 length (LE)][postcard payload]`.
//! The magic guards against loading an unrelated file; the length prefix
//! detects truncated writes.

use crate::document::Snapshot;

/// Magic bytes at the start of every snapshot file.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"PDSK";

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 4;

/// Error type for snapshot encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Header is missing, has the wrong magic, or the length does not match.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Encodes a [`Snapshot`] into a framed byte vector.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized,
/// or `CodecError::InvalidFrame` if the payload exceeds `u32::MAX` bytes.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    let payload =
        postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let len = u32::try_from(payload.len()).map_err(|_| {
        CodecError::InvalidFrame(format!(
            "snapshot too large for framing: {} bytes",
            payload.len()
        ))
    })?;
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&SNAPSHOT_MAGIC);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes a framed snapshot produced by [`encode_snapshot`].
///
/// # Errors
///
/// Returns `CodecError::InvalidFrame` if the header is short, the magic is
/// wrong, or the length prefix disagrees with the data; returns
/// `CodecError::Serialization` if the payload cannot be deserialized.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::InvalidFrame(format!(
            "need at least {HEADER_LEN} header bytes, got {}",
            bytes.len()
        )));
    }
    let (magic, rest) = bytes.split_at(SNAPSHOT_MAGIC.len());
    if magic != SNAPSHOT_MAGIC {
        return Err(CodecError::InvalidFrame("bad magic".to_string()));
    }
    let (len_bytes, payload) = rest.split_at(4);
    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(len_bytes);
    let len = u32::from_le_bytes(len_buf) as usize;
    if payload.len() != len {
        return Err(CodecError::InvalidFrame(format!(
            "length prefix says {len} bytes, found {}",
            payload.len()
        )));
    }
    postcard::from_bytes(payload).map_err(|e| CodecError::Serialization(e.to_string()))
}
