//! Framing between daemons: length-prefix (4 bytes LE) + bincode `Frame`.

use serde::{Deserialize, Serialize};

const LEN_SIZE: usize = 4;
const MAX_FRAME_LEN: u32 = 1024 * 1024; // 1 MiB

/// One delivered message: sender node id, channel path, opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: String,
    pub path: String,
    pub payload: Vec<u8>,
}

/// Encode a frame: 4 bytes LE length + bincode body.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>, FrameEncodeError> {
    let body = bincode::serialize(frame).map_err(FrameEncodeError::Encode)?;
    let len = body.len() as u32;
    if len > MAX_FRAME_LEN {
        return Err(FrameEncodeError::TooLarge);
    }
    let mut out = Vec::with_capacity(LEN_SIZE + body.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("frame too large")]
    TooLarge,
}

/// Body length announced by a 4-byte header, checked against the limit.
fn frame_len(header: [u8; LEN_SIZE]) -> Result<usize, FrameDecodeError> {
    let len = u32::from_le_bytes(header);
    if len > MAX_FRAME_LEN {
        return Err(FrameDecodeError::TooLarge);
    }
    Ok(len as usize)
}

/// Decode one frame from the front of `bytes`. Returns the frame and bytes consumed.
pub fn decode_frame(bytes: &[u8]) -> Result<(Frame, usize), FrameDecodeError> {
    if bytes.len() < LEN_SIZE {
        return Err(FrameDecodeError::NeedMore);
    }
    let len = frame_len([bytes[0], bytes[1], bytes[2], bytes[3]])?;
    if bytes.len() < LEN_SIZE + len {
        return Err(FrameDecodeError::NeedMore);
    }
    let frame = decode_body(&bytes[LEN_SIZE..LEN_SIZE + len])?;
    Ok((frame, LEN_SIZE + len))
}

fn decode_body(body: &[u8]) -> Result<Frame, FrameDecodeError> {
    bincode::deserialize(body).map_err(FrameDecodeError::Decode)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("need more bytes")]
    NeedMore,
    #[error("frame too large")]
    TooLarge,
    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),
}
