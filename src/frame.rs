//! Whole-frame convenience: `header_bytes ∥ body_bytes` in one call.
//!
//! The header is always exactly [`NUM_HEADER_BYTES`](crate::header::NUM_HEADER_BYTES)
//! long; the body may arrive shorter than the configured size because the
//! encoder strips trailing zero bytes, and is zero-padded back before decode.

use crate::algorithm::AlgorithmRegistry;
use crate::error::CodecError;
use crate::header::NUM_HEADER_BYTES;
use crate::message::Message;
use crate::value::ValueMap;

/// Encode header and body into one frame.
pub fn encode_frame(
    msg: &Message,
    vals: &mut ValueMap,
    algorithms: &AlgorithmRegistry,
) -> Result<Vec<u8>, CodecError> {
    let mut frame = msg.head_encode(vals, algorithms)?;
    frame.extend(msg.body_encode(vals, algorithms)?);
    Ok(frame)
}

/// Decode one frame into a single value mapping (header keys are the
/// reserved underscore names). The frame must at least cover the header.
pub fn decode_frame(msg: &Message, frame: &[u8]) -> Result<ValueMap, CodecError> {
    if frame.len() < NUM_HEADER_BYTES {
        return Err(CodecError::ShortFrame {
            got: frame.len(),
            need: NUM_HEADER_BYTES,
        });
    }
    let (head, body) = frame.split_at(NUM_HEADER_BYTES);
    let mut out = msg.head_decode(head)?;
    out.extend(msg.body_decode(body)?);
    Ok(out)
}
