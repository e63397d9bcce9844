//! The eight canonical header fields and their fixed widths.
//!
//! Every frame opens with a 6-byte header: CCL identifier byte, message id,
//! time of day, source and destination platform ids, the multimessage and
//! broadcast flags, and two unused bits. Widths sum to exactly
//! `8 × NUM_HEADER_BYTES` and never depend on the message layout.

use crate::bits::BitBuffer;
use crate::value::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub const NUM_HEADER_PARTS: usize = 8;
pub const NUM_HEADER_BYTES: usize = 6;

/// CCL type byte identifying a DCCL-coded frame.
pub const CCL_DCCL_ID: u64 = 0x20;

pub const SECONDS_PER_DAY: i64 = 86_400;

pub const HEAD_CCL_ID_SIZE: usize = 8;
pub const HEAD_DCCL_ID_SIZE: usize = 9;
pub const HEAD_TIME_SIZE: usize = 17;
pub const HEAD_SRC_ID_SIZE: usize = 5;
pub const HEAD_DEST_ID_SIZE: usize = 5;
pub const HEAD_FLAG_SIZE: usize = 1;
pub const HEAD_UNUSED_SIZE: usize = 2;

/// Canonical header parts, in declaration (encode) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    CclId,
    DcclId,
    Time,
    SrcId,
    DestId,
    MultiMessageFlag,
    BroadcastFlag,
    Unused,
}

impl HeaderKind {
    pub const CANONICAL: [HeaderKind; NUM_HEADER_PARTS] = [
        HeaderKind::CclId,
        HeaderKind::DcclId,
        HeaderKind::Time,
        HeaderKind::SrcId,
        HeaderKind::DestId,
        HeaderKind::MultiMessageFlag,
        HeaderKind::BroadcastFlag,
        HeaderKind::Unused,
    ];

    /// Reserved value-map key for this part.
    pub fn var_name(&self) -> &'static str {
        match self {
            HeaderKind::CclId => "_ccl_id",
            HeaderKind::DcclId => "_id",
            HeaderKind::Time => "_time",
            HeaderKind::SrcId => "_src_id",
            HeaderKind::DestId => "_dest_id",
            HeaderKind::MultiMessageFlag => "_multimessage_flag",
            HeaderKind::BroadcastFlag => "_broadcast_flag",
            HeaderKind::Unused => "_unused",
        }
    }

    pub fn calc_size(&self) -> usize {
        match self {
            HeaderKind::CclId => HEAD_CCL_ID_SIZE,
            HeaderKind::DcclId => HEAD_DCCL_ID_SIZE,
            HeaderKind::Time => HEAD_TIME_SIZE,
            HeaderKind::SrcId => HEAD_SRC_ID_SIZE,
            HeaderKind::DestId => HEAD_DEST_ID_SIZE,
            HeaderKind::MultiMessageFlag | HeaderKind::BroadcastFlag => HEAD_FLAG_SIZE,
            HeaderKind::Unused => HEAD_UNUSED_SIZE,
        }
    }

    /// Header parts never reject a value; out-of-width values are masked.
    pub fn encode_element(&self, val: &Value) -> BitBuffer {
        let width = self.calc_size();
        match self {
            HeaderKind::CclId => BitBuffer::from_u64(CCL_DCCL_ID, width),
            HeaderKind::DcclId | HeaderKind::SrcId | HeaderKind::DestId => {
                BitBuffer::from_u64(val.as_i64().unwrap_or(0) as u64, width)
            }
            HeaderKind::Time => {
                let secs = val.as_i64().unwrap_or_else(now_unix_seconds);
                BitBuffer::from_u64(secs.rem_euclid(SECONDS_PER_DAY) as u64, width)
            }
            HeaderKind::MultiMessageFlag | HeaderKind::BroadcastFlag => {
                BitBuffer::from_u64(val.as_bool().unwrap_or(false) as u64, width)
            }
            HeaderKind::Unused => BitBuffer::new(width),
        }
    }

    pub fn decode_element(&self, bits: &BitBuffer) -> Value {
        match self {
            HeaderKind::CclId | HeaderKind::DcclId | HeaderKind::SrcId | HeaderKind::DestId => {
                Value::Int(bits.as_u64() as i64)
            }
            HeaderKind::Time => Value::Int(bits.as_u64() as i64),
            HeaderKind::MultiMessageFlag | HeaderKind::BroadcastFlag => {
                Value::Bool(bits.as_u64() != 0)
            }
            HeaderKind::Unused => Value::Absent,
        }
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_fill_the_header_exactly() {
        let total: usize = HeaderKind::CANONICAL.iter().map(|h| h.calc_size()).sum();
        assert_eq!(total, NUM_HEADER_BYTES * 8);
    }

    #[test]
    fn ccl_id_is_fixed() {
        let bits = HeaderKind::CclId.encode_element(&Value::Absent);
        assert_eq!(bits.as_u64(), CCL_DCCL_ID);
    }

    #[test]
    fn time_wraps_to_second_of_day() {
        // 2026-08-25 00:00:10 UTC
        let bits = HeaderKind::Time.encode_element(&Value::Int(1_787_961_610));
        assert_eq!(bits.as_u64(), 1_787_961_610 % SECONDS_PER_DAY as u64);
    }

    #[test]
    fn src_id_masks_to_width() {
        let bits = HeaderKind::SrcId.encode_element(&Value::Int(0b100_0001));
        assert_eq!(bits.as_u64(), 0b00001);
    }
}
