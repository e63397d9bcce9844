//! Fixed-width bit buffer with shift-accumulate packing.
//!
//! Fields are packed by left-shifting the whole buffer by the element width
//! and OR-ing the element's bits into the freed low positions; unpacking
//! reads the low bits and right-shifts them away. Rendering to a byte string
//! is most-significant byte first.

use byteorder::{ByteOrder, LittleEndian};

/// A bit buffer of fixed conceptual width. Bits shifted past the width are
/// dropped, so the width set at construction bounds the whole packing run.
///
/// Storage is least-significant byte first; [`BitBuffer::to_bytes`] reverses
/// into wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer {
    bits: usize,
    data: Vec<u8>,
}

impl BitBuffer {
    /// A zeroed buffer `bits` wide.
    pub fn new(bits: usize) -> Self {
        BitBuffer {
            bits,
            data: vec![0; bits.div_ceil(8)],
        }
    }

    /// Build from a wire byte string (most-significant byte first).
    /// Width is `8 × bytes.len()`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut data: Vec<u8> = bytes.to_vec();
        data.reverse();
        BitBuffer {
            bits: bytes.len() * 8,
            data,
        }
    }

    /// The low `width` bits of `value`.
    pub fn from_u64(value: u64, width: usize) -> Self {
        let mut scratch = [0u8; 8];
        LittleEndian::write_u64(&mut scratch, value);
        let mut buf = BitBuffer {
            bits: width,
            data: scratch[..width.div_ceil(8).min(8)].to_vec(),
        };
        buf.data.resize(width.div_ceil(8), 0);
        buf.mask_top();
        buf
    }

    pub fn len(&self) -> usize {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Render to a wire byte string, most-significant byte first, width
    /// rounded up to whole bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        out.reverse();
        out
    }

    /// The low 64 bits as an integer.
    pub fn as_u64(&self) -> u64 {
        let mut scratch = [0u8; 8];
        let n = self.data.len().min(8);
        scratch[..n].copy_from_slice(&self.data[..n]);
        LittleEndian::read_u64(&scratch)
    }

    /// Shift toward the most-significant end, dropping overflow.
    pub fn shl(&mut self, n: usize) {
        if n == 0 || self.data.is_empty() {
            return;
        }
        let byte_shift = n / 8;
        let bit_shift = (n % 8) as u32;
        let len = self.data.len();
        for i in (0..len).rev() {
            let mut v = 0u8;
            if i >= byte_shift {
                v = self.data[i - byte_shift] << bit_shift;
                if bit_shift > 0 && i > byte_shift {
                    v |= self.data[i - byte_shift - 1] >> (8 - bit_shift);
                }
            }
            self.data[i] = v;
        }
        self.mask_top();
    }

    /// Shift toward the least-significant end.
    pub fn shr(&mut self, n: usize) {
        if n == 0 || self.data.is_empty() {
            return;
        }
        let byte_shift = n / 8;
        let bit_shift = (n % 8) as u32;
        let len = self.data.len();
        for i in 0..len {
            let mut v = 0u8;
            if i + byte_shift < len {
                v = self.data[i + byte_shift] >> bit_shift;
                if bit_shift > 0 && i + byte_shift + 1 < len {
                    v |= self.data[i + byte_shift + 1] << (8 - bit_shift);
                }
            }
            self.data[i] = v;
        }
    }

    /// OR another buffer into the low bits. The other buffer's width must not
    /// exceed this one's; excess bytes are ignored.
    pub fn or_low(&mut self, other: &BitBuffer) {
        for (i, b) in other.data.iter().enumerate() {
            if i < self.data.len() {
                self.data[i] |= b;
            }
        }
        self.mask_top();
    }

    /// Copy of the low `n` bits as an `n`-wide buffer.
    pub fn low_bits(&self, n: usize) -> BitBuffer {
        let mut data = self.data.clone();
        data.resize(n.div_ceil(8), 0);
        let mut buf = BitBuffer { bits: n, data };
        buf.mask_top();
        buf
    }

    fn mask_top(&mut self) {
        let rem = self.bits % 8;
        if rem != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u8 << rem) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_accumulate_orders_msb_first() {
        // three 8-bit elements appended 10, 20, 5: wire order 0x0A 0x14 0x05
        let mut bits = BitBuffer::new(24);
        for v in [10u64, 20, 5] {
            bits.shl(8);
            bits.or_low(&BitBuffer::from_u64(v, 8));
        }
        assert_eq!(bits.to_bytes(), vec![0x0a, 0x14, 0x05]);
    }

    #[test]
    fn low_bits_and_shr_unwind_encode() {
        let mut bits = BitBuffer::new(12);
        bits.shl(5);
        bits.or_low(&BitBuffer::from_u64(0b10110, 5));
        bits.shl(7);
        bits.or_low(&BitBuffer::from_u64(0b0011001, 7));

        assert_eq!(bits.low_bits(7).as_u64(), 0b0011001);
        bits.shr(7);
        assert_eq!(bits.low_bits(5).as_u64(), 0b10110);
    }

    #[test]
    fn overflow_past_width_is_dropped() {
        let mut bits = BitBuffer::new(8);
        bits.or_low(&BitBuffer::from_u64(0xff, 8));
        bits.shl(4);
        assert_eq!(bits.as_u64(), 0xf0);
    }

    #[test]
    fn byte_round_trip() {
        let raw = [0x12u8, 0x34, 0x56];
        let bits = BitBuffer::from_bytes(&raw);
        assert_eq!(bits.len(), 24);
        assert_eq!(bits.to_bytes(), raw);
        assert_eq!(bits.as_u64(), 0x123456);
    }

    #[test]
    fn zero_width_buffer_is_inert() {
        let mut bits = BitBuffer::new(0);
        bits.shl(0);
        bits.or_low(&BitBuffer::new(0));
        assert!(bits.to_bytes().is_empty());
    }
}
