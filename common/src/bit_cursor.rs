use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitCursorError {
    #[error("read past the end of the buffer at bit {position} (buffer holds {len} bits)")]
    OutOfRange { position: usize, len: usize },

    #[error("exp-golomb code has more than {leading_zeros} leading zero bits")]
    MalformedGolombCode { leading_zeros: u32 },

    #[error("fixed-width reads are limited to 32 bits, requested {0}")]
    UnsupportedWidth(u32),
}

/// `BitCursor` reads the syntax elements of an `RBSP` bit by bit, most significant bit first.
///
/// `bit_position` never exceeds `8 * data.len()`. Reads that would cross the end of `data` fail
/// with `BitCursorError::OutOfRange` and leave the position unchanged.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    bit_position: usize,
}

impl<'a> BitCursor<'a> {
    /// Longest run of leading zero bits accepted by `read_exp_golomb`.
    pub const MAX_GOLOMB_LEADING_ZEROS: u32 = 32;

    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.bit_position
    }

    pub fn len_bits(&self) -> usize {
        self.data.len() * 8
    }

    pub fn bits_remaining(&self) -> usize {
        self.len_bits() - self.bit_position
    }

    pub fn is_exhausted(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// u(1)
    pub fn read_bit(&mut self) -> Result<bool, BitCursorError> {
        if self.bit_position >= self.len_bits() {
            return Err(self.out_of_range());
        }

        let byte = self.data[self.bit_position / 8];
        let bit = (byte >> (7 - self.bit_position % 8)) & 1;
        self.bit_position += 1;

        Ok(bit == 1)
    }

    /// u(n) for `width` in `0..=32`. A zero width yields 0 without consuming anything.
    pub fn read_unsigned(&mut self, width: u32) -> Result<u32, BitCursorError> {
        if width > 32 {
            return Err(BitCursorError::UnsupportedWidth(width));
        }
        if self.bits_remaining() < width as usize {
            return Err(self.out_of_range());
        }

        let mut value = 0u64;
        for _ in 0..width {
            value = (value << 1) | self.read_bit()? as u64;
        }

        Ok(value as u32)
    }

    /// ue(v), ITU-T H.264 9.1.
    ///
    /// `leadingZeroBits` is bounded by `MAX_GOLOMB_LEADING_ZEROS`, which also keeps
    /// `2^leadingZeroBits - 1 + read_bits(leadingZeroBits)` within a `u64`.
    pub fn read_exp_golomb(&mut self) -> Result<u64, BitCursorError> {
        let mut leading_zeros = 0u32;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > Self::MAX_GOLOMB_LEADING_ZEROS {
                return Err(BitCursorError::MalformedGolombCode {
                    leading_zeros: Self::MAX_GOLOMB_LEADING_ZEROS,
                });
            }
        }

        let suffix = self.read_unsigned(leading_zeros)? as u64;
        Ok((1u64 << leading_zeros) - 1 + suffix)
    }

    fn out_of_range(&self) -> BitCursorError {
        BitCursorError::OutOfRange {
            position: self.bit_position,
            len: self.len_bits(),
        }
    }
}
