//! Bitstream reading for header parsing.
//!
//! Wraps the `bitstream-io` big-endian reader with explicit bounds so that a
//! read past the end of the buffer fails before any bits are consumed.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::utils::errors::ReaderError;

/// Widest field a single [`BsIoSliceReader::get_n`] call may return.
pub const MAX_READ_BITS: u32 = 32;

#[derive(Debug)]
pub struct BsIoSliceReader<'a> {
    bs: BitReader<io::Cursor<&'a [u8]>, BigEndian>,
    len: u64,
    pos: u64,
}

impl<'a> BsIoSliceReader<'a> {
    /// Creates a reader whose first bit is the MSB of `buf[start]`.
    ///
    /// `start` must lie strictly inside `buf`.
    pub fn new(buf: &'a [u8], start: usize) -> Result<Self, ReaderError> {
        if start >= buf.len() {
            return Err(ReaderError::StartOutOfRange {
                start,
                len: buf.len(),
            });
        }

        let slice = &buf[start..];

        Ok(Self {
            bs: BitReader::endian(io::Cursor::new(slice), BigEndian),
            len: (slice.len() as u64) << 3,
            pos: 0,
        })
    }

    pub fn from_slice(buf: &'a [u8]) -> Result<Self, ReaderError> {
        Self::new(buf, 0)
    }

    /// Reads the next `n` bits, MSB first.
    #[inline(always)]
    pub fn get_n(&mut self, n: u32) -> Result<u32, ReaderError> {
        if n > MAX_READ_BITS {
            return Err(ReaderError::WidthTooLarge(n));
        }

        self.ensure_available(n)?;

        if n == 0 {
            return Ok(0);
        }

        let value = self.bs.read_unsigned_var::<u32>(n)?;
        self.pos += n as u64;

        Ok(value)
    }

    #[inline(always)]
    pub fn get(&mut self) -> Result<bool, ReaderError> {
        Ok(self.get_n(1)? != 0)
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> Result<(), ReaderError> {
        self.ensure_available(n)?;

        if n > 0 {
            self.bs.skip(n)?;
            self.pos += n as u64;
        }

        Ok(())
    }

    #[inline(always)]
    pub fn available(&self) -> u64 {
        self.len - self.pos
    }

    /// Bits consumed since the start offset.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn ensure_available(&self, n: u32) -> Result<(), ReaderError> {
        let available = self.available();
        if n as u64 > available {
            return Err(ReaderError::Overrun {
                requested: n,
                available,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_msb_first_across_bytes() -> Result<(), ReaderError> {
        let data = [0b1010_1100, 0b0101_1111, 0xA5];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        assert_eq!(reader.get_n(3)?, 0b101);
        assert_eq!(reader.get_n(9)?, 0b0_1100_0101);
        assert!(reader.get()?);
        assert_eq!(reader.position(), 13);
        assert_eq!(reader.get_n(11)?, 0b111_1010_0101);
        assert_eq!(reader.available(), 0);

        Ok(())
    }

    #[test]
    fn starts_at_byte_offset() -> Result<(), ReaderError> {
        let data = [0x00, 0xFF, 0xF2];
        let mut reader = BsIoSliceReader::new(&data, 1)?;

        assert_eq!(reader.get_n(12)?, 0xFFF);
        assert_eq!(reader.get_n(4)?, 2);

        Ok(())
    }

    #[test]
    fn rejects_start_outside_buffer() {
        let data = [0u8; 4];

        assert!(matches!(
            BsIoSliceReader::new(&data, 4),
            Err(ReaderError::StartOutOfRange { start: 4, len: 4 })
        ));
        assert!(matches!(
            BsIoSliceReader::new(&[], 0),
            Err(ReaderError::StartOutOfRange { start: 0, len: 0 })
        ));
    }

    #[test]
    fn overrun_does_not_advance() -> Result<(), ReaderError> {
        let data = [0xF0];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        reader.skip_n(4)?;
        assert!(matches!(
            reader.get_n(5),
            Err(ReaderError::Overrun {
                requested: 5,
                available: 4
            })
        ));
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.get_n(4)?, 0);
        assert_eq!(reader.get_n(0)?, 0);

        Ok(())
    }

    #[test]
    fn rejects_wide_reads() -> Result<(), ReaderError> {
        let data = [0u8; 8];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        assert!(matches!(reader.get_n(33), Err(ReaderError::WidthTooLarge(33))));
        assert_eq!(reader.get_n(32)?, 0);

        Ok(())
    }
}
