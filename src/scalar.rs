use std::io::{self, Write};
use byteorder::{ByteOrder, LittleEndian};
use crate::bit_stream::{BitRead, BitWriter};
use crate::TinyVgParseError;

/// Fixed and variable width scalar reads on top of a [`BitRead`].
///
/// Byte sized values go through [`BitRead::read_byte_unaligned`] and are
/// little-endian. Tag sized values go through [`BitRead::read_bit`] and are
/// most significant bit first.
pub trait BitReadExt: BitRead {
    /// Reads an integer narrower than a byte.
    fn read_tiny_int(&mut self, bits: u8) -> Result<u8, TinyVgParseError> {
        debug_assert!(bits > 0 && bits < 8, "tiny ints are 1 to 7 bits wide");
        let mut accum = 0u8;
        for _ in 0..bits {
            accum = (accum << 1) | self.read_bit()?;
        }
        Ok(accum)
    }

    fn read_u8(&mut self) -> Result<u8, TinyVgParseError> {
        self.read_byte_unaligned()
    }

    fn read_u16(&mut self) -> Result<u16, TinyVgParseError> {
        let mut buf = [0u8; 2];
        self.read_bytes(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn read_u32(&mut self) -> Result<u32, TinyVgParseError> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// Reads a binary32 IEEE 754 value by reinterpreting its bit pattern.
    fn read_f32(&mut self) -> Result<f32, TinyVgParseError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Page 4, VarUInt.
    /// Seven bits per byte, least significant group first, high bit set while
    /// more bytes follow. Bits beyond 64 are dropped.
    fn read_var_uint(&mut self) -> Result<u64, TinyVgParseError> {
        let mut shift = 0u32;
        let mut result = 0u64;
        while shift < 64 {
            let byte = self.read_byte_unaligned()?;
            result |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(result)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), TinyVgParseError> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte_unaligned()?;
        }
        Ok(())
    }
}

impl<R: BitRead + ?Sized> BitReadExt for R {}

impl<W: Write> BitWriter<W> {
    /// Writes the low `bits` bits of `value`, most significant first.
    pub fn write_tiny_int(&mut self, value: u8, bits: u8) -> io::Result<()> {
        debug_assert!(bits > 0 && bits < 8, "tiny ints are 1 to 7 bits wide");
        for shift in (0..bits).rev() {
            self.write_bit((value >> shift) & 1 != 0)?;
        }
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_byte_unaligned(value)
    }

    pub fn write_u16(&mut self, value: u16) -> io::Result<()> {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.write_bytes(&buf)
    }

    pub fn write_u32(&mut self, value: u32) -> io::Result<()> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write_bytes(&buf)
    }

    pub fn write_f32(&mut self, value: f32) -> io::Result<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_var_uint(&mut self, mut value: u64) -> io::Result<()> {
        loop {
            let chunk = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                return self.write_byte_unaligned(chunk);
            }
            self.write_byte_unaligned(chunk | 0x80)?;
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        for &byte in bytes {
            self.write_byte_unaligned(byte)?;
        }
        Ok(())
    }
}
