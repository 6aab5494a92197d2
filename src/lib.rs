//! Decodes binary TinyVG files into Rust data structures.
//!
//! The format packs fields at bit granularity, so decoding runs on a
//! [`BitStream`] rather than a byte cursor. A stream hands out a bounded
//! number of zero bits after its data ends (the run-out), which lets a
//! trailing end of document tag be read from inputs cut short right before it,
//! while still stopping malformed inputs that never reach one.
//!
//! ```
//! use tinyvg_decoder::TinyVg;
//!
//! let bytes = [0x72, 0x56, 0x01, 0b01_00_0000, 0x18, 0x18, 0x00, 0x00];
//! let tvg = TinyVg::from_bytes(&bytes).unwrap();
//! assert_eq!((tvg.header.width, tvg.header.height), (24, 24));
//! ```

pub mod bit_stream;
pub mod scalar;
pub mod header;
pub mod common;
pub mod color_table;
pub mod commands;
pub mod path;

use std::io::{Read, Seek};
use thiserror::Error;
use crate::bit_stream::{BitRead, BitStream};
use crate::color_table::{parse_color_table, ColorTable};
use crate::commands::{parse_draw_commands, Command};
use crate::common::UnitFormat;
use crate::header::TinyVgHeader;

pub use crate::bit_stream::{BitWriter, ByteSource, SeekSource, SliceSource};
pub use crate::scalar::BitReadExt;

#[derive(Debug, Error)]
pub enum TinyVgParseError {
    #[error("not a valid TinyVG document: magic bytes {0:02x?}")]
    InvalidMagic([u8; 2]),
    #[error("unsupported TinyVG version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid coordinate range {0}")]
    InvalidCoordinateRange(u8),
    #[error("custom color encoding is not supported")]
    UnsupportedColorEncoding,
    #[error("invalid style type {0}")]
    InvalidStyleType(u8),
    #[error("invalid command index {0}")]
    InvalidCommand(u8),
    #[error("reserved bits in {field} must be zero, found {value:#b}")]
    NonZeroPadding { field: &'static str, value: u8 },
    #[error("color table has already been initialized")]
    ColorTableAlreadyInitialized,
    #[error("color index {index} is outside of a color table with {len} entries")]
    ColorIndexOutOfRange { index: u64, len: usize },
    #[error("count {count} exceeds the limit of {limit}")]
    CountTooLarge { count: u64, limit: u64 },
    #[error("end of input stream")]
    EndOfStream,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run-out budget used when none is given: exactly one command tag.
pub const DEFAULT_RUN_OUT_BITS: usize = 8;

/// Largest collection the decoder accepts unless told otherwise.
pub const DEFAULT_MAX_COUNT: u64 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Zero bits made available after the input ends.
    pub run_out_bits: usize,

    /// Upper bound for every decoded count: palette size, points, lines,
    /// rectangles, path segments and instructions per segment. Reads past the
    /// end of the input produce zeros rather than errors, so this is what
    /// bounds memory for hostile inputs.
    pub max_count: u64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            run_out_bits: DEFAULT_RUN_OUT_BITS,
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}

impl DecodeOptions {
    pub(crate) fn check_count(&self, count: u64) -> Result<usize, TinyVgParseError> {
        let too_large = TinyVgParseError::CountTooLarge { count, limit: self.max_count };
        if count > self.max_count {
            return Err(too_large);
        }
        usize::try_from(count).map_err(|_| too_large)
    }
}

/// A decoded document.
#[derive(Debug, Clone, PartialEq)]
pub struct TinyVg {
    pub header: TinyVgHeader,
    pub color_table: ColorTable,
    /// Every command in file order. The last one is always
    /// [`commands::DrawCommand::EndOfDocument`].
    pub draw_commands: Vec<Command>
}

impl TinyVg {

    pub fn from_bytes(data: &[u8]) -> Result<TinyVg, TinyVgParseError> {
        Self::from_bytes_with_options(data, &DecodeOptions::default())
    }

    pub fn from_bytes_with_options(data: &[u8], options: &DecodeOptions) -> Result<TinyVg, TinyVgParseError> {
        let mut stream = BitStream::from_slice(data, options.run_out_bits);
        Self::decode(&mut stream, options)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<TinyVg, TinyVgParseError> {
        Self::from_reader_with_options(reader, &DecodeOptions::default())
    }

    pub fn from_reader_with_options<R: Read + Seek>(reader: R, options: &DecodeOptions) -> Result<TinyVg, TinyVgParseError> {
        let mut stream = BitStream::from_reader(reader, options.run_out_bits);
        Self::decode(&mut stream, options)
    }

    /// Decodes from a stream the caller set up. The stream's own run-out
    /// budget applies; `options.run_out_bits` is not consulted. On error
    /// nothing is kept; rewind the stream to try again.
    pub fn decode<R: BitRead + ?Sized>(reader: &mut R, options: &DecodeOptions) -> Result<TinyVg, TinyVgParseError> {
        let header = TinyVgHeader::parse(reader)?;

        let mut color_table = ColorTable::default();
        parse_color_table(reader, &header, options, &mut color_table)?;

        let format = UnitFormat::from_header(&header);
        let draw_commands = parse_draw_commands(reader, &format, options)?;

        Ok(TinyVg {
            header,
            color_table,
            draw_commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_count_respects_limit() {
        let options = DecodeOptions { run_out_bits: 8, max_count: 4 };
        assert_eq!(options.check_count(4).unwrap(), 4);
        assert!(matches!(
            options.check_count(5),
            Err(TinyVgParseError::CountTooLarge { count: 5, limit: 4 })
        ));
    }

    #[test]
    fn error_messages_name_the_problem() {
        assert_eq!(
            TinyVgParseError::InvalidMagic([0x00, 0x01]).to_string(),
            "not a valid TinyVG document: magic bytes [00, 01]"
        );
        assert_eq!(
            TinyVgParseError::NonZeroPadding { field: "arc flags", value: 4 }.to_string(),
            "reserved bits in arc flags must be zero, found 0b100"
        );
    }
}
