use log::debug;
use crate::bit_stream::BitRead;
use crate::common::read_size;
use crate::scalar::BitReadExt;
use crate::TinyVgParseError;

/// https://en.wikipedia.org/wiki/File_format#Magic_number
pub const MAGIC: [u8; 2] = [0x72, 0x56];

/// The only format version this decoder accepts.
pub const VERSION: u8 = 1;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorEncoding {
    /// Each color is a 4-tuple (red, green, blue, alpha) of bytes with the color
    /// channels encoded in sRGB and the alpha as linear alpha.
    Rgba8888 = 0,

    /// Each color is encoded as a 3-tuple (red, green, blue) with 16 bit per color.
    /// While red and blue both use 5 bit, the green channel uses 6 bit. The first
    /// byte holds red in its high 5 bits and the upper half of green; the second
    /// byte holds the lower half of green and blue.
    Rgb565 = 1,

    /// Each color is a 4-tuple (red, green ,blue, alpha) of binary32 IEEE 754
    /// floating point value with the color channels encoded in scRGB and the
    /// alpha as linear alpha. A color value of 1.0 is full intensity, while a value of
    /// 0.0 is zero intensity.
    RgbaF32 = 2,

    /// The custom color encoding is defined undefined. The information how these
    /// colors are encoded must be implemented via external means.
    Custom = 3
}

impl ColorEncoding {
    /// Decodes a 2-bit field; every value is a known encoding.
    fn from_bits(value: u8) -> ColorEncoding {
        match value & 0b11 {
            0 => ColorEncoding::Rgba8888,
            1 => ColorEncoding::Rgb565,
            2 => ColorEncoding::RgbaF32,
            _ => ColorEncoding::Custom,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinateRange {
    /// Each Unit takes up 16 bit.
    Default = 0,

    /// Each Unit takes up 8 bit.
    Reduced = 1,

    /// Each Unit takes up 32 bit.
    Enhanced = 2,
}

impl TryFrom<u8> for CoordinateRange {
    type Error = TinyVgParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CoordinateRange::Default),
            1 => Ok(CoordinateRange::Reduced),
            2 => Ok(CoordinateRange::Enhanced),
            other => Err(TinyVgParseError::InvalidCoordinateRange(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TinyVgHeader {
    /// The TinyVG version.
    pub version: u8,

    /// Defines the number of fraction bits in a Unit value.
    pub fraction_bits: u8,

    /// Defines the type of color information that is used in the color table.
    pub color_encoding: ColorEncoding,

    /// Defines the number of total bits in a Unit value and thus the overall
    /// precision of the file.
    pub coordinate_range: CoordinateRange,

    /// Encodes the maximum width of the output file in display units.
    /// A value of 0 indicates that the image has the maximum possible
    /// width.
    pub width: u32,

    /// Encodes the maximum height of the output file in display units.
    /// A value of 0 indicates that the image has the maximum possible
    /// height.
    pub height: u32,

    /// The number of colors in the color table.
    pub color_count: u64,
}

impl TinyVgHeader {
    pub(crate) fn parse<R: BitRead + ?Sized>(reader: &mut R) -> Result<Self, TinyVgParseError> {
        let magic = [reader.read_u8()?, reader.read_u8()?];
        if magic != MAGIC {
            return Err(TinyVgParseError::InvalidMagic(magic));
        }

        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(TinyVgParseError::UnsupportedVersion(version));
        }

        // The packed byte is read field by field, most significant bit first:
        // coordinate range, color encoding, then fraction bits. Everything
        // after it is sized by these three values.
        let coordinate_range = CoordinateRange::try_from(reader.read_tiny_int(2)?)?;
        let color_encoding = ColorEncoding::from_bits(reader.read_tiny_int(2)?);
        let fraction_bits = reader.read_tiny_int(4)?;

        let width = read_size(coordinate_range, reader)?;
        let height = read_size(coordinate_range, reader)?;

        let color_count = reader.read_var_uint()?;

        debug!(
            "header: {width}x{height}, {coordinate_range:?} range, {color_encoding:?} colors, {fraction_bits} fraction bits, {color_count} palette entries"
        );

        Ok(TinyVgHeader {
            version,
            fraction_bits,
            color_encoding,
            coordinate_range,
            width,
            height,
            color_count,
        })
    }
}
