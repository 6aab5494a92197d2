use crate::bit_stream::BitRead;
use crate::header::{CoordinateRange, TinyVgHeader};
use crate::scalar::BitReadExt;
use crate::TinyVgParseError;

/// A document-scaled coordinate: the raw integer times `2^-fraction_bits`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Unit(pub f64);

/// Unit may be 8, 16, or 32 bits, so we will advance the stream conditionally.
pub(crate) fn read_size<R: BitRead + ?Sized>(coordinate_range: CoordinateRange, reader: &mut R) -> Result<u32, TinyVgParseError> {
    let res = match coordinate_range {
        CoordinateRange::Reduced  => u32::from(reader.read_u8()?),
        CoordinateRange::Default  => u32::from(reader.read_u16()?),
        CoordinateRange::Enhanced => reader.read_u32()?,
    };
    Ok(res)
}

/// The document-wide parameters every coordinate read depends on. Built once
/// from the header, then shared by all command and path decoding.
#[derive(Debug, Copy, Clone)]
pub(crate) struct UnitFormat {
    coordinate_range: CoordinateRange,
    scale: f64,
}

impl UnitFormat {
    pub(crate) fn new(coordinate_range: CoordinateRange, fraction_bits: u8) -> Self {
        let scale = 1.0 / f64::from(1u32 << fraction_bits);
        Self { coordinate_range, scale }
    }

    pub(crate) fn from_header(header: &TinyVgHeader) -> Self {
        Self::new(header.coordinate_range, header.fraction_bits)
    }

    /// Units are two's complement at the coordinate range's width.
    pub(crate) fn read_unit<R: BitRead + ?Sized>(&self, reader: &mut R) -> Result<Unit, TinyVgParseError> {
        let raw = match self.coordinate_range {
            CoordinateRange::Reduced  => i64::from(reader.read_u8()? as i8),
            CoordinateRange::Default  => i64::from(reader.read_u16()? as i16),
            CoordinateRange::Enhanced => i64::from(reader.read_u32()? as i32),
        };
        Ok(Unit(raw as f64 * self.scale))
    }

    pub(crate) fn read_point<R: BitRead + ?Sized>(&self, reader: &mut R) -> Result<Point, TinyVgParseError> {
        let x = self.read_unit(reader)?;
        let y = self.read_unit(reader)?;
        Ok(Point { x, y })
    }

    pub(crate) fn read_rectangle<R: BitRead + ?Sized>(&self, reader: &mut R) -> Result<Rectangle, TinyVgParseError> {
        let x = self.read_unit(reader)?;
        let y = self.read_unit(reader)?;
        let width = self.read_unit(reader)?;
        let height = self.read_unit(reader)?;
        Ok(Rectangle { x, y, width, height })
    }

    pub(crate) fn read_line<R: BitRead + ?Sized>(&self, reader: &mut R) -> Result<Line, TinyVgParseError> {
        let start = self.read_point(reader)?;
        let end = self.read_point(reader)?;
        Ok(Line { start, end })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: Unit,
    pub y: Unit,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    /// Horizontal distance of the left side to the origin.
    pub x: Unit,
    /// Vertical distance of the upper side to the origin.
    pub y: Unit,
    /// Horizontal extent of the rectangle.
    pub width: Unit,
    /// Vertical extent of the rectangle.
    pub height: Unit,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Line {
    /// Start point of the line
    pub start: Point,
    /// End point of the line.
    pub end: Point,
}
