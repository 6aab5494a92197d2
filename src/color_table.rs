use log::debug;
use crate::bit_stream::BitRead;
use crate::header::{ColorEncoding, TinyVgHeader};
use crate::scalar::BitReadExt;
use crate::{DecodeOptions, TinyVgParseError};

/// A color with every channel nominally in `0.0..=1.0`. Decoding never
/// clamps, so float encoded colors may fall outside that range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl Color {
    pub const BLACK: Color = Color { red: 0.0, green: 0.0, blue: 0.0, alpha: 1.0 };

    pub fn from_rgba8888(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color {
            red: f32::from(red) / 255.0,
            green: f32::from(green) / 255.0,
            blue: f32::from(blue) / 255.0,
            alpha: f32::from(alpha) / 255.0,
        }
    }

    /// `left` is the first byte on the wire: red in its high 5 bits, then the
    /// top 3 bits of green. `right` holds the low 3 bits of green, then blue.
    pub fn from_rgb565(left: u8, right: u8) -> Self {
        let red = (left >> 3) & 0x1F;
        let green = ((left & 0x07) << 3) | ((right >> 5) & 0x07);
        let blue = right & 0x1F;
        Color {
            red: f32::from(red) / 31.0,
            green: f32::from(green) / 63.0,
            blue: f32::from(blue) / 31.0,
            alpha: 1.0,
        }
    }
}

/// The document palette. Its length is fixed when it is created, after which
/// entries can only be replaced in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    colors: Option<Vec<Color>>,
}

impl ColorTable {
    /// Creates `count` entries, all [`Color::BLACK`]. Fails if the table was
    /// already created.
    pub fn create(&mut self, count: usize) -> Result<(), TinyVgParseError> {
        if self.colors.is_some() {
            return Err(TinyVgParseError::ColorTableAlreadyInitialized);
        }
        self.colors = Some(vec![Color::BLACK; count]);
        Ok(())
    }

    pub fn set(&mut self, index: u64, color: Color) -> Result<(), TinyVgParseError> {
        let len = self.len();
        let slot = match (&mut self.colors, usize::try_from(index)) {
            (Some(colors), Ok(i)) => colors.get_mut(i),
            _ => None,
        };
        match slot {
            Some(slot) => {
                *slot = color;
                Ok(())
            }
            None => Err(TinyVgParseError::ColorIndexOutOfRange { index, len }),
        }
    }

    pub fn get(&self, index: u64) -> Option<&Color> {
        usize::try_from(index).ok().and_then(|i| self.as_slice().get(i))
    }

    pub fn is_initialized(&self) -> bool {
        self.colors.is_some()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &[Color] {
        self.colors.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Color> {
        self.as_slice().iter()
    }
}

fn read_rgba8888<R: BitRead + ?Sized>(reader: &mut R) -> Result<Color, TinyVgParseError> {
    let r = reader.read_u8()?;
    let g = reader.read_u8()?;
    let b = reader.read_u8()?;
    let a = reader.read_u8()?;
    Ok(Color::from_rgba8888(r, g, b, a))
}

fn read_rgb565<R: BitRead + ?Sized>(reader: &mut R) -> Result<Color, TinyVgParseError> {
    let left = reader.read_u8()?;
    let right = reader.read_u8()?;
    Ok(Color::from_rgb565(left, right))
}

fn read_rgba_f32<R: BitRead + ?Sized>(reader: &mut R) -> Result<Color, TinyVgParseError> {
    let red = reader.read_f32()?;
    let green = reader.read_f32()?;
    let blue = reader.read_f32()?;
    let alpha = reader.read_f32()?;
    Ok(Color { red, green, blue, alpha })
}

/// Fills `table` with the header's `color_count` entries.
pub(crate) fn parse_color_table<R: BitRead + ?Sized>(
    reader: &mut R,
    header: &TinyVgHeader,
    options: &DecodeOptions,
    table: &mut ColorTable,
) -> Result<(), TinyVgParseError> {
    let count = options.check_count(header.color_count)?;
    table.create(count)?;

    let read_color: fn(&mut R) -> Result<Color, TinyVgParseError> = match header.color_encoding {
        ColorEncoding::Rgba8888 => read_rgba8888::<R>,
        ColorEncoding::Rgb565 => read_rgb565::<R>,
        ColorEncoding::RgbaF32 => read_rgba_f32::<R>,
        ColorEncoding::Custom => return Err(TinyVgParseError::UnsupportedColorEncoding),
    };

    for index in 0..header.color_count {
        table.set(index, read_color(reader)?)?;
    }

    debug!("color table: {} entries", table.len());
    Ok(())
}
