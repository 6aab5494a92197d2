use log::{debug, trace};
use crate::bit_stream::BitRead;
use crate::common::{Line, Point, Rectangle, Unit, UnitFormat};
use crate::path::Path;
use crate::scalar::BitReadExt;
use crate::{DecodeOptions, TinyVgParseError};

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StyleType {
    /// Colored The shape is uniformly colored with a single color.
    Flat = 0,
    /// Gradient The shape is colored with a linear gradient.
    Linear = 1,
    /// Gradient The shape is colored with a radial gradient.
    Radial = 2
}

impl TryFrom<u8> for StyleType {
    type Error = TinyVgParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Flat),
            1 => Ok(Self::Linear),
            2 => Ok(Self::Radial),
            other => Err(TinyVgParseError::InvalidStyleType(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatColored {
    pub color_index: u64
}

/// Shared by linear and radial gradients; only the interpretation differs.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub point_0: Point,
    pub point_1: Point,
    pub color_index_0: u64,
    pub color_index_1: u64,
}

impl Gradient {
    fn read<R: BitRead + ?Sized>(format: &UnitFormat, reader: &mut R) -> Result<Gradient, TinyVgParseError> {
        let point_0 = format.read_point(reader)?;
        let point_1 = format.read_point(reader)?;

        let color_index_0 = reader.read_var_uint()?;
        let color_index_1 = reader.read_var_uint()?;

        Ok(Gradient {
            point_0,
            point_1,
            color_index_0,
            color_index_1,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    FlatColor(FlatColored),
    LinearGradient(Gradient),
    RadialGradient(Gradient),
}

impl Style {
    /// The record has no length or tag of its own; its shape is fixed by the
    /// style type read earlier.
    fn read_using_style_type<R: BitRead + ?Sized>(format: &UnitFormat, reader: &mut R, style_type: StyleType) -> Result<Style, TinyVgParseError> {
        match style_type {
            StyleType::Flat   => Ok(Style::FlatColor(FlatColored { color_index: reader.read_var_uint()? })),
            StyleType::Linear => Ok(Style::LinearGradient(Gradient::read(format, reader)?)),
            StyleType::Radial => Ok(Style::RadialGradient(Gradient::read(format, reader)?)),
        }
    }

    pub fn style_type(&self) -> StyleType {
        match self {
            Style::FlatColor(_) => StyleType::Flat,
            Style::LinearGradient(_) => StyleType::Linear,
            Style::RadialGradient(_) => StyleType::Radial,
        }
    }
}

/// The next draw command.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandType {
    /// This command determines the end of file.
    EndOfDocument = 0,

    /// This command fills an N-gon.
    FillPolygon = 1,

    /// This command fills a set of rectangles.
    FillRectangles = 2,

    /// This command fills a free-form path.
    FillPath = 3,

    /// This command draws a set of lines.
    DrawLines = 4,

    /// This command draws the outline of a polygon.
    DrawLineLoop = 5,

    /// This command draws a list of end-to-end lines.
    DrawLineStrip = 6,

    /// This command draws a free-form path.
    DrawLinePath = 7,

    /// This command draws a filled polygon with an outline.
    OutlineFillPolygon = 8,

    /// This command draws several filled rectangles with an outline.
    OutlineFillRectangles = 9,

    /// This command combines the fill and draw line path command into one.
    OutlineFillPath = 10,
}

impl TryFrom<u8> for CommandType {
    type Error = TinyVgParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EndOfDocument),
            1 => Ok(Self::FillPolygon),
            2 => Ok(Self::FillRectangles),
            3 => Ok(Self::FillPath),
            4 => Ok(Self::DrawLines),
            5 => Ok(Self::DrawLineLoop),
            6 => Ok(Self::DrawLineStrip),
            7 => Ok(Self::DrawLinePath),
            8 => Ok(Self::OutlineFillPolygon),
            9 => Ok(Self::OutlineFillRectangles),
            10 => Ok(Self::OutlineFillPath),
            other => Err(TinyVgParseError::InvalidCommand(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillPolygonData {
    pub style: Style,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillRectanglesData {
    pub style: Style,
    pub rectangles: Vec<Rectangle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillPathData {
    pub style: Style,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawLinesData {
    pub lines: Vec<Line>,
    pub line_width: Unit,
    pub line_style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawLineLoopData {
    pub line_style: Style,
    pub line_width: Unit,
    pub points: Vec<Point>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawLineStripData {
    pub line_style: Style,
    pub line_width: Unit,
    pub points: Vec<Point>
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawLinePathData {
    pub line_style: Style,
    pub line_width: Unit,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineFillPolygonData {
    pub fill_style: Style,
    pub line_style: Style,
    pub line_width: Unit,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineFillRectanglesData {
    pub fill_style: Style,
    pub line_style: Style,
    pub line_width: Unit,
    pub rectangles: Vec<Rectangle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineFillPathData {
    pub fill_style: Style,
    pub line_style: Style,
    pub line_width: Unit,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// This command determines the end of file. Every byte after it is not
    /// part of the TinyVG data.
    EndOfDocument,

    /// This command fills an N-gon.
    FillPolygon(FillPolygonData),

    /// This command fills a set of rectangles.
    FillRectangles(FillRectanglesData),

    /// This command fills a free-form path.
    FillPath(FillPathData),

    /// This command draws a set of lines.
    DrawLines(DrawLinesData),

    /// This command draws the outline of a polygon.
    DrawLineLoop(DrawLineLoopData),

    /// This command draws a list of end-to-end lines.
    DrawLineStrip(DrawLineStripData),

    /// This command draws a free-form path.
    DrawLinePath(DrawLinePathData),

    /// This command draws a filled polygon with an outline.
    OutlineFillPolygon(OutlineFillPolygonData),

    /// This command draws several filled rectangles with an outline.
    OutlineFillRectangles(OutlineFillRectanglesData),

    /// This command combines the fill and draw line path command into one.
    OutlineFillPath(OutlineFillPathData),
}

impl DrawCommand {
    pub fn command_type(&self) -> CommandType {
        match self {
            DrawCommand::EndOfDocument => CommandType::EndOfDocument,
            DrawCommand::FillPolygon(_) => CommandType::FillPolygon,
            DrawCommand::FillRectangles(_) => CommandType::FillRectangles,
            DrawCommand::FillPath(_) => CommandType::FillPath,
            DrawCommand::DrawLines(_) => CommandType::DrawLines,
            DrawCommand::DrawLineLoop(_) => CommandType::DrawLineLoop,
            DrawCommand::DrawLineStrip(_) => CommandType::DrawLineStrip,
            DrawCommand::DrawLinePath(_) => CommandType::DrawLinePath,
            DrawCommand::OutlineFillPolygon(_) => CommandType::OutlineFillPolygon,
            DrawCommand::OutlineFillRectangles(_) => CommandType::OutlineFillRectangles,
            DrawCommand::OutlineFillPath(_) => CommandType::OutlineFillPath,
        }
    }
}

/// A decoded command together with the primary style type from its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub primary_style_type: StyleType,
    pub draw_command: DrawCommand,
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        self.draw_command.command_type()
    }
}

/// Reads a var uint count. The wire value is one less than the count.
fn read_count<R: BitRead + ?Sized>(reader: &mut R, options: &DecodeOptions) -> Result<usize, TinyVgParseError> {
    let raw = reader.read_var_uint()?;
    options.check_count(raw.saturating_add(1))
}

/// Reads the packed byte of the outline commands: the secondary style type
/// in the top 2 bits and the count, less one, in the low 6.
fn read_outline_count<R: BitRead + ?Sized>(reader: &mut R, options: &DecodeOptions) -> Result<(StyleType, usize), TinyVgParseError> {
    let sec_style_type = StyleType::try_from(reader.read_tiny_int(2)?)?;
    let count = options.check_count(u64::from(reader.read_tiny_int(6)?) + 1)?;
    Ok((sec_style_type, count))
}

fn read_points<R: BitRead + ?Sized>(format: &UnitFormat, reader: &mut R, count: usize) -> Result<Vec<Point>, TinyVgParseError> {
    (0..count).map(|_| format.read_point(reader)).collect()
}

fn read_rectangles<R: BitRead + ?Sized>(format: &UnitFormat, reader: &mut R, count: usize) -> Result<Vec<Rectangle>, TinyVgParseError> {
    (0..count).map(|_| format.read_rectangle(reader)).collect()
}

fn read_draw_command<R: BitRead + ?Sized>(
    reader: &mut R,
    format: &UnitFormat,
    options: &DecodeOptions,
    command: CommandType,
    style_type: StyleType,
) -> Result<DrawCommand, TinyVgParseError> {
    let draw_command = match command {
        CommandType::EndOfDocument => DrawCommand::EndOfDocument,
        CommandType::FillPolygon => {
            // The number of points in the polygon. This value is offset by 1.
            let point_count = read_count(reader, options)?;

            // The style that is used to fill the polygon.
            let style = Style::read_using_style_type(format, reader, style_type)?;

            let points = read_points(format, reader, point_count)?;
            DrawCommand::FillPolygon(FillPolygonData { style, points })
        }
        CommandType::FillRectangles => {
            let rectangle_count = read_count(reader, options)?;
            let style = Style::read_using_style_type(format, reader, style_type)?;
            let rectangles = read_rectangles(format, reader, rectangle_count)?;
            DrawCommand::FillRectangles(FillRectanglesData { style, rectangles })
        }
        CommandType::FillPath => {
            // The number of segments in the path. This value is offset by 1.
            let segment_count = read_count(reader, options)?;
            let style = Style::read_using_style_type(format, reader, style_type)?;

            // Filled paths have no outline, so their width starts at zero.
            let path = Path::parse(reader, format, options, segment_count, Unit::default())?;
            DrawCommand::FillPath(FillPathData { style, path })
        }
        CommandType::DrawLines => {
            let line_count = read_count(reader, options)?;
            let line_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_width = format.read_unit(reader)?;

            let lines = (0..line_count)
                .map(|_| format.read_line(reader))
                .collect::<Result<Vec<Line>, _>>()?;
            DrawCommand::DrawLines(DrawLinesData { lines, line_width, line_style })
        }
        CommandType::DrawLineLoop => {
            let point_count = read_count(reader, options)?;
            let line_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_width = format.read_unit(reader)?;
            let points = read_points(format, reader, point_count)?;
            DrawCommand::DrawLineLoop(DrawLineLoopData { line_style, line_width, points })
        }
        CommandType::DrawLineStrip => {
            let point_count = read_count(reader, options)?;
            let line_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_width = format.read_unit(reader)?;
            let points = read_points(format, reader, point_count)?;
            DrawCommand::DrawLineStrip(DrawLineStripData { line_style, line_width, points })
        }
        CommandType::DrawLinePath => {
            let segment_count = read_count(reader, options)?;
            let line_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_width = format.read_unit(reader)?;
            let path = Path::parse(reader, format, options, segment_count, line_width)?;
            DrawCommand::DrawLinePath(DrawLinePathData { line_style, line_width, path })
        }
        CommandType::OutlineFillPolygon => {
            let (sec_style_type, point_count) = read_outline_count(reader, options)?;

            // The primary style fills, the secondary style draws the outline.
            let fill_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_style = Style::read_using_style_type(format, reader, sec_style_type)?;
            let line_width = format.read_unit(reader)?;
            let points = read_points(format, reader, point_count)?;
            DrawCommand::OutlineFillPolygon(OutlineFillPolygonData { fill_style, line_style, line_width, points })
        }
        CommandType::OutlineFillRectangles => {
            let (sec_style_type, rect_count) = read_outline_count(reader, options)?;
            let fill_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_style = Style::read_using_style_type(format, reader, sec_style_type)?;
            let line_width = format.read_unit(reader)?;
            let rectangles = read_rectangles(format, reader, rect_count)?;
            DrawCommand::OutlineFillRectangles(OutlineFillRectanglesData { fill_style, line_style, line_width, rectangles })
        }
        CommandType::OutlineFillPath => {
            let (sec_style_type, segment_count) = read_outline_count(reader, options)?;
            let fill_style = Style::read_using_style_type(format, reader, style_type)?;
            let line_style = Style::read_using_style_type(format, reader, sec_style_type)?;
            let line_width = format.read_unit(reader)?;
            let path = Path::parse(reader, format, options, segment_count, line_width)?;
            DrawCommand::OutlineFillPath(OutlineFillPathData { fill_style, line_style, line_width, path })
        }
    };
    Ok(draw_command)
}

/// Reads tagged commands until, and including, the end of document command.
pub(crate) fn parse_draw_commands<R: BitRead + ?Sized>(
    reader: &mut R,
    format: &UnitFormat,
    options: &DecodeOptions,
) -> Result<Vec<Command>, TinyVgParseError> {
    let mut commands: Vec<Command> = Vec::new();

    loop {
        // 2 bits of primary style type, then 6 bits of command index.
        let primary_style_type = StyleType::try_from(reader.read_tiny_int(2)?)?;
        let command_type = CommandType::try_from(reader.read_tiny_int(6)?)?;

        let draw_command = read_draw_command(reader, format, options, command_type, primary_style_type)?;
        trace!("command {command_type:?} with {primary_style_type:?} style");
        commands.push(Command { primary_style_type, draw_command });

        if command_type == CommandType::EndOfDocument {
            break;
        }
    }

    debug!("end of document after {} commands", commands.len());
    Ok(commands)
}
