use log::trace;
use crate::bit_stream::BitRead;
use crate::common::{Point, Unit, UnitFormat};
use crate::scalar::BitReadExt;
use crate::{DecodeOptions, TinyVgParseError};

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathCommandType {
    Line = 0,
    HorizontalLine = 1,
    VerticalLine = 2,
    CubicBezier = 3,
    ArcCircle = 4,
    ArcEllipse = 5,
    ClosePath = 6,
    QuadraticBezier = 7,
}

impl PathCommandType {
    /// Decodes a 3-bit field; every value is a known instruction.
    fn from_bits(value: u8) -> Self {
        match value & 0b111 {
            0 => Self::Line,
            1 => Self::HorizontalLine,
            2 => Self::VerticalLine,
            3 => Self::CubicBezier,
            4 => Self::ArcCircle,
            5 => Self::ArcEllipse,
            6 => Self::ClosePath,
            _ => Self::QuadraticBezier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubicBezier {
    pub control_point_0: Point,
    pub control_point_1: Point,
    pub point_1: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcCircle {
    /// When true the larger circle segment is drawn.
    pub large_arc: bool,
    /// When true the arc turns left going from the current point to the target.
    pub sweep: bool,
    pub radius: Unit,
    pub target: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcEllipse {
    pub large_arc: bool,
    pub sweep: bool,
    pub radius_x: Unit,
    pub radius_y: Unit,
    /// Rotation of the ellipse in mathematical negative direction, in degrees.
    pub rotation: Unit,
    pub target: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticBezier {
    pub control_point: Point,
    pub point_1: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathInstruction {
    /// A straight line to a new point.
    Line(Point),
    /// A horizontal line to a new x coordinate.
    HorizontalLine(Unit),
    /// A vertical line to a new y coordinate.
    VerticalLine(Unit),
    CubicBezier(CubicBezier),
    ArcCircle(ArcCircle),
    ArcEllipse(ArcEllipse),
    /// Closes the segment with a straight line back to its start point.
    ClosePath,
    QuadraticBezier(QuadraticBezier),
}

impl PathInstruction {
    pub fn command_type(&self) -> PathCommandType {
        match self {
            PathInstruction::Line(_) => PathCommandType::Line,
            PathInstruction::HorizontalLine(_) => PathCommandType::HorizontalLine,
            PathInstruction::VerticalLine(_) => PathCommandType::VerticalLine,
            PathInstruction::CubicBezier(_) => PathCommandType::CubicBezier,
            PathInstruction::ArcCircle(_) => PathCommandType::ArcCircle,
            PathInstruction::ArcEllipse(_) => PathCommandType::ArcEllipse,
            PathInstruction::ClosePath => PathCommandType::ClosePath,
            PathInstruction::QuadraticBezier(_) => PathCommandType::QuadraticBezier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathCommand {
    pub instruction: PathInstruction,
    /// The width carried in this instruction's tag, if it had one.
    pub line_width_override: Option<Unit>,
    /// The line width in effect for this instruction.
    pub line_width: Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Pen-down location; every segment starts with an implicit move.
    pub start: Point,
    /// Line width in effect when the segment starts.
    pub line_width: Unit,
    pub path_commands: Vec<PathCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    /// Reads `segment_count` instruction counts, then each segment. The
    /// current line width starts at `line_width` and is carried from one
    /// instruction to the next, across segment boundaries, until a tag
    /// overrides it.
    pub(crate) fn parse<R: BitRead + ?Sized>(
        reader: &mut R,
        format: &UnitFormat,
        options: &DecodeOptions,
        segment_count: usize,
        line_width: Unit,
    ) -> Result<Self, TinyVgParseError> {
        // Counts come from the input, so buffers grow as data is actually read.
        let mut segment_command_counts: Vec<usize> = Vec::new();
        for _ in 0..segment_count {
            let raw = reader.read_var_uint()?;
            segment_command_counts.push(options.check_count(raw.saturating_add(1))?);
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut line_width = line_width;

        for commands_count in segment_command_counts {
            let start = format.read_point(reader)?;
            let mut segment = Segment {
                start,
                line_width,
                path_commands: Vec::new(),
            };

            for _ in 0..commands_count {
                let command = read_path_command(reader, format, line_width)?;
                line_width = command.line_width;
                segment.path_commands.push(command);
            }

            trace!("path segment with {} instructions", segment.path_commands.len());
            segments.push(segment);
        }

        Ok(Self { segments })
    }
}

/// Reads one tagged instruction. The tag is 3 reserved bits, a line width
/// flag, 1 reserved bit, and the 3-bit instruction type.
fn read_path_command<R: BitRead + ?Sized>(
    reader: &mut R,
    format: &UnitFormat,
    line_width: Unit,
) -> Result<PathCommand, TinyVgParseError> {
    let reserved = reader.read_tiny_int(3)?;
    if reserved != 0 {
        return Err(TinyVgParseError::NonZeroPadding { field: "path instruction tag", value: reserved });
    }
    let has_line_width = reader.read_bit()? != 0;
    let reserved = reader.read_bit()?;
    if reserved != 0 {
        return Err(TinyVgParseError::NonZeroPadding { field: "path instruction tag", value: reserved });
    }
    let command_type = PathCommandType::from_bits(reader.read_tiny_int(3)?);

    let line_width_override = if has_line_width {
        Some(format.read_unit(reader)?)
    } else {
        None
    };

    let instruction = match command_type {
        PathCommandType::Line => PathInstruction::Line(format.read_point(reader)?),
        PathCommandType::HorizontalLine => PathInstruction::HorizontalLine(format.read_unit(reader)?),
        PathCommandType::VerticalLine => PathInstruction::VerticalLine(format.read_unit(reader)?),
        PathCommandType::CubicBezier => {
            let control_point_0 = format.read_point(reader)?;
            let control_point_1 = format.read_point(reader)?;
            let point_1 = format.read_point(reader)?;
            PathInstruction::CubicBezier(CubicBezier { control_point_0, control_point_1, point_1 })
        }
        PathCommandType::ArcCircle => {
            let (large_arc, sweep) = read_arc_flags(reader)?;
            let radius = format.read_unit(reader)?;
            let target = format.read_point(reader)?;
            PathInstruction::ArcCircle(ArcCircle { large_arc, sweep, radius, target })
        }
        PathCommandType::ArcEllipse => {
            let (large_arc, sweep) = read_arc_flags(reader)?;
            let radius_x = format.read_unit(reader)?;
            let radius_y = format.read_unit(reader)?;
            let rotation = format.read_unit(reader)?;
            let target = format.read_point(reader)?;
            PathInstruction::ArcEllipse(ArcEllipse { large_arc, sweep, radius_x, radius_y, rotation, target })
        }
        PathCommandType::ClosePath => PathInstruction::ClosePath,
        PathCommandType::QuadraticBezier => {
            let control_point = format.read_point(reader)?;
            let point_1 = format.read_point(reader)?;
            PathInstruction::QuadraticBezier(QuadraticBezier { control_point, point_1 })
        }
    };

    Ok(PathCommand {
        instruction,
        line_width_override,
        line_width: line_width_override.unwrap_or(line_width),
    })
}

/// 6 reserved bits, then sweep, then large arc. Returns `(large_arc, sweep)`.
fn read_arc_flags<R: BitRead + ?Sized>(reader: &mut R) -> Result<(bool, bool), TinyVgParseError> {
    let padding = reader.read_tiny_int(6)?;
    if padding != 0 {
        return Err(TinyVgParseError::NonZeroPadding { field: "arc flags", value: padding });
    }
    let sweep = reader.read_bit()? != 0;
    let large_arc = reader.read_bit()? != 0;
    Ok((large_arc, sweep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_stream::{BitStream, BitWriter};
    use crate::header::CoordinateRange;

    fn format() -> UnitFormat {
        UnitFormat::new(CoordinateRange::Reduced, 0)
    }

    fn parse(data: &[u8], segment_count: usize, line_width: f64) -> Result<Path, TinyVgParseError> {
        parse_with(data, &DecodeOptions::default(), segment_count, line_width)
    }

    fn parse_with(data: &[u8], options: &DecodeOptions, segment_count: usize, line_width: f64) -> Result<Path, TinyVgParseError> {
        let mut stream = BitStream::from_slice(data, 8);
        Path::parse(&mut stream, &format(), options, segment_count, Unit(line_width))
    }

    #[test]
    fn line_and_close() {
        let data = [
            0x01,       // two instructions
            0x02, 0x03, // start
            0x00, 0x0A, 0x0B, // line to (10, 11)
            0x06,       // close
        ];
        let path = parse(&data, 1, 1.5).unwrap();
        assert_eq!(path.segments.len(), 1);
        let segment = &path.segments[0];
        assert_eq!(segment.start, Point { x: Unit(2.0), y: Unit(3.0) });
        assert_eq!(segment.line_width, Unit(1.5));
        assert_eq!(segment.path_commands[0].instruction, PathInstruction::Line(Point { x: Unit(10.0), y: Unit(11.0) }));
        assert_eq!(segment.path_commands[1].instruction, PathInstruction::ClosePath);
        assert!(segment.path_commands.iter().all(|c| c.line_width == Unit(1.5) && c.line_width_override.is_none()));
    }

    #[test]
    fn line_width_override_persists_across_segments() {
        let data = [
            0x01, 0x00, // two instructions, then one
            0x00, 0x00, // first start
            0x11, 0x04, 0x05, // horizontal line to 5 with width 4
            0x02, 0x06, // vertical line to 6
            0x01, 0x01, // second start
            0x00, 0x07, 0x07, // line
        ];
        let path = parse(&data, 2, 1.0).unwrap();
        let first = &path.segments[0];
        assert_eq!(first.line_width, Unit(1.0));
        assert_eq!(first.path_commands[0].instruction, PathInstruction::HorizontalLine(Unit(5.0)));
        assert_eq!(first.path_commands[0].line_width_override, Some(Unit(4.0)));
        assert_eq!(first.path_commands[0].line_width, Unit(4.0));
        assert_eq!(first.path_commands[1].instruction, PathInstruction::VerticalLine(Unit(6.0)));
        assert_eq!(first.path_commands[1].line_width, Unit(4.0));

        let second = &path.segments[1];
        assert_eq!(second.line_width, Unit(4.0));
        assert_eq!(second.path_commands[0].line_width, Unit(4.0));
    }

    #[test]
    fn curves_and_arcs() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_var_uint(3).unwrap();
        writer.write_bytes(&[0x00, 0x00]).unwrap();
        // cubic
        writer.write_u8(0x03).unwrap();
        writer.write_bytes(&[1, 2, 3, 4, 5, 6]).unwrap();
        // quadratic
        writer.write_u8(0x07).unwrap();
        writer.write_bytes(&[7, 8, 9, 10]).unwrap();
        // circle: sweep only
        writer.write_u8(0x04).unwrap();
        writer.write_u8(0b0000_0010).unwrap();
        writer.write_bytes(&[3, 11, 12]).unwrap();
        // ellipse: large arc only
        writer.write_u8(0x05).unwrap();
        writer.write_u8(0b0000_0001).unwrap();
        writer.write_bytes(&[2, 4, 0xFF, 13, 14]).unwrap();
        let data = writer.into_inner();

        let path = parse(&data, 1, 0.0).unwrap();
        let instructions: Vec<&PathInstruction> = path.segments[0].path_commands.iter().map(|c| &c.instruction).collect();
        let p = |x: f64, y: f64| Point { x: Unit(x), y: Unit(y) };
        assert_eq!(instructions, [
            &PathInstruction::CubicBezier(CubicBezier { control_point_0: p(1.0, 2.0), control_point_1: p(3.0, 4.0), point_1: p(5.0, 6.0) }),
            &PathInstruction::QuadraticBezier(QuadraticBezier { control_point: p(7.0, 8.0), point_1: p(9.0, 10.0) }),
            &PathInstruction::ArcCircle(ArcCircle { large_arc: false, sweep: true, radius: Unit(3.0), target: p(11.0, 12.0) }),
            &PathInstruction::ArcEllipse(ArcEllipse {
                large_arc: true,
                sweep: false,
                radius_x: Unit(2.0),
                radius_y: Unit(4.0),
                rotation: Unit(-1.0),
                target: p(13.0, 14.0),
            }),
        ]);
        assert_eq!(instructions[2].command_type(), PathCommandType::ArcCircle);
    }

    #[test]
    fn reserved_tag_bits_are_rejected() {
        for tag in [0b1000_0000u8, 0b0010_0000, 0b0000_1000] {
            let data = [0x00, 0x00, 0x00, tag, 0x01, 0x01];
            let err = parse(&data, 1, 0.0).unwrap_err();
            assert!(
                matches!(err, TinyVgParseError::NonZeroPadding { field: "path instruction tag", .. }),
                "tag {tag:#010b} gave {err:?}"
            );
        }
    }

    #[test]
    fn arc_padding_is_rejected() {
        for bit in 2..8 {
            let flags = 1u8 << bit;
            for kind in [0x04u8, 0x05] {
                let data = [0x00, 0x00, 0x00, kind, flags, 0x01, 0x01, 0x01, 0x01, 0x01];
                let err = parse(&data, 1, 0.0).unwrap_err();
                assert!(
                    matches!(err, TinyVgParseError::NonZeroPadding { field: "arc flags", value } if value == flags >> 2),
                    "flags {flags:#010b} on kind {kind} gave {err:?}"
                );
            }
        }
    }

    #[test]
    fn instruction_count_over_limit_is_rejected() {
        let options = DecodeOptions { max_count: 16, ..DecodeOptions::default() };
        // 2^20 - 1 in three var uint bytes, nothing else behind it
        let data = [0xFF, 0xFF, 0x3F];
        let err = parse_with(&data, &options, 1, 0.0).unwrap_err();
        assert!(matches!(err, TinyVgParseError::CountTooLarge { count, limit: 16 } if count == 1 << 20), "got {err:?}");
    }

    #[test]
    fn huge_instruction_count_fails_on_missing_tags() {
        let data = [0xFF, 0xFF, 0x3F];
        let err = parse(&data, 1, 0.0).unwrap_err();
        assert!(matches!(err, TinyVgParseError::EndOfStream), "got {err:?}");
    }
}
