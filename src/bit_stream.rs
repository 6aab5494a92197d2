use std::io::{self, Read, Seek, SeekFrom, Write};
use byteorder::ReadBytesExt;
use log::warn;
use crate::TinyVgParseError;

/// An ordered, possibly exhaustible supply of bytes.
pub trait ByteSource {
    /// Returns the next byte, or `None` once the source is exhausted.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// Returns true while at least one more byte can be read.
    fn has_remaining(&mut self) -> io::Result<bool>;

    /// Moves back to the first byte of the source.
    fn rewind(&mut self) -> io::Result<()>;
}

/// An in-memory byte source.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bytes handed out so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.position).copied();
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }

    fn has_remaining(&mut self) -> io::Result<bool> {
        Ok(self.position < self.data.len())
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// A byte source over a positioned stream such as a file.
///
/// One byte is buffered ahead so that `has_remaining` can be answered
/// without knowing the stream length.
#[derive(Debug)]
pub struct SeekSource<R> {
    inner: R,
    lookahead: Option<u8>,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, lookahead: None }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill_lookahead(&mut self) -> io::Result<()> {
        if self.lookahead.is_some() {
            return Ok(());
        }
        match self.inner.read_u8() {
            Ok(byte) => self.lookahead = Some(byte),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        self.fill_lookahead()?;
        Ok(self.lookahead.take())
    }

    fn has_remaining(&mut self) -> io::Result<bool> {
        self.fill_lookahead()?;
        Ok(self.lookahead.is_some())
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.lookahead = None;
        self.inner.seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

/// Bit-level reads, most significant bit first within each byte.
pub trait BitRead {
    /// Reads one bit. Once the real data is exhausted this hands out the
    /// configured number of run-out zero bits, then fails with
    /// [`TinyVgParseError::EndOfStream`].
    fn read_bit(&mut self) -> Result<u8, TinyVgParseError>;

    /// Reads one bit of real data. Returns `None` at exhaustion and never
    /// touches the run-out budget.
    fn try_read_bit(&mut self) -> Result<Option<u8>, TinyVgParseError>;

    /// Reads 8 bits, not necessarily aligned to a byte boundary. Bits past
    /// the end of the real data are zero.
    fn read_byte_unaligned(&mut self) -> Result<u8, TinyVgParseError> {
        let mut byte = 0u8;
        let mut mask = 0x80u8;
        while mask != 0 {
            match self.try_read_bit()? {
                Some(bit) => {
                    if bit != 0 {
                        byte |= mask;
                    }
                }
                None => break,
            }
            mask >>= 1;
        }
        Ok(byte)
    }

    /// True once the real data has been exhausted. Ignores run-out.
    fn is_empty(&self) -> bool;

    /// True while real data or run-out bits remain.
    fn can_read(&mut self) -> Result<bool, TinyVgParseError>;
}

/// Wraps a [`ByteSource`] to read individual bits, with a bounded run-out of
/// zero bits after the end of the data.
#[derive(Debug)]
pub struct BitStream<S> {
    source: S,
    run_out_budget: usize,
    run_out_left: usize,
    in_run_out: bool,
    current: u8,
    /// Bits of `current` not yet consumed.
    bits_left: u8,
}

impl<'a> BitStream<SliceSource<'a>> {
    pub fn from_slice(data: &'a [u8], run_out_bits: usize) -> Self {
        Self::new(SliceSource::new(data), run_out_bits)
    }
}

impl<R: Read + Seek> BitStream<SeekSource<R>> {
    pub fn from_reader(reader: R, run_out_bits: usize) -> Self {
        Self::new(SeekSource::new(reader), run_out_bits)
    }
}

impl<S: ByteSource> BitStream<S> {
    pub fn new(source: S, run_out_bits: usize) -> Self {
        Self {
            source,
            run_out_budget: run_out_bits,
            run_out_left: run_out_bits,
            in_run_out: false,
            current: 0,
            bits_left: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Run-out bits still available.
    pub fn run_out_left(&self) -> usize {
        self.run_out_left
    }

    /// Resets all bit state and the run-out budget, and moves the source back
    /// to its start.
    pub fn rewind(&mut self) -> Result<(), TinyVgParseError> {
        self.source.rewind()?;
        self.in_run_out = false;
        self.run_out_left = self.run_out_budget;
        self.current = 0;
        self.bits_left = 0;
        Ok(())
    }

    fn next_real_bit(&mut self) -> Result<Option<u8>, TinyVgParseError> {
        if self.bits_left == 0 {
            match self.source.next_byte()? {
                Some(byte) => {
                    self.current = byte;
                    self.bits_left = 8;
                }
                None => {
                    self.in_run_out = true;
                    return Ok(None);
                }
            }
        }
        self.bits_left -= 1;
        Ok(Some((self.current >> self.bits_left) & 1))
    }

    fn run_out_bit(&mut self) -> Result<u8, TinyVgParseError> {
        if self.run_out_left == 0 {
            return Err(TinyVgParseError::EndOfStream);
        }
        if self.run_out_left == self.run_out_budget {
            warn!("input exhausted, reading {} run-out bits", self.run_out_budget);
        }
        self.run_out_left -= 1;
        Ok(0)
    }
}

impl<S: ByteSource> BitRead for BitStream<S> {
    fn read_bit(&mut self) -> Result<u8, TinyVgParseError> {
        if self.in_run_out {
            return self.run_out_bit();
        }
        match self.next_real_bit()? {
            Some(bit) => Ok(bit),
            None => self.run_out_bit(),
        }
    }

    fn try_read_bit(&mut self) -> Result<Option<u8>, TinyVgParseError> {
        if self.in_run_out {
            return Ok(None);
        }
        self.next_real_bit()
    }

    fn is_empty(&self) -> bool {
        self.in_run_out
    }

    fn can_read(&mut self) -> Result<bool, TinyVgParseError> {
        if self.run_out_left > 0 {
            return Ok(true);
        }
        if self.in_run_out {
            return Ok(false);
        }
        Ok(self.bits_left > 0 || self.source.has_remaining()?)
    }
}

/// Writes individual bits to a sink, most significant bit first.
///
/// Full bytes go straight to the sink; a partially filled byte is held until
/// it completes or [`BitWriter::flush`] is called.
#[derive(Debug)]
pub struct BitWriter<W> {
    inner: W,
    pending: u8,
    mask: u8,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pending: 0, mask: 0x80 }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Returns the sink. A pending partial byte is lost unless
    /// [`BitWriter::flush`] was called first.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// True when no partial byte is pending.
    pub fn is_aligned(&self) -> bool {
        self.mask == 0x80
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.pending |= self.mask;
        }
        self.mask >>= 1;
        if self.mask == 0 {
            self.inner.write_all(&[self.pending])?;
            self.pending = 0;
            self.mask = 0x80;
        }
        Ok(())
    }

    /// Writes 8 bits without realigning.
    pub fn write_byte_unaligned(&mut self, value: u8) -> io::Result<()> {
        let mut mask = 0x80u8;
        while mask != 0 {
            self.write_bit(value & mask != 0)?;
            mask >>= 1;
        }
        Ok(())
    }

    /// Emits any partial byte, then writes `value` as a whole byte.
    pub fn write_byte_aligned(&mut self, value: u8) -> io::Result<()> {
        self.write_pending()?;
        self.inner.write_all(&[value])
    }

    /// Emits the pending partial byte, zero padded in its low bits, then
    /// flushes the sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.write_pending()?;
        self.inner.flush()
    }

    fn write_pending(&mut self) -> io::Result<()> {
        if self.is_aligned() {
            return Ok(());
        }
        self.inner.write_all(&[self.pending])?;
        self.pending = 0;
        self.mask = 0x80;
        Ok(())
    }

    /// Drops the pending partial byte.
    pub fn rewind(&mut self) {
        self.pending = 0;
        self.mask = 0x80;
    }
}

impl BitWriter<Vec<u8>> {
    /// Drops the pending partial byte and everything written so far.
    pub fn clear(&mut self) {
        self.rewind();
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_bits_msb_first() {
        let data = [0b1010_0001];
        let mut stream = BitStream::from_slice(&data, 0);
        let bits: Vec<u8> = (0..8).map(|_| stream.read_bit().unwrap()).collect();
        assert_eq!(bits, [1, 0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn run_out_yields_zeros_then_fails() {
        let data = [0xFF];
        let mut stream = BitStream::from_slice(&data, 3);
        for _ in 0..8 {
            assert_eq!(stream.read_bit().unwrap(), 1);
        }
        assert!(!stream.is_empty());
        for _ in 0..3 {
            assert_eq!(stream.read_bit().unwrap(), 0);
            assert!(stream.is_empty());
        }
        assert!(matches!(stream.read_bit(), Err(TinyVgParseError::EndOfStream)));
    }

    #[test]
    fn try_read_bit_does_not_consume_run_out() {
        let data: [u8; 0] = [];
        let mut stream = BitStream::from_slice(&data, 2);
        assert_eq!(stream.try_read_bit().unwrap(), None);
        assert!(stream.is_empty());
        assert_eq!(stream.run_out_left(), 2);
        assert!(stream.can_read().unwrap());
        assert_eq!(stream.read_bit().unwrap(), 0);
        assert_eq!(stream.read_bit().unwrap(), 0);
        assert!(!stream.can_read().unwrap());
    }

    #[test]
    fn unaligned_byte_spans_two_bytes() {
        let data = [0b0000_1111, 0b0101_0000];
        let mut stream = BitStream::from_slice(&data, 0);
        for _ in 0..4 {
            stream.read_bit().unwrap();
        }
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0b1111_0101);
    }

    #[test]
    fn unaligned_byte_is_zero_padded_past_end() {
        let data = [0b0000_1011];
        let mut stream = BitStream::from_slice(&data, 0);
        for _ in 0..4 {
            stream.read_bit().unwrap();
        }
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0b1011_0000);
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn can_read_without_run_out() {
        let data = [0x01];
        let mut stream = BitStream::from_slice(&data, 0);
        assert!(stream.can_read().unwrap());
        stream.read_byte_unaligned().unwrap();
        assert!(!stream.can_read().unwrap());
        assert!(!stream.is_empty());
    }

    #[test]
    fn rewind_restarts_slice_and_budget() {
        let data = [0xA5];
        let mut stream = BitStream::from_slice(&data, 1);
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0xA5);
        stream.read_bit().unwrap();
        assert!(stream.read_bit().is_err());

        stream.rewind().unwrap();
        assert!(!stream.is_empty());
        assert_eq!(stream.run_out_left(), 1);
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0xA5);
    }

    #[test]
    fn seek_source_reads_and_rewinds() {
        let mut stream = BitStream::from_reader(Cursor::new(vec![0x72, 0x56]), 0);
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0x72);
        assert!(stream.can_read().unwrap());
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0x56);
        assert!(!stream.can_read().unwrap());
        assert_eq!(stream.try_read_bit().unwrap(), None);

        stream.rewind().unwrap();
        assert_eq!(stream.read_byte_unaligned().unwrap(), 0x72);
    }

    #[test]
    fn writer_packs_bits_msb_first() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        writer.write_bit(false).unwrap();
        writer.write_bit(true).unwrap();
        assert!(writer.get_ref().is_empty());
        writer.flush().unwrap();
        assert_eq!(writer.into_inner(), [0b1010_0000]);
    }

    #[test]
    fn aligned_write_flushes_partial_byte() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        writer.write_byte_aligned(0x42).unwrap();
        writer.write_byte_unaligned(0x81).unwrap();
        assert_eq!(writer.into_inner(), [0x80, 0x42, 0x81]);
    }

    #[test]
    fn unaligned_write_straddles_bytes() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(false).unwrap();
        writer.write_byte_unaligned(0xFF).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.into_inner(), [0x7F, 0x80]);
    }

    #[test]
    fn flush_reaches_buffered_sink() {
        let mut writer = BitWriter::new(io::BufWriter::new(Vec::new()));
        writer.write_bit(true).unwrap();
        writer.flush().unwrap();
        assert!(writer.get_ref().buffer().is_empty());
        assert_eq!(writer.get_ref().get_ref(), &[0x80]);
    }

    #[test]
    fn clear_discards_output() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_byte_aligned(0x01).unwrap();
        writer.write_bit(true).unwrap();
        writer.clear();
        writer.flush().unwrap();
        assert!(writer.into_inner().is_empty());
    }
}
