//! Byte-oriented little-endian reader for BPK1 parsing.
//!
//! Wraps a `bitstream-io` little-endian bit reader. Containers are read a
//! byte or a word at a time; the stationery mask is read a nibble at a time,
//! which is why this goes through a bit reader at all.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BitRead, BitReader, LittleEndian};

#[derive(Debug)]
pub struct ByteIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, LittleEndian>,
    len: u64,
}

pub type LeSliceReader<'a> = ByteIoReader<io::Cursor<&'a [u8]>>;

fn out_of_bounds(what: &str, wanted: u64, position: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("{what}({wanted}): out of bounds at byte {position}"),
    )
}

impl<R> ByteIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes,
        }
    }

    #[inline(always)]
    pub fn get_u32_le(&mut self) -> io::Result<u32> {
        match self.bs.read_unsigned_var::<u32>(32) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(out_of_bounds("get_u32_le", 4, self.position().unwrap_or(0)))
            }
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn get_u16_le(&mut self) -> io::Result<u16> {
        match self.bs.read_unsigned_var::<u16>(16) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(out_of_bounds("get_u16_le", 2, self.position().unwrap_or(0)))
            }
            Err(e) => Err(e),
        }
    }

    /// Reads four bits. Low nibble of each byte comes first.
    #[inline(always)]
    pub fn get_nibble(&mut self) -> io::Result<u8> {
        self.bs.read_unsigned_var::<u8>(4)
    }

    pub fn get_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let available = self.available()?;
        if n as u64 > available {
            return Err(out_of_bounds("get_bytes", n as u64, self.position()?));
        }

        let mut buf = vec![0; n];
        self.bs.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn get_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        match self.bs.read_bytes(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(out_of_bounds(
                "get_array",
                N as u64,
                self.position().unwrap_or(0),
            )),
            Err(e) => Err(e),
        }
    }

    /// Moves to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        if offset > self.len {
            return Err(out_of_bounds("seek_to", offset, self.position()?));
        }

        self.bs.seek_bits(SeekFrom::Start(offset << 3))?;
        Ok(())
    }

    pub fn skip_bytes(&mut self, n: u64) -> io::Result<()> {
        if n > self.available()? {
            return Err(out_of_bounds("skip_bytes", n, self.position()?));
        }

        self.bs.skip((n << 3) as u32)
    }

    /// Current position in whole bytes.
    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|bits| bits >> 3)
    }

    /// Remaining whole bytes.
    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.position().map(|pos| self.len.saturating_sub(pos))
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a> LeSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_words_and_nibbles_little_endian() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xA5, 0x0F];
        let mut reader = LeSliceReader::from_slice(&data);

        assert_eq!(reader.get_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(reader.get_nibble().unwrap(), 0x5);
        assert_eq!(reader.get_nibble().unwrap(), 0xA);
        assert_eq!(reader.get_nibble().unwrap(), 0xF);
        assert_eq!(reader.get_nibble().unwrap(), 0x0);
        assert_eq!(reader.available().unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_reads_are_eof() {
        let data = [1u8, 2, 3];
        let mut reader = LeSliceReader::from_slice(&data);

        let err = reader.get_u32_le().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        reader.seek_to(1).unwrap();
        assert_eq!(reader.get_bytes(2).unwrap(), vec![2, 3]);
        assert!(reader.get_bytes(1).is_err());
        assert!(reader.seek_to(4).is_err());
        assert!(reader.skip_bytes(1).is_err());
    }
}
