//! LZSS compression as used for whole Letter files.
//!
//! Two Nintendo variants are understood. Both start with a one byte type
//! marker and a 24-bit little-endian decompressed size, followed by groups of
//! eight tokens announced by a flag byte (MSB first, set bit = back-reference):
//!
//! - `0x10` (LZ10): references are two bytes, 3..=18 bytes long.
//! - `0x11` (LZ11): references are two to four bytes, 1..=65808 bytes long.
//!   A zero 24-bit size is followed by a 32-bit size.
//!
//! [`compress`] always produces LZ11.

use std::borrow::Cow;

use log::{debug, trace};

use crate::utils::errors::LzssError;

pub const LZ10_MARKER: u8 = 0x10;
pub const LZ11_MARKER: u8 = 0x11;

const WINDOW: usize = 0x1000;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 0x1_0110;
/// Upper bound on the up-front allocation, as a multiple of the input length.
/// The declared size is untrusted and may reach 4 GiB on LZ11.
const PREALLOC_RATIO: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Lz10,
    Lz11,
}

impl Variant {
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            LZ10_MARKER => Some(Self::Lz10),
            LZ11_MARKER => Some(Self::Lz11),
            _ => None,
        }
    }
}

struct Header {
    variant: Variant,
    size: usize,
    data_start: usize,
}

impl Header {
    fn read(bytes: &[u8]) -> Result<Self, LzssError> {
        let &marker = bytes.first().ok_or(LzssError::MissingHeader)?;
        let variant = Variant::from_marker(marker).ok_or(LzssError::UnknownHeader(marker))?;

        let Some(size) = bytes.get(1..4) else {
            return Err(LzssError::MissingHeader);
        };
        let size = u32::from_le_bytes([size[0], size[1], size[2], 0]) as usize;

        if size == 0 && variant == Variant::Lz11 {
            let Some(ext) = bytes.get(4..8) else {
                return Err(LzssError::MissingHeader);
            };
            return Ok(Self {
                variant,
                size: u32::from_le_bytes([ext[0], ext[1], ext[2], ext[3]]) as usize,
                data_start: 8,
            });
        }

        Ok(Self {
            variant,
            size,
            data_start: 4,
        })
    }
}

/// Returns `true` when `bytes` starts with a known compression marker.
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes.first().copied().and_then(Variant::from_marker).is_some()
}

/// Cursor over the token stream that reports how far decoding got on EOF.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
    expected: usize,
}

impl Tokens<'_> {
    #[inline(always)]
    fn next(&mut self, written: usize) -> Result<u8, LzssError> {
        let byte = self.bytes.get(self.pos).copied().ok_or(LzssError::Truncated {
            written,
            expected: self.expected,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Decodes one back-reference into `(length, distance)`.
    fn reference(&mut self, variant: Variant, written: usize) -> Result<(usize, usize), LzssError> {
        let b0 = self.next(written)? as usize;

        let (length, high) = match variant {
            Variant::Lz10 => ((b0 >> 4) + 3, b0 & 0xF),
            Variant::Lz11 => match b0 >> 4 {
                0 => {
                    let b1 = self.next(written)? as usize;
                    ((((b0 & 0xF) << 4) | (b1 >> 4)) + 0x11, b1 & 0xF)
                }
                1 => {
                    let b1 = self.next(written)? as usize;
                    let b2 = self.next(written)? as usize;
                    ((((b0 & 0xF) << 12) | (b1 << 4) | (b2 >> 4)) + 0x111, b2 & 0xF)
                }
                indicator => (indicator + 1, b0 & 0xF),
            },
        };

        let low = self.next(written)? as usize;
        Ok((length, ((high << 8) | low) + 1))
    }
}

/// Decompresses an LZ10 or LZ11 stream.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, LzssError> {
    let header = Header::read(bytes)?;
    debug!(
        "Decompressing {:?} stream: {} bytes -> {} bytes",
        header.variant,
        bytes.len(),
        header.size
    );

    let capacity = header.size.min(bytes.len().saturating_mul(PREALLOC_RATIO));
    let mut out = Vec::with_capacity(capacity);
    let mut tokens = Tokens {
        bytes: &bytes[header.data_start..],
        pos: 0,
        expected: header.size,
    };

    while out.len() < header.size {
        let flags = tokens.next(out.len())?;

        for bit in (0..8).rev() {
            if out.len() >= header.size {
                break;
            }

            if (flags >> bit) & 1 == 0 {
                let byte = tokens.next(out.len())?;
                out.push(byte);
                continue;
            }

            let (length, distance) = tokens.reference(header.variant, out.len())?;
            if distance > out.len() {
                return Err(LzssError::DistanceTooFar {
                    distance,
                    written: out.len(),
                });
            }
            if out.len() + length > header.size {
                return Err(LzssError::Overrun {
                    length,
                    written: out.len(),
                    expected: header.size,
                });
            }

            // Byte by byte: a reference may overlap the bytes it produces.
            for _ in 0..length {
                out.push(out[out.len() - distance]);
            }
        }
    }

    let trailing = tokens.bytes.len() - tokens.pos;
    if trailing > 0 {
        trace!("Ignoring {trailing} trailing bytes after compressed stream");
    }

    Ok(out)
}

/// Decompresses `bytes` when they carry a compression marker and passes them
/// through untouched otherwise.
///
/// Fails only when the marker is present and the stream behind it is corrupt.
pub fn decompress_if_compressed(bytes: &[u8]) -> Result<Cow<'_, [u8]>, LzssError> {
    if is_compressed(bytes) {
        decompress(bytes).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

/// Compresses `data` as an LZ11 stream with greedy matching.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, LzssError> {
    let size = u32::try_from(data.len()).map_err(|_| LzssError::InputTooLarge(data.len()))?;

    let mut out = Vec::with_capacity(data.len() + data.len() / 8 + 8);
    out.push(LZ11_MARKER);
    if size == 0 || size > 0xFF_FFFF {
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&size.to_le_bytes());
    } else {
        out.extend_from_slice(&size.to_le_bytes()[..3]);
    }

    let mut pos = 0;
    while pos < data.len() {
        let flag_index = out.len();
        out.push(0);

        for bit in (0..8).rev() {
            if pos >= data.len() {
                break;
            }

            let (length, distance) = longest_match(data, pos);
            if length >= MIN_MATCH {
                out[flag_index] |= 1 << bit;
                push_reference(&mut out, length, distance);
                pos += length;
            } else {
                out.push(data[pos]);
                pos += 1;
            }
        }
    }

    debug!("Compressed {} bytes into {} bytes", data.len(), out.len());
    Ok(out)
}

fn longest_match(data: &[u8], pos: usize) -> (usize, usize) {
    let max_len = (data.len() - pos).min(MAX_MATCH);
    let mut best = (0, 0);

    for candidate in (pos.saturating_sub(WINDOW)..pos).rev() {
        let length = (0..max_len)
            .take_while(|&i| data[candidate + i] == data[pos + i])
            .count();

        if length > best.0 {
            best = (length, pos - candidate);
            if length == max_len {
                break;
            }
        }
    }

    best
}

fn push_reference(out: &mut Vec<u8>, length: usize, distance: usize) {
    let d = distance - 1;
    let d_high = (d >> 8) as u8;
    let d_low = (d & 0xFF) as u8;

    match length {
        0..=0x10 => {
            out.push((((length - 1) as u8) << 4) | d_high);
        }
        0x11..=0x110 => {
            let l = length - 0x11;
            out.push((l >> 4) as u8);
            out.push((((l & 0xF) as u8) << 4) | d_high);
        }
        _ => {
            let l = length - 0x111;
            out.push(0x10 | (l >> 12) as u8);
            out.push(((l >> 4) & 0xFF) as u8);
            out.push((((l & 0xF) as u8) << 4) | d_high);
        }
    }
    out.push(d_low);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lz10_literals_and_reference() {
        let stream = [0x10, 9, 0, 0, 0b0001_0000, b'a', b'b', b'c', 0x30, 0x02];
        assert_eq!(decompress(&stream).unwrap(), b"abcabcabc");
    }

    #[test]
    fn lz11_short_medium_and_long_references() {
        // 3 literals, then a 6 byte copy at distance 3.
        let short = [0x11, 9, 0, 0, 0b0001_0000, b'a', b'b', b'c', 0x50, 0x02];
        assert_eq!(decompress(&short).unwrap(), b"abcabcabc");

        // 1 literal, then a 0x20 byte copy at distance 1 (three byte form).
        let medium = [0x11, 0x21, 0, 0, 0b0100_0000, b'z', 0x00, 0xF0, 0x00];
        assert_eq!(decompress(&medium).unwrap(), vec![b'z'; 0x21]);

        // 1 literal, then a 0x200 byte copy at distance 1 (four byte form).
        let l = 0x200 - 0x111;
        let long = [
            0x11,
            0x01,
            0x02,
            0,
            0b0100_0000,
            b'q',
            0x10 | (l >> 12) as u8,
            ((l >> 4) & 0xFF) as u8,
            ((l & 0xF) as u8) << 4,
            0x00,
        ];
        assert_eq!(decompress(&long).unwrap(), vec![b'q'; 0x201]);
    }

    #[test]
    fn lz11_extended_size_header() {
        let stream = [0x11, 0, 0, 0, 2, 0, 0, 0, 0x00, b'h', b'i'];
        assert_eq!(decompress(&stream).unwrap(), b"hi");
    }

    #[test]
    fn oversized_declared_length_is_truncated_not_allocated() {
        let stream = [0x11, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];
        assert!(matches!(
            decompress(&stream),
            Err(LzssError::Truncated {
                written: 0,
                expected: 0xFFFF_FFFF
            })
        ));
    }

    #[test]
    fn corrupt_streams_fail() {
        assert!(matches!(decompress(&[]), Err(LzssError::MissingHeader)));
        assert!(matches!(
            decompress(&[0x42, 1, 0, 0]),
            Err(LzssError::UnknownHeader(0x42))
        ));
        assert!(matches!(
            decompress(&[0x10, 4, 0, 0, 0x00, b'a']),
            Err(LzssError::Truncated {
                written: 1,
                expected: 4
            })
        ));
        assert!(matches!(
            decompress(&[0x10, 4, 0, 0, 0b1000_0000, 0x10, 0x00]),
            Err(LzssError::DistanceTooFar {
                distance: 1,
                written: 0
            })
        ));
        assert!(matches!(
            decompress(&[0x10, 4, 0, 0, 0b0100_0000, b'a', 0x30, 0x00]),
            Err(LzssError::Overrun { length: 6, .. })
        ));
    }

    #[test]
    fn compress_is_decodable() {
        let mut data = b"Swapdoodle letter, Swapdoodle letter, Swapdoodle!".to_vec();
        data.extend(std::iter::repeat_n(0u8, 5000));
        data.extend((0..=255u8).cycle().take(3000));

        let packed = compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed).unwrap(), data);

        let empty = compress(&[]).unwrap();
        assert_eq!(decompress(&empty).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn conditional_decompression_passes_plain_data_through() {
        let plain = b"BPK1\x00\x00\x00\x00";
        assert!(matches!(
            decompress_if_compressed(plain).unwrap(),
            Cow::Borrowed(_)
        ));

        let packed = compress(b"BPK1 payload BPK1 payload").unwrap();
        let expanded = decompress(&packed).unwrap();
        assert_eq!(decompress_if_compressed(&packed).unwrap(), expanded);
        assert_eq!(decompress_if_compressed(&expanded).unwrap(), expanded);

        // Marker present but the stream behind it is cut short.
        assert!(decompress_if_compressed(&packed[..packed.len() - 3]).is_err());
    }
}
