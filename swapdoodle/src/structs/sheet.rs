//! Drawing pages (`SHEET1` blocks).

use serde::Serialize;

use crate::utils::byte_io::LeSliceReader;
use crate::utils::errors::FormatError;

/// Offset of the first stroke record in a sheet payload.
pub const STROKES_OFFSET: u64 = 0x40;
pub const STROKE_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub strokes: Vec<SheetStroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetStroke {
    pub x: u8,
    pub y: u8,
    pub draw_line: bool,
    pub style_color: u8,
    pub style_3d: bool,
    pub style_bold: bool,
}

#[inline(always)]
const fn bit(byte: u8, n: u8) -> bool {
    (byte >> n) & 1 != 0
}

impl SheetStroke {
    pub fn from_bytes(bytes: [u8; STROKE_SIZE]) -> Self {
        Self {
            x: (bytes[2] & 0x0F) << 4 | (bytes[1] & 0x0F),
            y: (bytes[1] & 0x0F) << 4 | (bytes[0] & 0x0F),
            draw_line: bit(bytes[2], 6),
            style_color: bytes[3] & 0x07,
            style_3d: bit(bytes[3], 5),
            style_bold: bit(bytes[3], 4),
        }
    }
}

impl Sheet {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = LeSliceReader::from_slice(bytes);
        reader.get_u32_le()?;
        let num_strokes = reader.get_u32_le()? as usize;
        reader.seek_to(STROKES_OFFSET)?;

        let room = reader.available()? as usize / STROKE_SIZE;
        let mut strokes = Vec::with_capacity(num_strokes.min(room));
        for _ in 0..num_strokes {
            strokes.push(SheetStroke::from_bytes(reader.get_array()?));
        }

        Ok(Self { strokes })
    }

    /// Strokes that continue a line from the previous point.
    pub fn line_count(&self) -> usize {
        self.strokes.iter().filter(|s| s.draw_line).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_bit_fields() {
        let stroke = SheetStroke::from_bytes([0x0C, 0x0B, 0x4A, 0b0011_0101]);
        assert_eq!(stroke.x, 0xAB);
        assert_eq!(stroke.y, 0xBC);
        assert!(stroke.draw_line);
        assert_eq!(stroke.style_color, 5);
        assert!(stroke.style_3d);
        assert!(stroke.style_bold);

        let plain = SheetStroke::from_bytes([0xF1, 0xF2, 0x03, 0b1100_1010]);
        assert_eq!(plain.x, 0x32);
        assert_eq!(plain.y, 0x21);
        assert!(!plain.draw_line);
        assert_eq!(plain.style_color, 2);
        assert!(!plain.style_3d);
        assert!(!plain.style_bold);
    }

    #[test]
    fn sheet_reads_declared_strokes() {
        let mut payload = vec![0u8; STROKES_OFFSET as usize];
        payload[4..8].copy_from_slice(&2u32.to_le_bytes());
        payload.extend_from_slice(&[0x01, 0x02, 0x43, 0x01]);
        payload.extend_from_slice(&[0x04, 0x05, 0x06, 0x12]);

        let sheet = Sheet::from_bytes(&payload).unwrap();
        assert_eq!(sheet.strokes.len(), 2);
        assert_eq!(sheet.strokes[0].x, 0x32);
        assert_eq!(sheet.line_count(), 1);
    }

    #[test]
    fn sheet_with_missing_strokes_is_truncated() {
        let mut payload = vec![0u8; STROKES_OFFSET as usize];
        payload[4..8].copy_from_slice(&3u32.to_le_bytes());
        payload.extend_from_slice(&[0; 8]);

        assert!(matches!(
            Sheet::from_bytes(&payload),
            Err(FormatError::Truncated(_))
        ));
    }
}
