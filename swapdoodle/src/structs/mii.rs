//! The sender's Mii (`MIISTD1` block).
//!
//! The block holds a 3DS Mii record. Only the identifying fields are decoded;
//! face and body parameters are left in the raw block.

use serde::Serialize;

use crate::utils::byte_io::LeSliceReader;
use crate::utils::errors::FormatError;

/// Bytes up to and including the creator name.
pub const MII_RECORD_MIN_SIZE: usize = 0x5C;

const PROFILE_OFFSET: u64 = 0x18;
const MII_NAME_OFFSET: u64 = 0x1A;
const CREATOR_NAME_OFFSET: u64 = 0x48;
/// UTF-16LE code units per name field.
const NAME_UNITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MiiGender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiiData {
    pub mii_name: String,
    pub creator_name: String,
    pub gender: MiiGender,
    /// 1..=12, or 0 when unset.
    pub birth_month: u8,
    /// 1..=31, or 0 when unset.
    pub birth_day: u8,
    /// Index into the console's 12 favorite colors.
    pub favorite_color: u8,
    pub favorite: bool,
}

impl MiiData {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = LeSliceReader::from_slice(bytes);

        reader.seek_to(PROFILE_OFFSET)?;
        let profile = reader.get_u16_le()?;

        reader.seek_to(MII_NAME_OFFSET)?;
        let mii_name = read_name(&mut reader)?;

        reader.seek_to(CREATOR_NAME_OFFSET)?;
        let creator_name = read_name(&mut reader)?;

        Ok(Self {
            mii_name,
            creator_name,
            gender: if profile & 1 == 0 {
                MiiGender::Male
            } else {
                MiiGender::Female
            },
            birth_month: ((profile >> 1) & 0x0F) as u8,
            birth_day: ((profile >> 5) & 0x1F) as u8,
            favorite_color: ((profile >> 10) & 0x0F) as u8,
            favorite: (profile >> 14) & 1 != 0,
        })
    }
}

/// A NUL-terminated UTF-16LE name of at most ten code units.
fn read_name(reader: &mut LeSliceReader<'_>) -> Result<String, FormatError> {
    let mut units = Vec::with_capacity(NAME_UNITS);
    for _ in 0..NAME_UNITS {
        units.push(reader.get_u16_le()?);
    }
    let end = units.iter().position(|&u| u == 0).unwrap_or(NAME_UNITS);
    Ok(String::from_utf16_lossy(&units[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn decodes_names_and_profile() {
        let record = fixtures::mii_record("Kaede", "Yuki", 0b0100_1000_1010_1101);
        let mii = MiiData::from_bytes(&record).unwrap();

        assert_eq!(mii.mii_name, "Kaede");
        assert_eq!(mii.creator_name, "Yuki");
        assert_eq!(mii.gender, MiiGender::Female);
        assert_eq!(mii.birth_month, 6);
        assert_eq!(mii.birth_day, 5);
        assert_eq!(mii.favorite_color, 2);
        assert!(mii.favorite);
    }

    #[test]
    fn full_length_names_have_no_terminator() {
        let record = fixtures::mii_record("ABCDEFGHIJ", "とうきょう", 0);
        let mii = MiiData::from_bytes(&record).unwrap();
        assert_eq!(mii.mii_name, "ABCDEFGHIJ");
        assert_eq!(mii.creator_name, "とうきょう");
        assert_eq!(mii.gender, MiiGender::Male);
    }

    #[test]
    fn short_record_is_truncated() {
        let record = fixtures::mii_record("Kaede", "Yuki", 0);
        assert!(matches!(
            MiiData::from_bytes(&record[..0x50]),
            Err(FormatError::Truncated(_))
        ));
    }
}
