use log::{debug, trace, warn};

use crate::codec::bpk1;
use crate::structs::document::LetterDocument;
use crate::structs::mii::MiiData;
use crate::structs::sheet::Sheet;
use crate::structs::stationery::Stationery;
use crate::utils::errors::FormatError;

pub const THUMBNAIL_BLOCK: &str = "THUMB2";
pub const MII_BLOCK: &str = "MIISTD1";
pub const STATIONERY_BLOCK: &str = "STATIN1";
pub const SHEET_BLOCK: &str = "SHEET1";

/// Decodes a Letter file, compressed or not.
///
/// Every block stays reachable through [`LetterDocument::blocks`]; the ones
/// this crate understands are decoded on top of that.
pub fn parse_letter(bytes: &[u8]) -> Result<LetterDocument, FormatError> {
    let raw = bpk1::read_blocks(bytes)?;

    let mut thumbnails = vec![];
    let mut sender_mii = None;
    let mut stationery = None;
    let mut sheets = vec![];

    for block in &raw {
        match block.name.as_str() {
            THUMBNAIL_BLOCK => thumbnails.push(block.data.clone()),
            STATIONERY_BLOCK => {
                if stationery.is_some() {
                    warn!("Ignoring additional {STATIONERY_BLOCK} block");
                    continue;
                }
                stationery = Some(Stationery::from_bpk1_bytes(&block.data)?);
            }
            SHEET_BLOCK => sheets.push(Sheet::from_bytes(&block.data)?),
            MII_BLOCK => {
                if sender_mii.is_some() {
                    warn!("Ignoring additional {MII_BLOCK} block");
                    continue;
                }
                sender_mii = Some(MiiData::from_bytes(&block.data)?);
            }
            other => trace!("Keeping unrecognized block {other} undecoded"),
        }
    }

    debug!(
        "Letter: {} blocks, {} thumbnails, {} sheets, stationery: {}, sender: {:?}",
        raw.len(),
        thumbnails.len(),
        sheets.len(),
        stationery.is_some(),
        sender_mii.as_ref().map(|mii| mii.mii_name.as_str())
    );

    Ok(LetterDocument::new(
        raw.into_iter().collect(),
        thumbnails,
        sender_mii,
        stationery,
        sheets,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::bpk1::Bpk1Writer;
    use crate::codec::lzss;
    use crate::fixtures;

    #[test]
    fn decodes_known_blocks() {
        let bytes = fixtures::letter_bytes(2, Some(fixtures::stationery(3)), 1);
        let letter = parse_letter(&bytes).unwrap();

        assert_eq!(letter.thumbnails().len(), 2);
        let mii = letter.sender_mii().unwrap();
        assert_eq!(mii.mii_name, fixtures::MII_NAME);
        assert_eq!(mii.creator_name, fixtures::MII_CREATOR);
        assert_eq!(
            letter.sender_mii_bytes(),
            Some(fixtures::mii_record(fixtures::MII_NAME, fixtures::MII_CREATOR, 0).as_slice())
        );
        assert_eq!(letter.sheets().len(), 1);

        let strokes = &letter.sheets()[0].strokes;
        assert_eq!(strokes.len(), 2);
        assert_eq!((strokes[0].x, strokes[0].y), (0x35, 0x50));
        assert!(strokes[0].draw_line);
        assert_eq!(strokes[0].style_color, 2);
        assert!(strokes[0].style_bold);

        let stationery = letter.stationery().unwrap();
        assert_eq!(stationery.name(), fixtures::STATIONERY_NAME);
        assert_eq!(stationery.mask()[255][255], 3);
        assert_eq!(letter.blocks().occurrences(STATIONERY_BLOCK).len(), 1);
    }

    #[test]
    fn compressed_letter_matches_plain() {
        let plain = fixtures::letter_bytes(1, None, 2);
        let packed = lzss::compress(&plain).unwrap();

        let a = parse_letter(&plain).unwrap();
        let b = parse_letter(&packed).unwrap();
        assert_eq!(a.blocks(), b.blocks());
        assert_eq!(a.sheets(), b.sheets());
    }

    #[test]
    fn unknown_blocks_are_kept_raw() {
        let mut writer = Bpk1Writer::new();
        writer.push("EXTRA9", vec![7, 7, 7]).unwrap();
        let letter = parse_letter(&writer.finish()).unwrap();

        assert!(letter.thumbnails().is_empty());
        assert!(letter.stationery().is_none());
        assert!(letter.sender_mii().is_none());
        assert!(letter.sender_mii_bytes().is_none());
        assert_eq!(letter.blocks().get("EXTRA9", 0), Some(&[7u8, 7, 7][..]));
    }

    #[test]
    fn only_first_stationery_is_decoded() {
        let mut writer = Bpk1Writer::new();
        writer
            .push(STATIONERY_BLOCK, fixtures::stationery(1))
            .unwrap()
            .push(STATIONERY_BLOCK, vec![0xAA; 12])
            .unwrap();
        let letter = parse_letter(&writer.finish()).unwrap();

        assert_eq!(letter.stationery().unwrap().mask()[0][0], 1);
        assert_eq!(letter.blocks().occurrences(STATIONERY_BLOCK).len(), 2);
    }

    #[test]
    fn truncated_mii_fails_the_letter() {
        let mut writer = Bpk1Writer::new();
        writer.push(MII_BLOCK, vec![0u8; 0x20]).unwrap();
        assert!(matches!(
            parse_letter(&writer.finish()),
            Err(FormatError::Truncated(_))
        ));
    }
}
