//! Decoded Letter documents.

use std::collections::BTreeMap;

use crate::codec::bpk1::Bpk1Block;
use crate::codec::letter::{MII_BLOCK, parse_letter};
use crate::structs::mii::MiiData;
use crate::structs::sheet::Sheet;
use crate::structs::stationery::Stationery;
use crate::utils::errors::FormatError;

/// Named block payloads, grouped by name in package order.
///
/// A name can occur several times; each occurrence is addressed by its index
/// among the blocks sharing that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks(BTreeMap<String, Vec<Vec<u8>>>);

impl Blocks {
    /// Payload of the `index`-th block called `name`, if there is one.
    pub fn get(&self, name: &str, index: usize) -> Option<&[u8]> {
        self.0.get(name)?.get(index).map(Vec::as_slice)
    }

    /// Every payload called `name`, in package order.
    pub fn occurrences(&self, name: &str) -> &[Vec<u8>] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
        self.0.iter().map(|(name, data)| (name.as_str(), data.as_slice()))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of payloads across all names.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl FromIterator<Bpk1Block> for Blocks {
    fn from_iter<T: IntoIterator<Item = Bpk1Block>>(iter: T) -> Self {
        let mut map: BTreeMap<String, Vec<Vec<u8>>> = BTreeMap::new();
        for block in iter {
            map.entry(block.name).or_default().push(block.data);
        }
        Self(map)
    }
}

/// One decoded Letter.
///
/// Only [`parse_letter`] (or [`LetterDocument::from_bytes`]) produces one, and
/// nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct LetterDocument {
    blocks: Blocks,
    thumbnails: Vec<Vec<u8>>,
    sender_mii: Option<MiiData>,
    stationery: Option<Stationery>,
    sheets: Vec<Sheet>,
}

impl LetterDocument {
    pub(crate) fn new(
        blocks: Blocks,
        thumbnails: Vec<Vec<u8>>,
        sender_mii: Option<MiiData>,
        stationery: Option<Stationery>,
        sheets: Vec<Sheet>,
    ) -> Self {
        Self {
            blocks,
            thumbnails,
            sender_mii,
            stationery,
            sheets,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        parse_letter(bytes)
    }

    pub fn blocks(&self) -> &Blocks {
        &self.blocks
    }

    /// Raw JPEG thumbnails in package order.
    pub fn thumbnails(&self) -> &[Vec<u8>] {
        &self.thumbnails
    }

    pub fn stationery(&self) -> Option<&Stationery> {
        self.stationery.as_ref()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sender_mii(&self) -> Option<&MiiData> {
        self.sender_mii.as_ref()
    }

    /// The sender's full Mii record as stored.
    pub fn sender_mii_bytes(&self) -> Option<&[u8]> {
        self.blocks.get(MII_BLOCK, 0)
    }
}

#[test]
fn block_lookup_misses_are_not_errors() {
    let blocks: Blocks = [
        Bpk1Block {
            name: "THUMB2".into(),
            data: vec![1],
        },
        Bpk1Block {
            name: "SHEET1".into(),
            data: vec![2],
        },
        Bpk1Block {
            name: "THUMB2".into(),
            data: vec![3],
        },
    ]
    .into_iter()
    .collect();

    assert_eq!(blocks.get("THUMB2", 0), Some(&[1u8][..]));
    assert_eq!(blocks.get("THUMB2", 1), Some(&[3u8][..]));
    assert_eq!(blocks.get("THUMB2", 2), None);
    assert_eq!(blocks.get("MISSING", 0), None);
    assert!(blocks.occurrences("MISSING").is_empty());
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks.total(), 3);
    assert_eq!(blocks.names().collect::<Vec<_>>(), ["SHEET1", "THUMB2"]);
}
