//! BPK1 block packages.
//!
//! A package is a 0x40 byte header (`b"BPK1"`, block count, reserved bytes)
//! followed by a table of 20 byte entries (offset, size, CRC-32, 8 byte
//! NUL-padded name) and the block payloads at the offsets the table names.
//! The whole package may be wrapped in LZSS compression.

use std::borrow::Cow;

use log::{debug, trace};
use swapdoodled_macros::ToBytes;

use crate::codec::lzss;
use crate::utils::byte_io::LeSliceReader;
use crate::utils::crc::BPK1_CRC;
use crate::utils::errors::FormatError;

pub const BPK1_MAGIC: [u8; 4] = *b"BPK1";
pub const HEADER_SIZE: usize = 0x40;
pub const ENTRY_SIZE: usize = 20;
pub const BLOCK_NAME_LEN: usize = 8;

/// A named payload read from, or destined for, a BPK1 package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bpk1Block {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(ToBytes)]
struct ContainerHeader {
    magic: [u8; 4],
    num_blocks: u32,
    reserved: [u8; HEADER_SIZE - 8],
}

#[derive(ToBytes)]
struct BlockEntry {
    offset: u32,
    size: u32,
    checksum: u32,
    name: [u8; BLOCK_NAME_LEN],
}

pub fn has_bpk1_magic(bytes: &[u8]) -> bool {
    bytes.get(0..4).is_some_and(|magic| magic == BPK1_MAGIC)
}

pub fn calc_bpk1_checksum(data: &[u8]) -> u32 {
    BPK1_CRC.checksum(data)
}

fn block_name(raw: &[u8; BLOCK_NAME_LEN]) -> Result<String, FormatError> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(BLOCK_NAME_LEN);
    String::from_utf8(raw[..end].to_vec())
        .map_err(|_| FormatError::InvalidBlockName(raw[..end].to_vec()))
}

/// Reads every block of a package, decompressing it first when needed.
///
/// Blocks are returned in table order. Each payload is checked against the
/// CRC-32 stored in its table entry.
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Bpk1Block>, FormatError> {
    let data: Cow<'_, [u8]> = if has_bpk1_magic(bytes) {
        Cow::Borrowed(bytes)
    } else {
        let decompressed = lzss::decompress(bytes)?;
        if !has_bpk1_magic(&decompressed) {
            return Err(FormatError::BadMagic);
        }
        Cow::Owned(decompressed)
    };

    let mut reader = LeSliceReader::from_slice(&data);
    reader.skip_bytes(4)?;
    let num_blocks = reader.get_u32_le()? as usize;
    reader.skip_bytes((HEADER_SIZE - 8) as u64)?;

    debug!("BPK1 package with {num_blocks} blocks ({} bytes)", data.len());

    let table_room = reader.available()? as usize / ENTRY_SIZE;
    let mut entries = Vec::with_capacity(num_blocks.min(table_room));

    for _ in 0..num_blocks {
        entries.push(BlockEntry {
            offset: reader.get_u32_le()?,
            size: reader.get_u32_le()?,
            checksum: reader.get_u32_le()?,
            name: reader.get_array()?,
        });
    }

    // Payloads are read after the whole table since reading them seeks around.
    entries
        .into_iter()
        .map(|entry| {
            let name = block_name(&entry.name)?;

            reader.seek_to(entry.offset as u64)?;
            trace!(
                "Reading {name} at offset {} with size {}",
                entry.offset, entry.size
            );
            let data = reader.get_bytes(entry.size as usize)?;

            let calculated = calc_bpk1_checksum(&data);
            if calculated != entry.checksum {
                return Err(FormatError::ChecksumMismatch {
                    name,
                    calculated,
                    read: entry.checksum,
                });
            }

            Ok(Bpk1Block { name, data })
        })
        .collect()
}

/// Builds a BPK1 package.
///
/// ```rust
/// use swapdoodle::codec::bpk1::{Bpk1Writer, read_blocks};
///
/// let mut writer = Bpk1Writer::new();
/// writer.push("THUMB2", vec![0xFF, 0xD8])?;
/// let package = writer.finish();
///
/// let blocks = read_blocks(&package)?;
/// assert_eq!(blocks[0].name, "THUMB2");
/// # Ok::<(), swapdoodle::utils::errors::FormatError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct Bpk1Writer {
    blocks: Vec<Bpk1Block>,
}

impl Bpk1Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block. Names are at most eight bytes and may not contain NUL.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, FormatError> {
        let name = name.into();
        if name.len() > BLOCK_NAME_LEN || name.as_bytes().contains(&0) {
            return Err(FormatError::InvalidBlockName(name.into_bytes()));
        }

        self.blocks.push(Bpk1Block {
            name,
            data: data.into(),
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serializes the package: header, block table, then payloads in order.
    pub fn finish(&self) -> Vec<u8> {
        let table_end = HEADER_SIZE + ENTRY_SIZE * self.blocks.len();
        let payload_len: usize = self.blocks.iter().map(|b| b.data.len()).sum();

        let mut out = Vec::with_capacity(table_end + payload_len);
        out.extend(
            ContainerHeader {
                magic: BPK1_MAGIC,
                num_blocks: self.blocks.len() as u32,
                reserved: [0; HEADER_SIZE - 8],
            }
            .to_le_vec(),
        );

        let mut offset = table_end;
        for block in &self.blocks {
            let mut name = [0u8; BLOCK_NAME_LEN];
            name[..block.name.len()].copy_from_slice(block.name.as_bytes());

            out.extend(
                BlockEntry {
                    offset: offset as u32,
                    size: block.data.len() as u32,
                    checksum: calc_bpk1_checksum(&block.data),
                    name,
                }
                .to_le_vec(),
            );
            offset += block.data.len();
        }

        for block in &self.blocks {
            out.extend_from_slice(&block.data);
        }

        out
    }
}
