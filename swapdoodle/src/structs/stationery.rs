//! Stationery: the decorative background bundled with a Letter.
//!
//! The `STATIN1` block of a Letter is a nested BPK1 package holding the
//! stationery name, two JPEG backgrounds and a 4-bit transparency mask for
//! the 3D background.

use log::{debug, warn};

use crate::codec::bpk1;
use crate::structs::document::Blocks;
use crate::utils::byte_io::LeSliceReader;
use crate::utils::errors::FormatError;

pub const NAME_BLOCK: &str = "NAME1";
pub const BACKGROUND_2D_BLOCK: &str = "BG2D1";
pub const BACKGROUND_3D_BLOCK: &str = "BG3D1";
pub const MASK_BLOCK: &str = "MASK1";

/// Canvas of the 2D background, `(width, height)`.
pub const CANVAS_2D: (u32, u32) = (250, 230);
/// Canvas of the 3D background and its mask, `(width, height)`.
pub const CANVAS_3D: (u32, u32) = (256, 256);
/// Rows and columns of a well-formed mask grid.
pub const MASK_SIZE: usize = 256;
pub const MASK_MAX: u8 = 0x0F;

/// Row-major 4-bit intensities. Well-formed grids are 256×256; the codec does
/// not enforce that, rendering does.
pub type MaskGrid = Vec<Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stationery {
    name: String,
    background_2d: Vec<u8>,
    background_3d: Vec<u8>,
    mask: MaskGrid,
    blocks: Blocks,
}

impl Stationery {
    pub(crate) fn from_bpk1_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        let blocks: Blocks = bpk1::read_blocks(bytes)?.into_iter().collect();

        let required = |name: &'static str| {
            blocks
                .get(name, 0)
                .map(<[u8]>::to_vec)
                .ok_or(FormatError::MissingStationeryBlock(name))
        };

        let background_2d = required(BACKGROUND_2D_BLOCK)?;
        let background_3d = required(BACKGROUND_3D_BLOCK)?;
        let mask = unpack_mask(&required(MASK_BLOCK)?)?;

        let name = match blocks.get(NAME_BLOCK, 0) {
            Some(raw) => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                String::from_utf8_lossy(&raw[..end]).into_owned()
            }
            None => {
                warn!("Stationery has no {NAME_BLOCK} block");
                String::new()
            }
        };

        debug!(
            "Stationery \"{name}\": 2D {} bytes, 3D {} bytes, mask {} rows",
            background_2d.len(),
            background_3d.len(),
            mask.len()
        );

        Ok(Self {
            name,
            background_2d,
            background_3d,
            mask,
            blocks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// JPEG bytes for the 250×230 canvas.
    pub fn background_2d(&self) -> &[u8] {
        &self.background_2d
    }

    /// JPEG bytes for the 256×256 canvas.
    pub fn background_3d(&self) -> &[u8] {
        &self.background_3d
    }

    pub fn mask(&self) -> &MaskGrid {
        &self.mask
    }

    /// Every block of the nested package, including the ones decoded above.
    pub fn blocks(&self) -> &Blocks {
        &self.blocks
    }
}

/// Expands packed nibbles (low nibble first) into rows of [`MASK_SIZE`].
///
/// A payload shorter than a full grid leaves a short last row.
pub fn unpack_mask(packed: &[u8]) -> Result<MaskGrid, FormatError> {
    let mut reader = LeSliceReader::from_slice(packed);
    let mut values = Vec::with_capacity(packed.len() * 2);
    for _ in 0..packed.len() * 2 {
        values.push(reader.get_nibble()?);
    }

    Ok(values.chunks(MASK_SIZE).map(<[u8]>::to_vec).collect())
}

/// Packs a grid back into nibbles. Values are truncated to four bits.
pub fn pack_mask(mask: &MaskGrid) -> Vec<u8> {
    let values: Vec<u8> = mask.iter().flatten().map(|v| v & MASK_MAX).collect();
    values
        .chunks(2)
        .map(|pair| pair[0] | pair.get(1).map_or(0, |high| high << 4))
        .collect()
}
