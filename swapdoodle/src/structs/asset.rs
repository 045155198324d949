use std::fmt::{Display, Formatter};
use std::io::Cursor;

use image::{ImageFormat, ImageReader, RgbaImage};
use serde::Serialize;

use crate::utils::errors::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetFormat {
    Jpeg,
    Png,
}

impl AssetFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AssetFormat::Jpeg => "image/jpeg",
            AssetFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AssetFormat::Jpeg => "jpg",
            AssetFormat::Png => "png",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            AssetFormat::Jpeg => ImageFormat::Jpeg,
            AssetFormat::Png => ImageFormat::Png,
        }
    }
}

impl Display for AssetFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An encoded, displayable image.
///
/// The bytes are kept exactly as produced or received; only the header is
/// inspected to learn the dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    format: AssetFormat,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl ImageAsset {
    /// Tags already-encoded bytes with `format`, probing their dimensions.
    pub fn from_encoded(bytes: Vec<u8>, format: AssetFormat) -> Result<Self, RenderError> {
        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format.image_format())
            .into_dimensions()
            .map_err(|e| RenderError::image(format!("probing {format} header"), e))?;

        Ok(Self {
            format,
            width,
            height,
            bytes,
        })
    }

    /// Encodes an RGBA buffer as PNG.
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, RenderError> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::image("encoding png", e))?;

        Ok(Self {
            format: AssetFormat::Png,
            width: image.width(),
            height: image.height(),
            bytes,
        })
    }

    /// Decodes the asset into straight (non-premultiplied) RGBA8.
    pub fn decode(&self) -> Result<RgbaImage, RenderError> {
        image::load_from_memory_with_format(&self.bytes, self.format.image_format())
            .map(|img| img.to_rgba8())
            .map_err(|e| RenderError::image(format!("decoding {}", self.format), e))
    }

    pub fn format(&self) -> AssetFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
