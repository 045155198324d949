//! Render-ready Letters, as produced by [`crate::render::post_process`].

use crate::structs::asset::ImageAsset;
use crate::structs::sheet::Sheet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStationery {
    pub name: String,
    /// 2D background, JPEG bytes untouched.
    pub background_2d: ImageAsset,
    /// 3D background, JPEG bytes untouched.
    pub background_3d: ImageAsset,
    /// 256×256 PNG whose alpha channel is the expanded mask; RGB is black.
    /// Meant to be drawn over `background_3d`.
    pub mask: ImageAsset,
    /// 250×230 PNG: the 2D background with the masked 3D layer drawn on top.
    pub composite: ImageAsset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLetter {
    pub thumbnails: Vec<ImageAsset>,
    pub stationery: Option<RenderedStationery>,
    pub sheets: Vec<Sheet>,
}
