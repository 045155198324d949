//! Post-processing of decoded Letters into display-ready assets.
//!
//! Thumbnails and backgrounds pass through untouched. The 4-bit stationery
//! mask is expanded into an RGBA overlay and, together with both backgrounds,
//! flattened into a single composite matching what the device shows.

use image::{Rgba, RgbaImage};
use log::{Level, debug};

use crate::log_or_err;
use crate::structs::asset::{AssetFormat, ImageAsset};
use crate::structs::document::LetterDocument;
use crate::structs::rendered::{RenderedLetter, RenderedStationery};
use crate::structs::stationery::{CANVAS_2D, CANVAS_3D, MASK_MAX, MASK_SIZE, MaskGrid, Stationery};
use crate::utils::errors::RenderError;

mod blend;

pub use blend::over;

/// Converts a [`LetterDocument`] into a [`RenderedLetter`].
#[derive(Debug, Clone)]
pub struct PostProcessor {
    pub(crate) fail_level: Level,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            fail_level: Level::Error,
        }
    }
}

impl PostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics at or above `level` become errors instead of log lines.
    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    pub fn fail_level(&self) -> Level {
        self.fail_level
    }

    pub fn process(&self, document: &LetterDocument) -> Result<RenderedLetter, RenderError> {
        let thumbnails = document
            .thumbnails()
            .iter()
            .map(|bytes| ImageAsset::from_encoded(bytes.clone(), AssetFormat::Jpeg))
            .collect::<Result<Vec<_>, _>>()?;

        let stationery = document
            .stationery()
            .map(|s| self.render_stationery(s))
            .transpose()?;

        Ok(RenderedLetter {
            thumbnails,
            stationery,
            sheets: document.sheets().to_vec(),
        })
    }

    fn render_stationery(&self, stationery: &Stationery) -> Result<RenderedStationery, RenderError> {
        let background_2d =
            ImageAsset::from_encoded(stationery.background_2d().to_vec(), AssetFormat::Jpeg)?;
        self.check_canvas("2D background", &background_2d, CANVAS_2D)?;

        let background_3d =
            ImageAsset::from_encoded(stationery.background_3d().to_vec(), AssetFormat::Jpeg)?;
        self.check_canvas("3D background", &background_3d, CANVAS_3D)?;

        let overlay = mask_overlay(stationery.mask())?;
        let composite =
            flatten_stationery(&background_2d.decode()?, &background_3d.decode()?, &overlay)?;

        debug!(
            "Rendered stationery \"{}\" ({}x{} composite)",
            stationery.name(),
            composite.width(),
            composite.height()
        );

        Ok(RenderedStationery {
            name: stationery.name().to_owned(),
            background_2d,
            background_3d,
            mask: ImageAsset::from_rgba(&overlay)?,
            composite: ImageAsset::from_rgba(&composite)?,
        })
    }

    fn check_canvas(
        &self,
        layer: &'static str,
        asset: &ImageAsset,
        (canvas_width, canvas_height): (u32, u32),
    ) -> Result<(), RenderError> {
        if asset.dimensions() != (canvas_width, canvas_height) {
            log_or_err!(
                self,
                Level::Warn,
                RenderError::CanvasMismatch {
                    layer,
                    width: asset.width(),
                    height: asset.height(),
                    canvas_width,
                    canvas_height,
                }
            );
        }
        Ok(())
    }
}

/// Post-processes with the default (lenient) settings.
pub fn post_process(document: &LetterDocument) -> Result<RenderedLetter, RenderError> {
    PostProcessor::default().process(document)
}

/// Checks that `mask` is a full 256×256 grid of 4-bit values.
pub fn validate_mask(mask: &MaskGrid) -> Result<(), RenderError> {
    if mask.len() != MASK_SIZE {
        return Err(RenderError::MaskRowCount {
            expected: MASK_SIZE,
            found: mask.len(),
        });
    }

    for (row, entries) in mask.iter().enumerate() {
        if entries.len() != MASK_SIZE {
            return Err(RenderError::MaskRowLength {
                row,
                expected: MASK_SIZE,
                found: entries.len(),
            });
        }
        if let Some((column, &value)) = entries.iter().enumerate().find(|(_, v)| **v > MASK_MAX) {
            return Err(RenderError::MaskValueOutOfRange { row, column, value });
        }
    }

    Ok(())
}

/// Expands a mask into a 256×256 overlay: black, with alpha `m × 17`.
pub fn mask_overlay(mask: &MaskGrid) -> Result<RgbaImage, RenderError> {
    validate_mask(mask)?;

    let (width, height) = CANVAS_3D;
    let mut overlay = surface(width, height)?;
    for (y, row) in mask.iter().enumerate() {
        for (x, &value) in row.iter().enumerate() {
            overlay.put_pixel(x as u32, y as u32, Rgba([0, 0, 0, value * 17]));
        }
    }

    Ok(overlay)
}

/// Flattens the stationery onto the 250×230 canvas.
///
/// The 2D background is drawn first. The 3D background is then drawn on a
/// 256×256 layer whose alpha is replaced by the overlay's, and that layer is
/// composited source-over at the origin. Both layers are clipped to their
/// canvases.
pub fn flatten_stationery(
    background_2d: &RgbaImage,
    background_3d: &RgbaImage,
    overlay: &RgbaImage,
) -> Result<RgbaImage, RenderError> {
    let (canvas_width, canvas_height) = CANVAS_2D;
    let mut canvas = surface(canvas_width, canvas_height)?;
    draw(&mut canvas, background_2d);

    let (layer_width, layer_height) = CANVAS_3D;
    let mut layer = surface(layer_width, layer_height)?;
    draw(&mut layer, background_3d);
    for (x, y, pixel) in layer.enumerate_pixels_mut() {
        pixel[3] = if x < overlay.width() && y < overlay.height() {
            overlay.get_pixel(x, y)[3]
        } else {
            0
        };
    }

    draw(&mut canvas, &layer);
    Ok(canvas)
}

fn draw(dst: &mut RgbaImage, src: &RgbaImage) {
    let width = dst.width().min(src.width());
    let height = dst.height().min(src.height());
    for y in 0..height {
        for x in 0..width {
            let out = over(dst.get_pixel(x, y).0, src.get_pixel(x, y).0);
            dst.put_pixel(x, y, Rgba(out));
        }
    }
}

fn surface(width: u32, height: u32) -> Result<RgbaImage, RenderError> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(RenderError::Surface { width, height })?;
    RgbaImage::from_raw(width, height, vec![0; len]).ok_or(RenderError::Surface { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn flat_mask(value: u8) -> MaskGrid {
        vec![vec![value; MASK_SIZE]; MASK_SIZE]
    }

    #[test]
    fn overlay_alpha_is_mask_times_17() {
        let mut mask = flat_mask(0);
        mask[3][7] = 15;
        mask[255][0] = 8;

        let overlay = mask_overlay(&mask).unwrap();
        assert_eq!(overlay.dimensions(), (256, 256));
        assert_eq!(overlay.get_pixel(7, 3).0, [0, 0, 0, 255]);
        assert_eq!(overlay.get_pixel(0, 255).0, [0, 0, 0, 136]);
        assert_eq!(overlay.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn malformed_masks_are_render_errors() {
        let mut short_row = flat_mask(1);
        short_row[10].pop();
        assert!(matches!(
            mask_overlay(&short_row),
            Err(RenderError::MaskRowLength {
                row: 10,
                found: 255,
                ..
            })
        ));

        let mut missing_rows = flat_mask(1);
        missing_rows.truncate(100);
        assert!(matches!(
            mask_overlay(&missing_rows),
            Err(RenderError::MaskRowCount { found: 100, .. })
        ));

        let mut too_bright = flat_mask(1);
        too_bright[2][5] = 16;
        assert!(matches!(
            mask_overlay(&too_bright),
            Err(RenderError::MaskValueOutOfRange {
                row: 2,
                column: 5,
                value: 16
            })
        ));
    }

    #[test]
    fn composite_follows_mask_extremes() {
        let bg2d = RgbaImage::from_pixel(250, 230, Rgba([200, 10, 10, 255]));
        let bg3d = RgbaImage::from_pixel(256, 256, Rgba([10, 10, 200, 255]));

        let mut mask = flat_mask(0);
        mask[0][0] = 15;
        let overlay = mask_overlay(&mask).unwrap();

        let composite = flatten_stationery(&bg2d, &bg3d, &overlay).unwrap();
        assert_eq!(composite.dimensions(), (250, 230));
        assert_eq!(composite.get_pixel(0, 0).0, [10, 10, 200, 255]);
        assert_eq!(composite.get_pixel(1, 0).0, [200, 10, 10, 255]);
        assert_eq!(composite.get_pixel(249, 229).0, [200, 10, 10, 255]);
    }

    #[test]
    fn letter_without_stationery_keeps_thumbnails() {
        let document = fixtures::letter_document(2, None, 1);
        let rendered = post_process(&document).unwrap();

        assert_eq!(rendered.thumbnails.len(), 2);
        assert!(rendered.stationery.is_none());
        assert_eq!(rendered.sheets.len(), 1);
        for (asset, raw) in rendered.thumbnails.iter().zip(document.thumbnails()) {
            assert_eq!(asset.format(), AssetFormat::Jpeg);
            assert_eq!(asset.bytes(), raw.as_slice());
        }
    }

    #[test]
    fn stationery_is_rendered() {
        let document = fixtures::letter_document(1, Some(fixtures::stationery(15)), 0);
        let rendered = post_process(&document).unwrap();
        let stationery = rendered.stationery.unwrap();

        assert_eq!(stationery.name, fixtures::STATIONERY_NAME);
        assert_eq!(stationery.background_2d.dimensions(), CANVAS_2D);
        assert_eq!(stationery.mask.format(), AssetFormat::Png);
        assert_eq!(stationery.composite.dimensions(), CANVAS_2D);

        let mask = stationery.mask.decode().unwrap();
        assert!(mask.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        // Fully opaque mask: the composite is the 3D background.
        let composite = stationery.composite.decode().unwrap();
        let bg3d = stationery.background_3d.decode().unwrap();
        for (x, y, pixel) in composite.enumerate_pixels() {
            assert_eq!(pixel.0[..3], bg3d.get_pixel(x, y).0[..3]);
            assert_eq!(pixel.0[3], 255);
        }
    }

    #[test]
    fn canvas_mismatch_is_fatal_only_when_strict() {
        let document = fixtures::letter_document(0, Some(fixtures::stationery_sized((64, 64), 4)), 0);
        assert!(post_process(&document).is_ok());

        let mut strict = PostProcessor::new();
        strict.set_fail_level(Level::Warn);
        assert!(matches!(
            strict.process(&document),
            Err(RenderError::CanvasMismatch {
                layer: "2D background",
                width: 64,
                height: 64,
                ..
            })
        ));
    }

    #[test]
    fn undecodable_thumbnail_fails() {
        let document = fixtures::letter_document_with_thumbnail(b"\x00\x01garbage".to_vec());
        assert!(matches!(
            post_process(&document),
            Err(RenderError::Image { .. })
        ));
    }
}
