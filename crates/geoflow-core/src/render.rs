//! Categorical PNG rendering of classified rasters.
//!
//! Each classification rule owns a static palette mapping class ids to RGB
//! colours; classes with no palette entry (including the no-data sentinel)
//! fall back to the palette's background colour.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use crate::classify::Classified;
use crate::error::Result;

/// A static class-id → RGB mapping with a background colour for everything
/// else (no-data, excluded cells).
#[derive(Debug)]
pub struct Palette {
    pub background: [u8; 3],
    pub entries: &'static [(u8, [u8; 3])],
}

impl Palette {
    pub fn color_of(&self, class: u8) -> [u8; 3] {
        self.entries
            .iter()
            .find(|(id, _)| *id == class)
            .map(|(_, rgb)| *rgb)
            .unwrap_or(self.background)
    }
}

/// Land cover: water, barren, built-up, sparse and dense vegetation.
pub static LULC_PALETTE: Palette = Palette {
    background: [255, 255, 255],
    entries: &[
        (1, [0, 0, 255]),     // Water
        (2, [210, 180, 140]), // Barren
        (3, [128, 128, 128]), // Built-up
        (4, [154, 205, 50]),  // Sparse Vegetation
        (5, [0, 128, 0]),     // Dense Vegetation
    ],
};

/// Flood risk: safe through high.
pub static FLOOD_PALETTE: Palette = Palette {
    background: [255, 255, 255],
    entries: &[
        (0, [34, 139, 34]),  // Safe
        (1, [255, 255, 0]),  // Low
        (2, [255, 140, 0]),  // Medium
        (3, [220, 20, 60]),  // High
    ],
};

/// Site suitability: very low through very high.
pub static SUITABILITY_PALETTE: Palette = Palette {
    background: [128, 128, 128],
    entries: &[
        (1, [255, 255, 224]), // Very Low
        (2, [240, 230, 140]), // Low
        (3, [143, 188, 143]), // Moderate
        (4, [60, 179, 113]),  // High
        (5, [34, 139, 34]),   // Very High
    ],
};

/// Render a classified raster to a PNG at `path`, one pixel per cell.
pub fn render_classified(classified: &Classified, path: &Path) -> Result<()> {
    let raster = &classified.raster;
    let width = raster.width() as u32;
    let height = raster.height() as u32;
    let mut img = RgbImage::new(width, height);
    let band = raster.band(0);
    for (i, &v) in band.iter().enumerate() {
        let class = if v.is_finite() && (0.0..=255.0).contains(&v) {
            v as u8
        } else {
            u8::MAX
        };
        let [r, g, b] = classified.palette.color_of(class);
        let x = (i % raster.meta.width) as u32;
        let y = (i / raster.meta.width) as u32;
        img.put_pixel(x, y, Rgb([r, g, b]));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    img.save(path)?;
    Ok(())
}
