//! Border layout and canvas compositing

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::config::Config;

/// Canvas background
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Bilinear-class resampling
pub const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Image orientation; squares count as portrait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Where the scaled image lands on the target canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub orientation: Orientation,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Layout {
    /// Compute the layout of a `width` x `height` image on the configured canvas.
    ///
    /// Scaled sizes are truncated, and the centering offsets use integer
    /// halving, so odd remainders leave the image one pixel off center.
    pub fn compute(width: u32, height: u32, config: &Config) -> Self {
        let orientation = Orientation::of(width, height);
        let border = config.border_for(orientation);

        let (scaled_width, scaled_height) = if width == 0 || height == 0 {
            (0, 0)
        } else {
            let available_width = f64::from(config.target_width) * (1.0 - 2.0 * border.horizontal);
            let available_height = f64::from(config.target_height) * (1.0 - 2.0 * border.vertical);

            let scale = (available_width / f64::from(width))
                .min(available_height / f64::from(height));

            (
                (f64::from(width) * scale) as u32,
                (f64::from(height) * scale) as u32,
            )
        };

        Self {
            orientation,
            scaled_width,
            scaled_height,
            offset_x: config.target_width.saturating_sub(scaled_width) / 2,
            offset_y: config.target_height.saturating_sub(scaled_height) / 2,
        }
    }

    /// True when nothing would be drawn
    pub fn is_empty(&self) -> bool {
        self.scaled_width == 0 || self.scaled_height == 0
    }
}

/// Scale `image` into the bordered area and center it on a white canvas.
///
/// The result is always exactly `target_width` x `target_height`.
pub fn apply_border(image: &DynamicImage, config: &Config) -> RgbaImage {
    let layout = Layout::compute(image.width(), image.height(), config);

    debug!(
        "Bordering {}x{} ({:?}) -> {}x{} at ({}, {})",
        image.width(),
        image.height(),
        layout.orientation,
        layout.scaled_width,
        layout.scaled_height,
        layout.offset_x,
        layout.offset_y
    );

    let mut canvas = RgbaImage::from_pixel(config.target_width, config.target_height, BACKGROUND);
    if layout.is_empty() {
        return canvas;
    }

    let scaled = imageops::resize(
        &image.to_rgba8(),
        layout.scaled_width,
        layout.scaled_height,
        RESAMPLE_FILTER,
    );
    imageops::overlay(
        &mut canvas,
        &scaled,
        i64::from(layout.offset_x),
        i64::from(layout.offset_y),
    );

    canvas
}
