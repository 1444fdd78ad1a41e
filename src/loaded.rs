// SPDX-License-Identifier: GPL-3.0-only

//! Loaded images and the crop extractor.
//!
//! A [`LoadedImage`] keeps the original full-resolution pixels alongside
//! the fit scale of the bounded preview it was drawn into. Crops always
//! copy from the full-resolution source, never from the display-scaled
//! render; that guarantee is the reason the decoded source is retained.

use std::io::Cursor;

use image::RgbaImage;

use crate::attachment::EncodedImage;
use crate::error::CaptureError;
use crate::gesture::MIN_DRAG_PX;
use crate::geometry::{map_rect, Rect};

#[derive(Debug, Clone)]
pub struct LoadedImage {
    name: Option<String>,
    source: RgbaImage,
    display_width: u32,
    display_height: u32,
}

impl LoadedImage {
    /// Decode selected file bytes into a loaded image.
    ///
    /// `max_display_width` bounds the preview surface; the fit scale is
    /// `min(max_display_width / natural_width, 1)` so small images are
    /// never upscaled.
    ///
    /// # Errors
    /// Returns `CaptureError::Decode` when the bytes are not a decodable
    /// image. The caller's previous image, if any, stays untouched.
    pub fn from_bytes(
        bytes: &[u8],
        name: Option<&str>,
        max_display_width: u32,
    ) -> Result<Self, CaptureError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| CaptureError::Decode(err.to_string()))?;
        Ok(Self::from_pixels(decoded.to_rgba8(), name, max_display_width))
    }

    /// Wrap already-decoded pixels, e.g. a fresh live-capture frame.
    #[must_use]
    pub fn from_pixels(source: RgbaImage, name: Option<&str>, max_display_width: u32) -> Self {
        let natural_width = source.width().max(1);
        let fit = (max_display_width as f32 / natural_width as f32).min(1.0);
        let display_width = ((natural_width as f32) * fit).round() as u32;
        let display_height = ((source.height() as f32) * fit).round() as u32;
        Self {
            name: name.map(str::to_owned),
            source,
            display_width,
            display_height,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn natural_size(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    /// Size of the display-space render target.
    #[must_use]
    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    /// Ratio `source_dimension / display_dimension`, fixed for the
    /// lifetime of this image.
    #[must_use]
    pub fn source_per_display(&self) -> f32 {
        self.source.width() as f32 / self.display_width as f32
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.source
    }

    /// Extract the source-resolution region behind a display-space
    /// rectangle.
    ///
    /// Rectangles with either side under the drag threshold mean "no
    /// visible drag, send everything": the full source image is returned
    /// unmodified. Otherwise the rectangle is mapped to source space,
    /// clamped to the natural bounds, and copied out of the original
    /// full-resolution pixels.
    ///
    /// # Errors
    /// Returns `CaptureError::InvalidRegion` when the mapped rectangle
    /// falls entirely outside the image, and `CaptureError::Image` if PNG
    /// encoding fails.
    pub fn crop_to_source(&self, display_rect: Rect) -> Result<EncodedImage, CaptureError> {
        if display_rect.below_threshold(MIN_DRAG_PX) {
            return encode_png(&self.source);
        }

        let (natural_width, natural_height) = self.source.dimensions();
        let mapped = map_rect(display_rect, self.source_per_display())
            .clamp_to(natural_width as f32, natural_height as f32);
        let width = mapped.width.round() as u32;
        let height = mapped.height.round() as u32;
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidRegion { width, height });
        }

        let x = mapped.x.round() as u32;
        let y = mapped.y.round() as u32;
        let cropped = image::imageops::crop_imm(&self.source, x, y, width, height).to_image();
        encode_png(&cropped)
    }
}

fn encode_png(pixels: &RgbaImage) -> Result<EncodedImage, CaptureError> {
    let mut bytes = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(EncodedImage::png(bytes))
}
