// SPDX-License-Identifier: GPL-3.0-only

use std::io::Cursor;

use async_trait::async_trait;
use image::RgbaImage;

use crate::attachment::EncodedImage;
use crate::error::CaptureError;
use crate::geometry::Rect;
use crate::scene::{NodeId, Scene};

/// A rasterized region of the scene.
///
/// Holds raw RGBA pixels so follow-up crops can work on the buffer
/// directly instead of decoding the encoded output again.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pub pixels: RgbaImage,
}

impl RasterFrame {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encode the frame as PNG, alpha channel included.
    ///
    /// # Errors
    /// Returns `CaptureError::Image` if PNG encoding fails.
    pub fn encode_png(&self) -> Result<EncodedImage, CaptureError> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(EncodedImage::png(bytes))
    }
}

/// Renders a rectangle of the scene into a pixel frame.
///
/// Every node in `exclude` (the capture overlay and transient chrome) must
/// be left out of the output, the render is clipped and offset to exactly
/// `region`, and background transparency is preserved rather than
/// composited over a default background. A zero-area `region` is invalid
/// input and fails fast with [`CaptureError::InvalidRegion`].
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(
        &self,
        scene: &Scene,
        region: Rect,
        exclude: &[NodeId],
    ) -> Result<RasterFrame, CaptureError>;

    fn name(&self) -> &'static str;
}

pub mod software;
