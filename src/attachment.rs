// SPDX-License-Identifier: GPL-3.0-only

//! Attachment artifacts handed to the network-layer collaborator.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::error::CaptureError;

/// Encoded image bytes plus their format tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EncodedImage {
    #[must_use]
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: ImageFormat::Png,
        }
    }

    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Inline data-URL payload, the form the request layer embeds in JSON
    /// bodies.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), STANDARD.encode(&self.bytes))
    }
}

/// The terminal artifact of either capture flow: the encoded image plus an
/// optional bounded preview for the composer UI.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub image: EncodedImage,
    pub preview: Option<EncodedImage>,
}

impl Attachment {
    #[must_use]
    pub fn new(image: EncodedImage) -> Self {
        Self {
            image,
            preview: None,
        }
    }

    #[must_use]
    pub fn with_preview(image: EncodedImage, preview: EncodedImage) -> Self {
        Self {
            image,
            preview: Some(preview),
        }
    }
}

/// Aspect-preserving preview encode, targeting `target_height` lines.
/// Images already small enough are passed through at natural size.
///
/// # Errors
/// Returns `CaptureError::Image` if PNG encoding fails.
pub fn make_preview(pixels: &RgbaImage, target_height: u32) -> Result<EncodedImage, CaptureError> {
    let (width, height) = pixels.dimensions();
    let thumbnail = if height <= target_height {
        pixels.clone()
    } else {
        let aspect = width as f32 / height as f32;
        let thumb_width = ((target_height as f32 * aspect).round() as u32).max(1);
        image::imageops::thumbnail(pixels, thumb_width, target_height)
    };

    let mut bytes = Vec::new();
    thumbnail.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(EncodedImage::png(bytes))
}

/// Events emitted toward the (external) message composer.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    AttachmentReady(Attachment),
    AttachmentCleared,
    /// One user-facing message per failed capture attempt
    CaptureFailed(String),
}

/// The composer-side slot holding at most one pending attachment.
///
/// Replaces the original's ambient `attachedFile`/`attachedPreview`
/// globals: a new attachment replaces the old one wholesale, and clearing
/// is explicit.
#[derive(Debug, Default)]
pub struct AttachmentSlot {
    current: Option<Attachment>,
}

impl AttachmentSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, attachment: Attachment) {
        self.current = Some(attachment);
    }

    /// Clear the slot; returns whether anything was held.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Hand the attachment to the sender, leaving the slot empty.
    pub fn take(&mut self) -> Option<Attachment> {
        self.current.take()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Attachment> {
        self.current.as_ref()
    }
}
