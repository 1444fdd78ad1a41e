// SPDX-License-Identifier: GPL-3.0-only

/// Error type for the capture and crop pipeline.
///
/// The primary purpose of this type is to provide simple user facing messages
/// for failures that reach the session controller.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// A region was mandatory but the finalized rectangle has no area
    #[error("invalid capture region ({width}x{height})")]
    InvalidRegion { width: u32, height: u32 },
    /// A single cross-origin image could not be inlined (non-fatal, logged)
    #[error("resource fetch failed for {url}: {reason}")]
    ResourceFetch { url: String, reason: String },
    /// The underlying render threw or timed out
    #[error("rasterization failed: {0}")]
    Rasterization(String),
    /// A selected file is not a decodable image
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation cancelled")]
    Cancelled,
}

impl CaptureError {
    /// Condensed error message for end users.
    ///
    /// The session controller reports exactly one of these per failed
    /// attempt; the full error goes to the log.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRegion { .. } => "The selected region is empty",
            Self::ResourceFetch { .. } => "Some images could not be loaded",
            Self::Rasterization(_) => "The selected region could not be captured",
            Self::Decode(_) => "The selected file is not a supported image",
            Self::Image(_) => "The image could not be processed",
            Self::Io(_) => "A file could not be read or written",
            Self::Cancelled => "Capture cancelled",
        }
    }

    /// Whether the error aborts only a single resource rather than the
    /// whole capture attempt.
    #[must_use]
    pub fn is_per_resource(&self) -> bool {
        matches!(self, Self::ResourceFetch { .. })
    }
}
