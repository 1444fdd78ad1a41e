// SPDX-License-Identifier: GPL-3.0-only

//! Screen-region capture and crop pipeline for chat-style image attachments
//!
//! This crate implements the capture side of a chat front end that queries a
//! backend with text and images: drag a rectangle over the live scene,
//! rasterize exactly that region once fonts and images have settled, or crop
//! a previously loaded image against its display-space preview.

pub mod attachment;
pub mod error;
pub mod gesture;
pub mod geometry;
pub mod loaded;
pub mod rasterizer;
pub mod readiness;
pub mod scene;
pub mod session;
pub mod settings;

// Re-export main types for easier usage
pub use attachment::{Attachment, AttachmentSlot, CaptureEvent, EncodedImage};
pub use error::CaptureError;
pub use gesture::{DragTracker, MIN_DRAG_PX};
pub use geometry::{map_rect, Rect};
pub use loaded::LoadedImage;
pub use rasterizer::{software::SoftwareRasterizer, RasterFrame, Rasterizer};
pub use readiness::{ReadinessReport, ResourceFetcher};
pub use scene::{ImageElement, ImageOrigin, NodeContent, NodeId, Scene};
pub use session::{CancelHandle, SessionController, SessionOutcome, SessionPhase};
pub use settings::CaptureSettings;

/// The current version of the snipkit library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
