// SPDX-License-Identifier: GPL-3.0-only

//! The renderable scene the live-capture flow operates on.
//!
//! A [`Scene`] is an ordered list of rectangular nodes over a viewport,
//! painted back to front. Image nodes reference an [`ImageElement`] that
//! tracks decode state and origin, so the readiness gate can wait for
//! in-flight loads and inline cross-origin pixels before rasterization.

use image::RgbaImage;
use tokio::sync::oneshot;

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

#[derive(Debug)]
pub enum NodeContent {
    /// Solid RGBA fill
    Fill([u8; 4]),
    /// Reference into the scene's image elements
    Image(ImageId),
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub bounds: Rect,
    pub content: NodeContent,
    pub hidden: bool,
}

/// Where an image's bytes came from. Remote images taint the output
/// unless their pixels are inlined first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Local,
    Remote(String),
}

/// Decode state of one image element.
pub enum ImageData {
    /// Decoded pixels, safe to composite
    Ready(RgbaImage),
    /// Load still in flight; resolved by the readiness gate
    Pending(oneshot::Receiver<Result<RgbaImage, String>>),
    /// Load failed or timed out; composites as blank
    Unavailable,
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(img) => write!(f, "Ready({}x{})", img.width(), img.height()),
            Self::Pending(_) => write!(f, "Pending"),
            Self::Unavailable => write!(f, "Unavailable"),
        }
    }
}

#[derive(Debug)]
pub struct ImageElement {
    pub origin: ImageOrigin,
    /// Pixels already live inline; no re-fetch needed
    pub inline: bool,
    pub data: ImageData,
}

impl ImageElement {
    /// Element whose pixels are already decoded and local.
    #[must_use]
    pub fn ready(origin: ImageOrigin, pixels: RgbaImage) -> Self {
        let inline = origin == ImageOrigin::Local;
        Self {
            origin,
            inline,
            data: ImageData::Ready(pixels),
        }
    }

    /// Element with an in-flight load. The returned sender resolves it.
    #[must_use]
    pub fn pending(origin: ImageOrigin) -> (Self, oneshot::Sender<Result<RgbaImage, String>>) {
        let (tx, rx) = oneshot::channel();
        let element = Self {
            origin,
            inline: false,
            data: ImageData::Pending(rx),
        };
        (element, tx)
    }

    #[must_use]
    pub fn pixels(&self) -> Option<&RgbaImage> {
        match &self.data {
            ImageData::Ready(img) => Some(img),
            _ => None,
        }
    }
}

/// Web-font readiness signal. [`FontRegistry::ready`] models a document
/// whose fonts have already settled.
#[derive(Debug, Default)]
pub struct FontRegistry {
    pending: Option<oneshot::Receiver<()>>,
}

impl FontRegistry {
    #[must_use]
    pub fn ready() -> Self {
        Self { pending: None }
    }

    /// Registry that settles when the returned sender fires (or drops).
    #[must_use]
    pub fn loading() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { pending: Some(rx) }, tx)
    }

    pub(crate) fn take_wait(&mut self) -> Option<oneshot::Receiver<()>> {
        self.pending.take()
    }
}

#[derive(Debug)]
pub struct Scene {
    viewport: Rect,
    nodes: Vec<Node>,
    images: Vec<ImageElement>,
    pub fonts: FontRegistry,
    next_node: u32,
}

impl Scene {
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            nodes: Vec::new(),
            images: Vec::new(),
            fonts: FontRegistry::ready(),
            next_node: 0,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Register an image element and return its id for use in nodes.
    pub fn add_image(&mut self, element: ImageElement) -> ImageId {
        let id = ImageId(self.images.len() as u32);
        self.images.push(element);
        id
    }

    /// Append a node on top of the current paint order.
    pub fn push_node(&mut self, bounds: Rect, content: NodeContent) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.push(Node {
            id,
            bounds,
            content,
            hidden: false,
        });
        id
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.hidden = hidden;
        }
    }

    /// Nodes in paint order (later entries composite on top).
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn image(&self, id: ImageId) -> Option<&ImageElement> {
        self.images.get(id.0 as usize)
    }

    pub(crate) fn images_mut(&mut self) -> &mut [ImageElement] {
        &mut self.images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_keep_paint_order_and_ids() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let a = scene.push_node(Rect::new(0.0, 0.0, 10.0, 10.0), NodeContent::Fill([0; 4]));
        let b = scene.push_node(Rect::new(5.0, 5.0, 10.0, 10.0), NodeContent::Fill([0; 4]));
        assert_ne!(a, b);
        assert_eq!(scene.nodes()[0].id, a);
        assert_eq!(scene.nodes()[1].id, b);
    }

    #[test]
    fn hidden_flag_is_per_node() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let id = scene.push_node(Rect::new(0.0, 0.0, 10.0, 10.0), NodeContent::Fill([0; 4]));
        scene.set_hidden(id, true);
        assert!(scene.nodes()[0].hidden);
        scene.set_hidden(id, false);
        assert!(!scene.nodes()[0].hidden);
    }

    #[test]
    fn local_ready_elements_count_as_inline() {
        let element = ImageElement::ready(ImageOrigin::Local, RgbaImage::new(2, 2));
        assert!(element.inline);
        let remote = ImageElement::ready(
            ImageOrigin::Remote("https://covers.example/1.png".into()),
            RgbaImage::new(2, 2),
        );
        assert!(!remote.inline);
    }
}
