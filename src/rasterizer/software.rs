// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use super::{RasterFrame, Rasterizer};
use crate::error::CaptureError;
use crate::geometry::Rect;
use crate::scene::{ImageData, NodeContent, NodeId, Scene};

/// CPU compositor over the scene's node list.
///
/// Nodes paint back to front with straight-alpha blending onto a
/// transparent canvas. Image nodes composite their decoded pixels 1:1 from
/// the node origin, clipped to the node bounds; an image without pixels
/// (still pending, failed, or tainted) leaves its area blank.
pub struct SoftwareRasterizer {
    _private: (),
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareRasterizer {
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
impl Rasterizer for SoftwareRasterizer {
    async fn rasterize(
        &self,
        scene: &Scene,
        region: Rect,
        exclude: &[NodeId],
    ) -> Result<RasterFrame, CaptureError> {
        let width = region.width.round() as i64;
        let height = region.height.round() as i64;
        if width <= 0 || height <= 0 {
            return Err(CaptureError::InvalidRegion {
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            });
        }

        let origin_x = region.x.round() as i64;
        let origin_y = region.y.round() as i64;
        let mut canvas = RgbaImage::new(width as u32, height as u32);

        for node in scene.nodes() {
            if node.hidden || exclude.contains(&node.id) {
                continue;
            }
            let Some(clip) = node.bounds.intersect(&region) else {
                continue;
            };

            let clip_x = clip.x.round() as i64;
            let clip_y = clip.y.round() as i64;
            let clip_w = (clip.x + clip.width).round() as i64 - clip_x;
            let clip_h = (clip.y + clip.height).round() as i64 - clip_y;
            let node_x = node.bounds.x.round() as i64;
            let node_y = node.bounds.y.round() as i64;

            match &node.content {
                NodeContent::Fill(color) => {
                    let src = Rgba(*color);
                    for py in clip_y..clip_y + clip_h {
                        for px in clip_x..clip_x + clip_w {
                            let (cx, cy) = (px - origin_x, py - origin_y);
                            if cx >= 0 && cy >= 0 && cx < width && cy < height {
                                blend(canvas.get_pixel_mut(cx as u32, cy as u32), src);
                            }
                        }
                    }
                }
                NodeContent::Image(image_id) => {
                    let Some(element) = scene.image(*image_id) else {
                        continue;
                    };
                    let ImageData::Ready(pixels) = &element.data else {
                        // No pixels to composite; the area stays blank.
                        continue;
                    };
                    for py in clip_y..clip_y + clip_h {
                        for px in clip_x..clip_x + clip_w {
                            let (sx, sy) = (px - node_x, py - node_y);
                            if sx < 0
                                || sy < 0
                                || sx >= i64::from(pixels.width())
                                || sy >= i64::from(pixels.height())
                            {
                                continue;
                            }
                            let (cx, cy) = (px - origin_x, py - origin_y);
                            if cx >= 0 && cy >= 0 && cx < width && cy < height {
                                blend(
                                    canvas.get_pixel_mut(cx as u32, cy as u32),
                                    *pixels.get_pixel(sx as u32, sy as u32),
                                );
                            }
                        }
                    }
                }
            }
        }

        Ok(RasterFrame { pixels: canvas })
    }

    fn name(&self) -> &'static str {
        "Software Compositor"
    }
}

/// Straight-alpha "over" blend of `src` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = u32::from(src.0[3]);
    if sa == 255 {
        *dst = src;
        return;
    }
    if sa == 0 {
        return;
    }
    let da = u32::from(dst.0[3]);
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let sc = u32::from(src.0[channel]);
        let dc = u32::from(dst.0[channel]);
        dst.0[channel] = ((sc * sa + dc * da * (255 - sa) / 255) / out_a) as u8;
    }
    dst.0[3] = out_a as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ImageElement, ImageOrigin};

    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn scene_with_background() -> Scene {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        scene.push_node(Rect::new(0.0, 0.0, 800.0, 600.0), NodeContent::Fill(BLUE));
        scene
    }

    #[tokio::test]
    async fn zero_area_region_fails_fast() {
        let scene = scene_with_background();
        let result = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(10.0, 10.0, 0.0, 0.0), &[])
            .await;
        assert!(matches!(
            result,
            Err(CaptureError::InvalidRegion { width: 0, height: 0 })
        ));
    }

    #[tokio::test]
    async fn excluded_overlay_does_not_appear_in_the_output() {
        let mut scene = scene_with_background();
        // Full-viewport overlay chrome at (0,0), painted on top.
        let overlay = scene.push_node(Rect::new(0.0, 0.0, 800.0, 600.0), NodeContent::Fill(RED));

        let frame = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(50.0, 50.0, 300.0, 200.0), &[overlay])
            .await
            .unwrap();

        assert_eq!(frame.width(), 300);
        assert_eq!(frame.height(), 200);
        for pixel in frame.pixels.pixels() {
            assert_eq!(pixel.0, BLUE);
        }
    }

    #[tokio::test]
    async fn render_is_offset_to_the_region() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        // A red square whose top-left corner sits at (100, 100).
        scene.push_node(Rect::new(100.0, 100.0, 50.0, 50.0), NodeContent::Fill(RED));

        let frame = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(90.0, 90.0, 70.0, 70.0), &[])
            .await
            .unwrap();

        assert_eq!(frame.pixels.get_pixel(5, 5).0, [0, 0, 0, 0]);
        assert_eq!(frame.pixels.get_pixel(10, 10).0, RED);
        assert_eq!(frame.pixels.get_pixel(59, 59).0, RED);
        assert_eq!(frame.pixels.get_pixel(60, 60).0, [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn transparency_is_preserved_not_composited() {
        let scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let frame = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(0.0, 0.0, 4.0, 4.0), &[])
            .await
            .unwrap();
        assert!(frame.pixels.pixels().all(|p| p.0[3] == 0));
    }

    #[tokio::test]
    async fn image_nodes_composite_their_decoded_pixels() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let pixels = RgbaImage::from_pixel(8, 8, Rgba([9, 8, 7, 255]));
        let id = scene.add_image(ImageElement::ready(ImageOrigin::Local, pixels));
        scene.push_node(Rect::new(20.0, 20.0, 8.0, 8.0), NodeContent::Image(id));

        let frame = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(20.0, 20.0, 8.0, 8.0), &[])
            .await
            .unwrap();
        assert!(frame.pixels.pixels().all(|p| p.0 == [9, 8, 7, 255]));
    }

    #[tokio::test]
    async fn pending_images_render_blank() {
        let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        let (element, _tx) = ImageElement::pending(ImageOrigin::Local);
        let id = scene.add_image(element);
        scene.push_node(Rect::new(0.0, 0.0, 8.0, 8.0), NodeContent::Image(id));

        let frame = SoftwareRasterizer::new()
            .rasterize(&scene, Rect::new(0.0, 0.0, 8.0, 8.0), &[])
            .await
            .unwrap();
        assert!(frame.pixels.pixels().all(|p| p.0[3] == 0));
    }
}
