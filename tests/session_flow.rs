// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests for the live capture session: readiness gating,
//! overlay exclusion, and cancellation behavior under real task
//! interleaving.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use snipkit::scene::ImageData;
use snipkit::{
    CaptureError, CaptureEvent, CaptureSettings, ImageElement, ImageOrigin, NodeContent, RasterFrame,
    Rasterizer, Rect, ResourceFetcher, Scene, SessionController, SessionOutcome, SoftwareRasterizer,
};

const BLUE: [u8; 4] = [10, 20, 200, 255];
const RED: [u8; 4] = [200, 20, 10, 255];

struct NoFetch;

#[async_trait]
impl ResourceFetcher for NoFetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::ResourceFetch {
            url: url.to_string(),
            reason: "offline".into(),
        })
    }
}

/// Rasterizer that takes a while and records when it was invoked.
struct SlowRasterizer {
    inner: SoftwareRasterizer,
    delay: Duration,
    invoked_at: Arc<Mutex<Option<Instant>>>,
}

impl SlowRasterizer {
    fn new(delay: Duration) -> Self {
        Self {
            inner: SoftwareRasterizer::new(),
            delay,
            invoked_at: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl Rasterizer for SlowRasterizer {
    async fn rasterize(
        &self,
        scene: &Scene,
        region: Rect,
        exclude: &[snipkit::NodeId],
    ) -> Result<RasterFrame, CaptureError> {
        *self.invoked_at.lock().unwrap() = Some(Instant::now());
        sleep(self.delay).await;
        self.inner.rasterize(scene, region, exclude).await
    }

    fn name(&self) -> &'static str {
        "Slow Compositor"
    }
}

fn page_scene() -> Scene {
    let mut scene = Scene::new(Rect::new(0.0, 0.0, 800.0, 600.0));
    scene.push_node(Rect::new(0.0, 0.0, 800.0, 600.0), NodeContent::Fill(BLUE));
    scene
}

fn controller_with(
    rasterizer: Arc<dyn Rasterizer>,
) -> (SessionController, mpsc::Receiver<CaptureEvent>) {
    let (tx, rx) = mpsc::channel(8);
    let controller = SessionController::new(
        rasterizer,
        Arc::new(NoFetch),
        CaptureSettings::default(),
        tx,
    );
    (controller, rx)
}

#[tokio::test]
async fn overlay_chrome_is_excluded_from_the_capture() {
    let mut scene = page_scene();
    // The capture overlay: full-viewport chrome painted on top of the page.
    let overlay = scene.push_node(Rect::new(0.0, 0.0, 800.0, 600.0), NodeContent::Fill(RED));

    let (mut controller, mut rx) = controller_with(Arc::new(SoftwareRasterizer::new()));
    controller.start(&scene, vec![overlay]);
    controller.pointer_down(50.0, 50.0);
    controller.pointer_moved(200.0, 200.0);
    let outcome = controller.finish(&mut scene, 350.0, 250.0).await;

    assert_eq!(outcome, Some(SessionOutcome::Completed));
    let Ok(CaptureEvent::AttachmentReady(attachment)) = rx.try_recv() else {
        panic!("expected an attachment");
    };
    let decoded = image::load_from_memory(&attachment.image.bytes)
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (300, 200));
    assert!(decoded.pixels().all(|p| p.0 == BLUE));
}

#[tokio::test(start_paused = true)]
async fn rasterization_waits_for_the_readiness_gate() {
    let mut scene = page_scene();
    let (element, tx) = ImageElement::pending(ImageOrigin::Local);
    let id = scene.add_image(element);
    scene.push_node(Rect::new(10.0, 10.0, 16.0, 16.0), NodeContent::Image(id));
    tokio::spawn(async move {
        sleep(Duration::from_millis(30)).await;
        let _ = tx.send(Ok(image::RgbaImage::from_pixel(
            16,
            16,
            image::Rgba([1, 1, 1, 255]),
        )));
    });

    let rasterizer = Arc::new(SlowRasterizer::new(Duration::from_millis(1)));
    let invoked_at = Arc::clone(&rasterizer.invoked_at);
    let (mut controller, mut rx) = controller_with(rasterizer);

    let start = Instant::now();
    controller.start(&scene, Vec::new());
    controller.pointer_down(0.0, 0.0);
    let outcome = controller.finish(&mut scene, 100.0, 100.0).await;

    assert_eq!(outcome, Some(SessionOutcome::Completed));
    let invoked = invoked_at.lock().unwrap().expect("rasterizer ran");
    assert!(
        invoked.duration_since(start) >= Duration::from_millis(30),
        "rasterization started before the gate settled"
    );
    // The pending image settled in time to be part of the frame.
    assert!(matches!(
        scene.image(id).unwrap().data,
        ImageData::Ready(_)
    ));
    assert!(rx.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn cancellation_discards_a_late_arriving_render() {
    let mut scene = page_scene();
    let rasterizer = Arc::new(SlowRasterizer::new(Duration::from_millis(50)));
    let (mut controller, mut rx) = controller_with(rasterizer);

    controller.start(&scene, Vec::new());
    controller.pointer_down(10.0, 10.0);

    let handle = controller.cancel_handle();
    tokio::spawn(async move {
        sleep(Duration::from_millis(10)).await;
        handle.cancel();
    });

    let outcome = controller.finish(&mut scene, 200.0, 200.0).await;
    assert_eq!(outcome, Some(SessionOutcome::Cancelled));

    // The render completed after cancellation; no attachment ever surfaces.
    sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_fetches_do_not_abort_the_capture() {
    let mut scene = page_scene();
    // A cross-origin image that can never be inlined.
    let id = scene.add_image(ImageElement::ready(
        ImageOrigin::Remote("https://covers.example/cover.png".into()),
        image::RgbaImage::new(4, 4),
    ));
    scene.push_node(Rect::new(0.0, 0.0, 4.0, 4.0), NodeContent::Image(id));

    let (mut controller, mut rx) = controller_with(Arc::new(SoftwareRasterizer::new()));
    controller.start(&scene, Vec::new());
    controller.pointer_down(0.0, 0.0);
    let outcome = controller.finish(&mut scene, 100.0, 100.0).await;

    // Best effort: the capture completes with that one image blank.
    assert_eq!(outcome, Some(SessionOutcome::Completed));
    assert!(matches!(rx.try_recv(), Ok(CaptureEvent::AttachmentReady(_))));
}
