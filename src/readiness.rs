// SPDX-License-Identifier: GPL-3.0-only

//! Capture readiness gate.
//!
//! Before the live scene is rasterized, every visual dependency must have
//! settled: web fonts, in-flight image loads, and cross-origin images that
//! would otherwise taint the output. The gate fans out one wait per image
//! plus one for fonts, runs them concurrently, and resolves once every
//! wait has settled, successfully or not. Per-resource
//! failures are logged and swallowed; the capture proceeds with whatever
//! pixels are available.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{join_all, BoxFuture, FutureExt};
use tokio::time::timeout;

use crate::error::CaptureError;
use crate::scene::{ImageData, ImageOrigin, Scene};

/// Fetches the bytes behind a remote image so its pixels can be inlined.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CaptureError>;
}

/// What the gate did to each class of dependency.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Images with decoded pixels after the gate
    pub images_ready: usize,
    /// Waits that hit the bounded timeout and were treated as settled
    pub timed_out: usize,
    /// Loads or re-fetches that failed outright (logged, non-fatal)
    pub failed: usize,
    pub fonts_settled: bool,
}

enum ImageOutcome {
    Pixels { pixels: image::RgbaImage, inline: bool },
    TimedOut,
    Failed,
}

/// Resolve every pending load and inline every cross-origin image, waiting
/// at most `wait` per dependency.
///
/// A perpetually pending image is treated as loaded once the timeout
/// elapses so a single stuck resource cannot hang the capture forever.
/// This never returns an error: the gate is best effort by design.
pub async fn prepare(scene: &mut Scene, fetcher: &dyn ResourceFetcher, wait: Duration) -> ReadinessReport {
    let mut jobs: Vec<BoxFuture<'_, (usize, ImageOutcome)>> = Vec::new();

    for (index, element) in scene.images_mut().iter_mut().enumerate() {
        if let ImageOrigin::Remote(url) = &element.origin {
            if !element.inline {
                // Re-fetch supersedes any in-flight load for the same slot.
                // Already-decoded pixels stay in place so a failed fetch
                // composites stale rather than blank.
                let url = url.clone();
                if matches!(element.data, ImageData::Pending(_)) {
                    element.data = ImageData::Unavailable;
                }
                jobs.push(
                    async move { (index, fetch_and_decode(fetcher, &url, wait).await) }.boxed(),
                );
                continue;
            }
        }

        if matches!(element.data, ImageData::Pending(_)) {
            let ImageData::Pending(rx) = std::mem::replace(&mut element.data, ImageData::Unavailable)
            else {
                unreachable!();
            };
            jobs.push(
                async move {
                    let outcome = match timeout(wait, rx).await {
                        Ok(Ok(Ok(pixels))) => ImageOutcome::Pixels {
                            pixels,
                            inline: false,
                        },
                        Ok(Ok(Err(reason))) => {
                            log::warn!("image load failed: {reason}");
                            ImageOutcome::Failed
                        }
                        Ok(Err(_)) => {
                            log::warn!("image load abandoned before completion");
                            ImageOutcome::Failed
                        }
                        Err(_) => {
                            log::warn!("image still loading after {wait:?}, proceeding without it");
                            ImageOutcome::TimedOut
                        }
                    };
                    (index, outcome)
                }
                .boxed(),
            );
        }
    }

    let fonts_wait = scene.fonts.take_wait();
    let fonts_fut = async move {
        match fonts_wait {
            // A dropped sender still counts as settled: nothing left to wait for.
            Some(rx) => timeout(wait, rx).await.is_ok(),
            None => true,
        }
    };

    let (fonts_settled, outcomes) = tokio::join!(fonts_fut, join_all(jobs));
    if !fonts_settled {
        log::warn!("fonts not settled after {wait:?}, proceeding");
    }

    let mut report = ReadinessReport {
        fonts_settled,
        ..ReadinessReport::default()
    };
    for (index, outcome) in outcomes {
        let element = &mut scene.images_mut()[index];
        match outcome {
            ImageOutcome::Pixels { pixels, inline } => {
                element.data = ImageData::Ready(pixels);
                if inline {
                    element.inline = true;
                }
            }
            ImageOutcome::TimedOut => report.timed_out += 1,
            ImageOutcome::Failed => report.failed += 1,
        }
    }

    report.images_ready = scene
        .images_mut()
        .iter()
        .filter(|element| matches!(element.data, ImageData::Ready(_)))
        .count();
    log::debug!(
        "readiness gate settled: {} ready, {} timed out, {} failed, fonts {}",
        report.images_ready,
        report.timed_out,
        report.failed,
        if report.fonts_settled { "ready" } else { "pending" }
    );
    report
}

async fn fetch_and_decode(fetcher: &dyn ResourceFetcher, url: &str, wait: Duration) -> ImageOutcome {
    let bytes = match timeout(wait, fetcher.fetch(url)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => {
            log::warn!("could not inline {url}: {err}");
            return ImageOutcome::Failed;
        }
        Err(_) => {
            log::warn!("inlining {url} timed out after {wait:?}");
            return ImageOutcome::TimedOut;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(decoded) => ImageOutcome::Pixels {
            pixels: decoded.to_rgba8(),
            inline: true,
        },
        Err(err) => {
            log::warn!("could not decode fetched image {url}: {err}");
            ImageOutcome::Failed
        }
    }
}
