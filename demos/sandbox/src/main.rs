// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Ardent sandbox
// Runs the capture pipeline headless against a synthetic webcam.
//
// Usage: sandbox [config.ron]

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ardent_sdk::prelude::*;
use async_trait::async_trait;

const RUN_FOR: Duration = Duration::from_secs(2);

struct SyntheticVideo {
    width: u32,
    height: u32,
}

impl MediaElement for SyntheticVideo {
    fn kind(&self) -> ElementKind {
        ElementKind::Video
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Webcam source producing a fixed-size synthetic video element.
struct SyntheticWebcam;

#[async_trait]
impl Plugin for SyntheticWebcam {
    fn id(&self) -> &str {
        plugins::SOURCE_WEBCAM
    }

    async fn init(&self, _ctx: &EngineContext) -> Result<()> {
        log::info!("Synthetic webcam opened");
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        log::info!("Synthetic webcam closed");
        Ok(())
    }

    async fn capture(&self, config: &CaptureConfig, _ctx: &EngineContext) -> Result<CapturedSource> {
        let element = SyntheticVideo {
            width: config.source_width,
            height: config.source_height,
        };
        Ok(CapturedSource::new(
            Arc::new(element),
            config.source_width,
            config.source_height,
        ))
    }
}

/// Host that renders a moving gradient for every requested bitmap.
#[derive(Default)]
struct SyntheticHost {
    frame: AtomicU64,
}

#[async_trait]
impl FrameHost for SyntheticHost {
    fn supports_bitmaps(&self) -> bool {
        true
    }

    async fn bitmap_from_element(&self, element: &dyn MediaElement) -> Result<Bitmap> {
        let (width, height) = element.intrinsic_size().unwrap_or((640, 480));
        let shift = self.frame.fetch_add(1, Ordering::Relaxed) as u32;
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[
                    ((x + shift) % 256) as u8,
                    (y % 256) as u8,
                    (shift % 256) as u8,
                    255,
                ]);
            }
        }
        Ok(Bitmap::new(width, height, pixels))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ArdentConfig::load(path)?,
        None => ArdentConfig::default(),
    };

    let runtime = Runtime::builder()
        .config(config)
        .host(Arc::new(SyntheticHost::default()))
        .init_logging(true)
        .build();
    let ctx = runtime.context();

    ctx.event_bus.on(events::PROFILE_APPLIED, |event| {
        if let Some(changed) = event.payload::<ProfileChanged>() {
            log::info!(
                "Device profile '{}' ({}x{} @ {} detections/s)",
                changed.profile.label,
                changed.profile.source_width,
                changed.profile.source_height,
                changed.profile.max_detection_rate
            );
        }
        Ok(())
    });

    let frames = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&frames);
    ctx.event_bus.on(events::ENGINE_UPDATE, move |event| {
        if let Some(frame) = event.payload::<FrameEvent>() {
            counter.fetch_add(1, Ordering::Relaxed);
            log::trace!(
                "Frame {} ({}x{}, bitmap: {})",
                frame.id,
                frame.width,
                frame.height,
                frame.bitmap.is_some()
            );
        }
        Ok(())
    });

    let capabilities = StaticCapabilities {
        capabilities: DeviceCapabilities {
            cores: 8,
            memory_gb: 8.0,
            webgl2: true,
            wasm_simd: true,
            screen_long_side: 1920,
            ..DeviceCapabilities::default()
        },
        benchmark: None,
    };
    runtime.register_plugin(Arc::new(ProfilePolicyPlugin::new(Arc::new(capabilities))))?;
    runtime.register_plugin(Arc::new(SyntheticWebcam))?;
    runtime.enable_plugin(plugins::PROFILE_DEFAULT).await?;

    let source = runtime.capture().await?;
    log::info!(
        "Capturing {} at {}x{}",
        source.source_type,
        source.width,
        source.height
    );

    runtime.start();
    if !runtime.start_pump() {
        anyhow::bail!("frame pump did not start");
    }

    tokio::time::sleep(RUN_FOR).await;

    log::info!(
        "Pumped {} frames in {:?}",
        frames.load(Ordering::Relaxed),
        RUN_FOR
    );
    runtime.shutdown().await;
    Ok(())
}
