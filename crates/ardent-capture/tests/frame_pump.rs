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

mod common;

use ardent_capture::{
    Bitmap, FrameHost, FramePumpConfig, FramePumpHandle, FramePumpSystem, HeadlessHost,
    RasterSurface,
};
use ardent_core::names::resources;
use ardent_core::{
    ElementKind, Engine, EngineContext, FrameCallback, FrameRequestId, FrameSource,
    IntervalFrameScheduler, ManualFrameScheduler, MediaElement, SourceType,
    VideoFrameCallbacks,
};
use async_trait::async_trait;
use common::{record_frames, settle, FakeElement};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn install_source(ctx: &EngineContext, element: Arc<dyn MediaElement>, width: u32, height: u32) {
    ctx.entity_store.set_resource(
        resources::FRAME_SOURCE_REF,
        FrameSource {
            element,
            stream: None,
            source_type: SourceType::Video,
            width,
            height,
        },
    );
}

fn headless_pump() -> FramePumpSystem {
    FramePumpSystem::new(Arc::new(HeadlessHost), FramePumpConfig::default())
}

struct FastHost;

#[async_trait]
impl FrameHost for FastHost {
    fn supports_bitmaps(&self) -> bool {
        true
    }

    async fn bitmap_from_element(&self, element: &dyn MediaElement) -> anyhow::Result<Bitmap> {
        let (w, h) = element.intrinsic_size().unwrap_or((2, 2));
        Ok(Bitmap::blank(w, h))
    }
}

struct Surface {
    size: (u32, u32),
    draws: Arc<AtomicUsize>,
}

impl RasterSurface for Surface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self) {}

    fn draw_element(&mut self, _: &dyn MediaElement, _: u32, _: u32) -> anyhow::Result<()> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cannot capture elements directly, only surfaces.
#[derive(Default)]
struct SurfaceHost {
    created: Arc<AtomicUsize>,
    draws: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameHost for SurfaceHost {
    fn supports_bitmaps(&self) -> bool {
        true
    }

    fn create_surface(&self, width: u32, height: u32) -> Option<Box<dyn RasterSurface>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(Surface {
            size: (width, height),
            draws: Arc::clone(&self.draws),
        }))
    }

    async fn bitmap_from_surface(&self, surface: &dyn RasterSurface) -> anyhow::Result<Bitmap> {
        let (w, h) = surface.size();
        Ok(Bitmap::blank(w, h))
    }
}

#[tokio::test]
async fn start_without_frame_source_fails() {
    let engine = Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()));
    let ctx = engine.context();
    let pump = headless_pump();

    assert!(!pump.start(&ctx));
    assert!(!pump.is_running(&ctx));
    pump.stop(&ctx);
}

#[tokio::test]
async fn start_with_non_video_source_fails() {
    let engine = Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()));
    let ctx = engine.context();
    install_source(&ctx, Arc::new(FakeElement::image()), 640, 480);

    assert!(!headless_pump().start(&ctx));
    assert!(!ctx.entity_store.has_resource(resources::FRAME_PUMP));
}

#[tokio::test]
async fn display_synced_pump_emits_dimension_only_frames() {
    let scheduler = Arc::new(ManualFrameScheduler::new(16.0));
    let engine = Engine::with_scheduler(scheduler.clone());
    let ctx = engine.context();
    install_source(&ctx, Arc::new(FakeElement::video()), 320, 240);
    let frames = record_frames(&ctx);
    let pump = headless_pump();

    assert!(pump.start(&ctx));
    assert!(pump.start(&ctx), "starting twice is a successful no-op");
    settle().await;

    for _ in 0..3 {
        scheduler.advance_frames(1);
        settle().await;
    }

    {
        let frames = frames.lock().unwrap();
        let ids: Vec<u64> = frames.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(frames.iter().all(|f| f.bitmap.is_none()));
        assert!(frames.iter().all(|f| (f.width, f.height) == (320, 240)));
    }

    pump.stop(&ctx);
    assert!(!pump.is_running(&ctx));
    assert!(!ctx.entity_store.has_resource(resources::FRAME_PUMP));
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.advance_frames(5);
    settle().await;
    assert_eq!(frames.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn video_frame_callbacks_are_preferred() {
    let scheduler = Arc::new(ManualFrameScheduler::new(16.0));
    let engine = Engine::with_scheduler(scheduler.clone());
    let ctx = engine.context();
    let element = Arc::new(FakeElement::video_with_frame_callbacks());
    element.set_size(1280, 720);
    install_source(&ctx, element.clone(), 640, 480);
    let frames = record_frames(&ctx);
    let pump = FramePumpSystem::new(Arc::new(FastHost), FramePumpConfig::default());

    assert!(pump.start(&ctx));
    settle().await;

    scheduler.advance_frames(4);
    settle().await;
    assert!(frames.lock().unwrap().is_empty());

    let video_frames = element.frames.as_ref().unwrap();
    video_frames.present(0.0);
    settle().await;
    video_frames.present(33.0);
    settle().await;

    {
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        let bitmap = frames[0].bitmap.as_ref().unwrap();
        assert_eq!((bitmap.width, bitmap.height), (1280, 720));
        assert_eq!((frames[1].width, frames[1].height), (1280, 720));
    }

    assert_eq!(video_frames.pending(), 1);
    pump.stop(&ctx);
    assert_eq!(video_frames.pending(), 0);
}

#[tokio::test]
async fn surface_fallback_reuses_surface_until_size_changes() {
    let scheduler = Arc::new(ManualFrameScheduler::new(16.0));
    let engine = Engine::with_scheduler(scheduler.clone());
    let ctx = engine.context();
    let element = Arc::new(FakeElement::video());
    install_source(&ctx, element.clone(), 320, 240);
    let frames = record_frames(&ctx);
    let host = SurfaceHost::default();
    let created = Arc::clone(&host.created);
    let draws = Arc::clone(&host.draws);
    let pump = FramePumpSystem::new(Arc::new(host), FramePumpConfig::default());

    assert!(pump.start(&ctx));
    settle().await;
    for _ in 0..2 {
        scheduler.advance_frames(1);
        settle().await;
    }
    assert_eq!(created.load(Ordering::SeqCst), 1);

    element.set_size(640, 360);
    scheduler.advance_frames(1);
    settle().await;

    assert_eq!(created.load(Ordering::SeqCst), 2);
    assert_eq!(draws.load(Ordering::SeqCst), 3);
    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 3);
    let last = frames[2].bitmap.as_ref().unwrap();
    assert_eq!((last.width, last.height), (640, 360));
    drop(frames);
    pump.stop(&ctx);
}

#[tokio::test(start_paused = true)]
async fn timer_fallback_drives_the_pump_without_display_sync() {
    let engine = Engine::with_scheduler(Arc::new(IntervalFrameScheduler::new(16.0)));
    let ctx = engine.context();
    install_source(&ctx, Arc::new(FakeElement::video()), 0, 0);
    let frames = record_frames(&ctx);
    let pump = headless_pump();

    assert!(pump.start(&ctx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let emitted = frames.lock().unwrap().len();
    assert!(emitted >= 3, "expected several timer frames, got {emitted}");
    let first = frames.lock().unwrap()[0].clone();
    assert_eq!((first.width, first.height), (640, 480));

    pump.stop(&ctx);
    settle().await;
    let after_stop = frames.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(frames.lock().unwrap().len(), after_stop);
}

/// A video whose frame callbacks are discarded without ever firing.
struct StalledVideo;

impl VideoFrameCallbacks for StalledVideo {
    fn request_video_frame(&self, callback: FrameCallback) -> FrameRequestId {
        drop(callback);
        FrameRequestId(1)
    }

    fn cancel_video_frame(&self, _id: FrameRequestId) -> bool {
        false
    }
}

impl MediaElement for StalledVideo {
    fn kind(&self) -> ElementKind {
        ElementKind::Video
    }

    fn video_frame_callbacks(&self) -> Option<&dyn VideoFrameCallbacks> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[tokio::test]
async fn pump_stops_itself_when_its_wake_up_is_dropped() {
    let engine = Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()));
    let ctx = engine.context();
    install_source(&ctx, Arc::new(StalledVideo), 320, 240);
    let pump = headless_pump();

    assert!(pump.start(&ctx));
    settle().await;

    assert!(!pump.is_running(&ctx));
    assert!(!ctx.entity_store.has_resource(resources::FRAME_PUMP));

    assert!(pump.start(&ctx), "a dead pump can be started again");
    pump.stop(&ctx);
}

#[tokio::test(start_paused = true)]
async fn disposing_the_engine_ends_a_running_pump() {
    let engine = Engine::with_scheduler(Arc::new(IntervalFrameScheduler::new(16.0)));
    let ctx = engine.context();
    install_source(&ctx, Arc::new(FakeElement::video()), 320, 240);
    let pump = headless_pump();

    assert!(pump.start(&ctx));
    tokio::time::sleep(Duration::from_millis(50)).await;
    let handle = ctx
        .resource::<FramePumpHandle>(resources::FRAME_PUMP)
        .unwrap();
    assert!(handle.last_frame_id() > 0);

    engine.dispose().await;
    pump.stop(&ctx);
    let frames = record_frames(&ctx);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(frames.lock().unwrap().is_empty());
    assert!(!handle.is_running());
}
