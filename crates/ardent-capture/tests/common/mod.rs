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

#![allow(dead_code)]

use ardent_capture::FrameEvent;
use ardent_core::names::events;
use ardent_core::{
    CaptureConfig, CapturedSource, ElementKind, EngineContext, FrameCallback, FrameRequestId,
    MediaElement, Plugin, VideoFrameCallbacks,
};
use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Video-frame callbacks fired by hand with [`FakeVideoFrames::present`].
#[derive(Default)]
pub struct FakeVideoFrames {
    next_id: AtomicU64,
    pending: Mutex<BTreeMap<u64, FrameCallback>>,
}

impl FakeVideoFrames {
    pub fn present(&self, now: f64) {
        let due: Vec<FrameCallback> = std::mem::take(&mut *self.pending.lock().unwrap())
            .into_values()
            .collect();
        for callback in due {
            callback(now);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl VideoFrameCallbacks for FakeVideoFrames {
    fn request_video_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.lock().unwrap().insert(id, callback);
        FrameRequestId(id)
    }

    fn cancel_video_frame(&self, id: FrameRequestId) -> bool {
        self.pending.lock().unwrap().remove(&id.0).is_some()
    }
}

pub struct FakeElement {
    pub kind: ElementKind,
    pub size: Mutex<Option<(u32, u32)>>,
    pub frames: Option<FakeVideoFrames>,
}

impl FakeElement {
    pub fn video() -> Self {
        Self {
            kind: ElementKind::Video,
            size: Mutex::new(None),
            frames: None,
        }
    }

    pub fn video_with_frame_callbacks() -> Self {
        Self {
            frames: Some(FakeVideoFrames::default()),
            ..Self::video()
        }
    }

    pub fn image() -> Self {
        Self {
            kind: ElementKind::Image,
            ..Self::video()
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        *self.size.lock().unwrap() = Some((width, height));
    }
}

impl MediaElement for FakeElement {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        *self.size.lock().unwrap()
    }

    fn video_frame_callbacks(&self) -> Option<&dyn VideoFrameCallbacks> {
        self.frames.as_ref().map(|f| f as &dyn VideoFrameCallbacks)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A `source:*` plugin that hands back a fake video element.
pub struct StubSource {
    pub id: &'static str,
    pub fail_init: bool,
    pub fail_capture: bool,
    pub report_size: bool,
    pub disposed: Arc<AtomicUsize>,
}

impl StubSource {
    pub fn webcam() -> Self {
        Self {
            id: "source:webcam",
            fail_init: false,
            fail_capture: false,
            report_size: true,
            disposed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Plugin for StubSource {
    fn id(&self) -> &str {
        self.id
    }

    async fn init(&self, _ctx: &EngineContext) -> anyhow::Result<()> {
        if self.fail_init {
            anyhow::bail!("permission denied");
        }
        Ok(())
    }

    async fn dispose(&self) -> anyhow::Result<()> {
        self.disposed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn capture(
        &self,
        config: &CaptureConfig,
        _ctx: &EngineContext,
    ) -> anyhow::Result<CapturedSource> {
        if self.fail_capture {
            anyhow::bail!("device busy");
        }
        let (width, height) = if self.report_size {
            (config.source_width, config.source_height)
        } else {
            (0, 0)
        };
        Ok(CapturedSource::new(Arc::new(FakeElement::video()), width, height))
    }
}

/// Records every topic emitted on the listed topics, in order.
pub fn record_topics(ctx: &EngineContext, topics: &[&'static str]) -> Arc<Mutex<Vec<&'static str>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for &topic in topics {
        let seen = Arc::clone(&seen);
        ctx.event_bus.on(topic, move |_| {
            seen.lock().unwrap().push(topic);
            Ok(())
        });
    }
    seen
}

/// Collects the frame events published on `engine:update`.
pub fn record_frames(ctx: &EngineContext) -> Arc<Mutex<Vec<FrameEvent>>> {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    ctx.event_bus.on(events::ENGINE_UPDATE, move |event| {
        if let Some(frame) = event.payload::<FrameEvent>() {
            sink.lock().unwrap().push(frame.clone());
        }
        Ok(())
    });
    frames
}

/// Lets spawned tasks on the current-thread runtime catch up.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
