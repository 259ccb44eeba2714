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

use crate::events::FrameEvent;
use crate::host::{Bitmap, FrameHost, RasterSurface};
use ardent_core::names::{events, resources};
use ardent_core::{
    ElementKind, EngineContext, EntityStore, EventBus, FrameRequestId, FrameScheduler,
    FrameSource, MediaElement,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

/// Frame pump settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramePumpConfig {
    /// Width used when neither the element nor the frame source reports one.
    pub default_width: u32,
    /// Height used when neither the element nor the frame source reports one.
    pub default_height: u32,
    /// Period of the fallback timer, in milliseconds.
    pub timer_interval_ms: f64,
}

impl Default for FramePumpConfig {
    fn default() -> Self {
        Self {
            default_width: 640,
            default_height: 480,
            timer_interval_ms: 16.0,
        }
    }
}

/// The wake-up the pump is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingWake {
    VideoFrame(FrameRequestId),
    DisplayFrame(FrameRequestId),
    Timer,
}

/// State of a running pump, stored as the `FramePump` resource.
pub struct FramePumpHandle {
    running: AtomicBool,
    frame_id: AtomicU64,
    wake: Mutex<Option<PendingWake>>,
    notify: Notify,
    element: Arc<dyn MediaElement>,
    scheduler: Arc<dyn FrameScheduler>,
}

impl FramePumpHandle {
    /// Whether the pump is still producing frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Id of the last frame published, `0` before the first.
    pub fn last_frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::SeqCst)
    }

    fn set_wake(&self, wake: Option<PendingWake>) {
        *self.wake.lock().unwrap_or_else(PoisonError::into_inner) = wake;
    }

    fn take_wake(&self) -> Option<PendingWake> {
        self.wake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Stops the pump and cancels its outstanding wake-up. A wake-up that
    /// already fired is harmless: the loop re-checks `running` before doing
    /// anything else.
    fn halt(&self) {
        self.running.store(false, Ordering::SeqCst);
        match self.take_wake() {
            Some(PendingWake::VideoFrame(id)) => {
                if let Some(callbacks) = self.element.video_frame_callbacks() {
                    callbacks.cancel_video_frame(id);
                }
            }
            Some(PendingWake::DisplayFrame(id)) => {
                self.scheduler.cancel_frame(id);
            }
            Some(PendingWake::Timer) | None => {}
        }
        self.notify.notify_one();
    }
}

/// Streams frames from the active video source onto `engine:update`.
///
/// Wake-ups come from the element's own video-frame callbacks when it has
/// them, else from the engine scheduler when it follows the display, else
/// from a plain timer.
pub struct FramePumpSystem {
    host: Arc<dyn FrameHost>,
    config: FramePumpConfig,
}

impl FramePumpSystem {
    /// A pump that captures bitmaps through `host`.
    pub fn new(host: Arc<dyn FrameHost>, config: FramePumpConfig) -> Self {
        Self { host, config }
    }

    /// Starts pumping from the `FrameSourceRef` video source.
    ///
    /// Returns `true` if the pump is running afterwards, including when it
    /// already was. Returns `false` when there is no video frame source or
    /// no tokio runtime to run on.
    pub fn start(&self, ctx: &EngineContext) -> bool {
        if self.is_running(ctx) {
            return true;
        }

        let Some(source) = ctx.resource::<FrameSource>(resources::FRAME_SOURCE_REF) else {
            log::warn!("No frame source found; initialize capture before starting the frame pump");
            return false;
        };
        if source.element.kind() != ElementKind::Video {
            log::warn!("Frame source is not a video element; frame pump not started");
            return false;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Frame pump needs a tokio runtime: {e}");
                return false;
            }
        };

        let scheduler = ctx.engine.scheduler();
        let handle = Arc::new(FramePumpHandle {
            running: AtomicBool::new(true),
            frame_id: AtomicU64::new(0),
            wake: Mutex::new(None),
            notify: Notify::new(),
            element: Arc::clone(&source.element),
            scheduler: Arc::clone(&scheduler),
        });
        ctx.entity_store
            .set_resource_arc(resources::FRAME_PUMP, Arc::clone(&handle));

        let pump = PumpLoop {
            handle,
            source: (*source).clone(),
            host: Arc::clone(&self.host),
            config: self.config.clone(),
            bus: ctx.event_bus.clone(),
            store: Arc::downgrade(&ctx.entity_store),
            scheduler,
            surface: None,
        };
        runtime.spawn(pump.run());
        log::info!("Frame pump started");
        true
    }

    /// Stops the pump and removes its handle. Does nothing if it is not running.
    pub fn stop(&self, ctx: &EngineContext) {
        let Some(handle) = ctx.resource::<FramePumpHandle>(resources::FRAME_PUMP) else {
            return;
        };
        handle.halt();
        ctx.entity_store.remove_resource(resources::FRAME_PUMP);
        log::info!("Frame pump stopped after {} frames", handle.last_frame_id());
    }

    /// Whether a pump is running for this context.
    pub fn is_running(&self, ctx: &EngineContext) -> bool {
        ctx.resource::<FramePumpHandle>(resources::FRAME_PUMP)
            .is_some_and(|handle| handle.is_running())
    }
}

struct PumpLoop {
    handle: Arc<FramePumpHandle>,
    source: FrameSource,
    host: Arc<dyn FrameHost>,
    config: FramePumpConfig,
    bus: EventBus,
    store: Weak<EntityStore>,
    scheduler: Arc<dyn FrameScheduler>,
    surface: Option<Box<dyn RasterSurface>>,
}

impl PumpLoop {
    async fn run(mut self) {
        while self.handle.is_running() {
            if !self.wait_for_frame().await || !self.handle.is_running() {
                break;
            }
            if !self.is_installed() {
                log::debug!("Frame pump handle is no longer installed");
                break;
            }
            self.emit_frame().await;
        }
        self.retire();
        log::debug!("Frame pump loop exited");
    }

    /// Whether this loop's handle is still the `FramePump` resource.
    fn is_installed(&self) -> bool {
        self.store
            .upgrade()
            .and_then(|store| store.get_resource::<FramePumpHandle>(resources::FRAME_PUMP))
            .is_some_and(|stored| Arc::ptr_eq(&stored, &self.handle))
    }

    /// Marks the handle stopped and uninstalls it, unless a newer pump
    /// already replaced it.
    fn retire(&self) {
        self.handle.halt();
        if !self.is_installed() {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.remove_resource(resources::FRAME_PUMP);
        }
    }

    /// Arms one wake-up and waits for it. Returns `false` when the wake-up
    /// was cancelled.
    async fn wait_for_frame(&self) -> bool {
        let (tx, rx) = oneshot::channel::<()>();
        let wake = if let Some(callbacks) = self.source.element.video_frame_callbacks() {
            let id = callbacks.request_video_frame(Box::new(move |_: f64| {
                let _ = tx.send(());
            }));
            PendingWake::VideoFrame(id)
        } else if self.scheduler.is_display_synced() {
            let id = self.scheduler.request_frame(Box::new(move |_: f64| {
                let _ = tx.send(());
            }));
            PendingWake::DisplayFrame(id)
        } else {
            PendingWake::Timer
        };

        self.handle.set_wake(Some(wake));
        if !self.handle.is_running() {
            // Stopped while arming; nobody else will cancel this wake-up.
            self.handle.halt();
            return false;
        }

        let fired = match wake {
            PendingWake::Timer => {
                let period = Duration::from_secs_f64(self.config.timer_interval_ms.max(1.0) / 1000.0);
                tokio::select! {
                    _ = tokio::time::sleep(period) => true,
                    _ = self.handle.notify.notified() => false,
                }
            }
            PendingWake::VideoFrame(_) | PendingWake::DisplayFrame(_) => rx.await.is_ok(),
        };
        self.handle.take_wake();
        fired
    }

    fn frame_size(&self) -> (u32, u32) {
        self.source
            .element
            .intrinsic_size()
            .filter(|(w, h)| *w > 0 && *h > 0)
            .or_else(|| {
                (self.source.width > 0 && self.source.height > 0)
                    .then_some((self.source.width, self.source.height))
            })
            .unwrap_or((self.config.default_width, self.config.default_height))
    }

    async fn emit_frame(&mut self) {
        let (width, height) = self.frame_size();
        if width == 0 || height == 0 {
            return;
        }

        let bitmap = if self.host.supports_bitmaps() {
            match self.capture_bitmap(width, height).await {
                Ok(bitmap) => Some(bitmap),
                Err(e) => {
                    log::debug!("Skipping frame, capture failed: {e:#}");
                    return;
                }
            }
        } else {
            None
        };

        let id = self.handle.frame_id.fetch_add(1, Ordering::SeqCst) + 1;
        log::trace!("Frame {id} ({width}x{height})");
        self.bus.emit(
            events::ENGINE_UPDATE,
            FrameEvent {
                id,
                bitmap,
                width,
                height,
            },
        );
    }

    async fn capture_bitmap(&mut self, width: u32, height: u32) -> anyhow::Result<Bitmap> {
        let element = Arc::clone(&self.source.element);
        match self.host.bitmap_from_element(&*element).await {
            Ok(bitmap) => return Ok(bitmap),
            Err(e) => log::trace!("Direct bitmap capture unavailable: {e:#}"),
        }

        if self.surface.as_ref().map(|s| s.size()) != Some((width, height)) {
            self.surface = self.host.create_surface(width, height);
        }
        let Some(surface) = self.surface.as_mut() else {
            anyhow::bail!("host cannot create a {width}x{height} surface");
        };
        surface.clear();
        surface.draw_element(&*element, width, height)?;
        self.host.bitmap_from_surface(&**surface).await
    }
}
