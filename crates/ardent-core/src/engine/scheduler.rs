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

//! Sources of frame wake-ups for the engine loop.

use crate::sync::lock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frame period of a 60 Hz display, in milliseconds.
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// A one-shot callback receiving the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send + 'static>;

/// Handle of a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

/// An external clock that wakes the engine once per frame.
///
/// Every request fires at most once. Implementations must never invoke a
/// callback from inside `request_frame`.
pub trait FrameScheduler: Send + Sync + 'static {
    /// Current time in milliseconds since an arbitrary origin.
    fn now(&self) -> f64;

    /// Schedules `callback` for the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a pending request. Returns `false` if it already fired or was
    /// never issued.
    fn cancel_frame(&self, id: FrameRequestId) -> bool;

    /// Whether wake-ups follow the display refresh rather than a plain timer.
    fn is_display_synced(&self) -> bool {
        false
    }

    /// Whether requests made from the calling context will actually fire.
    fn can_schedule(&self) -> bool {
        true
    }
}

struct PendingFrame {
    due: f64,
    callback: FrameCallback,
}

#[derive(Default)]
struct ManualState {
    now: f64,
    next_id: u64,
    pending: BTreeMap<u64, PendingFrame>,
}

/// A deterministic, display-synced scheduler driven by [`advance_by`].
///
/// Time only moves when the owner advances it, which makes frame-driven
/// behavior reproducible in tests and headless hosts.
///
/// [`advance_by`]: ManualFrameScheduler::advance_by
pub struct ManualFrameScheduler {
    frame_interval_ms: f64,
    state: Mutex<ManualState>,
}

impl ManualFrameScheduler {
    /// A scheduler whose frames are `frame_interval_ms` apart.
    ///
    /// Non-positive intervals fall back to [`DEFAULT_FRAME_INTERVAL_MS`].
    pub fn new(frame_interval_ms: f64) -> Self {
        let frame_interval_ms = if frame_interval_ms > 0.0 {
            frame_interval_ms
        } else {
            log::warn!(
                "Invalid frame interval {frame_interval_ms}ms, using {DEFAULT_FRAME_INTERVAL_MS}ms"
            );
            DEFAULT_FRAME_INTERVAL_MS
        };
        Self {
            frame_interval_ms,
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Moves the clock forward by `ms`, firing every callback that falls due
    /// on the way in due-time order. Callbacks requested while advancing fire
    /// too if they fall due before the target time.
    pub fn advance_by(&self, ms: f64) {
        let target = lock(&self.state).now + ms.max(0.0);
        loop {
            let next = {
                let mut state = lock(&self.state);
                let due = state
                    .pending
                    .iter()
                    .filter(|(_, frame)| frame.due <= target)
                    .min_by(|(a_id, a), (b_id, b)| a.due.total_cmp(&b.due).then(a_id.cmp(b_id)))
                    .map(|(id, _)| *id);
                match due.and_then(|id| state.pending.remove(&id)) {
                    Some(frame) => {
                        state.now = state.now.max(frame.due);
                        Some(frame)
                    }
                    None => None,
                }
            };
            match next {
                Some(frame) => (frame.callback)(frame.due),
                None => break,
            }
        }
        let mut state = lock(&self.state);
        state.now = state.now.max(target);
    }

    /// Advances by `count` whole frame intervals.
    pub fn advance_frames(&self, count: u32) {
        self.advance_by(self.frame_interval_ms * f64::from(count));
    }

    /// Number of requests that have not fired or been cancelled.
    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// The configured frame interval in milliseconds.
    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }
}

impl Default for ManualFrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn now(&self) -> f64 {
        lock(&self.state).now
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        let due = state.now + self.frame_interval_ms;
        state.pending.insert(id, PendingFrame { due, callback });
        FrameRequestId(id)
    }

    fn cancel_frame(&self, id: FrameRequestId) -> bool {
        lock(&self.state).pending.remove(&id.0).is_some()
    }

    fn is_display_synced(&self) -> bool {
        true
    }
}

/// A real-time scheduler backed by tokio timers.
///
/// Each request spawns a task on the current tokio runtime that sleeps for
/// one interval and then fires unless it was cancelled. Requests made
/// outside a runtime are dropped with an error.
pub struct IntervalFrameScheduler {
    interval: Duration,
    origin: tokio::time::Instant,
    next_id: AtomicU64,
    pending: Arc<Mutex<HashSet<u64>>>,
}

impl IntervalFrameScheduler {
    /// A scheduler firing every `frame_interval_ms` milliseconds.
    pub fn new(frame_interval_ms: f64) -> Self {
        let ms = if frame_interval_ms > 0.0 {
            frame_interval_ms
        } else {
            DEFAULT_FRAME_INTERVAL_MS
        };
        Self {
            interval: Duration::from_secs_f64(ms / 1000.0),
            origin: tokio::time::Instant::now(),
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl Default for IntervalFrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

fn elapsed_ms(origin: tokio::time::Instant) -> f64 {
    origin.elapsed().as_secs_f64() * 1000.0
}

impl FrameScheduler for IntervalFrameScheduler {
    fn now(&self) -> f64 {
        elapsed_ms(self.origin)
    }

    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Frame {id} requested outside a tokio runtime: {e}");
                return FrameRequestId(id);
            }
        };

        lock(&self.pending).insert(id);
        let pending = Arc::clone(&self.pending);
        let interval = self.interval;
        let origin = self.origin;
        handle.spawn(async move {
            tokio::time::sleep(interval).await;
            let still_wanted = lock(&pending).remove(&id);
            if still_wanted {
                callback(elapsed_ms(origin));
            }
        });
        FrameRequestId(id)
    }

    fn cancel_frame(&self, id: FrameRequestId) -> bool {
        lock(&self.pending).remove(&id.0)
    }

    fn can_schedule(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }
}
