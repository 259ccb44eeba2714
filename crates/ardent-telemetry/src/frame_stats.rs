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

//! Per-tick frame timing.

use ardent_core::{EngineContext, SystemFn};
use std::sync::{Arc, Mutex, PoisonError};

/// Frame timing over one report interval. Times are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Ticks in the interval.
    pub frames: u64,
    /// Shortest tick.
    pub min_dt: f64,
    /// Mean tick.
    pub avg_dt: f64,
    /// Longest tick.
    pub max_dt: f64,
}

impl FrameReport {
    /// Ticks per second implied by the mean tick.
    pub fn fps(&self) -> f64 {
        if self.avg_dt > 0.0 {
            1000.0 / self.avg_dt
        } else {
            0.0
        }
    }
}

#[derive(Debug)]
struct Window {
    frames: u64,
    elapsed: f64,
    min_dt: f64,
    max_dt: f64,
    total_frames: u64,
}

impl Window {
    fn new() -> Self {
        Self {
            frames: 0,
            elapsed: 0.0,
            min_dt: f64::INFINITY,
            max_dt: 0.0,
            total_frames: 0,
        }
    }
}

/// Accumulates tick durations and produces a [`FrameReport`] each time
/// the report interval has elapsed.
///
/// Intervals are measured in engine time (the sum of `dt`), so manually
/// stepped engines report deterministically.
#[derive(Debug)]
pub struct FrameStats {
    interval_ms: f64,
    window: Mutex<Window>,
}

impl FrameStats {
    /// Creates stats reporting every `interval_ms` of engine time.
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            window: Mutex::new(Window::new()),
        }
    }

    /// Records one tick. Returns a report when the interval has elapsed.
    pub fn record(&self, dt: f64) -> Option<FrameReport> {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let dt = dt.max(0.0);
        window.frames += 1;
        window.total_frames += 1;
        window.elapsed += dt;
        window.min_dt = window.min_dt.min(dt);
        window.max_dt = window.max_dt.max(dt);

        if window.elapsed < self.interval_ms {
            return None;
        }

        let report = FrameReport {
            frames: window.frames,
            min_dt: window.min_dt,
            avg_dt: window.elapsed / window.frames as f64,
            max_dt: window.max_dt,
        };
        let total_frames = window.total_frames;
        *window = Window::new();
        window.total_frames = total_frames;
        Some(report)
    }

    /// Ticks recorded since creation.
    pub fn total_frames(&self) -> u64 {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_frames
    }

    /// Wraps these stats in an engine system that logs each report.
    pub fn system(self: &Arc<Self>) -> SystemFn {
        let stats = Arc::clone(self);
        Arc::new(move |dt: f64, _ctx: &EngineContext| -> anyhow::Result<()> {
            if let Some(report) = stats.record(dt) {
                log::info!(
                    "{} frames, {:.1} fps (dt min {:.2} / avg {:.2} / max {:.2} ms)",
                    report.frames,
                    report.fps(),
                    report.min_dt,
                    report.avg_dt,
                    report.max_dt
                );
            }
            Ok(())
        })
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ardent_core::{Engine, ManualFrameScheduler};

    #[test]
    fn reports_once_per_interval() {
        let stats = FrameStats::new(100.0);
        for _ in 0..4 {
            assert!(stats.record(20.0).is_none());
        }
        let report = stats.record(30.0).unwrap();
        assert_eq!(report.frames, 5);
        assert_eq!(report.min_dt, 20.0);
        assert_eq!(report.max_dt, 30.0);
        assert_eq!(report.avg_dt, 22.0);

        assert!(stats.record(20.0).is_none());
        assert_eq!(stats.total_frames(), 6);
    }

    #[test]
    fn fps_follows_the_mean_tick() {
        let report = FrameReport {
            frames: 60,
            min_dt: 16.0,
            avg_dt: 20.0,
            max_dt: 25.0,
        };
        assert_eq!(report.fps(), 50.0);
    }

    #[test]
    fn system_counts_engine_ticks() {
        let engine = Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()));
        let stats = Arc::new(FrameStats::new(50.0));
        engine.add_shared_system(stats.system());

        for _ in 0..3 {
            engine.update(16.0);
        }
        assert_eq!(stats.total_frames(), 3);
    }
}
