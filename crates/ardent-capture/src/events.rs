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

//! Payloads of the events published by the capture helpers.

use crate::error::CaptureError;
use crate::host::Bitmap;
use ardent_core::{CaptureConfig, FrameSource};

/// Payload of `capture:init:start`.
#[derive(Debug, Clone)]
pub struct CaptureStarted {
    /// The configuration being activated.
    pub config: CaptureConfig,
}

/// Payload of `capture:init:success` and `capture:ready`.
#[derive(Debug, Clone)]
pub struct CaptureReady {
    /// The frame source now stored as `FrameSourceRef`.
    pub frame_source: FrameSource,
}

/// Payload of `capture:init:error`.
#[derive(Debug, Clone)]
pub struct CaptureInitError {
    /// What went wrong.
    pub error: CaptureError,
}

/// Payload of `capture:disposed`.
#[derive(Debug, Clone)]
pub struct CaptureDisposed {
    /// The frame source that was active, if any.
    pub frame_source_ref: Option<FrameSource>,
}

/// A frame produced by the frame pump, published on `engine:update`.
///
/// `bitmap` is `None` when the host cannot produce bitmaps; consumers then
/// extract the image themselves.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    /// Monotonic frame number, starting at 1 for each pump run.
    pub id: u64,
    /// The captured pixels.
    pub bitmap: Option<Bitmap>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}
