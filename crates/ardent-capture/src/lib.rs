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

//! # Ardent Capture
//!
//! Consumer-facing helpers that sit on top of the runtime:
//!
//! - [`CaptureSystem`] activates the source plugin matching a
//!   [`CaptureConfig`](ardent_core::CaptureConfig) and publishes the resulting
//!   frame source as the `FrameSourceRef` resource.
//! - [`FramePumpSystem`] streams frames out of an active video source as
//!   `engine:update` events, using whatever the [`FrameHost`] can offer to
//!   turn them into bitmaps.

#![warn(missing_docs)]

mod capture_system;
mod error;
pub mod events;
mod frame_pump;
mod host;

pub use capture_system::CaptureSystem;
pub use error::CaptureError;
pub use events::{CaptureDisposed, CaptureInitError, CaptureReady, CaptureStarted, FrameEvent};
pub use frame_pump::{FramePumpConfig, FramePumpHandle, FramePumpSystem};
pub use host::{Bitmap, FrameHost, HeadlessHost, RasterSurface};
