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

//! Well-known string keys shared between the runtime and its consumers.

/// Component keys attached to tracked entities.
pub mod components {
    /// A marker or image target followed by a tracker.
    pub const TRACKING_TARGET: &str = "TrackingTarget";
    /// The pose of a tracked entity.
    pub const TRANSFORM: &str = "Transform";
    /// Whether a tracked entity is currently visible.
    pub const VISIBLE: &str = "Visible";
}

/// Global resource keys.
pub mod resources {
    /// [`ProcessingConfig`](crate::resources::ProcessingConfig).
    pub const PROCESSING_CONFIG: &str = "ProcessingConfig";
    /// [`CaptureState`](crate::resources::CaptureState).
    pub const CAPTURE_STATE: &str = "CaptureState";
    /// [`FrameSource`](crate::source::FrameSource) of the active capture.
    pub const FRAME_SOURCE_REF: &str = "FrameSourceRef";
    /// [`DeviceProfile`](crate::resources::DeviceProfile).
    pub const DEVICE_PROFILE: &str = "DeviceProfile";
    /// [`EnabledPlugins`](crate::resources::EnabledPlugins).
    pub const ENABLED_PLUGINS: &str = "EnabledPlugins";
    /// Handle of the running frame pump, if any.
    pub const FRAME_PUMP: &str = "FramePump";
}

/// Event topics.
pub mod events {
    /// Capture initialization began.
    pub const CAPTURE_INIT_START: &str = "capture:init:start";
    /// Capture initialization succeeded.
    pub const CAPTURE_INIT_SUCCESS: &str = "capture:init:success";
    /// Capture initialization failed.
    pub const CAPTURE_INIT_ERROR: &str = "capture:init:error";
    /// A frame source is ready for consumers.
    pub const CAPTURE_READY: &str = "capture:ready";
    /// The capture pipeline was torn down.
    pub const CAPTURE_DISPOSED: &str = "capture:disposed";
    /// A source plugin finished loading its media.
    pub const SOURCE_LOADED: &str = "source:loaded";
    /// A source plugin failed.
    pub const SOURCE_ERROR: &str = "source:error";
    /// A source started playing.
    pub const SOURCE_PLAYING: &str = "source:playing";
    /// A source was paused.
    pub const SOURCE_PAUSED: &str = "source:paused";
    /// A tracker finished processing a frame.
    pub const FRAME_PROCESSED: &str = "frame:processed";
    /// The engine scheduler started.
    pub const ENGINE_START: &str = "engine:start";
    /// The engine scheduler stopped.
    pub const ENGINE_STOP: &str = "engine:stop";
    /// One engine tick completed, or the frame pump produced a frame.
    pub const ENGINE_UPDATE: &str = "engine:update";
    /// A plugin was registered.
    pub const PLUGIN_REGISTERED: &str = "plugin:registered";
    /// A plugin was enabled.
    pub const PLUGIN_ENABLED: &str = "plugin:enabled";
    /// A plugin was disabled.
    pub const PLUGIN_DISABLED: &str = "plugin:disabled";
    /// A device profile was computed and stored.
    pub const PROFILE_APPLIED: &str = "profile:applied";
    /// A device profile was replaced by a legacy preset.
    pub const PROFILE_UPDATED: &str = "profile:updated";
}

/// Registration ids of the packaged plugins.
pub mod plugins {
    /// Webcam frame source.
    pub const SOURCE_WEBCAM: &str = "source:webcam";
    /// Video file frame source.
    pub const SOURCE_VIDEO: &str = "source:video";
    /// Still image frame source.
    pub const SOURCE_IMAGE: &str = "source:image";
    /// Capability-based device profile policy.
    pub const PROFILE_DEFAULT: &str = "profile:default";
}
