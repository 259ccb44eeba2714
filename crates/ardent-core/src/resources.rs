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

//! Data types stored under the well-known [resource keys](crate::names::resources).

use crate::source::SourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for AR processing, shared by trackers and the frame pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Width of the processing canvas, in pixels.
    pub canvas_width: u32,
    /// Height of the processing canvas, in pixels.
    pub canvas_height: u32,
    /// Upper bound on tracker invocations per second.
    pub max_detection_rate: u32,
    /// Detection mode understood by the tracking backend (e.g. `mono`).
    pub detection_mode: String,
    /// Name of the tracking backend.
    pub tracking_backend: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            canvas_width: 640,
            canvas_height: 480,
            max_detection_rate: 60,
            detection_mode: "mono".to_string(),
            tracking_backend: "artoolkit".to_string(),
        }
    }
}

/// Lifecycle status of the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    /// Nothing has been captured yet.
    #[default]
    Uninitialized,
    /// A source plugin is being activated.
    Initializing,
    /// A frame source is available.
    Ready,
    /// Initialization failed; see [`CaptureState::error`].
    Error,
    /// The pipeline was torn down.
    Disposed,
}

impl CaptureStatus {
    /// Returns the lowercase name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStatus::Uninitialized => "uninitialized",
            CaptureStatus::Initializing => "initializing",
            CaptureStatus::Ready => "ready",
            CaptureStatus::Error => "error",
            CaptureStatus::Disposed => "disposed",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of the capture pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureState {
    /// Where the pipeline is in its lifecycle.
    pub status: CaptureStatus,
    /// Failure message when `status` is [`CaptureStatus::Error`].
    pub error: Option<String>,
    /// Kind of source being captured, once known.
    pub source_type: Option<SourceType>,
    /// Width of the active frame source.
    pub width: u32,
    /// Height of the active frame source.
    pub height: u32,
}

impl CaptureState {
    /// A pipeline activating `source_type`.
    pub fn initializing(source_type: Option<SourceType>) -> Self {
        Self {
            status: CaptureStatus::Initializing,
            source_type,
            ..Self::default()
        }
    }

    /// A pipeline with a live frame source.
    pub fn ready(source_type: SourceType, width: u32, height: u32) -> Self {
        Self {
            status: CaptureStatus::Ready,
            error: None,
            source_type: Some(source_type),
            width,
            height,
        }
    }

    /// A pipeline that failed with `message`.
    pub fn failed(source_type: Option<SourceType>, message: impl Into<String>) -> Self {
        Self {
            status: CaptureStatus::Error,
            error: Some(message.into()),
            source_type,
            ..Self::default()
        }
    }

    /// A pipeline that was torn down.
    pub fn disposed() -> Self {
        Self {
            status: CaptureStatus::Disposed,
            ..Self::default()
        }
    }
}

/// Ids of the plugins currently enabled, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnabledPlugins(pub Vec<String>);

/// Coarse performance class of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Entry-level phones and constrained hosts.
    Low,
    /// Mid-range devices.
    Medium,
    /// Recent phones and ordinary desktops.
    High,
    /// Workstation-class hosts.
    Ultra,
}

impl QualityTier {
    /// Returns the lowercase name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::Ultra => "ultra",
        }
    }
}

/// How much tracking work a device is expected to sustain per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[allow(missing_docs)]
    Low,
    #[allow(missing_docs)]
    Medium,
    #[allow(missing_docs)]
    High,
}

/// Camera features reported by the host media layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraCapabilities {
    /// The camera exposes a torch control.
    pub torch: bool,
    /// The camera exposes a focus-mode control.
    pub focus_mode: bool,
}

/// Capability signals of the host device, as supplied by an injected provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// User agent string, used only for legacy mobile detection.
    pub user_agent_hint: String,
    /// Logical CPU cores (at least 1).
    pub cores: u32,
    /// Device memory in gigabytes (at least 0.5).
    pub memory_gb: f64,
    /// WebGL2 (or an equivalent GPU API) is available.
    pub webgl2: bool,
    /// WASM SIMD is available.
    pub wasm_simd: bool,
    /// Longest screen side, in pixels.
    pub screen_long_side: u32,
    /// Camera controls.
    pub camera: CameraCapabilities,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            user_agent_hint: String::new(),
            cores: 2,
            memory_gb: 2.0,
            webgl2: false,
            wasm_simd: false,
            screen_long_side: 0,
            camera: CameraCapabilities::default(),
        }
    }
}

/// Capture and processing settings chosen for the current device.
///
/// Profiles computed from capabilities carry `quality_tier`, `score` and
/// `capabilities`; legacy presets leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Preset label, `auto-<tier>` for computed profiles.
    pub label: String,
    /// Tier the score mapped to.
    pub quality_tier: Option<QualityTier>,
    /// Capability score in `0..=100`.
    pub score: Option<u32>,
    /// Signals the score was computed from.
    pub capabilities: Option<DeviceCapabilities>,
    /// Requested capture width.
    pub source_width: u32,
    /// Requested capture height.
    pub source_height: u32,
    /// Display width.
    pub display_width: u32,
    /// Display height.
    pub display_height: u32,
    /// Processing canvas width.
    pub canvas_width: u32,
    /// Processing canvas height.
    pub canvas_height: u32,
    /// Upper bound on tracker invocations per second.
    pub max_detection_rate: u32,
    /// Preferred capture frame rate.
    pub fps_hint: u32,
    /// Per-frame tracking budget in milliseconds.
    pub budget_ms_per_frame: Option<f64>,
    /// Expected tracking complexity.
    pub complexity: Option<Complexity>,
}
