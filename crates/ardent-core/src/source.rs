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

//! Frame-source contracts shared by source plugins and the capture helpers.
//!
//! Media handles (video elements, streams) belong to the host media layer.
//! The runtime only stores and forwards them, so they cross this boundary as
//! trait objects or fully opaque [`OpaqueHandle`]s.

use crate::engine::{FrameCallback, FrameRequestId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A host-owned handle the runtime never looks into.
pub type OpaqueHandle = Arc<dyn Any + Send + Sync>;

/// The kind of media a frame source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A live camera stream.
    Webcam,
    /// A video file.
    Video,
    /// A still image.
    Image,
}

impl SourceType {
    /// Every source type, in lookup order.
    pub const ALL: [SourceType; 3] = [SourceType::Webcam, SourceType::Video, SourceType::Image];

    /// Returns the lowercase name of the source type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Webcam => "webcam",
            SourceType::Video => "video",
            SourceType::Image => "image",
        }
    }

    /// Returns the registration id of the plugin providing this source type.
    pub fn plugin_id(&self) -> &'static str {
        use crate::names::plugins;
        match self {
            SourceType::Webcam => plugins::SOURCE_WEBCAM,
            SourceType::Video => plugins::SOURCE_VIDEO,
            SourceType::Image => plugins::SOURCE_IMAGE,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`SourceType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source type '{0}'")]
pub struct ParseSourceTypeError(pub String);

impl FromStr for SourceType {
    type Err = ParseSourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webcam" => Ok(SourceType::Webcam),
            "video" => Ok(SourceType::Video),
            "image" => Ok(SourceType::Image),
            other => Err(ParseSourceTypeError(other.to_string())),
        }
    }
}

/// What to capture and at which size.
///
/// `source_type` stays a free-form string so that unknown values can be
/// reported through the capture state instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// `webcam`, `video` or `image`.
    pub source_type: String,
    /// Media URL for video and image sources.
    pub source_url: Option<String>,
    /// Specific camera device to open.
    pub device_id: Option<String>,
    /// Requested source width.
    pub source_width: u32,
    /// Requested source height.
    pub source_height: u32,
    /// Display width.
    pub display_width: u32,
    /// Display height.
    pub display_height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source_type: SourceType::Webcam.as_str().to_string(),
            source_url: None,
            device_id: None,
            source_width: 640,
            source_height: 480,
            display_width: 640,
            display_height: 480,
        }
    }
}

impl CaptureConfig {
    /// A config for `source_type` with default dimensions.
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            ..Self::default()
        }
    }

    /// Sets the requested source dimensions.
    pub fn with_source_size(mut self, width: u32, height: u32) -> Self {
        self.source_width = width;
        self.source_height = height;
        self
    }

    /// Sets the media URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// Broad category of a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Produces a sequence of frames.
    Video,
    /// Produces a single still frame.
    Image,
    /// A drawable surface.
    Canvas,
    /// Anything else.
    Other,
}

/// Per-decoded-frame notifications offered by some video elements.
pub trait VideoFrameCallbacks: Send + Sync {
    /// Runs `callback` once, when the next video frame is presented.
    fn request_video_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a pending request. Returns `false` if it already fired or is unknown.
    fn cancel_video_frame(&self, id: FrameRequestId) -> bool;
}

/// A host media element backing a frame source.
pub trait MediaElement: Send + Sync + 'static {
    /// What the element produces.
    fn kind(&self) -> ElementKind;

    /// Live dimensions reported by the media, when known.
    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Video-frame notifications, when the element supports them.
    fn video_frame_callbacks(&self) -> Option<&dyn VideoFrameCallbacks> {
        None
    }

    /// Allows downcasting to the concrete element type.
    fn as_any(&self) -> &dyn Any;
}

/// What a source plugin hands back from `capture`.
#[derive(Clone)]
pub struct CapturedSource {
    /// The element frames are read from.
    pub element: Arc<dyn MediaElement>,
    /// The media stream feeding the element, for camera sources.
    pub stream: Option<OpaqueHandle>,
    /// Width of the produced frames, `0` if unknown.
    pub width: u32,
    /// Height of the produced frames, `0` if unknown.
    pub height: u32,
}

impl CapturedSource {
    /// A descriptor for `element` with the given dimensions.
    pub fn new(element: Arc<dyn MediaElement>, width: u32, height: u32) -> Self {
        Self {
            element,
            stream: None,
            width,
            height,
        }
    }

    /// Attaches the stream feeding the element.
    pub fn with_stream(mut self, stream: OpaqueHandle) -> Self {
        self.stream = Some(stream);
        self
    }
}

impl fmt::Debug for CapturedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedSource")
            .field("element", &self.element.kind())
            .field("stream", &self.stream.is_some())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// The active frame source, stored under
/// [`FRAME_SOURCE_REF`](crate::names::resources::FRAME_SOURCE_REF).
#[derive(Clone)]
pub struct FrameSource {
    /// The element frames are read from.
    pub element: Arc<dyn MediaElement>,
    /// The media stream feeding the element, if any.
    pub stream: Option<OpaqueHandle>,
    /// Kind of source.
    pub source_type: SourceType,
    /// Declared frame width.
    pub width: u32,
    /// Declared frame height.
    pub height: u32,
}

impl fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource")
            .field("element", &self.element.kind())
            .field("stream", &self.stream.is_some())
            .field("source_type", &self.source_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_round_trips_through_its_name() {
        for source_type in SourceType::ALL {
            assert_eq!(source_type.as_str().parse::<SourceType>(), Ok(source_type));
        }
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let err = "bogus".parse::<SourceType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown source type 'bogus'");
    }

    #[test]
    fn source_types_map_to_namespaced_plugin_ids() {
        assert_eq!(SourceType::Webcam.plugin_id(), "source:webcam");
        assert_eq!(SourceType::Video.plugin_id(), "source:video");
        assert_eq!(SourceType::Image.plugin_id(), "source:image");
    }

    #[test]
    fn capture_config_defaults_to_vga_webcam() {
        let config = CaptureConfig::default();
        assert_eq!(config.source_type, "webcam");
        assert_eq!((config.source_width, config.source_height), (640, 480));
    }
}
