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

//! RON configuration for an Ardent runtime.

use ardent_capture::FramePumpConfig;
use ardent_core::resources::ProcessingConfig;
use ardent_core::{CaptureConfig, DEFAULT_FRAME_INTERVAL_MS};
use ardent_telemetry::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while loading an [`ArdentConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid RON for an [`ArdentConfig`].
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Engine loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval of the real-time frame scheduler, in milliseconds.
    pub frame_interval_ms: f64,
    /// `dt` used by [`Runtime::step`](crate::Runtime::step), in milliseconds.
    pub manual_delta_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            manual_delta_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

/// Top-level runtime configuration. Every section is optional.
///
/// ```ron
/// (
///     engine: (frame_interval_ms: 33.3),
///     capture: (source_type: "video", source_url: Some("clip.mp4")),
///     logging: (filter: "debug"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArdentConfig {
    /// Engine loop settings.
    pub engine: EngineConfig,
    /// Seeded as the `ProcessingConfig` resource.
    pub processing: ProcessingConfig,
    /// Source opened by [`Runtime::capture`](crate::Runtime::capture).
    pub capture: CaptureConfig,
    /// Frame pump settings.
    pub pump: FramePumpConfig,
    /// Logging and telemetry settings.
    pub logging: LoggingConfig,
}

impl ArdentConfig {
    /// Parses a RON document. A blank document yields the defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(ron::from_str(source)?)
    }

    /// Reads and parses a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_ron_str(&source)
    }

    /// Serializes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty)
    }
}
