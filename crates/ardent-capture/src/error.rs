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

/// Why [`CaptureSystem::initialize`](crate::CaptureSystem::initialize) failed.
///
/// Plugin errors are carried as rendered messages so the error can be
/// cloned into the `capture:init:error` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The configured source type maps to no source plugin.
    #[error("unknown source type '{0}'")]
    UnknownSourceType(String),
    /// The source plugin was never registered.
    #[error("capture plugin '{0}' is not registered")]
    PluginNotRegistered(String),
    /// The source plugin could not be enabled.
    #[error("capture plugin '{plugin_id}' could not be enabled: {reason}")]
    PluginEnableFailed {
        /// The source plugin.
        plugin_id: String,
        /// What the plugin manager reported.
        reason: String,
    },
    /// The source plugin failed to open its media.
    #[error("capture plugin '{plugin_id}' failed to capture: {reason}")]
    CaptureFailed {
        /// The source plugin.
        plugin_id: String,
        /// What the plugin reported.
        reason: String,
    },
}
