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

//! # Ardent SDK
//!
//! The public face of the Ardent AR runtime. A [`Runtime`] bundles an
//! [`Engine`](ardent_core::Engine) with capture, the frame pump and frame
//! statistics, configured from an [`ArdentConfig`].
//!
//! ```no_run
//! use ardent_sdk::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ArdentConfig::load("ardent.ron")?;
//! let runtime = Runtime::builder().config(config).init_logging(true).build();
//! runtime.start();
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod runtime;

pub use config::{ArdentConfig, ConfigError, EngineConfig};
pub use runtime::{Runtime, RuntimeBuilder};

/// Everything needed to build an application on the runtime.
pub mod prelude {
    pub use crate::{ArdentConfig, Runtime, RuntimeBuilder};
    pub use ardent_capture::{
        Bitmap, CaptureError, CaptureSystem, FrameEvent, FrameHost, FramePumpConfig,
        FramePumpSystem, HeadlessHost, RasterSurface,
    };
    pub use ardent_core::names::{components, events, plugins, resources};
    pub use ardent_core::resources::{
        CaptureState, CaptureStatus, DeviceCapabilities, DeviceProfile, ProcessingConfig,
    };
    pub use ardent_core::{
        CaptureConfig, CapturedSource, ElementKind, Engine, EngineContext, EngineUpdate, EntityId,
        Event, EventBus, FrameCallback, FrameRequestId, FrameScheduler, FrameSource,
        ManualFrameScheduler, MediaElement, Plugin, PluginError, SourceType, VideoFrameCallbacks,
    };
    pub use ardent_plugins::{
        CapabilityProvider, ProfileChanged, ProfilePolicyPlugin, StaticCapabilities,
    };
    pub use ardent_telemetry::{FrameReport, FrameStats, LoggingConfig};
}
