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

//! The plugin contract and the lifecycle manager.
//!
//! A plugin is a unit of external behavior that can be registered, enabled
//! and disabled independently. Every hook except [`Plugin::id`] has a no-op
//! default, so implementors only write the capabilities they offer.

mod manager;

pub use self::manager::{PluginManager, PluginState};

use crate::context::EngineContext;
use crate::source::{CaptureConfig, CapturedSource};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A registrable capability set.
///
/// `init` and `dispose` are awaited by the [`PluginManager`] one plugin at a
/// time and never concurrently for the same plugin. `update` runs
/// synchronously inside the engine tick.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Unique, namespaced registration key such as `source:webcam`.
    fn id(&self) -> &str;

    /// Prepares the plugin. Runs when the plugin is enabled.
    ///
    /// A plugin that fails part-way is responsible for rolling back whatever
    /// it set up before returning the error.
    async fn init(&self, _ctx: &EngineContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after a successful `init`.
    async fn enable(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs first when the plugin is disabled.
    async fn disable(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Releases what `init` acquired. Runs after `disable`.
    async fn dispose(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Per-tick work; `dt` is in milliseconds.
    fn update(&self, _dt: f64, _ctx: &EngineContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Opens a frame source. Only source plugins implement this.
    async fn capture(
        &self,
        _config: &CaptureConfig,
        _ctx: &EngineContext,
    ) -> anyhow::Result<CapturedSource> {
        anyhow::bail!("plugin '{}' does not provide frame capture", self.id())
    }
}

/// Payload of `plugin:registered`, `plugin:enabled` and `plugin:disabled`.
#[derive(Clone)]
pub struct PluginEvent {
    /// Registration key of the plugin.
    pub plugin_id: String,
    /// The plugin instance.
    pub plugin: Arc<dyn Plugin>,
}

impl fmt::Debug for PluginEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEvent")
            .field("plugin_id", &self.plugin_id)
            .finish_non_exhaustive()
    }
}

/// Errors returned by [`PluginManager`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// A plugin with this id is already registered.
    #[error("plugin '{0}' is already registered")]
    AlreadyRegistered(String),
    /// No plugin with this id is registered.
    #[error("plugin '{0}' is not registered")]
    NotRegistered(String),
    /// The plugin is already enabled.
    #[error("plugin '{0}' is already enabled")]
    AlreadyEnabled(String),
    /// The plugin is not enabled.
    #[error("plugin '{0}' is not enabled")]
    NotEnabled(String),
    /// The plugin is in the middle of being enabled or disabled.
    #[error("plugin '{0}' is busy changing state")]
    Busy(String),
    /// `init` or `enable` returned an error; the plugin stays registered.
    #[error("plugin '{plugin_id}' failed to initialize: {reason}")]
    InitFailed {
        /// The failing plugin.
        plugin_id: String,
        /// Rendered error chain.
        reason: String,
    },
}
