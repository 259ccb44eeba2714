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

use crate::config::ArdentConfig;
use ardent_capture::{CaptureError, CaptureSystem, FrameHost, FramePumpSystem, HeadlessHost};
use ardent_core::names::resources;
use ardent_core::resources::CaptureState;
use ardent_core::{
    Engine, EngineContext, FrameScheduler, FrameSource, IntervalFrameScheduler, Plugin,
    PluginError, SystemId,
};
use ardent_telemetry::FrameStats;
use std::sync::Arc;

/// Builds a [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    config: ArdentConfig,
    scheduler: Option<Arc<dyn FrameScheduler>>,
    host: Option<Arc<dyn FrameHost>>,
    init_logging: bool,
}

impl RuntimeBuilder {
    /// Uses `config` instead of the defaults.
    pub fn config(mut self, config: ArdentConfig) -> Self {
        self.config = config;
        self
    }

    /// Drives the engine with `scheduler` instead of a tokio timer.
    pub fn scheduler(mut self, scheduler: Arc<dyn FrameScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Captures frame bitmaps through `host`. Defaults to [`HeadlessHost`].
    pub fn host(mut self, host: Arc<dyn FrameHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Installs `env_logger` from the logging config when building.
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Creates the engine and seeds it from the configuration.
    pub fn build(self) -> Runtime {
        if self.init_logging {
            ardent_telemetry::init_logging(&self.config.logging);
        }

        let scheduler: Arc<dyn FrameScheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(IntervalFrameScheduler::new(
                self.config.engine.frame_interval_ms,
            )),
        };
        let engine = Engine::with_scheduler(scheduler);
        engine.context().entity_store.set_resource(
            resources::PROCESSING_CONFIG,
            self.config.processing.clone(),
        );

        let stats = Arc::new(FrameStats::new(
            self.config.logging.telemetry_interval_ms as f64,
        ));
        let stats_system = engine.add_shared_system(stats.system());

        let host: Arc<dyn FrameHost> = match self.host {
            Some(host) => host,
            None => Arc::new(HeadlessHost),
        };
        let pump = FramePumpSystem::new(host, self.config.pump.clone());

        log::info!("{} {} runtime ready", Engine::NAME, Engine::VERSION);
        Runtime {
            engine,
            config: self.config,
            stats,
            stats_system,
            pump,
        }
    }
}

/// An engine wired up with capture, frame pump and frame statistics.
pub struct Runtime {
    engine: Engine,
    config: ArdentConfig,
    stats: Arc<FrameStats>,
    stats_system: SystemId,
    pump: FramePumpSystem,
}

impl Runtime {
    /// Starts building a runtime.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// A context for systems, plugins and capture helpers.
    pub fn context(&self) -> EngineContext {
        self.engine.context()
    }

    /// The configuration the runtime was built with.
    pub fn config(&self) -> &ArdentConfig {
        &self.config
    }

    /// Frame statistics collected on every tick.
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Id of the statistics system, for callers that want to remove it.
    pub fn stats_system(&self) -> SystemId {
        self.stats_system
    }

    /// Registers a plugin under its own id.
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        self.engine.context().plugin_manager.register_plugin(plugin)
    }

    /// Enables a registered plugin.
    pub async fn enable_plugin(&self, id: &str) -> Result<(), PluginError> {
        let ctx = self.engine.context();
        ctx.plugin_manager.enable(id, &ctx).await
    }

    /// Opens the configured capture source.
    pub async fn capture(&self) -> Result<FrameSource, CaptureError> {
        CaptureSystem::initialize(&self.config.capture, &self.engine.context()).await
    }

    /// Current capture state.
    pub fn capture_state(&self) -> CaptureState {
        CaptureSystem::state(&self.engine.context())
    }

    /// Starts the engine loop.
    pub fn start(&self) {
        self.engine.start();
    }

    /// Stops the engine loop.
    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Runs one tick with the configured manual `dt`.
    pub fn step(&self) {
        self.engine.update(self.config.engine.manual_delta_ms);
    }

    /// Starts streaming frames from the captured video source.
    pub fn start_pump(&self) -> bool {
        self.pump.start(&self.engine.context())
    }

    /// Stops the frame pump.
    pub fn stop_pump(&self) {
        self.pump.stop(&self.engine.context());
    }

    /// Whether the frame pump is running.
    pub fn is_pumping(&self) -> bool {
        self.pump.is_running(&self.engine.context())
    }

    /// Tears everything down: pump, then capture, then the engine.
    pub async fn shutdown(self) {
        let ctx = self.engine.context();
        self.pump.stop(&ctx);
        CaptureSystem::dispose(&ctx).await;
        self.engine.dispose().await;
        log::info!(
            "Runtime shut down after {} ticks",
            self.stats.total_frames()
        );
    }
}
