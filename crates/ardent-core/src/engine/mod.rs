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

//! The cooperative per-frame scheduler.
//!
//! Every tick runs the registered systems in registration order, then
//! [`PluginManager::update`], then emits `engine:update`. Ticks are driven
//! by a [`FrameScheduler`] while the engine runs, or stepped by hand with
//! [`Engine::update`].

mod scheduler;

pub use self::scheduler::{
    FrameCallback, FrameRequestId, FrameScheduler, IntervalFrameScheduler, ManualFrameScheduler,
    DEFAULT_FRAME_INTERVAL_MS,
};

use crate::context::EngineContext;
use crate::ecs::EntityStore;
use crate::event::{Event, EventBus, EventHandler};
use crate::names::{events, resources};
use crate::plugin::PluginManager;
use crate::resources::EnabledPlugins;
use crate::sync::lock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// A per-tick callback. `dt` is the time since the previous tick in milliseconds.
pub type SystemFn = Arc<dyn Fn(f64, &EngineContext) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`Engine::add_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(u64);

/// Payload of `engine:start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStarted {
    /// Scheduler time the frame clock was started at, in milliseconds.
    pub time_ms: f64,
}

/// Payload of `engine:stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStopped;

/// Payload of the per-tick `engine:update`.
#[derive(Clone)]
pub struct EngineUpdate {
    /// Milliseconds since the previous tick.
    pub delta_time: f64,
    /// The context systems and plugins received this tick.
    pub context: EngineContext,
}

impl fmt::Debug for EngineUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineUpdate")
            .field("delta_time", &self.delta_time)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct LoopState {
    running: bool,
    last_frame_time: f64,
    pending_frame: Option<FrameRequestId>,
}

struct EngineShared {
    entity_store: Arc<EntityStore>,
    event_bus: EventBus,
    plugin_manager: Arc<PluginManager>,
    scheduler: Arc<dyn FrameScheduler>,
    systems: Mutex<Vec<(SystemId, SystemFn)>>,
    next_system_id: AtomicU64,
    loop_state: Mutex<LoopState>,
}

/// Owns the entity store, event bus and plugin manager and drives them
/// once per frame.
///
/// `Engine` is a cheap handle; clones refer to the same engine.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<EngineShared>,
}

impl Engine {
    /// Name of the runtime.
    pub const NAME: &'static str = "ardent";
    /// Version of the runtime.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
    /// Build revision; tracks the crate version.
    pub const REVISION: &'static str = Self::VERSION;

    /// An engine ticking on a tokio timer at 60 Hz.
    ///
    /// [`start`](Self::start) must be called from inside a tokio runtime;
    /// elsewhere it refuses to run. [`update`](Self::update) works anywhere.
    pub fn new() -> Self {
        Self::with_scheduler(Arc::new(IntervalFrameScheduler::default()))
    }

    /// An engine ticking on `scheduler`.
    pub fn with_scheduler(scheduler: Arc<dyn FrameScheduler>) -> Self {
        let entity_store = Arc::new(EntityStore::new());
        let event_bus = EventBus::new();
        let plugin_manager = Arc::new(PluginManager::new(event_bus.clone()));

        mirror_enabled_plugins(&event_bus, &entity_store, &plugin_manager);

        log::debug!("{} {} engine created", Self::NAME, Self::VERSION);
        Self {
            shared: Arc::new(EngineShared {
                entity_store,
                event_bus,
                plugin_manager,
                scheduler,
                systems: Mutex::new(Vec::new()),
                next_system_id: AtomicU64::new(1),
                loop_state: Mutex::new(LoopState::default()),
            }),
        }
    }

    /// The context handed to systems and plugins.
    pub fn context(&self) -> EngineContext {
        EngineContext {
            entity_store: Arc::clone(&self.shared.entity_store),
            event_bus: self.shared.event_bus.clone(),
            plugin_manager: Arc::clone(&self.shared.plugin_manager),
            engine: self.clone(),
        }
    }

    /// The frame scheduler driving this engine.
    pub fn scheduler(&self) -> Arc<dyn FrameScheduler> {
        Arc::clone(&self.shared.scheduler)
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        lock(&self.shared.loop_state).running
    }

    /// Appends a system to the tick. Adding the same closure twice runs it twice.
    pub fn add_system<F>(&self, system: F) -> SystemId
    where
        F: Fn(f64, &EngineContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_shared_system(Arc::new(system))
    }

    /// Appends an already shared system to the tick.
    pub fn add_shared_system(&self, system: SystemFn) -> SystemId {
        let id = SystemId(self.shared.next_system_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.shared.systems).push((id, system));
        id
    }

    /// Removes a system. Returns `false` if it was not registered.
    pub fn remove_system(&self, id: SystemId) -> bool {
        let mut systems = lock(&self.shared.systems);
        let before = systems.len();
        systems.retain(|(system_id, _)| *system_id != id);
        systems.len() != before
    }

    /// Number of registered systems.
    pub fn system_count(&self) -> usize {
        lock(&self.shared.systems).len()
    }

    /// Starts the frame loop.
    ///
    /// `engine:start` is emitted before the first tick is requested. Calling
    /// this on a running engine only logs a warning. If the scheduler cannot
    /// deliver frames from here, the engine stays stopped.
    pub fn start(&self) {
        if !self.shared.scheduler.can_schedule() {
            log::error!("Frame scheduler cannot deliver frames here; engine not started");
            return;
        }
        {
            let mut state = lock(&self.shared.loop_state);
            if state.running {
                log::warn!("Engine is already running");
                return;
            }
            state.running = true;
        }

        let time_ms = self.shared.scheduler.now();
        self.shared
            .event_bus
            .emit(events::ENGINE_START, EngineStarted { time_ms });
        lock(&self.shared.loop_state).last_frame_time = time_ms;
        log::info!("Engine started");
        self.request_next_frame();
    }

    /// Stops the frame loop and cancels the pending tick.
    ///
    /// A tick already in progress completes; no further tick is requested.
    /// Stopping a stopped engine does nothing.
    pub fn stop(&self) {
        let pending = {
            let mut state = lock(&self.shared.loop_state);
            if !state.running {
                return;
            }
            state.running = false;
            state.pending_frame.take()
        };
        if let Some(id) = pending {
            self.shared.scheduler.cancel_frame(id);
        }
        self.shared.event_bus.emit(events::ENGINE_STOP, EngineStopped);
        log::info!("Engine stopped");
    }

    /// Runs one tick with an explicit `dt`, bypassing the scheduler.
    pub fn update(&self, dt: f64) {
        self.run_tick(dt);
    }

    /// Stops the engine and releases everything it owns: plugins are
    /// disabled and unregistered, then systems, entities, resources and
    /// event listeners are cleared.
    pub async fn dispose(&self) {
        self.stop();
        self.shared.plugin_manager.clear().await;
        lock(&self.shared.systems).clear();
        self.shared.entity_store.clear();
        self.shared.event_bus.clear(None);
        log::info!("Engine disposed");
    }

    fn request_next_frame(&self) {
        if !self.is_running() {
            return;
        }
        let weak: Weak<EngineShared> = Arc::downgrade(&self.shared);
        let id = self.shared.scheduler.request_frame(Box::new(move |now: f64| {
            if let Some(shared) = weak.upgrade() {
                Engine { shared }.on_frame(now);
            }
        }));

        let mut state = lock(&self.shared.loop_state);
        if state.running {
            state.pending_frame = Some(id);
        } else {
            drop(state);
            self.shared.scheduler.cancel_frame(id);
        }
    }

    fn on_frame(&self, now: f64) {
        let dt = {
            let mut state = lock(&self.shared.loop_state);
            if !state.running {
                return;
            }
            state.pending_frame = None;
            let dt = now - state.last_frame_time;
            state.last_frame_time = now;
            dt
        };
        self.run_tick(dt);
        self.request_next_frame();
    }

    fn run_tick(&self, dt: f64) {
        let ctx = self.context();
        let systems: Vec<(SystemId, SystemFn)> = lock(&self.shared.systems).clone();

        for (id, system) in systems {
            if let Err(e) = system(dt, &ctx) {
                log::error!("System {id:?} failed: {e:#}");
            }
        }

        ctx.plugin_manager.update(dt, &ctx);

        log::trace!("Tick complete (dt = {dt:.2}ms)");
        self.shared.event_bus.emit(
            events::ENGINE_UPDATE,
            EngineUpdate {
                delta_time: dt,
                context: ctx,
            },
        );
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.is_running())
            .field("systems", &self.system_count())
            .finish_non_exhaustive()
    }
}

/// Keeps the `EnabledPlugins` resource in step with the plugin manager.
fn mirror_enabled_plugins(
    event_bus: &EventBus,
    entity_store: &Arc<EntityStore>,
    plugin_manager: &Arc<PluginManager>,
) {
    let store = Arc::clone(entity_store);
    let manager = Arc::downgrade(plugin_manager);
    let handler: EventHandler = Arc::new(move |_: &Event| {
        if let Some(manager) = manager.upgrade() {
            store.set_resource(
                resources::ENABLED_PLUGINS,
                EnabledPlugins(manager.enabled_plugins()),
            );
        }
        Ok(())
    });
    event_bus.subscribe(events::PLUGIN_ENABLED, Arc::clone(&handler), false);
    event_bus.subscribe(events::PLUGIN_DISABLED, handler, false);
}
