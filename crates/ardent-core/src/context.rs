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

//! The handle bundle passed to every system and plugin call.

use crate::ecs::EntityStore;
use crate::engine::Engine;
use crate::event::EventBus;
use crate::plugin::PluginManager;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared access to the runtime's subsystems.
///
/// This is the only surface the runtime exposes outward: systems, plugins
/// and host code reach the store, the bus, the plugin manager and the
/// engine through it. Cloning is cheap and every clone refers to the same
/// subsystems.
#[derive(Clone)]
pub struct EngineContext {
    /// Entities, components and resources.
    pub entity_store: Arc<EntityStore>,
    /// The runtime's event bus.
    pub event_bus: EventBus,
    /// The plugin lifecycle manager.
    pub plugin_manager: Arc<PluginManager>,
    /// The engine that built this context.
    pub engine: Engine,
}

impl EngineContext {
    /// Shorthand for a typed resource read.
    pub fn resource<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entity_store.get_resource::<T>(name)
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("entities", &self.entity_store.entity_count())
            .field("event_bus", &self.event_bus)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
