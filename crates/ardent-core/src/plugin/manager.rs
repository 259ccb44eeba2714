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

use super::{Plugin, PluginError, PluginEvent};
use crate::context::EngineContext;
use crate::event::EventBus;
use crate::names::events;
use crate::sync::lock;
use std::sync::{Arc, Mutex};

/// Where a registered plugin is in its lifecycle.
///
/// The transitional states mark a plugin whose `init` or `dispose` is being
/// awaited; any other lifecycle request for it fails with
/// [`PluginError::Busy`] until the hook settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginState {
    /// Known to the manager but not running.
    Registered,
    /// `init`/`enable` are being awaited.
    Enabling,
    /// Running; receives `update` every tick.
    Enabled,
    /// `disable`/`dispose` are being awaited.
    Disabling,
}

struct PluginRecord {
    id: String,
    instance: Arc<dyn Plugin>,
    state: PluginState,
}

/// Registers plugins and drives their lifecycle.
///
/// Records are kept in registration order, which is also the order
/// `update` visits enabled plugins. Hook failures are isolated: they are
/// logged here and surface to the caller only as a [`PluginError`].
///
/// Disabling always completes. A plugin whose `disable` or `dispose` hook
/// fails is still returned to [`PluginState::Registered`] and
/// `plugin:disabled` is still emitted, so teardown can never get stuck on a
/// misbehaving plugin.
pub struct PluginManager {
    plugins: Mutex<Vec<PluginRecord>>,
    event_bus: EventBus,
}

impl PluginManager {
    /// Creates a manager that reports lifecycle events on `event_bus`.
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            plugins: Mutex::new(Vec::new()),
            event_bus,
        }
    }

    /// Registers `instance` under `id`.
    ///
    /// Fails with [`PluginError::AlreadyRegistered`] if the id is taken; the
    /// existing registration is left untouched.
    pub fn register(&self, id: &str, instance: Arc<dyn Plugin>) -> Result<(), PluginError> {
        {
            let mut plugins = lock(&self.plugins);
            if plugins.iter().any(|record| record.id == id) {
                log::warn!("Plugin '{id}' is already registered");
                return Err(PluginError::AlreadyRegistered(id.to_string()));
            }
            if instance.id() != id {
                log::debug!(
                    "Plugin '{}' registered under the id '{id}'",
                    instance.id()
                );
            }
            plugins.push(PluginRecord {
                id: id.to_string(),
                instance: Arc::clone(&instance),
                state: PluginState::Registered,
            });
        }

        log::info!("Registered plugin '{id}'");
        self.emit(events::PLUGIN_REGISTERED, id, instance);
        Ok(())
    }

    /// Registers `instance` under its own [`Plugin::id`].
    pub fn register_plugin(&self, instance: Arc<dyn Plugin>) -> Result<(), PluginError> {
        let id = instance.id().to_string();
        self.register(&id, instance)
    }

    /// Runs `init` then `enable` for plugin `id` and marks it enabled.
    ///
    /// If either hook fails the plugin stays registered and
    /// [`PluginError::InitFailed`] is returned.
    pub async fn enable(&self, id: &str, ctx: &EngineContext) -> Result<(), PluginError> {
        let instance = self.begin_transition(id, PluginState::Registered, PluginState::Enabling)?;
        let guard = TransitionGuard::new(self, id);

        let outcome = match instance.init(ctx).await {
            Ok(()) => instance.enable().await,
            Err(e) => Err(e),
        };
        guard.disarm();

        match outcome {
            Ok(()) => {
                if !self.set_state(id, PluginState::Enabled) {
                    log::warn!("Plugin '{id}' was removed while it was being enabled");
                    return Err(PluginError::NotRegistered(id.to_string()));
                }
                log::info!("Enabled plugin '{id}'");
                self.emit(events::PLUGIN_ENABLED, id, instance);
                Ok(())
            }
            Err(e) => {
                self.set_state(id, PluginState::Registered);
                log::error!("Failed to enable plugin '{id}': {e:#}");
                Err(PluginError::InitFailed {
                    plugin_id: id.to_string(),
                    reason: format!("{e:#}"),
                })
            }
        }
    }

    /// Runs `disable` then `dispose` for plugin `id` and returns it to
    /// [`PluginState::Registered`], whatever the hooks report.
    pub async fn disable(&self, id: &str) -> Result<(), PluginError> {
        let instance = self.begin_transition(id, PluginState::Enabled, PluginState::Disabling)?;
        let guard = TransitionGuard::new(self, id);

        if let Err(e) = instance.disable().await {
            log::error!("Plugin '{id}' failed to disable: {e:#}");
        }
        if let Err(e) = instance.dispose().await {
            log::error!("Plugin '{id}' failed to dispose: {e:#}");
        }
        guard.disarm();

        self.set_state(id, PluginState::Registered);
        log::info!("Disabled plugin '{id}'");
        self.emit(events::PLUGIN_DISABLED, id, instance);
        Ok(())
    }

    /// Calls `update` on every enabled plugin, in registration order.
    ///
    /// A failing plugin is logged and does not keep the others from updating.
    pub fn update(&self, dt: f64, ctx: &EngineContext) {
        let enabled: Vec<(String, Arc<dyn Plugin>)> = lock(&self.plugins)
            .iter()
            .filter(|record| record.state == PluginState::Enabled)
            .map(|record| (record.id.clone(), Arc::clone(&record.instance)))
            .collect();

        for (id, plugin) in enabled {
            if let Err(e) = plugin.update(dt, ctx) {
                log::error!("Plugin '{id}' failed to update: {e:#}");
            }
        }
    }

    /// Disables plugin `id` if needed, then drops its registration.
    pub async fn unregister(&self, id: &str) -> Result<(), PluginError> {
        match self.plugin_state(id) {
            None => return Err(PluginError::NotRegistered(id.to_string())),
            Some(PluginState::Enabling | PluginState::Disabling) => {
                return Err(PluginError::Busy(id.to_string()));
            }
            Some(PluginState::Enabled) => self.disable(id).await?,
            Some(PluginState::Registered) => {}
        }

        lock(&self.plugins).retain(|record| record.id != id);
        log::info!("Unregistered plugin '{id}'");
        Ok(())
    }

    /// Disables every enabled plugin, then unregisters every plugin.
    ///
    /// Failures are logged and do not stop the sweep. Plugins still in a
    /// transitional state are dropped without running their hooks.
    pub async fn clear(&self) {
        for id in self.enabled_plugins() {
            if let Err(e) = self.disable(&id).await {
                log::warn!("Could not disable plugin '{id}' while clearing: {e}");
            }
        }
        for id in self.registered_plugins() {
            if let Err(e) = self.unregister(&id).await {
                log::warn!("Could not unregister plugin '{id}' while clearing: {e}");
            }
        }

        let mut plugins = lock(&self.plugins);
        for record in plugins.iter() {
            log::warn!(
                "Dropping plugin '{}' left in state {:?}",
                record.id,
                record.state
            );
        }
        plugins.clear();
    }

    /// Returns `true` if a plugin is registered under `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.plugin_state(id).is_some()
    }

    /// Returns `true` if plugin `id` is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.plugin_state(id) == Some(PluginState::Enabled)
    }

    /// Lifecycle state of plugin `id`, or `None` if it is not registered.
    pub fn plugin_state(&self, id: &str) -> Option<PluginState> {
        lock(&self.plugins)
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.state)
    }

    /// The instance registered under `id`.
    pub fn get_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        lock(&self.plugins)
            .iter()
            .find(|record| record.id == id)
            .map(|record| Arc::clone(&record.instance))
    }

    /// Ids of every registered plugin, in registration order.
    pub fn registered_plugins(&self) -> Vec<String> {
        lock(&self.plugins)
            .iter()
            .map(|record| record.id.clone())
            .collect()
    }

    /// Ids of the enabled plugins, in registration order.
    pub fn enabled_plugins(&self) -> Vec<String> {
        lock(&self.plugins)
            .iter()
            .filter(|record| record.state == PluginState::Enabled)
            .map(|record| record.id.clone())
            .collect()
    }

    fn begin_transition(
        &self,
        id: &str,
        from: PluginState,
        to: PluginState,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        let mut plugins = lock(&self.plugins);
        let Some(record) = plugins.iter_mut().find(|record| record.id == id) else {
            log::warn!("Plugin '{id}' is not registered");
            return Err(PluginError::NotRegistered(id.to_string()));
        };

        if record.state != from {
            return Err(match record.state {
                PluginState::Enabling | PluginState::Disabling => PluginError::Busy(id.to_string()),
                PluginState::Enabled => PluginError::AlreadyEnabled(id.to_string()),
                PluginState::Registered => PluginError::NotEnabled(id.to_string()),
            });
        }

        record.state = to;
        Ok(Arc::clone(&record.instance))
    }

    /// Returns `false` if `id` is no longer registered.
    fn set_state(&self, id: &str, state: PluginState) -> bool {
        match lock(&self.plugins).iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.state = state;
                true
            }
            None => false,
        }
    }

    fn emit(&self, topic: &str, id: &str, plugin: Arc<dyn Plugin>) {
        self.event_bus.emit(
            topic,
            PluginEvent {
                plugin_id: id.to_string(),
                plugin,
            },
        );
    }
}

/// Returns a plugin to [`PluginState::Registered`] if the `enable` or
/// `disable` future driving it is dropped before its hooks settle.
struct TransitionGuard<'a> {
    manager: &'a PluginManager,
    id: &'a str,
    armed: bool,
}

impl<'a> TransitionGuard<'a> {
    fn new(manager: &'a PluginManager, id: &'a str) -> Self {
        Self {
            manager,
            id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if self.armed && self.manager.set_state(self.id, PluginState::Registered) {
            log::warn!("Plugin '{}' transition was cancelled", self.id);
        }
    }
}
