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

use crate::error::CaptureError;
use crate::events::{CaptureDisposed, CaptureInitError, CaptureReady, CaptureStarted};
use ardent_core::names::{events, resources};
use ardent_core::resources::CaptureState;
use ardent_core::{CaptureConfig, EngineContext, FrameSource, SourceType};

const FALLBACK_WIDTH: u32 = 640;
const FALLBACK_HEIGHT: u32 = 480;

/// Activates frame-source plugins and tracks the capture lifecycle.
///
/// The outcome of every call is observable two ways: through the
/// `CaptureState` and `FrameSourceRef` resources, and through the
/// `capture:*` events. A failed initialization always leaves
/// `CaptureState` in the error state.
pub struct CaptureSystem;

impl CaptureSystem {
    /// Opens the source described by `config`.
    ///
    /// Enables the matching `source:*` plugin if needed, awaits its
    /// `capture`, and stores the resulting [`FrameSource`] under
    /// `FrameSourceRef`.
    pub async fn initialize(
        config: &CaptureConfig,
        ctx: &EngineContext,
    ) -> Result<FrameSource, CaptureError> {
        let source_type = config.source_type.parse::<SourceType>().ok();
        ctx.entity_store.set_resource(
            resources::CAPTURE_STATE,
            CaptureState::initializing(source_type),
        );
        ctx.event_bus.emit(
            events::CAPTURE_INIT_START,
            CaptureStarted {
                config: config.clone(),
            },
        );

        match Self::activate(config, ctx).await {
            Ok(frame_source) => {
                ctx.entity_store
                    .set_resource(resources::FRAME_SOURCE_REF, frame_source.clone());
                ctx.entity_store.set_resource(
                    resources::CAPTURE_STATE,
                    CaptureState::ready(
                        frame_source.source_type,
                        frame_source.width,
                        frame_source.height,
                    ),
                );
                log::info!(
                    "Capture ready: {} {}x{}",
                    frame_source.source_type,
                    frame_source.width,
                    frame_source.height
                );

                let ready = CaptureReady {
                    frame_source: frame_source.clone(),
                };
                ctx.event_bus
                    .emit(events::CAPTURE_INIT_SUCCESS, ready.clone());
                ctx.event_bus.emit(events::CAPTURE_READY, ready);
                Ok(frame_source)
            }
            Err(error) => {
                log::error!("Capture initialization failed: {error}");
                ctx.entity_store.set_resource(
                    resources::CAPTURE_STATE,
                    CaptureState::failed(source_type, error.to_string()),
                );
                ctx.event_bus.emit(
                    events::CAPTURE_INIT_ERROR,
                    CaptureInitError {
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    async fn activate(
        config: &CaptureConfig,
        ctx: &EngineContext,
    ) -> Result<FrameSource, CaptureError> {
        let source_type = config
            .source_type
            .parse::<SourceType>()
            .map_err(|e| CaptureError::UnknownSourceType(e.0))?;
        let plugin_id = source_type.plugin_id();
        let plugins = &ctx.plugin_manager;

        if !plugins.is_registered(plugin_id) {
            return Err(CaptureError::PluginNotRegistered(plugin_id.to_string()));
        }
        if !plugins.is_enabled(plugin_id) {
            plugins.enable(plugin_id, ctx).await.map_err(|e| {
                CaptureError::PluginEnableFailed {
                    plugin_id: plugin_id.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        let plugin = plugins
            .get_plugin(plugin_id)
            .ok_or_else(|| CaptureError::PluginNotRegistered(plugin_id.to_string()))?;

        log::debug!("Capturing from '{plugin_id}'");
        let captured = plugin
            .capture(config, ctx)
            .await
            .map_err(|e| CaptureError::CaptureFailed {
                plugin_id: plugin_id.to_string(),
                reason: format!("{e:#}"),
            })?;

        let width = first_nonzero(&[captured.width, config.source_width, FALLBACK_WIDTH]);
        let height = first_nonzero(&[captured.height, config.source_height, FALLBACK_HEIGHT]);
        Ok(FrameSource {
            element: captured.element,
            stream: captured.stream,
            source_type,
            width,
            height,
        })
    }

    /// Disables every enabled source plugin and forgets the frame source.
    ///
    /// Safe to call repeatedly.
    pub async fn dispose(ctx: &EngineContext) {
        for source_type in SourceType::ALL {
            let plugin_id = source_type.plugin_id();
            if ctx.plugin_manager.is_enabled(plugin_id) {
                if let Err(e) = ctx.plugin_manager.disable(plugin_id).await {
                    log::warn!("Could not disable '{plugin_id}' during capture dispose: {e}");
                }
            }
        }

        let previous = Self::frame_source(ctx);
        ctx.entity_store.remove_resource(resources::FRAME_SOURCE_REF);
        ctx.entity_store
            .set_resource(resources::CAPTURE_STATE, CaptureState::disposed());
        log::debug!("Capture disposed");
        ctx.event_bus.emit(
            events::CAPTURE_DISPOSED,
            CaptureDisposed {
                frame_source_ref: previous,
            },
        );
    }

    /// The current capture state; uninitialized if capture never ran.
    pub fn state(ctx: &EngineContext) -> CaptureState {
        ctx.resource::<CaptureState>(resources::CAPTURE_STATE)
            .map(|state| (*state).clone())
            .unwrap_or_default()
    }

    /// The active frame source, if any.
    pub fn frame_source(ctx: &EngineContext) -> Option<FrameSource> {
        ctx.resource::<FrameSource>(resources::FRAME_SOURCE_REF)
            .map(|source| (*source).clone())
    }
}

fn first_nonzero(candidates: &[u32]) -> u32 {
    candidates.iter().copied().find(|v| *v > 0).unwrap_or(0)
}
