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

//! # Ardent Core
//!
//! The runtime at the heart of the Ardent AR toolkit: an entity-component
//! store, a topic-based event bus, a plugin lifecycle manager and a
//! cooperative per-frame scheduler that ties them together.
//!
//! Everything outside this crate (capture, trackers, renderers) talks to the
//! runtime exclusively through an [`EngineContext`].

#![warn(missing_docs)]

pub mod context;
pub mod ecs;
pub mod engine;
pub mod event;
pub mod names;
pub mod plugin;
pub mod resources;
pub mod source;

mod sync;

pub use context::EngineContext;
pub use ecs::{ComponentData, EcsError, EntityId, EntityStore, QueryId};
pub use engine::{
    Engine, EngineStarted, EngineStopped, EngineUpdate, FrameCallback, FrameRequestId,
    FrameScheduler, IntervalFrameScheduler, ManualFrameScheduler, SystemFn, SystemId,
    DEFAULT_FRAME_INTERVAL_MS,
};
pub use event::{Event, EventBus, EventHandler, Subscription};
pub use plugin::{Plugin, PluginError, PluginEvent, PluginManager, PluginState};
pub use source::{
    CaptureConfig, CapturedSource, ElementKind, FrameSource, MediaElement, OpaqueHandle,
    ParseSourceTypeError, SourceType, VideoFrameCallbacks,
};
