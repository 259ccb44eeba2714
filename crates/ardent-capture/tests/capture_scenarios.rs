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

mod common;

use ardent_capture::{CaptureError, CaptureInitError, CaptureSystem};
use ardent_core::names::{events, plugins, resources};
use ardent_core::resources::{CaptureState, CaptureStatus};
use ardent_core::{CaptureConfig, Engine, FrameSource, ManualFrameScheduler, SourceType};
use common::{record_topics, StubSource};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

fn engine() -> Engine {
    Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()))
}

#[tokio::test]
async fn webcam_capture_succeeds_with_requested_size() {
    let engine = engine();
    let ctx = engine.context();
    ctx.plugin_manager
        .register_plugin(Arc::new(StubSource::webcam()))
        .unwrap();
    ctx.plugin_manager
        .enable(plugins::SOURCE_WEBCAM, &ctx)
        .await
        .unwrap();
    let seen = record_topics(
        &ctx,
        &[
            events::CAPTURE_INIT_START,
            events::CAPTURE_INIT_SUCCESS,
            events::CAPTURE_READY,
            events::CAPTURE_INIT_ERROR,
        ],
    );

    let config = CaptureConfig::new("webcam").with_source_size(320, 240);
    let source = CaptureSystem::initialize(&config, &ctx).await.unwrap();

    assert_eq!(source.source_type, SourceType::Webcam);
    assert_eq!(CaptureSystem::state(&ctx).status, CaptureStatus::Ready);

    let stored = ctx
        .resource::<FrameSource>(resources::FRAME_SOURCE_REF)
        .unwrap();
    assert_eq!((stored.width, stored.height), (320, 240));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            events::CAPTURE_INIT_START,
            events::CAPTURE_INIT_SUCCESS,
            events::CAPTURE_READY
        ]
    );
}

#[tokio::test]
async fn registered_source_plugin_is_enabled_on_demand() {
    let engine = engine();
    let ctx = engine.context();
    ctx.plugin_manager
        .register_plugin(Arc::new(StubSource::webcam()))
        .unwrap();

    CaptureSystem::initialize(&CaptureConfig::default(), &ctx)
        .await
        .unwrap();
    assert!(ctx.plugin_manager.is_enabled(plugins::SOURCE_WEBCAM));
}

#[tokio::test]
async fn unknown_source_type_is_reported() {
    let engine = engine();
    let ctx = engine.context();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    ctx.event_bus.on(events::CAPTURE_INIT_ERROR, move |event| {
        if let Some(payload) = event.payload::<CaptureInitError>() {
            sink.lock().unwrap().push(payload.error.clone());
        }
        Ok(())
    });

    let err = CaptureSystem::initialize(&CaptureConfig::new("bogus"), &ctx)
        .await
        .unwrap_err();

    assert_eq!(err, CaptureError::UnknownSourceType("bogus".into()));
    assert!(err.to_string().contains("unknown source type"));
    let state = CaptureSystem::state(&ctx);
    assert_eq!(state.status, CaptureStatus::Error);
    assert_eq!(state.error.as_deref(), Some("unknown source type 'bogus'"));
    assert_eq!(*errors.lock().unwrap(), vec![err]);
    assert!(CaptureSystem::frame_source(&ctx).is_none());
}

#[tokio::test]
async fn unregistered_source_plugin_is_reported() {
    let engine = engine();
    let ctx = engine.context();

    let err = CaptureSystem::initialize(&CaptureConfig::new("video"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CaptureError::PluginNotRegistered(plugins::SOURCE_VIDEO.into())
    );
    let state = CaptureSystem::state(&ctx);
    assert_eq!(state.status, CaptureStatus::Error);
    assert_eq!(state.source_type, Some(SourceType::Video));
}

#[tokio::test]
async fn enable_failure_is_propagated() {
    let engine = engine();
    let ctx = engine.context();
    let mut source = StubSource::webcam();
    source.fail_init = true;
    ctx.plugin_manager.register_plugin(Arc::new(source)).unwrap();

    let err = CaptureSystem::initialize(&CaptureConfig::default(), &ctx)
        .await
        .unwrap_err();
    match err {
        CaptureError::PluginEnableFailed { plugin_id, reason } => {
            assert_eq!(plugin_id, plugins::SOURCE_WEBCAM);
            assert!(reason.contains("permission denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(CaptureSystem::state(&ctx).status, CaptureStatus::Error);
    assert!(!ctx.plugin_manager.is_enabled(plugins::SOURCE_WEBCAM));
}

#[tokio::test]
async fn capture_failure_is_not_swallowed() {
    let engine = engine();
    let ctx = engine.context();
    let mut source = StubSource::webcam();
    source.fail_capture = true;
    ctx.plugin_manager.register_plugin(Arc::new(source)).unwrap();

    let err = CaptureSystem::initialize(&CaptureConfig::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::CaptureFailed { ref reason, .. } if reason.contains("device busy")));
    assert_eq!(CaptureSystem::state(&ctx).status, CaptureStatus::Error);
}

#[tokio::test]
async fn missing_descriptor_size_falls_back_to_config() {
    let engine = engine();
    let ctx = engine.context();
    let mut source = StubSource::webcam();
    source.report_size = false;
    ctx.plugin_manager.register_plugin(Arc::new(source)).unwrap();

    let config = CaptureConfig::new("webcam").with_source_size(800, 600);
    let frame_source = CaptureSystem::initialize(&config, &ctx).await.unwrap();
    assert_eq!((frame_source.width, frame_source.height), (800, 600));

    let state = ctx
        .resource::<CaptureState>(resources::CAPTURE_STATE)
        .unwrap();
    assert_eq!((state.width, state.height), (800, 600));
}

#[tokio::test]
async fn dispose_is_idempotent() {
    let engine = engine();
    let ctx = engine.context();
    let source = StubSource::webcam();
    let disposed = Arc::clone(&source.disposed);
    ctx.plugin_manager.register_plugin(Arc::new(source)).unwrap();
    CaptureSystem::initialize(&CaptureConfig::default(), &ctx)
        .await
        .unwrap();
    let seen = record_topics(&ctx, &[events::CAPTURE_DISPOSED]);

    CaptureSystem::dispose(&ctx).await;
    assert!(!ctx.entity_store.has_resource(resources::FRAME_SOURCE_REF));
    assert_eq!(CaptureSystem::state(&ctx).status, CaptureStatus::Disposed);

    CaptureSystem::dispose(&ctx).await;
    assert!(!ctx.entity_store.has_resource(resources::FRAME_SOURCE_REF));
    assert_eq!(CaptureSystem::state(&ctx).status, CaptureStatus::Disposed);

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(!ctx.plugin_manager.is_enabled(plugins::SOURCE_WEBCAM));
    assert!(ctx.plugin_manager.is_registered(plugins::SOURCE_WEBCAM));
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn state_defaults_to_uninitialized() {
    let engine = engine();
    assert_eq!(
        CaptureSystem::state(&engine.context()).status,
        CaptureStatus::Uninitialized
    );
}
