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

//! Capability-based device profiling.

use crate::legacy::{is_mobile_user_agent, legacy_profile};
use ardent_core::names::{events, plugins, resources};
use ardent_core::resources::{Complexity, DeviceCapabilities, DeviceProfile, QualityTier};
use ardent_core::{EngineContext, Plugin};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Supplies the capability signals profiling is based on.
///
/// Implemented by the host; the policy never inspects the environment itself.
pub trait CapabilityProvider: Send + Sync + 'static {
    /// Current device capabilities.
    fn capabilities(&self) -> DeviceCapabilities;

    /// A rough CPU throughput signal, or `None` to score without one.
    fn benchmark_signal(&self) -> Option<f64> {
        Some(micro_benchmark(Duration::from_millis(8)))
    }
}

/// A provider returning fixed values.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    /// Returned by [`CapabilityProvider::capabilities`].
    pub capabilities: DeviceCapabilities,
    /// Returned by [`CapabilityProvider::benchmark_signal`].
    pub benchmark: Option<f64>,
}

impl CapabilityProvider for StaticCapabilities {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities.clone()
    }

    fn benchmark_signal(&self) -> Option<f64> {
        self.benchmark
    }
}

/// Spins on cheap float math for about `budget` and returns the
/// accumulated value. Never runs longer than twice the budget.
pub fn micro_benchmark(budget: Duration) -> f64 {
    let start = Instant::now();
    let mut acc = 0.0f64;
    while start.elapsed() < budget {
        for i in 0..1000 {
            acc += (f64::from(i) + acc % 5.0).sqrt();
        }
        if start.elapsed() > budget * 2 {
            break;
        }
    }
    acc
}

/// Maps capabilities to a score in `0..=100`.
///
/// Cores and memory contribute up to 30 points each, WebGL2 and SIMD 10
/// each, the screen's long side up to 10, and the benchmark signal up to 10.
pub fn score_capabilities(caps: &DeviceCapabilities, benchmark: Option<f64>) -> u32 {
    let cores = f64::from(caps.cores.max(1));
    let memory = caps.memory_gb.max(0.5);

    let mut score = (cores * 5.0).min(30.0);
    score += (memory * 4.0).min(30.0);
    if caps.webgl2 {
        score += 10.0;
    }
    if caps.wasm_simd {
        score += 10.0;
    }
    score += f64::from(caps.screen_long_side / 600).min(10.0);

    if let Some(signal) = benchmark {
        let norm = signal.max(10.0).log10().max(0.0);
        score += (5.0 + norm).min(10.0);
    }

    score.clamp(0.0, 100.0).round() as u32
}

/// Capture and processing hints for a quality tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSettings {
    /// The tier.
    pub tier: QualityTier,
    /// Capture width.
    pub width: u32,
    /// Capture height.
    pub height: u32,
    /// Per-frame tracking budget in milliseconds.
    pub budget_ms: f64,
    /// Expected tracking complexity.
    pub complexity: Complexity,
}

/// Chooses the tier for `score`.
pub fn pick_tier(score: u32) -> TierSettings {
    let (tier, width, height, budget_ms, complexity) = match score {
        85.. => (QualityTier::Ultra, 1280, 720, 12.0, Complexity::High),
        65..=84 => (QualityTier::High, 960, 540, 10.0, Complexity::High),
        45..=64 => (QualityTier::Medium, 800, 450, 8.0, Complexity::Medium),
        _ => (QualityTier::Low, 640, 360, 6.0, Complexity::Low),
    };
    TierSettings {
        tier,
        width,
        height,
        budget_ms,
        complexity,
    }
}

/// Payload of `profile:applied` and `profile:updated`.
#[derive(Debug, Clone)]
pub struct ProfileChanged {
    /// The profile now stored as `DeviceProfile`.
    pub profile: DeviceProfile,
}

/// Computes a device profile from injected capabilities when enabled and
/// stores it as the `DeviceProfile` resource.
pub struct ProfilePolicyPlugin {
    provider: Arc<dyn CapabilityProvider>,
}

impl ProfilePolicyPlugin {
    /// A policy reading capabilities from `provider`.
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self { provider }
    }

    /// Scores the current capabilities and builds the matching profile.
    pub fn detect_profile(&self) -> DeviceProfile {
        let caps = self.provider.capabilities();
        let score = score_capabilities(&caps, self.provider.benchmark_signal());
        let settings = pick_tier(score);
        let (w, h) = (settings.width, settings.height);

        DeviceProfile {
            label: format!("auto-{}", settings.tier.as_str()),
            quality_tier: Some(settings.tier),
            score: Some(score),
            capabilities: Some(caps),
            source_width: w,
            source_height: h,
            display_width: w,
            display_height: h,
            canvas_width: w,
            canvas_height: h,
            max_detection_rate: 60,
            fps_hint: 30,
            budget_ms_per_frame: Some(settings.budget_ms),
            complexity: Some(settings.complexity),
        }
    }

    /// Replaces the stored profile with the legacy preset `label`.
    pub fn apply_legacy(&self, label: &str, ctx: &EngineContext) -> DeviceProfile {
        let profile = legacy_profile(label);
        log::info!("Applying legacy profile '{}'", profile.label);
        ctx.entity_store
            .set_resource(resources::DEVICE_PROFILE, profile.clone());
        ctx.event_bus.emit(
            events::PROFILE_UPDATED,
            ProfileChanged {
                profile: profile.clone(),
            },
        );
        profile
    }

    /// The profile currently stored, if any.
    pub fn current_profile(&self, ctx: &EngineContext) -> Option<Arc<DeviceProfile>> {
        ctx.resource::<DeviceProfile>(resources::DEVICE_PROFILE)
    }

    /// Whether the provider's user agent looks like a mobile device.
    pub fn is_mobile(&self) -> bool {
        is_mobile_user_agent(&self.provider.capabilities().user_agent_hint)
    }
}

#[async_trait]
impl Plugin for ProfilePolicyPlugin {
    fn id(&self) -> &str {
        plugins::PROFILE_DEFAULT
    }

    async fn init(&self, ctx: &EngineContext) -> anyhow::Result<()> {
        let profile = self.detect_profile();
        log::info!(
            "Device profile '{}' (score {})",
            profile.label,
            profile.score.unwrap_or_default()
        );
        ctx.entity_store
            .set_resource(resources::DEVICE_PROFILE, profile.clone());
        ctx.event_bus
            .emit(events::PROFILE_APPLIED, ProfileChanged { profile });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ardent_core::{Engine, ManualFrameScheduler};

    fn caps(cores: u32, memory_gb: f64, gpu: bool, simd: bool, screen: u32) -> DeviceCapabilities {
        DeviceCapabilities {
            cores,
            memory_gb,
            webgl2: gpu,
            wasm_simd: simd,
            screen_long_side: screen,
            ..DeviceCapabilities::default()
        }
    }

    #[test]
    fn score_sums_capped_terms() {
        let workstation = caps(8, 8.0, true, true, 2560);
        assert_eq!(score_capabilities(&workstation, None), 84);
        assert_eq!(score_capabilities(&workstation, Some(1.0e6)), 94);
    }

    #[test]
    fn score_enforces_minimum_signals() {
        let floor = caps(0, 0.0, false, false, 0);
        assert_eq!(score_capabilities(&floor, None), 7);
    }

    #[test]
    fn small_benchmark_signals_still_count() {
        let phone = caps(2, 2.3, false, false, 0);
        // 10 + 9.2 + (5 + log10(10))
        assert_eq!(score_capabilities(&phone, Some(0.0)), 25);
    }

    #[test]
    fn tiers_follow_score_thresholds() {
        assert_eq!(pick_tier(100).tier, QualityTier::Ultra);
        assert_eq!(pick_tier(85).tier, QualityTier::Ultra);
        assert_eq!(pick_tier(84).tier, QualityTier::High);
        assert_eq!(pick_tier(65).tier, QualityTier::High);
        assert_eq!(pick_tier(64).tier, QualityTier::Medium);
        assert_eq!(pick_tier(45).tier, QualityTier::Medium);
        assert_eq!(pick_tier(44).tier, QualityTier::Low);

        let high = pick_tier(70);
        assert_eq!((high.width, high.height), (960, 540));
        assert_eq!(high.budget_ms, 10.0);
        assert_eq!(high.complexity, Complexity::High);
    }

    #[test]
    fn detected_profile_mirrors_capture_size() {
        let plugin = ProfilePolicyPlugin::new(Arc::new(StaticCapabilities {
            capabilities: caps(4, 4.0, true, false, 1200),
            benchmark: None,
        }));

        let profile = plugin.detect_profile();
        assert_eq!(profile.score, Some(48));
        assert_eq!(profile.label, "auto-medium");
        assert_eq!((profile.source_width, profile.source_height), (800, 450));
        assert_eq!((profile.canvas_width, profile.canvas_height), (800, 450));
        assert_eq!(profile.max_detection_rate, 60);
        assert_eq!(profile.fps_hint, 30);
        assert_eq!(profile.budget_ms_per_frame, Some(8.0));
    }

    #[test]
    fn micro_benchmark_stays_within_budget() {
        let start = Instant::now();
        let signal = micro_benchmark(Duration::from_millis(2));
        assert!(signal > 0.0);
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn enabling_stores_and_announces_the_profile() {
        let engine = Engine::with_scheduler(Arc::new(ManualFrameScheduler::default()));
        let ctx = engine.context();
        let applied = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&applied);
        ctx.event_bus.on(events::PROFILE_APPLIED, move |event| {
            if let Some(change) = event.payload::<ProfileChanged>() {
                sink.lock().unwrap().push(change.profile.label.clone());
            }
            Ok(())
        });

        let plugin = Arc::new(ProfilePolicyPlugin::new(Arc::new(StaticCapabilities {
            capabilities: caps(8, 8.0, true, true, 2560),
            benchmark: Some(1.0e6),
        })));
        ctx.plugin_manager
            .register_plugin(Arc::clone(&plugin) as Arc<dyn Plugin>)
            .unwrap();
        ctx.plugin_manager
            .enable(plugins::PROFILE_DEFAULT, &ctx)
            .await
            .unwrap();

        let stored = plugin.current_profile(&ctx).unwrap();
        assert_eq!(stored.quality_tier, Some(QualityTier::Ultra));
        assert_eq!(*applied.lock().unwrap(), vec!["auto-ultra"]);

        let legacy = plugin.apply_legacy("phone-slow", &ctx);
        assert_eq!(legacy.canvas_width, 240);
        assert_eq!(plugin.current_profile(&ctx).unwrap().label, "phone-slow");
    }

    #[test]
    fn mobile_detection_uses_the_user_agent_hint() {
        let plugin = ProfilePolicyPlugin::new(Arc::new(StaticCapabilities {
            capabilities: DeviceCapabilities {
                user_agent_hint: "Mozilla/5.0 (Linux; Android 14)".into(),
                ..DeviceCapabilities::default()
            },
            benchmark: None,
        }));
        assert!(plugin.is_mobile());
    }
}
