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

//! Fixed presets from before capability scoring existed.

use ardent_core::resources::DeviceProfile;

/// The named presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyPreset {
    /// High-resolution processing at a reduced rate.
    DesktopFast,
    /// VGA processing at full rate.
    DesktopNormal,
    /// Quarter-VGA processing.
    PhoneNormal,
    /// The smallest canvas.
    PhoneSlow,
}

impl LegacyPreset {
    /// Every preset.
    pub const ALL: [LegacyPreset; 4] = [
        LegacyPreset::DesktopFast,
        LegacyPreset::DesktopNormal,
        LegacyPreset::PhoneNormal,
        LegacyPreset::PhoneSlow,
    ];

    /// The preset's label.
    pub fn label(&self) -> &'static str {
        match self {
            LegacyPreset::DesktopFast => "desktop-fast",
            LegacyPreset::DesktopNormal => "desktop-normal",
            LegacyPreset::PhoneNormal => "phone-normal",
            LegacyPreset::PhoneSlow => "phone-slow",
        }
    }

    /// Looks a preset up by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.label() == label)
    }

    /// The profile this preset stands for.
    pub fn profile(&self) -> DeviceProfile {
        let (canvas_width, canvas_height, max_detection_rate) = match self {
            LegacyPreset::DesktopFast => (640 * 3, 480 * 3, 30),
            LegacyPreset::DesktopNormal => (640, 480, 60),
            LegacyPreset::PhoneNormal => (80 * 4, 60 * 4, 30),
            LegacyPreset::PhoneSlow => (80 * 3, 60 * 3, 30),
        };
        DeviceProfile {
            label: self.label().to_string(),
            quality_tier: None,
            score: None,
            capabilities: None,
            source_width: 640,
            source_height: 480,
            display_width: 640,
            display_height: 480,
            canvas_width,
            canvas_height,
            max_detection_rate,
            fps_hint: 30,
            budget_ms_per_frame: None,
            complexity: None,
        }
    }
}

/// The preset profile for `label`; unknown labels get `desktop-normal`.
pub fn legacy_profile(label: &str) -> DeviceProfile {
    LegacyPreset::from_label(label)
        .unwrap_or(LegacyPreset::DesktopNormal)
        .profile()
}

const MOBILE_MARKERS: [&str; 15] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "windows phone",
    "opera mini",
    "opera mobi",
    "iemobile",
    "mobile",
    "kindle",
    "silk",
    "playstation",
    "nintendo",
];

/// Whether a user agent string looks like a phone, tablet or console.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}
