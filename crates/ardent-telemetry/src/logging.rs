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

use serde::{Deserialize, Serialize};

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub filter: String,
    /// How often frame statistics are reported, in milliseconds.
    pub telemetry_interval_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            telemetry_interval_ms: 1000,
        }
    }
}

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` takes precedence over `config.filter`. Returns `false` if a
/// logger was already installed, in which case nothing changes.
pub fn init_logging(config: &LoggingConfig) -> bool {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or(config.filter.as_str()))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
