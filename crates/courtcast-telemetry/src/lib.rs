use std::sync::Arc;

use parking_lot::RwLock;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "courtcast_hub" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of human-readable output.
    pub json_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json_output: true,
        }
    }
}

/// Guard returned by `init_telemetry`. Holds the level overrides so they
/// can be inspected and adjusted at runtime.
pub struct TelemetryGuard {
    level_filter: Arc<RwLock<Vec<(String, Level)>>>,
}

impl TelemetryGuard {
    /// Change the log level for a specific module at runtime.
    pub fn set_module_level(&self, module: &str, level: Level) {
        let mut levels = self.level_filter.write();
        if let Some(entry) = levels.iter_mut().find(|(m, _)| m == module) {
            entry.1 = level;
        } else {
            levels.push((module.to_string(), level));
        }
    }

    /// Get current per-module log level overrides.
    pub fn module_levels(&self) -> Vec<(String, Level)> {
        self.level_filter.read().clone()
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let level_filter = Arc::new(RwLock::new(config.module_levels.clone()));

    // Build the env filter from config
    let mut filter_str = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.json_output {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(fmt_layer).init();
    }

    TelemetryGuard { level_filter }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.module_levels.is_empty());
        assert!(config.json_output);
    }

    #[test]
    fn guard_module_level_overrides() {
        let guard = TelemetryGuard {
            level_filter: Arc::new(RwLock::new(vec![("courtcast_hub".into(), Level::INFO)])),
        };

        guard.set_module_level("courtcast_hub", Level::DEBUG);
        guard.set_module_level("courtcast_api", Level::TRACE);

        let levels = guard.module_levels();
        assert_eq!(levels.len(), 2);
        assert!(levels.contains(&("courtcast_hub".into(), Level::DEBUG)));
        assert!(levels.contains(&("courtcast_api".into(), Level::TRACE)));
    }
}
