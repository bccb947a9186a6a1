use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub date_service: DateServiceConfig,
    pub network: NetworkConfig,
    pub timings: TimingsConfig,
    pub gesture: GestureConfig,
    pub store: StoreConfig,
}

/// Remote Gregorian-to-Hijri lookup; the local algorithm is always the fallback.
#[derive(Debug, Deserialize, Clone)]
pub struct DateServiceConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for DateServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.aladhan.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TimingsConfig {
    /// Cross-fade window after next/previous.
    pub transition_ms: u64,
    pub celebration_secs: u64,
    pub clock_refresh_secs: u64,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            transition_ms: 200,
            celebration_secs: 2,
            clock_refresh_secs: 1,
        }
    }
}

impl TimingsConfig {
    pub const MAX_TRANSITION_MS: u64 = 10_000;
    pub const MAX_CELEBRATION_SECS: u64 = 3_600;
    pub const MAX_CLOCK_REFRESH_SECS: u64 = 60;

    /// Bring every value into a range the session timers can represent.
    /// The clock refresh is at least one second.
    pub fn clamped(&self) -> Self {
        let clamped = Self {
            transition_ms: self.transition_ms.min(Self::MAX_TRANSITION_MS),
            celebration_secs: self.celebration_secs.min(Self::MAX_CELEBRATION_SECS),
            clock_refresh_secs: self.clock_refresh_secs.clamp(1, Self::MAX_CLOCK_REFRESH_SECS),
        };
        if clamped != *self {
            tracing::warn!(requested = ?self, using = ?clamped, "Timings out of range, clamped");
        }
        clamped
    }
}

/// Pull-to-advance thresholds, in pixels.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GestureConfig {
    pub trigger_px: f64,
    pub max_px: f64,
    /// Fraction of the viewport height below which a pull may start.
    pub arm_fraction: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            trigger_px: 80.0,
            max_px: 150.0,
            arm_fraction: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Overrides the default location of the preferences file.
    pub path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zikr-companion");

        let builder = Config::builder()
            // 1. Load default values
            // Date service
            .set_default("date_service.enabled", true)?
            .set_default("date_service.base_url", "https://api.aladhan.com/v1")?
            // Network
            .set_default("network.request_timeout_secs", 10)?
            .set_default("network.connect_timeout_secs", 5)?
            // Timings
            .set_default("timings.transition_ms", 200)?
            .set_default("timings.celebration_secs", 2)?
            .set_default("timings.clock_refresh_secs", 1)?
            // Gesture
            .set_default("gesture.trigger_px", 80.0)?
            .set_default("gesture.max_px", 150.0)?
            .set_default("gesture.arm_fraction", 0.7)?
            // Store
            .set_default("store.path", None::<String>)?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (ZIKR__TIMINGS__TRANSITION_MS=...)
            .add_source(Environment::with_prefix("ZIKR").separator("__"));

        let s = builder.build()?;
        let mut config: Self = s.try_deserialize()?;
        config.timings = config.timings.clamped();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Value Tests ====================

    #[test]
    fn test_date_service_config_defaults() {
        let config = DateServiceConfig::default();
        assert!(config.enabled);
        assert_eq!(config.base_url, "https://api.aladhan.com/v1");
    }

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn test_timings_config_defaults() {
        let config = TimingsConfig::default();
        assert_eq!(config.transition_ms, 200);
        assert_eq!(config.celebration_secs, 2);
        assert_eq!(config.clock_refresh_secs, 1);
    }

    #[test]
    fn test_gesture_config_defaults() {
        let config = GestureConfig::default();
        assert_eq!(config.trigger_px, 80.0);
        assert_eq!(config.max_px, 150.0);
        assert_eq!(config.arm_fraction, 0.7);
    }

    #[test]
    fn test_store_config_defaults_to_no_override() {
        assert!(StoreConfig::default().path.is_none());
    }

    // ==================== Config Loading Tests ====================

    #[test]
    fn test_config_load_with_defaults() {
        // Should succeed even without a config file (uses defaults)
        let result = AppConfig::load();
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_loaded_config_has_expected_structure() {
        let config = AppConfig::load().expect("Config should load");

        assert!(!config.date_service.base_url.is_empty());
        assert!(config.network.request_timeout_secs > 0);
        assert!(config.timings.transition_ms > 0);
        assert!(config.timings.clock_refresh_secs > 0);
        assert!(config.gesture.trigger_px < config.gesture.max_px);
    }

    // ==================== Environment Variable Override Tests ====================

    /// Helper to safely set multiple environment variables in tests.
    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // SAFETY: Test environment; keys are unique to this test.
        for (key, value) in vars {
            unsafe {
                std::env::set_var(key, value);
            }
        }
        let result = f();
        for (key, _) in vars {
            unsafe {
                std::env::remove_var(key);
            }
        }
        result
    }

    #[test]
    fn test_env_var_overrides_celebration_window() {
        let config = with_env_vars(&[("ZIKR__TIMINGS__CELEBRATION_SECS", "5")], || {
            AppConfig::load().expect("Config should load")
        });

        assert_eq!(config.timings.celebration_secs, 5);
    }

    #[test]
    fn test_env_var_oversized_timings_are_clamped() {
        let config = with_env_vars(
            &[
                ("ZIKR__TIMINGS__TRANSITION_MS", "100000000000000000"),
                ("ZIKR__TIMINGS__CLOCK_REFRESH_SECS", "0"),
            ],
            || AppConfig::load().expect("Config should load"),
        );

        assert_eq!(config.timings.transition_ms, TimingsConfig::MAX_TRANSITION_MS);
        assert_eq!(config.timings.clock_refresh_secs, 1);
    }

    #[test]
    fn test_timings_clamp() {
        let timings = TimingsConfig {
            transition_ms: u64::MAX,
            celebration_secs: u64::MAX,
            clock_refresh_secs: 0,
        }
        .clamped();

        assert_eq!(timings.transition_ms, 10_000);
        assert_eq!(timings.celebration_secs, 3_600);
        assert_eq!(timings.clock_refresh_secs, 1);
        assert_eq!(TimingsConfig::default().clamped(), TimingsConfig::default());
    }

    #[test]
    fn test_env_var_overrides_store_path() {
        let config = with_env_vars(&[("ZIKR__STORE__PATH", "/tmp/zikr-test-store.json")], || {
            AppConfig::load().expect("Config should load")
        });

        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/tmp/zikr-test-store.json"))
        );
    }
}
