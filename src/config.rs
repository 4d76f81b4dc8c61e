//! Application-level configuration loading, including generation-service settings.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::session::DEFAULT_TIME_LIMIT_SECS;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZDASH_BACK_CONFIG_PATH";

/// Default base URL of the question-generation sidecar.
const DEFAULT_GENERATOR_URL: &str = "http://localhost:8090";
/// Default model identifier requested from the generation sidecar.
const DEFAULT_GENERATOR_MODEL: &str = "quizgen-1";
/// Default timeout applied to generation calls, in seconds.
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_time_limit_secs: u32,
    generator: GeneratorConfig,
}

/// Settings for the external question-generation service.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base URL of the generation sidecar.
    pub base_url: String,
    /// Model identifier passed along with every prompt.
    pub model: String,
    /// Timeout for a single generation call, in seconds.
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Time limit applied when the host starts a quiz without choosing one.
    pub fn default_time_limit_secs(&self) -> u32 {
        self.default_time_limit_secs
    }

    /// Settings for the question-generation service.
    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            generator: GeneratorConfig {
                base_url: DEFAULT_GENERATOR_URL.into(),
                model: DEFAULT_GENERATOR_MODEL.into(),
                timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_time_limit_secs: Option<u32>,
    generator: Option<RawGenerator>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the generation-service block inside the config file.
struct RawGenerator {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        let generator = match raw.generator {
            Some(raw) => GeneratorConfig {
                base_url: raw.base_url.unwrap_or(defaults.generator.base_url),
                model: raw.model.unwrap_or(defaults.generator.model),
                timeout_secs: raw.timeout_secs.unwrap_or(defaults.generator.timeout_secs),
            },
            None => defaults.generator,
        };
        Self {
            default_time_limit_secs: raw
                .default_time_limit_secs
                .unwrap_or(defaults.default_time_limit_secs),
            generator,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
impl AppConfig {
    /// Configuration pointing the generator client at a test stub.
    pub(crate) fn with_generator_url(base_url: String) -> Self {
        let mut config = Self::default();
        config.generator.base_url = base_url;
        config.generator.timeout_secs = 2;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"generator": {"model": "quizgen-2"}}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.default_time_limit_secs(), DEFAULT_TIME_LIMIT_SECS);
        assert_eq!(config.generator().model, "quizgen-2");
        assert_eq!(config.generator().base_url, DEFAULT_GENERATOR_URL);
    }

    #[test]
    fn full_config_overrides_everything() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "default_time_limit_secs": 45,
                "generator": {
                    "base_url": "http://gen.internal:9000",
                    "model": "quizgen-2",
                    "timeout_secs": 5
                }
            }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.default_time_limit_secs(), 45);
        assert_eq!(config.generator().base_url, "http://gen.internal:9000");
        assert_eq!(config.generator().timeout_secs, 5);
    }
}
