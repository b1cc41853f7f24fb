//! Configuration types for the PrepMaster orchestrator.
//!
//! This module provides the configuration structures that control a
//! practice session: how many questions are requested, whether answers are
//! scored, where reports are written, and which content service backs
//! question generation and answer evaluation.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "prepmaster.json";

/// Largest question set a single generation request may ask for.
pub const MAX_QUESTION_COUNT: u32 = 50;

/// Default number of questions requested from the content service.
const fn default_question_count() -> u32 {
    20
}

/// Default output directory for reports.
fn default_output_dir() -> String {
    ".".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

const fn default_request_timeout() -> u64 {
    60
}

/// Main configuration for a PrepMaster session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of questions requested for a custom session.
    #[serde(default = "default_question_count")]
    pub question_count: u32,

    /// When `true`, answers are submitted for scoring instead of revealed.
    #[serde(default)]
    pub evaluation_mode: bool,

    /// Output directory for generated reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Content service settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            evaluation_mode: false,
            output_dir: default_output_dir(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `prepmaster.json` in the current directory. If not found,
    /// returns the default configuration.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            PrepError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `prepmaster.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ConfigParseError` if the file exists but contains
    /// invalid JSON or an unknown backend name.
    ///
    /// Returns `PrepError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(PrepError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| PrepError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.question_count == 0 || self.question_count > MAX_QUESTION_COUNT {
            return Err(PrepError::config_validation(
                format!(
                    "questionCount must be between 1 and {MAX_QUESTION_COUNT}, got {}",
                    self.question_count
                ),
                format!("Set questionCount to a value from 1 to {MAX_QUESTION_COUNT} in your prepmaster.json"),
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(PrepError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your prepmaster.json (use '.' for current directory)",
            ));
        }

        self.generator.validate()
    }
}

/// Supported content service backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeneratorBackend {
    /// Google Gemini `generateContent` (default).
    #[default]
    Gemini,
    /// Any `OpenAI`-compatible chat completions endpoint.
    OpenAi,
}

impl GeneratorBackend {
    /// Parses a string into a `GeneratorBackend`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Returns the configuration name of the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for GeneratorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GeneratorBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid generator backend '{s}': expected one of 'gemini', 'openai'")
        })
    }
}

impl<'de> Deserialize<'de> for GeneratorBackend {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for GeneratorBackend {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Content service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Which wire protocol to speak.
    #[serde(default)]
    pub backend: GeneratorBackend,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the service, without a trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Upper bound on every generation or evaluation call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::default(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl GeneratorConfig {
    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(PrepError::config_validation(
                "generator.model must not be empty",
                "Set generator.model in your prepmaster.json (for example \"gemini-2.5-flash\")",
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(PrepError::config_validation(
                "generator.baseUrl must not be empty",
                "Set generator.baseUrl to the content service URL in your prepmaster.json",
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(PrepError::config_validation(
                "generator.apiKeyEnv must not be empty",
                "Set generator.apiKeyEnv to the name of the environment variable holding your API key",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(PrepError::config_validation(
                "generator.requestTimeoutSecs must be greater than 0",
                "Set generator.requestTimeoutSecs to at least 1 second in your prepmaster.json",
            ));
        }

        Ok(())
    }
}
