//! Configuration types and loading for Parley
//!
//! Configuration lives in a TOML file (by default
//! `<config dir>/parley/config.toml`). Environment variables override the
//! endpoint URLs and the starting language after the file is read.

use crate::constants::{endpoints, env, languages};
use crate::error::{ParleyError, Result};
use crate::types::LanguageTag;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Default log level when not running with `--debug`
    pub log_level: String,
    /// Remote services
    pub endpoints: EndpointConfig,
    /// Language selector settings
    pub language: LanguageConfig,
    /// Speech capability settings
    pub speech: SpeechConfig,
}

/// Remote chat and translation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub chat_url: String,
    pub translate_url: String,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Tag selected at startup
    pub default: LanguageTag,
    /// Tags the selector offers
    pub available: Vec<LanguageTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Master switch; when false both capabilities are unsupported
    pub enabled: bool,
    pub recognizer: Option<RecognizerCommand>,
    pub synthesizer: Option<SynthesizerCommand>,
}

/// External program that records one utterance and prints its transcript.
///
/// `{lang}` in `args` is replaced by the selected language tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// External program that speaks text aloud and can list its voices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerCommand {
    pub program: String,
    /// Arguments for speaking; `{text}` and `{lang}` are substituted
    #[serde(default)]
    pub speak_args: Vec<String>,
    /// Inserted before `speak_args` when a voice was selected; `{voice}` is substituted
    #[serde(default)]
    pub voice_args: Vec<String>,
    /// Arguments that make the program print its installed voices
    #[serde(default)]
    pub voices_args: Vec<String>,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            endpoints: EndpointConfig::default(),
            language: LanguageConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            chat_url: endpoints::DEFAULT_CHAT_URL.to_string(),
            translate_url: endpoints::DEFAULT_TRANSLATE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: LanguageTag::english(),
            available: vec![
                LanguageTag::english(),
                LanguageTag::parse(languages::MARATHI_TAG).unwrap_or_else(|_| LanguageTag::english()),
            ],
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recognizer: None,
            synthesizer: Some(SynthesizerCommand::espeak()),
        }
    }
}

impl SynthesizerCommand {
    /// `espeak-ng` invocation used when nothing else is configured
    pub fn espeak() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            speak_args: vec!["--".to_string(), "{text}".to_string()],
            voice_args: vec!["-v".to_string(), "{voice}".to_string()],
            voices_args: vec!["--voices".to_string()],
        }
    }
}

impl ParleyConfig {
    /// Load configuration from file, creating a default one if it doesn't exist
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let config = if config_path.exists() {
            let config_str = fs::read_to_string(config_path)?;
            let config: ParleyConfig = toml::from_str(&config_str).map_err(|e| {
                ParleyError::Config(format!(
                    "failed to parse config file {:?}: {}",
                    config_path, e
                ))
            })?;
            debug!("Loaded configuration from {:?}", config_path);
            config
        } else {
            let config = ParleyConfig::default();
            config.save(config_path)?;
            info!("Wrote default configuration to {:?}", config_path);
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    /// Default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ParleyError::Config("failed to get config directory".to_string()))?;
        Ok(config_dir.join("parley").join("config.toml"))
    }

    /// Apply `PARLEY_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, used by `apply_env_overrides`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::CHAT_URL) {
            debug!("Chat URL overridden by {}", env::CHAT_URL);
            self.endpoints.chat_url = url;
        }
        if let Some(url) = lookup(env::TRANSLATE_URL) {
            debug!("Translate URL overridden by {}", env::TRANSLATE_URL);
            self.endpoints.translate_url = url;
        }
        if let Some(lang) = lookup(env::LANG) {
            let wanted = LanguageTag::parse(&lang)?;
            self.language.default = self
                .language
                .available
                .iter()
                .find(|tag| tag.matches(wanted.as_str()))
                .cloned()
                .unwrap_or(wanted);
        }
        self.validate()
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("chat_url", &self.endpoints.chat_url),
            ("translate_url", &self.endpoints.translate_url),
        ] {
            reqwest::Url::parse(url.trim()).map_err(|e| {
                ParleyError::Config(format!("invalid {} '{}': {}", name, url, e))
            })?;
        }

        if self.language.available.is_empty() {
            return Err(ParleyError::Config(
                "language.available must list at least one tag".to_string(),
            ));
        }
        if !self.language.available.contains(&self.language.default) {
            return Err(ParleyError::Config(format!(
                "default language '{}' is not in language.available",
                self.language.default
            )));
        }
        if self.endpoints.timeout_seconds == Some(0) {
            return Err(ParleyError::Config(
                "endpoints.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
