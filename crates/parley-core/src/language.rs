//! Language selector
//!
//! The selected tag drives both the speech language and the translation
//! direction. English disables translation entirely.

use crate::translate::TranslationDirection;
use parley_common::{LanguageConfig, LanguageTag, ParleyError, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct LanguageSelector {
    current: LanguageTag,
    available: Vec<LanguageTag>,
}

impl LanguageSelector {
    pub fn new(current: LanguageTag, available: Vec<LanguageTag>) -> Result<Self> {
        if !available.contains(&current) {
            return Err(ParleyError::Language(format!(
                "'{}' is not one of the available languages",
                current
            )));
        }
        Ok(Self { current, available })
    }

    pub fn from_config(config: &LanguageConfig) -> Result<Self> {
        Self::new(config.default.clone(), config.available.clone())
    }

    pub fn current(&self) -> &LanguageTag {
        &self.current
    }

    pub fn available(&self) -> &[LanguageTag] {
        &self.available
    }

    /// Switch language; the tag must be offered (compared case-insensitively)
    pub fn select(&mut self, raw: &str) -> Result<&LanguageTag> {
        let wanted = LanguageTag::parse(raw)?;
        let tag = self
            .available
            .iter()
            .find(|t| t.matches(wanted.as_str()))
            .cloned()
            .ok_or_else(|| {
                ParleyError::Language(format!(
                    "'{}' is not available (choose from {})",
                    wanted,
                    self.available
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        info!("Language changed: {} -> {}", self.current, tag);
        self.current = tag;
        Ok(&self.current)
    }

    pub fn translation_enabled(&self) -> bool {
        !self.current.is_english()
    }

    /// Direction for the user's query: selected language into English
    pub fn query_direction(&self) -> Option<TranslationDirection> {
        self.translation_enabled().then(|| {
            TranslationDirection::new(LanguageTag::chat_code(), self.current.primary())
        })
    }

    /// Direction for the bot's response: English into the selected language
    pub fn response_direction(&self) -> Option<TranslationDirection> {
        self.translation_enabled().then(|| {
            TranslationDirection::new(self.current.primary(), LanguageTag::chat_code())
        })
    }
}

impl Default for LanguageSelector {
    fn default() -> Self {
        let english = LanguageTag::english();
        Self {
            current: english.clone(),
            available: vec![english],
        }
    }
}
