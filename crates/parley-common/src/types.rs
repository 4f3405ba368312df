//! Common types used across Parley components

use crate::constants::languages::{ENGLISH_CODE, ENGLISH_TAG};
use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language tag such as `en-US` or `mr-IN`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse a tag, rejecting empty input and characters outside `[A-Za-z0-9-]`
    pub fn parse(raw: &str) -> Result<Self> {
        let tag = raw.trim();
        if tag.is_empty() {
            return Err(ParleyError::Language("empty language tag".to_string()));
        }
        if tag.starts_with('-')
            || tag.ends_with('-')
            || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ParleyError::Language(format!(
                "malformed language tag '{}'",
                tag
            )));
        }
        Ok(Self(tag.to_string()))
    }

    pub fn english() -> Self {
        Self(ENGLISH_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary subtag, the code the translation endpoint understands (`mr-IN` -> `mr`)
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this tag is the one that disables translation
    pub fn is_english(&self) -> bool {
        self.matches(ENGLISH_TAG)
    }

    /// BCP-47 tags compare case-insensitively
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Code for the side of the conversation the chat endpoint speaks
    pub fn chat_code() -> &'static str {
        ENGLISH_CODE
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = ParleyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

impl std::str::FromStr for LanguageTag {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Who authored a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// Identifier of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
