//! Translation endpoint client
//!
//! Translation is best effort: callers go through [`translate_or_original`],
//! which substitutes the source text whenever the endpoint fails.

use crate::sentence::split_padding;
use async_trait::async_trait;
use parley_common::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Body sent to the translation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslateRequest {
    pub text: String,
    pub target_lang: String,
    pub source_lang: String,
}

/// Body returned by the translation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Which way a piece of text is being translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationDirection {
    pub target: String,
    pub source: String,
}

impl TranslationDirection {
    pub fn new(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

/// Something that can translate text between two language codes
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, direction: &TranslationDirection) -> Result<String>;
}

/// Translator backed by the remote `/translate` endpoint
pub struct HttpTranslator {
    client: reqwest::Client,
    url: String,
}

impl HttpTranslator {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::with_client(crate::chat::build_http_client(timeout)?, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim().to_string(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, direction: &TranslationDirection) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let request = TranslateRequest {
            text: text.to_string(),
            target_lang: direction.target.clone(),
            source_lang: direction.source.clone(),
        };

        debug!(
            "Translating {} chars {} -> {}",
            text.chars().count(),
            direction.source,
            direction.target
        );

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: TranslateResponse = serde_json::from_str(&body).map_err(|e| {
            ParleyError::Translation(format!(
                "unparseable response (status {}): {}",
                status.as_u16(),
                e
            ))
        })?;

        if let Some(error) = parsed.error {
            return Err(ParleyError::Translation(error));
        }

        parsed.translated_text.ok_or_else(|| {
            ParleyError::Translation(format!(
                "response without translated_text (status {})",
                status.as_u16()
            ))
        })
    }
}

/// Translate `text`, falling back to the original on any failure.
///
/// Only the trimmed core is sent; surrounding whitespace is put back around
/// the result. Whitespace-only input makes no call.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    direction: &TranslationDirection,
) -> String {
    let (lead, core, trail) = split_padding(text);
    if core.is_empty() {
        return text.to_string();
    }

    match translator.translate(core, direction).await {
        Ok(translated) => format!("{}{}{}", lead, translated, trail),
        Err(e) => {
            warn!("Translation failed, keeping original text: {}", e);
            text.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; uppercases text, or fails for inputs listed in `fail_on`
    #[derive(Default)]
    pub(crate) struct RecordingTranslator {
        pub calls: Mutex<Vec<(String, TranslationDirection)>>,
        pub fail_on: Vec<String>,
    }

    impl RecordingTranslator {
        pub fn failing_on(inputs: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: inputs.iter().map(|s| s.to_string()).collect(),
            }
        }

        pub fn inputs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(text, _)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Translator for RecordingTranslator {
        async fn translate(&self, text: &str, direction: &TranslationDirection) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), direction.clone()));
            if self.fail_on.iter().any(|f| f == text) {
                return Err(ParleyError::Translation("boom".to_string()));
            }
            Ok(text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_padding_is_preserved() {
        let translator = RecordingTranslator::default();
        let direction = TranslationDirection::new("mr", "en");

        let out = translate_or_original(&translator, " Hello. ", &direction).await;
        assert_eq!(out, " HELLO. ");
        assert_eq!(translator.inputs(), vec!["Hello."]);
    }

    #[tokio::test]
    async fn test_whitespace_only_makes_no_call() {
        let translator = RecordingTranslator::default();
        let direction = TranslationDirection::new("mr", "en");

        assert_eq!(translate_or_original(&translator, "  \n", &direction).await, "  \n");
        assert!(translator.inputs().is_empty());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let translator = RecordingTranslator::failing_on(&["Broken."]);
        let direction = TranslationDirection::new("mr", "en");

        let out = translate_or_original(&translator, "Broken. ", &direction).await;
        assert_eq!(out, "Broken. ");
        assert_eq!(translator.inputs(), vec!["Broken."]);
    }

    #[test]
    fn test_request_wire_format() {
        let request = TranslateRequest {
            text: "hi".to_string(),
            target_lang: "mr".to_string(),
            source_lang: "en".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"text": "hi", "target_lang": "mr", "source_lang": "en"})
        );
    }

    #[test]
    fn test_response_wire_format() {
        let ok: TranslateResponse =
            serde_json::from_str(r#"{"translated_text": "नमस्कार"}"#).unwrap();
        assert_eq!(ok.translated_text.as_deref(), Some("नमस्कार"));
        assert!(ok.error.is_none());

        let err: TranslateResponse = serde_json::from_str(r#"{"error": "quota"}"#).unwrap();
        assert_eq!(err.error.as_deref(), Some("quota"));
    }
}
