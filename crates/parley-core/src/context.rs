//! Everything the widget needs, built once from configuration

use crate::chat::{ChatClient, HttpChatClient, build_http_client};
use crate::language::LanguageSelector;
use crate::speech::SpeechCapabilities;
use crate::translate::{HttpTranslator, Translator};
use parley_common::{ParleyConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct WidgetContext {
    pub chat: Arc<dyn ChatClient>,
    pub translator: Arc<dyn Translator>,
    pub speech: SpeechCapabilities,
    pub languages: LanguageSelector,
}

impl WidgetContext {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        translator: Arc<dyn Translator>,
        speech: SpeechCapabilities,
        languages: LanguageSelector,
    ) -> Self {
        Self {
            chat,
            translator,
            speech,
            languages,
        }
    }

    /// HTTP clients for both endpoints, detected speech, configured languages.
    /// The two endpoint clients share one connection pool.
    pub fn from_config(config: &ParleyConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.endpoints.timeout_seconds.map(Duration::from_secs);
        let client = build_http_client(timeout)?;
        let chat = HttpChatClient::with_client(client.clone(), config.endpoints.chat_url.as_str());
        let translator = HttpTranslator::with_client(client, config.endpoints.translate_url.as_str());
        let speech = SpeechCapabilities::detect(&config.speech);
        let languages = LanguageSelector::from_config(&config.language)?;

        info!(
            "Widget context ready: chat={}, language={}, mic={}, voice={}",
            chat.url(),
            languages.current(),
            speech.can_listen(),
            speech.can_speak()
        );

        Ok(Self::new(
            Arc::new(chat),
            Arc::new(translator),
            speech,
            languages,
        ))
    }
}
