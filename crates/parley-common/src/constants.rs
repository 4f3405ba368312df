//! Common constants used across Parley

/// Separator between records in the chat response stream
pub const RECORD_SEPARATOR: &str = "\n\n";

/// Prefix marking a record that carries a content fragment
pub const DATA_PREFIX: &str = "data: ";

/// Characters that close a sentence for translation purposes
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Text shown in place of a bot turn whose response failed
pub const CHAT_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again later.";

/// Alert shown when a voice recognition session cannot start
pub const SPEECH_START_FAILED_MESSAGE: &str =
    "Could not start voice recognition. Is your microphone enabled?";

/// Language codes and tags
pub mod languages {
    /// Tag whose selection disables translation
    pub const ENGLISH_TAG: &str = "en-US";
    pub const MARATHI_TAG: &str = "mr-IN";

    /// Code the chat endpoint is spoken to in
    pub const ENGLISH_CODE: &str = "en";
}

/// Default endpoint locations
pub mod endpoints {
    pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:8000/chat";
    pub const DEFAULT_TRANSLATE_URL: &str = "http://127.0.0.1:8000/translate";
}

/// Environment variables that override configuration
pub mod env {
    pub const CHAT_URL: &str = "PARLEY_CHAT_URL";
    pub const TRANSLATE_URL: &str = "PARLEY_TRANSLATE_URL";
    pub const LANG: &str = "PARLEY_LANG";
}

/// Placeholders substituted into speech command arguments
pub mod placeholders {
    pub const LANG: &str = "{lang}";
    pub const VOICE: &str = "{voice}";
    pub const TEXT: &str = "{text}";
}
