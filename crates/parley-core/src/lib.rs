//! Parley Core - streaming multilingual chat pipeline
//!
//! This crate provides:
//! - Chat and translation endpoint clients
//! - Incremental record framing and sentence accumulation
//! - The streaming response processor with per-sentence translation
//! - Voice input and output adapters over pluggable speech capabilities
//! - The chat widget controller and its view boundary

pub mod chat;
pub mod context;
pub mod conversation;
pub mod framing;
pub mod language;
pub mod processor;
pub mod sentence;
pub mod speech;
pub mod translate;
pub mod widget;

// Re-export key types for convenience
pub use chat::{ByteStream, ChatClient, ChatRequest, HttpChatClient};
pub use context::WidgetContext;
pub use conversation::{ChatView, Conversation, ConversationTurn};
pub use framing::{RecordFramer, Utf8StreamDecoder};
pub use language::LanguageSelector;
pub use processor::{ProcessingStats, ResponseSink, StreamingResponseProcessor, TranslationMode};
pub use sentence::SentenceAccumulator;
pub use speech::{
    RecognitionState, SpeechCapabilities, SpeechRecognizer, SpeechSynthesizer, Voice,
    VoiceInputAdapter, VoiceOutputAdapter,
};
pub use translate::{HttpTranslator, TranslationDirection, Translator, translate_or_original};
pub use widget::{ChatWidget, SubmitOutcome};
