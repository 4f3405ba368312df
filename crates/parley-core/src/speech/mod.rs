//! Speech input and output
//!
//! Platform capabilities sit behind [`SpeechRecognizer`] and
//! [`SpeechSynthesizer`]; the adapters layer the widget's behaviour on top.

pub mod capabilities;
pub mod command;
pub mod recognition;
pub mod synthesis;

pub use capabilities::SpeechCapabilities;
pub use recognition::{
    CommandRecognizer, RecognitionEvent, RecognitionOptions, RecognitionState, SpeechRecognizer,
    UnsupportedRecognizer, VoiceInputAdapter, transition,
};
pub use synthesis::{
    CommandSynthesizer, SpeechSynthesizer, UnsupportedSynthesizer, Utterance, Voice,
    VoiceOutputAdapter, select_voice,
};
