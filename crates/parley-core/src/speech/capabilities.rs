use super::command::command_exists;
use super::recognition::{CommandRecognizer, SpeechRecognizer, UnsupportedRecognizer};
use super::synthesis::{CommandSynthesizer, SpeechSynthesizer, UnsupportedSynthesizer};
use parley_common::SpeechConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Speech capabilities chosen once at startup
#[derive(Clone)]
pub struct SpeechCapabilities {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl SpeechCapabilities {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
        }
    }

    pub fn unsupported() -> Self {
        Self::new(Arc::new(UnsupportedRecognizer), Arc::new(UnsupportedSynthesizer))
    }

    /// Pick command-backed implementations for configured programs found on `PATH`
    pub fn detect(config: &SpeechConfig) -> Self {
        if !config.enabled {
            info!("Speech disabled by configuration");
            return Self::unsupported();
        }

        let recognizer: Arc<dyn SpeechRecognizer> = match &config.recognizer {
            Some(command) if command_exists(&command.program) => {
                info!("Speech recognition via {}", command.program);
                Arc::new(CommandRecognizer::new(command.clone()))
            }
            Some(command) => {
                warn!("Recognizer '{}' not found; voice input disabled", command.program);
                Arc::new(UnsupportedRecognizer)
            }
            None => {
                info!("No recognizer configured; voice input disabled");
                Arc::new(UnsupportedRecognizer)
            }
        };

        let synthesizer: Arc<dyn SpeechSynthesizer> = match &config.synthesizer {
            Some(command) if command_exists(&command.program) => {
                info!("Speech synthesis via {}", command.program);
                Arc::new(CommandSynthesizer::new(command.clone()))
            }
            Some(command) => {
                warn!("Synthesizer '{}' not found; voice output disabled", command.program);
                Arc::new(UnsupportedSynthesizer)
            }
            None => Arc::new(UnsupportedSynthesizer),
        };

        Self::new(recognizer, synthesizer)
    }

    pub fn can_listen(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn can_speak(&self) -> bool {
        self.synthesizer.is_supported()
    }
}

impl Default for SpeechCapabilities {
    fn default() -> Self {
        Self::unsupported()
    }
}
