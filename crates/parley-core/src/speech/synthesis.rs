//! Voice output: speech synthesis capability and its adapter

use super::command::substitute;
use async_trait::async_trait;
use parley_common::placeholders;
use parley_common::{LanguageTag, ParleyError, Result, SynthesizerCommand};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// An installed voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Identifier passed back to the synthesizer
    pub id: String,
    pub name: String,
    /// Language tag as the platform reports it
    pub lang: String,
}

/// Text to speak and how to speak it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub lang: LanguageTag,
    /// `None` means the platform default voice
    pub voice: Option<Voice>,
}

/// Platform speech synthesis
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_supported(&self) -> bool;

    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Stop any utterance that is still speaking
    async fn cancel(&self) -> Result<()>;

    /// Start speaking; returns once the utterance has begun
    async fn speak(&self, utterance: &Utterance) -> Result<()>;
}

/// Stand-in when no synthesizer is available
pub struct UnsupportedSynthesizer;

#[async_trait]
impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        Ok(Vec::new())
    }

    async fn cancel(&self) -> Result<()> {
        Ok(())
    }

    async fn speak(&self, _utterance: &Utterance) -> Result<()> {
        Err(ParleyError::Unsupported(
            "speech synthesis is not available".to_string(),
        ))
    }
}

/// Synthesizer that runs an external program such as `espeak-ng`
pub struct CommandSynthesizer {
    command: SynthesizerCommand,
    current: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    pub fn new(command: SynthesizerCommand) -> Self {
        Self {
            command,
            current: Mutex::new(None),
        }
    }

    fn speak_args(&self, utterance: &Utterance) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(voice) = &utterance.voice {
            args.extend(substitute(
                &self.command.voice_args,
                &[(placeholders::VOICE, voice.id.as_str())],
            ));
        }
        args.extend(substitute(
            &self.command.speak_args,
            &[
                (placeholders::LANG, utterance.lang.as_str()),
                (placeholders::TEXT, utterance.text.as_str()),
            ],
        ));
        args
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn voices(&self) -> Result<Vec<Voice>> {
        if self.command.voices_args.is_empty() {
            return Ok(Vec::new());
        }

        let output = Command::new(&self.command.program)
            .args(&self.command.voices_args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ParleyError::Speech(format!("failed to list voices with {}: {}", self.command.program, e))
            })?;

        if !output.status.success() {
            return Err(ParleyError::Speech(format!(
                "{} exited with {} while listing voices",
                self.command.program, output.status
            )));
        }

        Ok(parse_espeak_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn cancel(&self) -> Result<()> {
        let mut current = self.current.lock().await;
        if let Some(mut child) = current.take() {
            if child.try_wait()?.is_none() {
                debug!("Cancelling running utterance");
                child.kill().await?;
            }
        }
        Ok(())
    }

    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        let args = self.speak_args(utterance);
        let child = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ParleyError::Speech(format!("failed to run {}: {}", self.command.program, e)))?;

        let mut current = self.current.lock().await;
        if let Some(mut previous) = current.replace(child) {
            // Only reached if the caller skipped cancel
            let _ = previous.start_kill();
        }
        Ok(())
    }
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 2)
///  5  mr              --/M      Marathi            inc/mr
/// ```
pub fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 4 || columns[0].parse::<u32>().is_err() {
                return None;
            }
            let lang = columns[1];
            Some(Voice {
                id: lang.to_string(),
                name: columns[3].replace('_', " "),
                lang: lang.to_string(),
            })
        })
        .collect()
}

/// First voice whose language tag equals `lang`, ignoring ASCII case
pub fn select_voice<'v>(voices: &'v [Voice], lang: &LanguageTag) -> Option<&'v Voice> {
    voices.iter().find(|voice| lang.matches(&voice.lang))
}

/// Speaks text in the selected language, one utterance at a time
pub struct VoiceOutputAdapter {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voices: RwLock<Option<Vec<Voice>>>,
}

impl VoiceOutputAdapter {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            voices: RwLock::new(None),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_supported()
    }

    /// Installed voices, loaded on first use
    pub async fn voices(&self) -> Result<Vec<Voice>> {
        if let Some(voices) = self.voices.read().await.as_ref() {
            return Ok(voices.clone());
        }
        self.refresh_voices().await
    }

    /// Reload the voice list from the synthesizer
    pub async fn refresh_voices(&self) -> Result<Vec<Voice>> {
        let voices = self.synthesizer.voices().await?;
        debug!("Loaded {} voices", voices.len());
        *self.voices.write().await = Some(voices.clone());
        Ok(voices)
    }

    /// Speak `text` in `lang`, cutting off whatever is currently playing
    pub async fn speak(&self, text: &str, lang: &LanguageTag) -> Result<()> {
        if !self.is_supported() {
            return Err(ParleyError::Unsupported(
                "speech synthesis is not available".to_string(),
            ));
        }

        let voices = self.voices().await.unwrap_or_else(|e| {
            warn!("Could not load voices: {}", e);
            Vec::new()
        });
        let voice = select_voice(&voices, lang).cloned();
        match &voice {
            Some(v) => debug!("Using voice {} ({}) for {}", v.name, v.id, lang),
            None => warn!("No voice found for {}, using default.", lang),
        }

        self.synthesizer.cancel().await?;
        info!("Speaking {} chars in {}", text.chars().count(), lang);
        self.synthesizer
            .speak(&Utterance {
                text: text.to_string(),
                lang: lang.clone(),
                voice,
            })
            .await
    }

    pub async fn cancel(&self) -> Result<()> {
        self.synthesizer.cancel().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Logs every call in order
    #[derive(Default)]
    pub(crate) struct RecordingSynthesizer {
        pub voices: Vec<Voice>,
        pub events: StdMutex<Vec<String>>,
        pub spoken: StdMutex<Vec<Utterance>>,
        pub voice_loads: AtomicUsize,
    }

    impl RecordingSynthesizer {
        pub fn with_voices(voices: Vec<Voice>) -> Self {
            Self {
                voices,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynthesizer {
        fn is_supported(&self) -> bool {
            true
        }

        async fn voices(&self) -> Result<Vec<Voice>> {
            self.voice_loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.voices.clone())
        }

        async fn cancel(&self) -> Result<()> {
            self.events.lock().unwrap().push("cancel".to_string());
            Ok(())
        }

        async fn speak(&self, utterance: &Utterance) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("speak:{}", utterance.text));
            self.spoken.lock().unwrap().push(utterance.clone());
            Ok(())
        }
    }

    pub(crate) fn voice(id: &str, lang: &str) -> Voice {
        Voice {
            id: id.to_string(),
            name: id.to_string(),
            lang: lang.to_string(),
        }
    }

    fn tag(raw: &str) -> LanguageTag {
        LanguageTag::parse(raw).unwrap()
    }

    #[test]
    fn test_select_voice_exact_tag_ignoring_case() {
        let voices = vec![voice("mr", "mr"), voice("marathi", "MR-in"), voice("us", "en-US")];
        assert_eq!(select_voice(&voices, &tag("mr-IN")).unwrap().id, "marathi");
        assert_eq!(select_voice(&voices, &tag("en-us")).unwrap().id, "us");
        assert!(select_voice(&voices, &tag("hi-IN")).is_none());
    }

    #[test]
    fn test_parse_espeak_voices() {
        let listing = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 2)
 5  mr              --/M      Marathi            inc/mr
";
        let voices = parse_espeak_voices(listing);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].lang, "en-us");
        assert_eq!(voices[1].name, "English (America)");
        assert_eq!(voices[2].id, "mr");
    }

    #[tokio::test]
    async fn test_speak_cancels_first_and_uses_matching_voice() {
        let synthesizer = Arc::new(RecordingSynthesizer::with_voices(vec![
            voice("us", "en-US"),
            voice("marathi", "mr-IN"),
        ]));
        let adapter = VoiceOutputAdapter::new(synthesizer.clone());

        adapter.speak("नमस्कार", &tag("mr-IN")).await.unwrap();
        adapter.speak("पुन्हा", &tag("mr-IN")).await.unwrap();

        assert_eq!(
            *synthesizer.events.lock().unwrap(),
            vec!["cancel", "speak:नमस्कार", "cancel", "speak:पुन्हा"]
        );
        let spoken = synthesizer.spoken.lock().unwrap();
        assert_eq!(spoken[0].voice.as_ref().unwrap().id, "marathi");
        assert_eq!(spoken[0].lang.as_str(), "mr-IN");
    }

    #[tokio::test]
    async fn test_missing_voice_falls_back_to_default() {
        let synthesizer = Arc::new(RecordingSynthesizer::with_voices(vec![voice("us", "en-US")]));
        let adapter = VoiceOutputAdapter::new(synthesizer.clone());

        adapter.speak("hello", &tag("mr-IN")).await.unwrap();

        let spoken = synthesizer.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].voice.is_none());
    }

    #[tokio::test]
    async fn test_voices_cached_until_refresh() {
        let synthesizer = Arc::new(RecordingSynthesizer::with_voices(vec![voice("us", "en-US")]));
        let adapter = VoiceOutputAdapter::new(synthesizer.clone());

        adapter.voices().await.unwrap();
        adapter.speak("one", &tag("en-US")).await.unwrap();
        assert_eq!(synthesizer.voice_loads.load(Ordering::SeqCst), 1);

        adapter.refresh_voices().await.unwrap();
        assert_eq!(synthesizer.voice_loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_synthesizer() {
        let adapter = VoiceOutputAdapter::new(Arc::new(UnsupportedSynthesizer));
        assert!(!adapter.is_supported());
        assert!(matches!(
            adapter.speak("hi", &tag("en-US")).await,
            Err(ParleyError::Unsupported(_))
        ));
    }

    #[test]
    fn test_command_args_with_and_without_voice() {
        let synthesizer = CommandSynthesizer::new(SynthesizerCommand::espeak());
        let mut utterance = Utterance {
            text: "hello there".to_string(),
            lang: tag("en-US"),
            voice: None,
        };
        assert_eq!(synthesizer.speak_args(&utterance), vec!["--", "hello there"]);

        utterance.voice = Some(voice("en-us", "en-us"));
        assert_eq!(
            synthesizer.speak_args(&utterance),
            vec!["-v", "en-us", "--", "hello there"]
        );
    }

    #[test]
    fn test_text_starting_with_dash_follows_end_of_options() {
        let synthesizer = CommandSynthesizer::new(SynthesizerCommand::espeak());
        let utterance = Utterance {
            text: "-5 degrees today.".to_string(),
            lang: tag("en-US"),
            voice: Some(voice("en-us", "en-us")),
        };

        let args = synthesizer.speak_args(&utterance);
        let text_at = args.iter().position(|a| a == "-5 degrees today.").unwrap();
        assert!(text_at > 0);
        assert_eq!(args[text_at - 1], "--");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_cancel_stops_running_utterance() {
        let synthesizer = CommandSynthesizer::new(SynthesizerCommand {
            program: "sleep".to_string(),
            speak_args: vec!["{text}".to_string()],
            voice_args: vec![],
            voices_args: vec![],
        });
        let utterance = Utterance {
            text: "30".to_string(),
            lang: tag("en-US"),
            voice: None,
        };

        synthesizer.speak(&utterance).await.unwrap();
        assert!(synthesizer.current.lock().await.is_some());
        synthesizer.cancel().await.unwrap();
        assert!(synthesizer.current.lock().await.is_none());
        assert!(synthesizer.voices().await.unwrap().is_empty());
    }
}
