//! Voice input: speech recognition capability and its adapter
//!
//! A recognition session moves through a small state machine:
//!
//! ```text
//! Idle --Start--> Listening --End--> Idle
//!                     |
//!                   Error --Reset--> Idle
//! ```
//!
//! The adapter publishes every state on a watch channel and reports each
//! transition to the caller's callback.

use super::command::substitute;
use async_trait::async_trait;
use parley_common::placeholders;
use parley_common::{LanguageTag, ParleyError, RecognizerCommand, Result};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// State of the microphone affordance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecognitionState {
    #[default]
    Idle,
    Listening {
        lang: LanguageTag,
    },
    Error {
        message: String,
    },
}

impl RecognitionState {
    pub fn is_listening(&self) -> bool {
        matches!(self, RecognitionState::Listening { .. })
    }
}

/// Inputs to the recognition state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Start { lang: LanguageTag },
    End,
    Error { message: String },
    Reset,
}

/// Pure transition function; events that do not apply leave the state alone
pub fn transition(state: &RecognitionState, event: RecognitionEvent) -> RecognitionState {
    use RecognitionEvent as E;
    use RecognitionState as S;

    match (state, event) {
        (S::Idle, E::Start { lang }) => S::Listening { lang },
        (S::Listening { .. }, E::End) => S::Idle,
        (S::Idle | S::Listening { .. }, E::Error { message }) => S::Error { message },
        (S::Error { .. }, E::Reset) => S::Idle,
        (current, event) => {
            debug!("Ignoring {:?} in state {:?}", event, current);
            current.clone()
        }
    }
}

/// Options for one recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub lang: LanguageTag,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionOptions {
    /// One final result, one alternative
    pub fn single_shot(lang: LanguageTag) -> Self {
        Self {
            lang,
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Platform speech recognition
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Run one session. `Ok(None)` means it ended without recognizing speech.
    /// A session that cannot begin fails with [`ParleyError::SpeechStart`].
    async fn recognize(&self, options: &RecognitionOptions) -> Result<Option<String>>;
}

/// Stand-in when no recognizer is available
pub struct UnsupportedRecognizer;

#[async_trait]
impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn recognize(&self, _options: &RecognitionOptions) -> Result<Option<String>> {
        Err(ParleyError::Unsupported(
            "speech recognition is not available".to_string(),
        ))
    }
}

/// Recognizer that runs an external program and reads the transcript from stdout
pub struct CommandRecognizer {
    command: RecognizerCommand,
}

impl CommandRecognizer {
    pub fn new(command: RecognizerCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn recognize(&self, options: &RecognitionOptions) -> Result<Option<String>> {
        let args = substitute(
            &self.command.args,
            &[(placeholders::LANG, options.lang.as_str())],
        );
        debug!("Starting recognizer: {} {:?}", self.command.program, args);

        let output = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ParleyError::SpeechStart(format!("failed to run {}: {}", self.command.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParleyError::Speech(format!(
                "{} exited with {}: {}",
                self.command.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let transcript = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);
        Ok(transcript)
    }
}

/// Drives one recognition session at a time and tracks the affordance state
pub struct VoiceInputAdapter {
    recognizer: Arc<dyn SpeechRecognizer>,
    state: watch::Sender<RecognitionState>,
}

impl VoiceInputAdapter {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        let (state, _) = watch::channel(RecognitionState::Idle);
        Self { recognizer, state }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    pub fn state(&self) -> RecognitionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecognitionState> {
        self.state.subscribe()
    }

    /// Run a session in `lang`, returning the transcript if one was recognized.
    ///
    /// `on_transition` sees every state the session passes through. On error
    /// the state returns to idle before the error is handed back.
    pub async fn listen(
        &self,
        lang: &LanguageTag,
        on_transition: &mut (dyn FnMut(&RecognitionState) + Send),
    ) -> Result<Option<String>> {
        if !self.is_supported() {
            return Err(ParleyError::Unsupported(
                "speech recognition is not available".to_string(),
            ));
        }
        // Check and start under one lock so only one caller can begin a session
        let started = self.state.send_if_modified(|state| {
            if state.is_listening() {
                return false;
            }
            *state = transition(state, RecognitionEvent::Start { lang: lang.clone() });
            true
        });
        if !started {
            warn!("Recognition already in progress; ignoring start request");
            return Ok(None);
        }
        on_transition(&self.state());
        let options = RecognitionOptions::single_shot(lang.clone());

        match self.recognizer.recognize(&options).await {
            Ok(transcript) => {
                self.apply(RecognitionEvent::End, on_transition);
                let transcript = transcript
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                match &transcript {
                    Some(t) => info!("Recognized {} chars of speech", t.chars().count()),
                    None => info!("Recognition ended without speech"),
                }
                Ok(transcript)
            }
            Err(e) => {
                error!("Speech recognition error: {}", e);
                self.apply(
                    RecognitionEvent::Error {
                        message: e.to_string(),
                    },
                    on_transition,
                );
                self.apply(RecognitionEvent::Reset, on_transition);
                Err(e)
            }
        }
    }

    fn apply(
        &self,
        event: RecognitionEvent,
        on_transition: &mut (dyn FnMut(&RecognitionState) + Send),
    ) {
        let next = transition(&self.state.borrow(), event);
        self.state.send_replace(next.clone());
        on_transition(&next);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a scripted outcome and records the options it was started with
    pub(crate) struct ScriptedRecognizer {
        pub outcome: Mutex<Option<Result<Option<String>>>>,
        pub seen: Mutex<Vec<RecognitionOptions>>,
    }

    impl ScriptedRecognizer {
        pub fn new(outcome: Result<Option<String>>) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        fn is_supported(&self) -> bool {
            true
        }

        async fn recognize(&self, options: &RecognitionOptions) -> Result<Option<String>> {
            self.seen.lock().unwrap().push(options.clone());
            self.outcome.lock().unwrap().take().unwrap_or(Ok(None))
        }
    }

    /// Stays in its session until released, counting how many sessions began
    struct GatedRecognizer {
        release: tokio::sync::Notify,
        sessions: Mutex<usize>,
    }

    #[async_trait]
    impl SpeechRecognizer for GatedRecognizer {
        fn is_supported(&self) -> bool {
            true
        }

        async fn recognize(&self, _options: &RecognitionOptions) -> Result<Option<String>> {
            *self.sessions.lock().unwrap() += 1;
            self.release.notified().await;
            Ok(Some("first".into()))
        }
    }

    fn marathi() -> LanguageTag {
        LanguageTag::parse("mr-IN").unwrap()
    }

    #[test]
    fn test_transitions() {
        let idle = RecognitionState::Idle;
        let listening = transition(&idle, RecognitionEvent::Start { lang: marathi() });
        assert!(listening.is_listening());

        assert_eq!(transition(&listening, RecognitionEvent::End), RecognitionState::Idle);

        let failed = transition(
            &listening,
            RecognitionEvent::Error {
                message: "no-speech".into(),
            },
        );
        assert!(matches!(failed, RecognitionState::Error { .. }));
        assert_eq!(transition(&failed, RecognitionEvent::Reset), RecognitionState::Idle);

        // Start while listening is not a transition
        assert_eq!(
            transition(&listening, RecognitionEvent::Start { lang: marathi() }),
            listening
        );
        assert_eq!(transition(&idle, RecognitionEvent::End), idle);
    }

    #[tokio::test]
    async fn test_successful_session() {
        let recognizer = Arc::new(ScriptedRecognizer::new(Ok(Some("  hello there ".into()))));
        let adapter = VoiceInputAdapter::new(recognizer.clone());
        let mut states = Vec::new();
        let mut record = |s: &RecognitionState| states.push(s.clone());

        let transcript = adapter.listen(&marathi(), &mut record).await.unwrap();

        assert_eq!(transcript.as_deref(), Some("hello there"));
        assert_eq!(
            states,
            vec![
                RecognitionState::Listening { lang: marathi() },
                RecognitionState::Idle
            ]
        );
        assert_eq!(adapter.state(), RecognitionState::Idle);

        let seen = recognizer.seen.lock().unwrap();
        assert_eq!(seen[0], RecognitionOptions::single_shot(marathi()));
        assert!(!seen[0].continuous);
        assert_eq!(seen[0].max_alternatives, 1);
    }

    #[tokio::test]
    async fn test_error_resets_to_idle() {
        let recognizer = Arc::new(ScriptedRecognizer::new(Err(ParleyError::Speech(
            "audio-capture".into(),
        ))));
        let adapter = VoiceInputAdapter::new(recognizer);
        let mut states = Vec::new();
        let mut record = |s: &RecognitionState| states.push(s.clone());

        let result = adapter.listen(&marathi(), &mut record).await;

        assert!(matches!(result, Err(ParleyError::Speech(_))));
        assert_eq!(states.len(), 3);
        assert!(matches!(states[1], RecognitionState::Error { .. }));
        assert_eq!(states[2], RecognitionState::Idle);
        assert_eq!(adapter.state(), RecognitionState::Idle);
    }

    #[tokio::test]
    async fn test_blank_transcript_is_none() {
        let adapter = VoiceInputAdapter::new(Arc::new(ScriptedRecognizer::new(Ok(Some(
            "   ".into(),
        )))));
        let mut ignore = |_: &RecognitionState| {};
        assert_eq!(adapter.listen(&marathi(), &mut ignore).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_listen_while_listening_is_ignored() {
        let recognizer = Arc::new(GatedRecognizer {
            release: tokio::sync::Notify::new(),
            sessions: Mutex::new(0),
        });
        let adapter = Arc::new(VoiceInputAdapter::new(recognizer.clone()));
        let mut receiver = adapter.subscribe();

        let first = tokio::spawn({
            let adapter = adapter.clone();
            async move {
                let mut ignore = |_: &RecognitionState| {};
                adapter.listen(&marathi(), &mut ignore).await
            }
        });
        receiver.wait_for(|s| s.is_listening()).await.unwrap();

        let mut states = Vec::new();
        let mut record = |s: &RecognitionState| states.push(s.clone());
        let second = adapter.listen(&marathi(), &mut record).await.unwrap();
        assert_eq!(second, None);
        assert!(states.is_empty());
        assert!(adapter.state().is_listening());

        recognizer.release.notify_one();
        let transcript = first.await.unwrap().unwrap();
        assert_eq!(transcript.as_deref(), Some("first"));
        assert_eq!(*recognizer.sessions.lock().unwrap(), 1);
        assert_eq!(adapter.state(), RecognitionState::Idle);
    }

    #[tokio::test]
    async fn test_unsupported() {
        let adapter = VoiceInputAdapter::new(Arc::new(UnsupportedRecognizer));
        assert!(!adapter.is_supported());
        let mut ignore = |_: &RecognitionState| {};
        let result = adapter.listen(&marathi(), &mut ignore).await;
        assert!(matches!(result, Err(ParleyError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_subscribers_see_final_state() {
        let adapter = VoiceInputAdapter::new(Arc::new(ScriptedRecognizer::new(Ok(Some(
            "hi".into(),
        )))));
        let receiver = adapter.subscribe();
        let mut ignore = |_: &RecognitionState| {};
        adapter.listen(&marathi(), &mut ignore).await.unwrap();
        assert_eq!(*receiver.borrow(), RecognitionState::Idle);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_reads_first_line() {
        let recognizer = CommandRecognizer::new(RecognizerCommand {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "printf '\\nheard in {lang}\\nsecond guess\\n'".to_string(),
            ],
        });
        let transcript = recognizer
            .recognize(&RecognitionOptions::single_shot(marathi()))
            .await
            .unwrap();
        assert_eq!(transcript.as_deref(), Some("heard in mr-IN"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_recognizer_failures() {
        let missing = CommandRecognizer::new(RecognizerCommand {
            program: "/nonexistent/recognizer".to_string(),
            args: vec![],
        });
        let result = missing
            .recognize(&RecognitionOptions::single_shot(marathi()))
            .await;
        assert!(matches!(result, Err(ParleyError::SpeechStart(_))));

        let failing = CommandRecognizer::new(RecognizerCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo 'mic busy' >&2; exit 3".to_string()],
        });
        let result = failing
            .recognize(&RecognitionOptions::single_shot(marathi()))
            .await;
        match result {
            Err(ParleyError::Speech(msg)) => assert!(msg.contains("mic busy")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
