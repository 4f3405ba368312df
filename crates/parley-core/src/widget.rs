//! Chat widget controller
//!
//! Wires user input, the streaming pipeline, voice input and voice output to
//! a [`ChatView`]. One request is in flight at a time; input stays disabled
//! until the bot turn is final.

use crate::context::WidgetContext;
use crate::conversation::{ChatView, ConversationTurn};
use crate::processor::StreamingResponseProcessor;
use crate::speech::{RecognitionState, VoiceInputAdapter, VoiceOutputAdapter};
use crate::translate::translate_or_original;
use parley_common::{
    CHAT_ERROR_MESSAGE, LanguageTag, ParleyError, Result, SPEECH_START_FAILED_MESSAGE, TurnId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// What happened to a submission
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing to send
    Ignored,
    /// A previous request is still running
    Busy,
    Completed { turn_id: TurnId, text: String },
    /// The bot turn shows the apology message
    Failed { turn_id: TurnId, error: ParleyError },
}

impl SubmitOutcome {
    pub fn turn_id(&self) -> Option<TurnId> {
        match self {
            SubmitOutcome::Completed { turn_id, .. } | SubmitOutcome::Failed { turn_id, .. } => {
                Some(*turn_id)
            }
            _ => None,
        }
    }
}

/// Clears the busy flag when the request finishes, however it finishes
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChatWidget {
    context: WidgetContext,
    voice_input: VoiceInputAdapter,
    voice_output: VoiceOutputAdapter,
    busy: AtomicBool,
}

impl ChatWidget {
    pub fn new(context: WidgetContext) -> Self {
        let voice_input = VoiceInputAdapter::new(context.speech.recognizer.clone());
        let voice_output = VoiceOutputAdapter::new(context.speech.synthesizer.clone());
        Self {
            context,
            voice_input,
            voice_output,
            busy: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &WidgetContext {
        &self.context
    }

    pub fn language(&self) -> &LanguageTag {
        self.context.languages.current()
    }

    pub fn languages(&self) -> &[LanguageTag] {
        self.context.languages.available()
    }

    pub fn select_language(&mut self, raw: &str) -> Result<LanguageTag> {
        self.context.languages.select(raw).cloned()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn voice_input(&self) -> &VoiceInputAdapter {
        &self.voice_input
    }

    pub fn voice_output(&self) -> &VoiceOutputAdapter {
        &self.voice_output
    }

    /// Prepare a freshly attached view
    pub fn mount(&self, view: &mut dyn ChatView) {
        view.set_mic_visible(self.voice_input.is_supported());
        view.set_mic_state(&self.voice_input.state());
        view.set_input_enabled(true);
        view.focus_input();
    }

    /// Send the user's message and stream the answer into a new bot turn
    pub async fn submit(&self, raw: &str, view: &mut dyn ChatView) -> SubmitOutcome {
        let query = raw.trim();
        if query.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            warn!("Submit ignored: a request is already in flight");
            return SubmitOutcome::Busy;
        };

        view.append_turn(&ConversationTurn::user(query));
        view.set_input_text("");
        view.set_input_enabled(false);

        let bot = ConversationTurn::bot();
        let bot_id = bot.id;
        view.append_turn(&bot);
        view.scroll_to_bottom();

        let outcome = match self.respond(query, bot_id, view).await {
            Ok(text) => {
                info!("Turn {} complete ({} chars)", bot_id, text.chars().count());
                SubmitOutcome::Completed {
                    turn_id: bot_id,
                    text,
                }
            }
            Err(e) => {
                error!("Error fetching chat response: {}", e);
                view.update_turn(bot_id, CHAT_ERROR_MESSAGE);
                SubmitOutcome::Failed {
                    turn_id: bot_id,
                    error: e,
                }
            }
        };

        view.set_input_enabled(true);
        view.focus_input();
        view.show_speak_control(bot_id);
        view.scroll_to_bottom();
        outcome
    }

    async fn respond(&self, query: &str, bot_id: TurnId, view: &mut dyn ChatView) -> Result<String> {
        let languages = &self.context.languages;
        let translator = self.context.translator.as_ref();

        let query = match languages.query_direction() {
            Some(direction) => {
                debug!("Translating query from {}", direction.source);
                translate_or_original(translator, query, &direction).await
            }
            None => query.to_string(),
        };

        let stream = self.context.chat.open_stream(&query).await?;

        let response_direction = languages.response_direction();
        let processor = match &response_direction {
            Some(direction) => StreamingResponseProcessor::translating(translator, direction),
            None => StreamingResponseProcessor::passthrough(),
        };

        let mut sink = |text: &str| {
            view.update_turn(bot_id, text);
            view.scroll_to_bottom();
        };
        processor.process(stream, &mut sink).await
    }

    /// Run one voice input session; a recognized transcript is submitted
    pub async fn mic_clicked(&self, view: &mut dyn ChatView) -> SubmitOutcome {
        if self.is_busy() {
            return SubmitOutcome::Busy;
        }
        if !self.voice_input.is_supported() {
            view.set_mic_visible(false);
            return SubmitOutcome::Ignored;
        }

        let lang = self.language().clone();
        let mut on_transition = |state: &RecognitionState| view.set_mic_state(state);
        let result = self.voice_input.listen(&lang, &mut on_transition).await;
        match result {
            Ok(Some(transcript)) => {
                view.set_input_text(&transcript);
                self.submit(&transcript, view).await
            }
            Ok(None) => SubmitOutcome::Ignored,
            Err(ParleyError::SpeechStart(reason)) => {
                error!("Error starting speech recognition: {}", reason);
                view.alert(SPEECH_START_FAILED_MESSAGE);
                SubmitOutcome::Ignored
            }
            Err(e) => {
                warn!("Speech recognition error: {}", e);
                SubmitOutcome::Ignored
            }
        }
    }

    /// Read a bot turn aloud in the selected language
    pub async fn speak_turn(&self, id: TurnId, view: &dyn ChatView) -> Result<()> {
        let text = view
            .turn_text(id)
            .ok_or_else(|| ParleyError::Generic(format!("no turn {}", id.short())))?;
        if text.trim().is_empty() {
            debug!("Nothing to speak for turn {}", id.short());
            return Ok(());
        }
        self.voice_output.speak(&text, self.language()).await
    }
}
