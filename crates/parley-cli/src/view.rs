//! Terminal rendering of the chat widget

use anyhow::Result;
use colored::*;
use parley_common::{Role, TurnId};
use parley_core::{ChatView, Conversation, ConversationTurn, RecognitionState};
use regex::Regex;
use std::io::{self, Write};
use termimad::MadSkin;

/// Prints bot text incrementally as it streams in
pub struct TerminalView {
    conversation: Conversation,
    /// Bytes of the streaming turn already on screen
    printed: usize,
    can_speak: bool,
    mic_visible: bool,
    skin: MadSkin,
    link_pattern: Regex,
    markup_pattern: Regex,
}

impl TerminalView {
    pub fn new(can_speak: bool) -> Result<Self> {
        Ok(Self {
            conversation: Conversation::new(),
            printed: 0,
            can_speak,
            mic_visible: false,
            skin: MadSkin::default(),
            link_pattern: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)")?,
            markup_pattern: Regex::new(r"(?m)(\*\*|`|^#{1,6} |^\s*[-*] |\[[^\]]+\]\([^)]+\))")?,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn mic_visible(&self) -> bool {
        self.mic_visible
    }

    /// Replace Markdown links with OSC 8 hyperlinks for supported terminals.
    pub fn add_osc8_hyperlinks(&self, input: &str) -> String {
        self.link_pattern
            .replace_all(input, |caps: &regex::Captures| {
                let text = &caps[1];
                let url = &caps[2];
                format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
            })
            .to_string()
    }

    /// Re-print a finished answer as rendered markdown when it has any markup
    pub fn render_final(&self, text: &str) {
        if !self.markup_pattern.is_match(text) {
            return;
        }
        let formatted = self.add_osc8_hyperlinks(text);
        println!("{}", self.skin.term_text(&formatted));
    }

    fn flush() {
        let _ = io::stdout().flush();
    }
}

impl ChatView for TerminalView {
    fn append_turn(&mut self, turn: &ConversationTurn) {
        if turn.role == Role::Bot {
            self.printed = 0;
            print!("{}", "Parley: ".bright_green().bold());
            Self::flush();
        }
        self.conversation.push(turn.clone());
    }

    fn update_turn(&mut self, id: TurnId, text: &str) {
        let on_screen = self
            .conversation
            .get(id)
            .map(|t| t.displayed_text.clone())
            .unwrap_or_default();

        if text.starts_with(&on_screen) && self.printed == on_screen.len() {
            print!("{}", &text[self.printed..]);
        } else {
            // Not a continuation, e.g. the apology replacing a partial answer
            if self.printed > 0 {
                println!();
            }
            print!("{}", text.red());
        }
        self.printed = text.len();
        Self::flush();
        self.conversation.set_text(id, text);
    }

    fn turn_text(&self, id: TurnId) -> Option<String> {
        self.conversation.get(id).map(|t| t.displayed_text.clone())
    }

    fn set_input_enabled(&mut self, _enabled: bool) {}

    fn set_input_text(&mut self, text: &str) {
        if !text.is_empty() {
            println!("{} {}", "You (voice):".bright_cyan().bold(), text);
        }
    }

    fn show_speak_control(&mut self, id: TurnId) {
        println!();
        if self.can_speak {
            let index = self.conversation.bot_turns().position(|t| t.id == id);
            if let Some(index) = index {
                println!("{}", format!("  (/speak {} to listen)", index + 1).dimmed());
            }
        }
    }

    fn set_mic_visible(&mut self, visible: bool) {
        self.mic_visible = visible;
    }

    fn set_mic_state(&mut self, state: &RecognitionState) {
        match state {
            RecognitionState::Listening { lang } => {
                println!("{}", format!("🎙  Listening ({})...", lang).bright_magenta());
            }
            RecognitionState::Error { message } => {
                println!("{}", format!("🎙  {}", message).red());
            }
            RecognitionState::Idle => {}
        }
    }

    fn alert(&mut self, message: &str) {
        println!("{}", format!("⚠️  {}", message).bright_red().bold());
    }
}
