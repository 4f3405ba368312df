//! Streaming response processor
//!
//! Turns the chat endpoint's byte stream into display text. Without
//! translation every fragment is shown as soon as it arrives. With translation
//! fragments are held until a sentence completes, the sentence is translated,
//! and only then is it appended to the display.

use crate::chat::ByteStream;
use crate::framing::RecordFramer;
use crate::sentence::SentenceAccumulator;
use crate::translate::{TranslationDirection, Translator, translate_or_original};
use futures_util::StreamExt;
use parley_common::Result;
use std::time::Instant;
use tracing::{debug, info};

/// Receives the response buffer every time it grows
pub trait ResponseSink: Send {
    fn update(&mut self, text: &str);
}

impl<F> ResponseSink for F
where
    F: FnMut(&str) + Send,
{
    fn update(&mut self, text: &str) {
        self(text)
    }
}

/// How the processor treats fragments
#[derive(Clone, Copy)]
pub enum TranslationMode<'a> {
    Disabled,
    Enabled {
        translator: &'a dyn Translator,
        direction: &'a TranslationDirection,
    },
}

/// Counters for one processed response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub chunks: u64,
    pub records: u64,
    pub fragments: u64,
    pub translations: u64,
    pub characters: u64,
}

pub struct StreamingResponseProcessor<'a> {
    mode: TranslationMode<'a>,
}

impl<'a> StreamingResponseProcessor<'a> {
    pub fn new(mode: TranslationMode<'a>) -> Self {
        Self { mode }
    }

    pub fn passthrough() -> Self {
        Self::new(TranslationMode::Disabled)
    }

    pub fn translating(translator: &'a dyn Translator, direction: &'a TranslationDirection) -> Self {
        Self::new(TranslationMode::Enabled {
            translator,
            direction,
        })
    }

    /// Consume `stream` and return the final display text.
    ///
    /// A read error aborts processing; whatever was built so far is dropped
    /// with the error.
    pub async fn process(&self, stream: ByteStream, sink: &mut dyn ResponseSink) -> Result<String> {
        self.process_with_stats(stream, sink)
            .await
            .map(|(text, _)| text)
    }

    pub async fn process_with_stats(
        &self,
        mut stream: ByteStream,
        sink: &mut dyn ResponseSink,
    ) -> Result<(String, ProcessingStats)> {
        let started = Instant::now();
        let mut framer = RecordFramer::new();
        let mut sentences = SentenceAccumulator::new();
        let mut buffer = String::new();
        let mut stats = ProcessingStats::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            stats.chunks += 1;
            for fragment in framer.push(&chunk) {
                self.accept(&fragment, &mut sentences, &mut buffer, &mut stats, sink)
                    .await;
            }
        }

        for fragment in framer.finish() {
            self.accept(&fragment, &mut sentences, &mut buffer, &mut stats, sink)
                .await;
        }

        if let TranslationMode::Enabled {
            translator,
            direction,
        } = self.mode
        {
            if let Some(remainder) = sentences.take_remainder() {
                debug!("Translating trailing remainder of {} bytes", remainder.len());
                stats.translations += 1;
                buffer.push_str(&translate_or_original(translator, &remainder, direction).await);
                sink.update(&buffer);
            }
        }

        stats.records = framer.records_seen();
        stats.characters = buffer.chars().count() as u64;
        info!(
            "Processed response: {} chunks, {} fragments, {} translations, {} chars in {}ms",
            stats.chunks,
            stats.fragments,
            stats.translations,
            stats.characters,
            started.elapsed().as_millis()
        );
        Ok((buffer, stats))
    }

    async fn accept(
        &self,
        fragment: &str,
        sentences: &mut SentenceAccumulator,
        buffer: &mut String,
        stats: &mut ProcessingStats,
        sink: &mut dyn ResponseSink,
    ) {
        stats.fragments += 1;
        match self.mode {
            TranslationMode::Disabled => {
                buffer.push_str(fragment);
                sink.update(buffer);
            }
            TranslationMode::Enabled {
                translator,
                direction,
            } => {
                if let Some(sentence) = sentences.push(fragment) {
                    stats.translations += 1;
                    buffer.push_str(&translate_or_original(translator, &sentence, direction).await);
                    sink.update(buffer);
                }
            }
        }
    }
}
