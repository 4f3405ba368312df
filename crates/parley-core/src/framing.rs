//! Record framing for the chat response stream
//!
//! The chat endpoint answers with records separated by `"\n\n"`; a record
//! starting with `"data: "` carries a content fragment. Network chunks do not
//! respect either UTF-8 character boundaries or record boundaries, so both the
//! decoder and the framer carry partial input across calls.

use parley_common::{DATA_PREFIX, RECORD_SEPARATOR};
use tracing::{debug, trace};

const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder.
///
/// Bytes of a character split across chunks are held back until the rest
/// arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning all text that is complete so far
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());
        let mut consumed = 0;

        loop {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    // Safe: from_utf8 just validated this prefix
                    out.push_str(
                        std::str::from_utf8(&rest[..valid_up_to]).unwrap_or_default(),
                    );
                    match err.error_len() {
                        Some(bad) => {
                            out.push(REPLACEMENT);
                            consumed += valid_up_to + bad;
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            consumed += valid_up_to;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        out
    }

    /// Flush at end of stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT.to_string()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Splits decoded text into records and extracts `data: ` fragments.
#[derive(Debug, Default)]
pub struct RecordFramer {
    decoder: Utf8StreamDecoder,
    buffer: String,
    records_seen: u64,
}

impl RecordFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the fragments of every record it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.find(RECORD_SEPARATOR) {
            let record: String = self.buffer.drain(..pos + RECORD_SEPARATOR.len()).collect();
            let record = &record[..pos];
            self.records_seen += 1;
            if let Some(fragment) = Self::parse_record(record) {
                fragments.push(fragment);
            }
        }

        if !self.buffer.is_empty() {
            trace!(
                "Holding {} bytes of an incomplete record",
                self.buffer.len()
            );
        }
        fragments
    }

    /// End of stream: an unterminated trailing record is treated as complete
    pub fn finish(&mut self) -> Vec<String> {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        if self.buffer.is_empty() {
            return Vec::new();
        }

        let record = std::mem::take(&mut self.buffer);
        debug!(
            "Stream ended without a record separator; flushing {} bytes",
            record.len()
        );
        self.records_seen += 1;
        Self::parse_record(&record).into_iter().collect()
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    fn parse_record(record: &str) -> Option<String> {
        match record.strip_prefix(DATA_PREFIX) {
            Some(content) if !content.is_empty() => Some(content.to_string()),
            Some(_) => None,
            None => {
                if !record.is_empty() {
                    trace!("Ignoring non-data record: {:?}", record);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut framer = RecordFramer::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(framer.push(chunk));
        }
        out.extend(framer.finish());
        out
    }

    #[test]
    fn test_aligned_records() {
        let fragments = frame_all(&[b"data: Hello\n\ndata:  world\n\n"]);
        assert_eq!(fragments, vec!["Hello", " world"]);
    }

    #[test]
    fn test_separator_split_across_chunks() {
        // The first "\n" closes one chunk and the second opens the next
        let fragments = frame_all(&[b"data: Hello\n", b"\ndata: there\n\n"]);
        assert_eq!(fragments, vec!["Hello", "there"]);
    }

    #[test]
    fn test_prefix_split_across_chunks() {
        let fragments = frame_all(&[b"data: one\n\nda", b"ta: two\n\n"]);
        assert_eq!(fragments, vec!["one", "two"]);
    }

    #[test]
    fn test_every_split_point_yields_same_fragments() {
        let stream = "data: The value is 3.5\n\nevent: ping\n\ndata: नमस्कार!\n\ndata: ok\n\n";
        let bytes = stream.as_bytes();
        let expected = vec!["The value is 3.5", "नमस्कार!", "ok"];

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(frame_all(&[a, b]), expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let stream = "data: héllo\n\ndata: wörld\n\n".as_bytes();
        let chunks: Vec<&[u8]> = stream.chunks(1).collect();
        assert_eq!(frame_all(&chunks), vec!["héllo", "wörld"]);
    }

    #[test]
    fn test_non_data_and_empty_records_are_skipped() {
        let fragments = frame_all(&[b": comment\n\ndata: \n\nid: 7\n\ndata: kept\n\n"]);
        assert_eq!(fragments, vec!["kept"]);
    }

    #[test]
    fn test_trailing_record_flushed_at_end() {
        let mut framer = RecordFramer::new();
        assert_eq!(framer.push(b"data: first\n\ndata: tail"), vec!["first"]);
        assert_eq!(framer.finish(), vec!["tail"]);
        assert_eq!(framer.records_seen(), 2);
    }

    #[test]
    fn test_decoder_holds_partial_character() {
        let mut decoder = Utf8StreamDecoder::new();
        let bytes = "न".as_bytes();
        assert_eq!(bytes.len(), 3);

        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&bytes[1..2]), "");
        assert_eq!(decoder.decode(&bytes[2..]), "न");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_decoder_flushes_dangling_bytes() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
