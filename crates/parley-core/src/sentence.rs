//! Lexical sentence accumulation for per-sentence translation

use parley_common::SENTENCE_TERMINATORS;

/// Holds untranslated text since the last sentence boundary.
///
/// A boundary is any terminator inside the newly pushed fragment, so the
/// `"."` of a fragment `".5"` closes a sentence too.
#[derive(Debug, Default)]
pub struct SentenceAccumulator {
    pending: String,
}

impl SentenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment. Returns the accumulated sentence when the fragment
    /// contains a terminator, leaving the accumulator empty.
    pub fn push(&mut self, fragment: &str) -> Option<String> {
        self.pending.push_str(fragment);
        if contains_terminator(fragment) {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }

    /// Take whatever is left once the stream has ended
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

pub fn contains_terminator(text: &str) -> bool {
    text.contains(SENTENCE_TERMINATORS)
}

/// Splits text into leading whitespace, core and trailing whitespace
pub fn split_padding(text: &str) -> (&str, &str, &str) {
    let core_start = text.len() - text.trim_start().len();
    let core_end = text.trim_end().len();
    if core_start >= core_end {
        return (text, "", "");
    }
    (
        &text[..core_start],
        &text[core_start..core_end],
        &text[core_end..],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_completes_on_terminator() {
        let mut acc = SentenceAccumulator::new();
        assert_eq!(acc.push("Hello"), None);
        assert_eq!(acc.push(", there"), None);
        assert_eq!(acc.push(". How"), Some("Hello, there. How".to_string()));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_each_terminator_kind() {
        for fragment in ["Stop.", "Wow!", "Why?"] {
            let mut acc = SentenceAccumulator::new();
            assert_eq!(acc.push(fragment), Some(fragment.to_string()));
        }
    }

    #[test]
    fn test_decimal_point_is_a_boundary() {
        let mut acc = SentenceAccumulator::new();
        assert_eq!(acc.push("Pi is 3"), None);
        assert_eq!(acc.push(".14 roughly"), Some("Pi is 3.14 roughly".to_string()));
    }

    #[test]
    fn test_terminator_only_checked_in_new_fragment() {
        let mut acc = SentenceAccumulator::new();
        assert_eq!(acc.push("a"), None);
        assert_eq!(acc.push("b"), None);
        assert_eq!(acc.take_remainder(), Some("ab".to_string()));
        assert_eq!(acc.take_remainder(), None);
    }

    #[test]
    fn test_split_padding() {
        assert_eq!(split_padding("Hello. "), ("", "Hello.", " "));
        assert_eq!(split_padding("\n World.\n"), ("\n ", "World.", "\n"));
        assert_eq!(split_padding("plain"), ("", "plain", ""));
        assert_eq!(split_padding("   "), ("   ", "", ""));
        assert_eq!(split_padding(""), ("", "", ""));
    }
}
