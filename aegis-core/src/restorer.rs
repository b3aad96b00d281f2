// aegis-core/src/restorer.rs
//! Turns tokenized text back into the original, either in one shot or
//! incrementally from a chunked stream.
//!
//! Restoration only needs the token/original pairs: tokens are
//! self-delimiting, so no offsets travel with the text. Matching is
//! leftmost-longest in a single pass, which means a longer token such as
//! `[PERSON_10]` is never shadowed by `[PERSON_1]` and restored originals are
//! never scanned again.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;
use std::fmt;

use daachorse::{DoubleArrayAhoCorasick, DoubleArrayAhoCorasickBuilder, MatchKind};
use log::{debug, warn};

use crate::redactor::Mapping;

const TOKEN_OPEN: char = '[';
const TOKEN_CLOSE: char = ']';

/// Token lookup shared by the one-shot and the streaming restorer.
struct TokenTable {
    /// Unique, non-empty tokens, longest first.
    entries: Vec<Mapping>,
    automaton: Option<DoubleArrayAhoCorasick<u32>>,
}

impl fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenTable")
            .field("tokens", &self.entries.len())
            .field("automaton", &self.automaton.as_ref().map(|_| "<DoubleArrayAhoCorasick>"))
            .finish()
    }
}

impl TokenTable {
    fn new(mappings: &[Mapping]) -> Self {
        let mut seen = HashSet::with_capacity(mappings.len());
        let mut entries: Vec<Mapping> = mappings
            .iter()
            .filter(|m| !m.token.is_empty() && seen.insert(m.token.as_str()))
            .cloned()
            .collect();
        // Stable: equal-length tokens keep caller order.
        entries.sort_by(|a, b| b.token.len().cmp(&a.token.len()));

        let automaton = Self::build_automaton(&entries);
        Self { entries, automaton }
    }

    fn build_automaton(entries: &[Mapping]) -> Option<DoubleArrayAhoCorasick<u32>> {
        if entries.is_empty() {
            return None;
        }
        let mut patvals = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let Ok(value) = u32::try_from(i) else {
                warn!(
                    "Too many tokens for the automaton ({}); falling back to sequential replacement",
                    entries.len()
                );
                return None;
            };
            patvals.push((entry.token.as_str(), value));
        }
        match DoubleArrayAhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build_with_values(patvals)
        {
            Ok(automaton) => Some(automaton),
            Err(e) => {
                warn!(
                    "Failed to build token automaton ({}); falling back to sequential replacement",
                    e
                );
                None
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(&self, text: &str) -> String {
        if self.is_empty() || text.is_empty() {
            return text.to_string();
        }
        match &self.automaton {
            Some(automaton) => {
                let mut out = String::with_capacity(text.len());
                let mut last = 0usize;
                for m in automaton.leftmost_find_iter(text) {
                    out.push_str(&text[last..m.start()]);
                    out.push_str(&self.entries[m.value() as usize].original);
                    last = m.end();
                }
                out.push_str(&text[last..]);
                out
            }
            None => self.entries.iter().fold(text.to_string(), |acc, entry| {
                acc.replace(entry.token.as_str(), &entry.original)
            }),
        }
    }
}

/// Replaces every token in `text` with its original value.
pub fn restore(text: &str, mappings: &[Mapping]) -> String {
    if mappings.is_empty() {
        return text.to_string();
    }
    TokenTable::new(mappings).apply(text)
}

/// Incremental restorer for one stream of tokenized text.
///
/// Text that could still be the beginning of a token (an opening `[` with no
/// closing `]` after it) is held back until more input arrives or the stream
/// is flushed. One instance serves exactly one stream; `flush` consumes it.
#[derive(Debug)]
pub struct StreamRestorer {
    table: TokenTable,
    buffer: String,
}

impl StreamRestorer {
    pub fn new(mappings: &[Mapping]) -> Self {
        Self {
            table: TokenTable::new(mappings),
            buffer: String::new(),
        }
    }

    /// Accepts the next chunk and returns everything that can be emitted now.
    pub fn process(&mut self, chunk: &str) -> String {
        self.buffer.push_str(chunk);

        if let Some(open) = self.buffer.rfind(TOKEN_OPEN) {
            if !self.buffer[open..].contains(TOKEN_CLOSE) {
                let pending = self.buffer.split_off(open);
                let safe = std::mem::replace(&mut self.buffer, pending);
                debug!(
                    "Stream restorer holding back {} bytes of a possible token.",
                    self.buffer.len()
                );
                return self.table.apply(&safe);
            }
        }

        let out = self.table.apply(&self.buffer);
        self.buffer.clear();
        out
    }

    /// Ends the stream, emitting whatever is still buffered after a final
    /// substitution attempt.
    pub fn flush(self) -> String {
        self.table.apply(&self.buffer)
    }

    /// The bytes currently held back.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(token: &str, original: &str) -> Mapping {
        Mapping {
            token: token.to_string(),
            original: original.to_string(),
            entity_type: "PERSON".to_string(),
        }
    }

    #[test]
    fn test_restore_basic() {
        let mappings = vec![m("[PERSON_1]", "Thomas Schmidt")];
        assert_eq!(restore("Call [PERSON_1] tomorrow.", &mappings), "Call Thomas Schmidt tomorrow.");
    }

    #[test]
    fn test_restore_prefers_longer_token() {
        let mut mappings = vec![m("[PERSON_1]", "Alice")];
        for n in 2..=10 {
            mappings.push(m(&format!("[PERSON_{}]", n), &format!("P{}", n)));
        }
        assert_eq!(restore("[PERSON_10] and [PERSON_1]", &mappings), "P10 and Alice");
    }

    #[test]
    fn test_restore_does_not_rescan_originals() {
        let mappings = vec![m("[PERSON_1]", "[PERSON_2]"), m("[PERSON_2]", "Bob")];
        assert_eq!(restore("[PERSON_1] [PERSON_2]", &mappings), "[PERSON_2] Bob");
    }

    #[test]
    fn test_restore_without_mappings_is_identity() {
        assert_eq!(restore("[PERSON_1]", &[]), "[PERSON_1]");
    }

    #[test]
    fn test_unknown_tokens_are_left_alone() {
        let mappings = vec![m("[PERSON_1]", "Alice")];
        assert_eq!(restore("[PERSON_2] [EMAIL_1]", &mappings), "[PERSON_2] [EMAIL_1]");
    }

    #[test]
    fn test_duplicate_and_empty_tokens_are_ignored() {
        let mappings = vec![m("[PERSON_1]", "Alice"), m("[PERSON_1]", "Mallory"), m("", "x")];
        assert_eq!(restore("hi [PERSON_1]", &mappings), "hi Alice");
    }

    #[test]
    fn test_stream_split_inside_token() {
        let mappings = vec![m("[PERSON_1]", "Alice")];
        let mut stream = StreamRestorer::new(&mappings);
        let mut out = stream.process("Hello [PER");
        assert_eq!(out, "Hello ");
        assert_eq!(stream.pending(), "[PER");
        out.push_str(&stream.process("SON_1], how are you?"));
        assert!(!stream.is_pending());
        out.push_str(&stream.flush());
        assert_eq!(out, "Hello Alice, how are you?");
    }

    #[test]
    fn test_stream_flush_emits_dangling_bracket() {
        let mappings = vec![m("[PERSON_1]", "Alice")];
        let mut stream = StreamRestorer::new(&mappings);
        let mut out = stream.process("[PERSON_1] says [");
        assert_eq!(out, "Alice says ");
        out.push_str(&stream.process("PERSON_"));
        out.push_str(&stream.flush());
        assert_eq!(out, "Alice says [PERSON_");
    }

    #[test]
    fn test_stream_one_byte_chunks() {
        let mappings = vec![m("[PERSON_1]", "Müller"), m("[EMAIL_1]", "m@ü.de")];
        let text = "Grüße [PERSON_1] <[EMAIL_1]> [x";
        let mut stream = StreamRestorer::new(&mappings);
        let mut out = String::new();
        for ch in text.chars() {
            let mut buf = [0u8; 4];
            out.push_str(&stream.process(ch.encode_utf8(&mut buf)));
        }
        out.push_str(&stream.flush());
        assert_eq!(out, restore(text, &mappings));
        assert_eq!(out, "Grüße Müller <m@ü.de> [x");
    }
}
