//! Cursor-based tokenizer over a single input line.
//!
//! [`StringView`] hands out whitespace-delimited words, treating a run wrapped
//! in any of the supported paired quotes as one word. One token of pushback
//! ([`StringView::unread`]) lets the command resolver try a word as a
//! subcommand name and hand it back to parameter binding when it isn't one.

use thiserror::Error;

/// Opening and closing quote pairs, including typographic and CJK variants
/// that chat clients substitute for straight quotes.
const QUOTE_PAIRS: [(char, char); 17] = [
    ('"', '"'),
    ('‘', '’'),
    ('‛', '‚'),
    ('“', '”'),
    ('‟', '„'),
    ('⹂', '⹂'),
    ('「', '」'),
    ('『', '』'),
    ('〝', '〞'),
    ('﹁', '﹂'),
    ('﹃', '﹄'),
    ('＂', '＂'),
    ('｢', '｣'),
    ('«', '»'),
    ('‹', '›'),
    ('《', '》'),
    ('〈', '〉'),
];

fn closing_quote(open: char) -> Option<char> {
    QUOTE_PAIRS
        .iter()
        .find(|(candidate, _)| *candidate == open)
        .map(|(_, close)| *close)
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\n'
}

/// Returned by [`StringView::next_word`] when no input is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no input remaining")]
pub struct Exhausted;

/// A read cursor over one line of input.
#[derive(Debug, Clone)]
pub struct StringView {
    text: String,
    /// Byte offset of the first unread character.
    index: usize,
    /// Last token handed out, kept for `unread`.
    last: String,
    /// Byte offset where `last` starts, quotes included.
    last_start: usize,
    pending: bool,
}

impl StringView {
    /// Create a view positioned at the start of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            index: 0,
            last: String::new(),
            last_start: 0,
            pending: false,
        }
    }

    /// The full input line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Byte offset where the last word handed out begins in the raw text,
    /// including any opening quote. Unaffected by [`unread`](Self::unread).
    pub fn last_start(&self) -> usize {
        self.last_start
    }

    /// True when an unread token is waiting to be re-delivered.
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// True when the cursor reached the end and nothing was pushed back.
    ///
    /// Trailing spaces count as unread input, so a view can report that it is
    /// not exhausted and still fail the next [`next_word`](Self::next_word).
    pub fn is_exhausted(&self) -> bool {
        !self.pending && self.index >= self.text.len()
    }

    /// Read the next word.
    ///
    /// Leading spaces and newlines are skipped. A word opening with a known
    /// quote whose closing partner appears later is returned without the
    /// quotes and with its interior untouched; otherwise the word ends at the
    /// next space or newline.
    pub fn next_word(&mut self) -> Result<String, Exhausted> {
        if self.pending {
            self.pending = false;
            return Ok(self.last.clone());
        }

        let rest = &self.text[self.index..];
        self.index += rest.len() - rest.trim_start_matches(is_separator).len();

        let rest = &self.text[self.index..];
        let first = rest.chars().next().ok_or(Exhausted)?;
        self.last_start = self.index;

        if let Some(close) = closing_quote(first) {
            let body = &rest[first.len_utf8()..];
            if let Some(end) = body.find(close) {
                let word = body[..end].to_string();
                self.index += first.len_utf8() + end + close.len_utf8();
                self.last.clone_from(&word);
                return Ok(word);
            }
        }

        let end = rest.find(is_separator).unwrap_or(rest.len());
        let word = rest[..end].to_string();
        self.index += end;
        self.last.clone_from(&word);
        Ok(word)
    }

    /// Consume everything that is left as one string.
    ///
    /// A pending unread token is glued back in front of the untouched input
    /// as-is; otherwise only leading spaces are stripped.
    pub fn remainder(&mut self) -> String {
        let rest = &self.text[self.index..];
        let word = if self.pending {
            format!("{}{}", self.last, rest)
        } else {
            rest.trim_start_matches(' ').to_string()
        };

        self.index = self.text.len();
        self.pending = false;
        word
    }

    /// Push the last token back so the next [`next_word`](Self::next_word)
    /// returns it again. Only one level of pushback exists.
    pub fn unread(&mut self) {
        self.pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        let mut view = StringView::new(text);
        let mut out = Vec::new();
        while let Ok(word) = view.next_word() {
            out.push(word);
        }
        out
    }

    #[test]
    fn test_splits_on_spaces_and_newlines() {
        assert_eq!(words("give  sword\n3"), vec!["give", "sword", "3"]);
    }

    #[test]
    fn test_straight_quotes_group_words() {
        assert_eq!(words(r#"say "hello world" now"#), vec!["say", "hello world", "now"]);
    }

    #[test]
    fn test_typographic_and_cjk_quotes() {
        assert_eq!(words("say “hi there”"), vec!["say", "hi there"]);
        assert_eq!(words("say 「こんにちは 世界」"), vec!["say", "こんにちは 世界"]);
        assert_eq!(words("say «a b» ‹c d›"), vec!["say", "a b", "c d"]);
    }

    #[test]
    fn test_unclosed_quote_is_a_plain_word() {
        assert_eq!(words(r#"say "hello world"#), vec!["say", "\"hello", "world"]);
    }

    #[test]
    fn test_quotes_do_not_process_escapes() {
        assert_eq!(words(r#""a\" b"#), vec![r"a\", "b"]);
    }

    #[test]
    fn test_exhausted() {
        let mut view = StringView::new("one");
        assert!(!view.is_exhausted());
        assert_eq!(view.next_word().unwrap(), "one");
        assert!(view.is_exhausted());
        assert_eq!(view.next_word(), Err(Exhausted));
        assert_eq!(StringView::new("").next_word(), Err(Exhausted));
    }

    #[test]
    fn test_trailing_space_is_not_exhausted_but_has_no_word() {
        let mut view = StringView::new("one ");
        view.next_word().unwrap();
        assert!(!view.is_exhausted());
        assert_eq!(view.next_word(), Err(Exhausted));
    }

    #[test]
    fn test_unread_redelivers_last_token() {
        let mut view = StringView::new("a b");
        assert_eq!(view.next_word().unwrap(), "a");
        view.unread();
        assert!(view.has_pending());
        assert_eq!(view.next_word().unwrap(), "a");
        assert_eq!(view.next_word().unwrap(), "b");
    }

    #[test]
    fn test_unread_at_end_is_not_exhausted() {
        let mut view = StringView::new("a");
        view.next_word().unwrap();
        view.unread();
        assert!(!view.is_exhausted());
        assert_eq!(view.next_word().unwrap(), "a");
        assert!(view.is_exhausted());
    }

    #[test]
    fn test_last_start_covers_quotes_and_pushback() {
        let mut view = StringView::new(r#"mode  "s""#);
        view.next_word().unwrap();
        assert_eq!(view.last_start(), 0);
        assert_eq!(view.next_word().unwrap(), "s");
        assert_eq!(view.last_start(), 6);
        view.unread();
        view.next_word().unwrap();
        assert_eq!(view.last_start(), 6);
    }

    #[test]
    fn test_remainder_strips_leading_spaces() {
        let mut view = StringView::new("cmd   --name Bob  ");
        view.next_word().unwrap();
        assert_eq!(view.remainder(), "--name Bob  ");
        assert!(view.is_exhausted());
        assert_eq!(view.remainder(), "");
    }

    #[test]
    fn test_remainder_includes_pending_token() {
        let mut view = StringView::new("cmd first rest of it");
        view.next_word().unwrap();
        view.next_word().unwrap();
        view.unread();
        assert_eq!(view.remainder(), "first rest of it");
        assert!(!view.has_pending());
    }
}
