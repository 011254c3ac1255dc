//! Word-level text matching shared by classification and filter extraction.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into lower-case words, dropping possessive suffixes.
///
/// "Suzuki's goals" becomes `["suzuki", "goals"]`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| {
            let w = w.to_lowercase();
            w.strip_suffix("'s")
                .or_else(|| w.strip_suffix("\u{2019}s"))
                .map_or_else(|| w.clone(), str::to_string)
        })
        .collect()
}

/// A phrase matched as a contiguous run of whole words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    words: Vec<String>,
}

impl Phrase {
    /// Tokenizes `text` into a phrase.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            words: tokenize(text),
        }
    }

    /// Number of words in the phrase.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` for a phrase with no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Index of the first occurrence in `tokens`.
    #[must_use]
    pub fn position(&self, tokens: &[String]) -> Option<usize> {
        if self.words.is_empty() || self.words.len() > tokens.len() {
            return None;
        }
        tokens
            .windows(self.words.len())
            .position(|w| w == self.words.as_slice())
    }

    /// Returns `true` if the phrase occurs in `tokens`.
    #[must_use]
    pub fn found_in(&self, tokens: &[String]) -> bool {
        self.position(tokens).is_some()
    }
}

/// Result count the query asks for, if any.
///
/// Recognises "show me N", "first N", "top N" and "N clip(s)".
#[must_use]
pub fn requested_limit(tokens: &[String]) -> Option<usize> {
    let number = |s: &String| s.parse::<usize>().ok();

    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        let after = tokens.get(i + 2);
        let found = match token.as_str() {
            "show" if next.is_some_and(|n| n == "me") => after.and_then(number),
            "first" | "top" => next.and_then(number),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }

    tokens
        .windows(2)
        .find(|w| w[1] == "clip" || w[1] == "clips")
        .and_then(|w| number(&w[0]))
}
