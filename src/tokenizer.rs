//! Entity-folding tokenizer.
//!
//! Lowercase word/punctuation tokenization with one twist: runs of
//! capitalized words (optionally underscore-joined, e.g. `Machine_Learning`)
//! are folded into a single logical token before the generic pass, then
//! unfolded back to their constituent words. Underscore-joined entities
//! survive as single space-containing tokens; everything else becomes
//! lowercase words and single punctuation marks.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Capitalized entity run: `Word`, `Word_Word`, `Word Word_Word` ...
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:_[A-Z][a-z]+)*(?:\s+[A-Z][a-z]+(?:_[A-Z][a-z]+)*)*\b")
        .expect("entity regex")
});

/// Generic pass: word characters or a single non-space symbol.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]").expect("token regex"));

/// Marker attached to entity runs between the fold and unfold steps.
const ENTITY_MARK: &str = "ENTITY_";

/// Tokenize `text` into an ordered sequence of lowercase tokens.
///
/// Empty input yields an empty sequence. There are no failure modes.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = ENTITY_RE.replace_all(text, |caps: &Captures| format!("{ENTITY_MARK}{}", &caps[0]));
    let lowered = folded.to_lowercase();

    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().replace("entity_", "").replace('_', " "))
        .filter(|t| !t.is_empty())
        .collect()
}
