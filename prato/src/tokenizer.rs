//! Write-time token expansion.
//!
//! The backing store can only answer "does this document's token array
//! intersect this short candidate list", so recall has to be manufactured
//! when a name is written: the name is expanded into a redundant set of
//! substrings (words, prefixes, suffixes, adjacent phrases, initials,
//! connector-free combinations, accent-preserving variants) and stored
//! alongside it. Over-generating here trades storage for read-time recall
//! the store cannot provide itself.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::normalize::normalize;

/// Tokens shorter than this match too much noise; search drops them from
/// its candidate list.
pub const MIN_TOKEN_LEN: usize = 2;

/// Portuguese articles and prepositions skipped by the significant-word
/// expansions, in normalized (accent-stripped) form.
static CONNECTOR_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "de", "do", "da", "dos", "das", "e", "em", "no", "na", "nos", "nas",
        "a", "o", "as", "os", "ao", "aos", "com", "para", "por", "um", "uma",
    ]
    .into_iter()
    .collect()
});

/// Ordered, deduplicated token expansion of `name`.
///
/// Deterministic, with the full normalized name first: a consumer that can
/// only send the first N candidates (the store's membership ceiling) always
/// keeps the most selective token. Storage treats the result as an
/// unordered set.
pub fn searchable_tokens(name: &str) -> Vec<String> {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut sink = TokenSink::default();
    sink.push(normalized.clone());

    let words: Vec<&str> = normalized.split_whitespace().collect();

    for word in &words {
        push_word_expansions(&mut sink, word);
    }

    // Adjacent phrases: pairs with their prefixes, triples verbatim.
    for pair in words.windows(2) {
        push_prefixes(&mut sink, &pair.join(" "), 3);
    }
    for triple in words.windows(3) {
        sink.push(triple.join(" "));
    }

    if words.len() >= 2 {
        let initials: String = words.iter().filter_map(|w| w.chars().next()).collect();
        if initials.chars().count() >= MIN_TOKEN_LEN {
            sink.push(initials);
        }
    }

    // Connector-free combinations: "sopa de legumes" is findable as
    // "sopa legumes" even though the phrase never occurs.
    let significant: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > 1 && !CONNECTOR_WORDS.contains(w))
        .collect();
    for word in &significant {
        push_prefixes(&mut sink, word, MIN_TOKEN_LEN);
    }
    for i in 0..significant.len() {
        for j in (i + 1)..significant.len() {
            sink.push(format!("{} {}", significant[i], significant[j]));
        }
    }

    // Accent-preserving variants: lower-cased but not stripped, so a query
    // typed with the accents intact still matches exactly.
    let lowered = name.trim().to_lowercase();
    for word in lowered.split_whitespace() {
        sink.push(word.to_string());
        push_prefixes(&mut sink, word, MIN_TOKEN_LEN);
    }
    if lowered != normalized {
        sink.push(lowered);
    }

    sink.tokens
}

/// The word itself, its prefixes (from 2 chars for words of up to 4 chars,
/// else 3), and up to 3 suffixes that keep at least 2 chars.
fn push_word_expansions(sink: &mut TokenSink, word: &str) {
    sink.push(word.to_string());

    let len = word.chars().count();
    let min_prefix = if len <= 4 { 2 } else { 3 };
    push_prefixes(sink, word, min_prefix);

    if len > 3 {
        for drop in 1..=3 {
            if len - drop >= MIN_TOKEN_LEN {
                sink.push(word.chars().skip(drop).collect());
            }
        }
    }
}

/// Every prefix of `text` from `min_len` chars up to and including the
/// whole string.
fn push_prefixes(sink: &mut TokenSink, text: &str, min_len: usize) {
    let chars: Vec<char> = text.chars().collect();
    for end in min_len..=chars.len() {
        sink.push(chars[..end].iter().collect());
    }
}

/// Insertion-ordered set.
#[derive(Default)]
struct TokenSink {
    seen: HashSet<String>,
    tokens: Vec<String>,
}

impl TokenSink {
    fn push(&mut self, token: String) {
        if self.seen.insert(token.clone()) {
            self.tokens.push(token);
        }
    }
}
