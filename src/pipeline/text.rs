//! Word-boundary term matching and window helpers shared by the extractors.

use regex::{Match, Regex};

/// A vocabulary term compiled into a case-insensitive, word-bounded matcher.
#[derive(Debug, Clone)]
pub struct TermPattern {
    pub term: String,
    regex: Regex,
}

impl TermPattern {
    pub fn new(term: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){}", bounded_pattern(term)))?;
        Ok(Self {
            term: term.to_string(),
            regex,
        })
    }

    pub fn find_iter<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Match<'t>> + 't {
        self.regex.find_iter(text)
    }

    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.regex.find(text)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compile every term, skipping (and logging) any that fail.
pub fn compile_terms<'a>(terms: impl IntoIterator<Item = &'a str>) -> Vec<TermPattern> {
    terms
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .filter_map(|term| match TermPattern::new(term) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(term, error = %e, "Skipping vocabulary term");
                None
            }
        })
        .collect()
}

/// Escaped regex for `term` with `\b` on each edge that is a word character.
pub fn bounded_pattern(term: &str) -> String {
    let escaped = regex::escape(term);
    let left = if term.chars().next().is_some_and(is_word_char) { r"\b" } else { "" };
    let right = if term.chars().last().is_some_and(is_word_char) { r"\b" } else { "" };
    format!("{left}{escaped}{right}")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte offset of the first word-bounded occurrence of `needle` in
/// `haystack`. Both sides must already share the same casing.
pub fn find_term(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let enforce_left = needle.chars().next().is_some_and(is_word_char);
    let enforce_right = needle.chars().last().is_some_and(is_word_char);
    let mut offset = 0;
    while let Some(pos) = haystack[offset..].find(needle) {
        let start = offset + pos;
        let end = start + needle.len();
        let left_ok = !enforce_left
            || haystack[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let right_ok = !enforce_right
            || haystack[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if left_ok && right_ok {
            return Some(start);
        }
        offset = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

pub fn contains_term(haystack: &str, needle: &str) -> bool {
    find_term(haystack, needle).is_some()
}

/// Byte range of `radius` bytes either side of `start..end`, clamped to
/// char boundaries.
pub fn window_bounds(text: &str, start: usize, end: usize, radius: usize) -> (usize, usize) {
    let s = clamp_to_char_boundary(text, start.saturating_sub(radius), false);
    let e = clamp_to_char_boundary(text, end.saturating_add(radius), true);
    (s, e)
}

pub fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let (s, e) = window_bounds(text, start, end, radius);
    &text[s..e]
}

/// `text[start..]` limited to `len` bytes, clamped to a char boundary.
pub fn tail(text: &str, start: usize, len: usize) -> &str {
    let s = clamp_to_char_boundary(text, start, true);
    let e = clamp_to_char_boundary(text, s.saturating_add(len), true);
    &text[s..e]
}

pub fn clamp_to_char_boundary(text: &str, mut idx: usize, forward: bool) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && idx < text.len() && !text.is_char_boundary(idx) {
        if forward {
            idx += 1;
        } else {
            idx -= 1;
        }
    }
    idx
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first character of every whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Collapse runs of whitespace and trim surrounding punctuation.
pub fn clean_phrase(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c == ':' || c == '.' || c == '-')
        .trim()
        .to_string()
}
