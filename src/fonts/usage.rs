//! Which codes a font actually draws and what surrounds them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::fonts::FontModel;
use crate::fonts::dict::CharCode;

/// Share of a glyph's predecessors that must be letters before a spacing
/// accent is read as a combining mark.
const GLUED_ACCENT_RATIO: f32 = 0.8;

/// Statistics for one character code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharUsage {
    pub count: u32,
    /// Times the code opened a word.
    pub word_starts: u32,
    pub predecessors: HashMap<CharCode, u32>,
    pub successors: HashMap<CharCode, u32>,
    /// Neighbours drawn in another font, by their nominal text.
    pub cross_predecessors: HashMap<String, u32>,
    pub cross_successors: HashMap<String, u32>,
}

/// Usage of every code in one font plus word-length bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct CharUsageStats {
    chars: HashMap<CharCode, CharUsage>,
    last: Option<CharCode>,
    words: u32,
    word_chars: u32,
    current_word: u32,
}

impl CharUsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_used(&mut self, code: CharCode) {
        let prev = self.last;
        let usage = self.chars.entry(code).or_default();
        usage.count += 1;
        match prev {
            Some(p) => *usage.predecessors.entry(p).or_default() += 1,
            None => usage.word_starts += 1,
        }
        if let Some(p) = prev.and_then(|p| self.chars.get_mut(&p)) {
            *p.successors.entry(code).or_default() += 1;
        }
        self.current_word += 1;
        self.last = Some(code);
    }

    /// Counts a use without letting the code join a word, for explicit
    /// spaces.
    pub fn mark_separator(&mut self, code: CharCode) {
        self.chars.entry(code).or_default().count += 1;
        self.mark_word_boundary();
    }

    pub fn mark_word_boundary(&mut self) {
        if self.current_word > 0 {
            self.words += 1;
            self.word_chars += self.current_word;
        }
        self.current_word = 0;
        self.last = None;
    }

    pub fn record_cross_predecessor(&mut self, code: CharCode, text: String) {
        *self
            .chars
            .entry(code)
            .or_default()
            .cross_predecessors
            .entry(text)
            .or_default() += 1;
    }

    pub fn record_cross_successor(&mut self, code: CharCode, text: String) {
        *self
            .chars
            .entry(code)
            .or_default()
            .cross_successors
            .entry(text)
            .or_default() += 1;
    }

    pub fn get(&self, code: CharCode) -> Option<&CharUsage> {
        self.chars.get(&code)
    }

    /// Used codes in ascending order.
    pub fn codes(&self) -> Vec<CharCode> {
        let mut codes: Vec<CharCode> = self.chars.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn word_count(&self) -> u32 {
        self.words + u32::from(self.current_word > 0)
    }

    /// Mean number of glyphs per word, counting a word still open.
    pub fn average_word_length(&self) -> Option<f32> {
        let words = self.word_count();
        (words > 0).then(|| (self.word_chars + self.current_word) as f32 / words as f32)
    }
}

/// Combining form of a spacing accent.
pub(crate) fn combining_form(ch: char) -> Option<char> {
    Some(match ch {
        '`' | '\u{02CB}' => '\u{0300}',
        '\u{00B4}' | '\u{02CA}' => '\u{0301}',
        '^' | '\u{02C6}' => '\u{0302}',
        '~' | '\u{02DC}' => '\u{0303}',
        '\u{00AF}' | '\u{02C9}' => '\u{0304}',
        '\u{02D8}' => '\u{0306}',
        '\u{02D9}' => '\u{0307}',
        '\u{00A8}' => '\u{0308}',
        '\u{02DA}' => '\u{030A}',
        '\u{02DD}' => '\u{030B}',
        '\u{02C7}' => '\u{030C}',
        '\u{00B8}' => '\u{0327}',
        '\u{02DB}' => '\u{0328}',
        _ => return None,
    })
}

/// Whether a spacing accent with this usage is glued to the letter before
/// it: it never starts a word and nearly all its predecessors are letters.
/// `is_letter` classifies same-font predecessor codes.
pub(crate) fn is_glued_accent(usage: &CharUsage, is_letter: impl Fn(CharCode) -> bool) -> bool {
    if usage.word_starts > 0 {
        return false;
    }
    let mut total = 0u32;
    let mut letters = 0u32;
    for (&code, &n) in &usage.predecessors {
        total += n;
        if is_letter(code) {
            letters += n;
        }
    }
    for (text, &n) in &usage.cross_predecessors {
        total += n;
        if text.chars().last().is_some_and(char::is_alphabetic) {
            letters += n;
        }
    }
    total > 0 && letters as f32 >= GLUED_ACCENT_RATIO * total as f32
}

/// Feeds glyph sequences that may hop between fonts.
#[derive(Default)]
pub struct UsageRecorder {
    last: Option<(Arc<FontModel>, CharCode)>,
}

impl UsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, font: &Arc<FontModel>, code: CharCode) {
        if let Some((prev_font, prev_code)) = &self.last {
            if !Arc::ptr_eq(prev_font, font) {
                prev_font.record_neighbor(*prev_code, None, Some(font.nominal_unicode(code)));
                font.record_neighbor(code, Some(prev_font.nominal_unicode(*prev_code)), None);
                prev_font.mark_word_boundary();
            }
        }
        font.mark_used(code);
        self.last = Some((font.clone(), code));
    }

    pub fn word_boundary(&mut self) {
        if let Some((font, _)) = self.last.take() {
            font.mark_word_boundary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_lengths_and_neighbours() {
        let mut stats = CharUsageStats::new();
        for code in [1, 2, 3] {
            stats.mark_used(code);
        }
        stats.mark_separator(32);
        stats.mark_used(1);
        assert_eq!(stats.word_count(), 2);
        assert_eq!(stats.average_word_length(), Some(2.0));

        let one = stats.get(1).unwrap();
        assert_eq!(one.count, 2);
        assert_eq!(one.word_starts, 2);
        assert_eq!(one.successors.get(&2), Some(&1));
        assert_eq!(stats.get(3).unwrap().predecessors.get(&2), Some(&1));
        assert_eq!(stats.codes(), vec![1, 2, 3, 32]);
    }

    #[test]
    fn glued_accents() {
        let mut stats = CharUsageStats::new();
        for _ in 0..5 {
            stats.mark_used(b'e' as CharCode);
            stats.mark_used(0xB4);
            stats.mark_word_boundary();
        }
        let accent = stats.get(0xB4).unwrap();
        assert!(is_glued_accent(accent, |c| (c as u8).is_ascii_alphabetic()));

        stats.mark_used(0xB4);
        let accent = stats.get(0xB4).unwrap();
        assert!(!is_glued_accent(accent, |c| (c as u8).is_ascii_alphabetic()));
        assert_eq!(combining_form('\u{00B4}'), Some('\u{0301}'));
        assert_eq!(combining_form('a'), None);
    }
}
