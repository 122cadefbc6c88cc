//! Text Segmentation
//!
//! Splits a block of text into display segments on sentence (and optionally
//! clause) punctuation. Latin and CJK punctuation can be mixed freely.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::SegmentationMode;
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Delimiter Sets
// =============================================================================

/// Sentence terminators, Latin and full-width
pub const SENTENCE_DELIMITERS: &[char] = &['.', '!', '?', ';', '…', '。', '！', '？', '；'];

/// Clause separators added by the comma-aware variant
pub const CLAUSE_DELIMITERS: &[char] = &[',', '，', '、'];

/// Characters that close a segment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelimiterSet {
    chars: Vec<char>,
}

impl DelimiterSet {
    /// Sentence terminators only
    pub fn sentences() -> Self {
        Self::custom(SENTENCE_DELIMITERS)
    }

    /// Sentence terminators plus clause commas
    pub fn comma_aware() -> Self {
        let mut chars = SENTENCE_DELIMITERS.to_vec();
        chars.extend_from_slice(CLAUSE_DELIMITERS);
        Self { chars }
    }

    pub fn custom(chars: &[char]) -> Self {
        Self {
            chars: chars.to_vec(),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }
}

impl Default for DelimiterSet {
    fn default() -> Self {
        Self::sentences()
    }
}

fn whitespace_run() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

// =============================================================================
// Segmenter
// =============================================================================

/// Splits text into ordered segments
#[derive(Clone, Debug, Default)]
pub struct TextSegmenter {
    delimiters: DelimiterSet,
}

impl TextSegmenter {
    pub fn new(delimiters: DelimiterSet) -> Self {
        Self { delimiters }
    }

    pub fn comma_aware() -> Self {
        Self::new(DelimiterSet::comma_aware())
    }

    /// Splits `text` and applies `mode`.
    ///
    /// Fails with [`CoreError::EmptySegmentation`] when nothing usable remains.
    pub fn segment(&self, text: &str, mode: SegmentationMode) -> CoreResult<Vec<String>> {
        let disjoint = self.split_disjoint(text);
        if disjoint.is_empty() {
            return Err(CoreError::EmptySegmentation);
        }

        debug!(count = disjoint.len(), ?mode, "Segmented text");

        Ok(match mode {
            SegmentationMode::Disjoint => disjoint,
            SegmentationMode::Progressive => cumulative(&disjoint),
        })
    }

    /// Splits `text` into disjoint segments, delimiters attached to the text
    /// they close. Empty and delimiter-only pieces are dropped.
    pub fn split_disjoint(&self, text: &str) -> Vec<String> {
        let normalized = whitespace_run().replace_all(text.trim(), " ");
        let chars: Vec<char> = normalized.chars().collect();

        let mut segments = Vec::new();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            current.push(c);

            if !self.is_boundary(&chars, i) {
                continue;
            }
            // Keep runs like "?!" or "..." together
            if chars
                .get(i + 1)
                .is_some_and(|&next| self.is_boundary(&chars, i + 1) && next != ' ')
            {
                continue;
            }

            self.push_segment(&mut segments, &current);
            current.clear();
        }

        self.push_segment(&mut segments, &current);
        segments
    }

    fn is_boundary(&self, chars: &[char], i: usize) -> bool {
        let c = chars[i];
        if !self.delimiters.contains(c) {
            return false;
        }
        // Decimal point or thousands separator between digits
        if matches!(c, '.' | ',') && i > 0 {
            let before = chars[i - 1].is_ascii_digit();
            let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if before && after {
                return false;
            }
        }
        true
    }

    fn push_segment(&self, segments: &mut Vec<String>, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| self.delimiters.contains(c)) {
            return;
        }
        segments.push(trimmed.to_string());
    }
}

/// Builds cumulative prefixes: segment `i` joins segments `0..=i` with a space
fn cumulative(disjoint: &[String]) -> Vec<String> {
    let mut prefix = String::new();
    disjoint
        .iter()
        .map(|segment| {
            if !prefix.is_empty() {
                prefix.push(' ');
            }
            prefix.push_str(segment);
            prefix.clone()
        })
        .collect()
}

/// Segments `text` with the default sentence delimiters
pub fn segment(text: &str, mode: SegmentationMode) -> CoreResult<Vec<String>> {
    TextSegmenter::default().segment(text, mode)
}

// =============================================================================
// Tests
// =============================================================================
