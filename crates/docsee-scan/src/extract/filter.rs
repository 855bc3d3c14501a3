// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-processing of raw recognition hits: confidence floor, minimum length,
// and a text-line shape check that suppresses stray marks.

use docsee_core::config::FilterConfig;
use docsee_core::types::{RawHit, TextHit};
use regex::Regex;
use tracing::trace;

/// Optional bullet or dash, then an uppercase letter or digit, then common
/// word characters and punctuation.
const TEXT_LINE_PATTERN: &str = r#"^[-•*]?\s*[A-Z0-9][\w\s.,:;()\-+*/=%&!?"']+$"#;

/// Best-effort noise suppression for recognition output. This is a shape
/// heuristic, not a language model.
#[derive(Debug, Clone)]
pub struct TextFilter {
    config: FilterConfig,
    line_shape: Regex,
}

impl TextFilter {
    pub fn new(config: FilterConfig) -> Self {
        // The pattern is a compile-time constant.
        let line_shape = Regex::new(TEXT_LINE_PATTERN).expect("text line pattern is valid");
        Self { config, line_shape }
    }

    /// Whether a single hit survives filtering. Text is trimmed first.
    pub fn accepts(&self, text: &str, confidence: f32) -> bool {
        let text = text.trim();
        if confidence < self.config.min_confidence {
            return false;
        }
        if text.chars().count() < self.config.min_chars {
            return false;
        }
        self.line_shape.is_match(text)
    }

    /// Keep the hits that look like meaningful text lines, in input order.
    pub fn filter(&self, raw: Vec<RawHit>) -> Vec<TextHit> {
        let total = raw.len();
        let kept: Vec<TextHit> = raw
            .into_iter()
            .filter(|hit| self.accepts(&hit.text, hit.confidence))
            .map(|hit| TextHit {
                text: hit.text.trim().to_string(),
                confidence: hit.confidence,
            })
            .collect();
        trace!(total, kept = kept.len(), "Hits filtered");
        kept
    }
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str, confidence: f32) -> RawHit {
        RawHit {
            region: [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)],
            text: text.into(),
            confidence,
        }
    }

    #[test]
    fn confidence_just_below_floor_is_dropped() {
        let filter = TextFilter::default();
        assert!(!filter.accepts("Invoice 42", 0.39));
    }

    #[test]
    fn confidence_at_floor_with_short_token_is_kept() {
        let filter = TextFilter::default();
        assert!(filter.accepts("A1", 0.4));
    }

    #[test]
    fn single_symbol_is_dropped_regardless_of_confidence() {
        let filter = TextFilter::default();
        assert!(!filter.accepts("*", 1.0));
        assert!(!filter.accepts("*", 0.4));
    }

    #[test]
    fn lines_must_start_with_uppercase_or_digit() {
        let filter = TextFilter::default();
        assert!(filter.accepts("Total: 12.50", 0.9));
        assert!(filter.accepts("2024-01-05 receipt", 0.9));
        assert!(!filter.accepts("lowercase start", 0.9));
        assert!(!filter.accepts("~~ noise", 0.9));
    }

    #[test]
    fn bullets_and_dashes_are_allowed() {
        let filter = TextFilter::default();
        assert!(filter.accepts("- Item one", 0.8));
        assert!(filter.accepts("• Item two", 0.8));
        assert!(filter.accepts("*Note (see above)", 0.8));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let filter = TextFilter::default();
        let kept = filter.filter(vec![hit("  Hello World  ", 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Hello World");
    }

    #[test]
    fn filter_preserves_order_and_drops_noise() {
        let filter = TextFilter::default();
        let kept = filter.filter(vec![
            hit("First line", 0.95),
            hit("|", 0.99),
            hit("Second line", 0.2),
            hit("Third line", 0.7),
        ]);
        let texts: Vec<&str> = kept.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["First line", "Third line"]);
    }
}
