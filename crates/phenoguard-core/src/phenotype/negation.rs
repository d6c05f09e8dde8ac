//! Windowed negation detection.
//!
//! A match is negated when any trigger phrase occurs as a substring of the
//! lowercased text of the N tokens immediately before it. The test is plain
//! substring containment, so "no" also fires inside "abnormal" or "nodule".

use super::ontology::PhraseMatch;
use super::tokenizer::TokenizedText;

/// Tokens scanned before each match.
pub const DEFAULT_NEGATION_WINDOW: usize = 6;

/// Minimum trigger set.
pub const DEFAULT_NEGATION_TRIGGERS: &[&str] = &[
    "no",
    "not",
    "negative for",
    "free of",
    "ruled out",
    "absence of",
    "no evidence of",
    "unlikely",
    "doubtful",
];

/// Negation detector with a fixed window and trigger list.
#[derive(Debug, Clone)]
pub struct NegationDetector {
    window: usize,
    triggers: Vec<String>,
}

impl Default for NegationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_NEGATION_WINDOW, DEFAULT_NEGATION_TRIGGERS)
    }
}

impl NegationDetector {
    /// Create a detector. Triggers are lowercased; blank triggers are dropped.
    pub fn new<S: AsRef<str>>(window: usize, triggers: &[S]) -> Self {
        let mut kept: Vec<String> = Vec::new();
        for trigger in triggers {
            let trigger = trigger.as_ref().to_lowercase();
            if !trigger.trim().is_empty() && !kept.contains(&trigger) {
                kept.push(trigger);
            }
        }
        Self {
            window,
            triggers: kept,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Original text of the window preceding `m`, clipped at the start of the text.
    pub fn window_text<'a>(&self, m: &PhraseMatch, tokens: &TokenizedText<'a>) -> &'a str {
        let start = m.start.saturating_sub(self.window);
        tokens.span_text(start, m.start)
    }

    /// First trigger found in the window, if any.
    pub fn trigger_for(&self, m: &PhraseMatch, tokens: &TokenizedText<'_>) -> Option<&str> {
        let window = self.window_text(m, tokens).to_lowercase();
        if window.is_empty() {
            return None;
        }
        self.triggers
            .iter()
            .find(|t| window.contains(t.as_str()))
            .map(String::as_str)
    }

    pub fn is_negated(&self, m: &PhraseMatch, tokens: &TokenizedText<'_>) -> bool {
        self.trigger_for(m, tokens).is_some()
    }
}
