//! Phrase ontology and exact multi-token matcher.

use std::collections::HashMap;

use super::tokenizer::{Tokenizer, TokenizedText};

/// VTE concepts matched by default.
pub const DEFAULT_VTE_TERMS: &[&str] = &[
    "pulmonary embolism",
    "pe",
    "dvt",
    "deep vein thrombosis",
    "thrombus",
    "clot",
    "embolus",
    "venous thrombosis",
    "filling defect",
];

/// A matched ontology phrase: token span `[start, end)` plus the term index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    pub start: usize,
    pub end: usize,
    /// Index into [`Ontology::terms`]
    pub term: usize,
}

impl PhraseMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Matched text as written in the source.
    pub fn text<'a>(&self, tokens: &TokenizedText<'a>) -> &'a str {
        tokens.span_text(self.start, self.end)
    }
}

/// Fixed ordered list of lowercase phrases, tokenized once at construction.
#[derive(Debug, Clone)]
pub struct Ontology {
    terms: Vec<String>,
    patterns: Vec<Vec<String>>,
    /// First token → pattern indices
    by_first_token: HashMap<String, Vec<usize>>,
}

impl Ontology {
    /// Build an ontology, tokenizing each phrase with `tokenizer`.
    ///
    /// Phrases are lowercased; blank phrases and duplicates are dropped.
    pub fn new<S: AsRef<str>>(terms: &[S], tokenizer: &dyn Tokenizer) -> Self {
        let mut kept = Vec::new();
        let mut patterns = Vec::new();
        let mut by_first_token: HashMap<String, Vec<usize>> = HashMap::new();

        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() || kept.contains(&term) {
                continue;
            }
            let pattern: Vec<String> = tokenizer
                .tokenize(&term)
                .tokens()
                .iter()
                .map(|t| t.lower.clone())
                .collect();
            let Some(first) = pattern.first() else {
                continue;
            };
            by_first_token
                .entry(first.clone())
                .or_default()
                .push(patterns.len());
            kept.push(term);
            patterns.push(pattern);
        }

        Self {
            terms: kept,
            patterns,
            by_first_token,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, idx: usize) -> Option<&str> {
        self.terms.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All non-overlapping phrase occurrences, left to right.
    ///
    /// When several phrases start at the same token the longest wins; ties go
    /// to the earlier term. Scanning resumes after the chosen match.
    pub fn find_matches(&self, tokens: &TokenizedText<'_>) -> Vec<PhraseMatch> {
        let mut matches = Vec::new();
        let n = tokens.len();
        let mut i = 0;

        while i < n {
            match self.longest_at(tokens, i) {
                Some(found) => {
                    i = found.end;
                    matches.push(found);
                }
                None => i += 1,
            }
        }

        matches
    }

    fn longest_at(&self, tokens: &TokenizedText<'_>, start: usize) -> Option<PhraseMatch> {
        let first = tokens.lower(start)?;
        let candidates = self.by_first_token.get(first)?;

        let mut best: Option<PhraseMatch> = None;
        for &idx in candidates {
            let pattern = &self.patterns[idx];
            let end = start + pattern.len();
            if end > tokens.len() {
                continue;
            }
            let hit = pattern
                .iter()
                .enumerate()
                .all(|(k, word)| tokens.lower(start + k) == Some(word.as_str()));
            if hit && best.map_or(true, |b| pattern.len() > b.len()) {
                best = Some(PhraseMatch {
                    start,
                    end,
                    term: idx,
                });
            }
        }
        best
    }
}
