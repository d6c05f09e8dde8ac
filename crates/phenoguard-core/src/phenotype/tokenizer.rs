//! Rule-based tokenizer.
//!
//! Splits on whitespace, then peels leading/trailing punctuation off each
//! chunk into single-character tokens. A `/` between words is its own token,
//! so "PE/DVT" yields three tokens. Hyphens, digits and apostrophes inside a
//! word are kept ("non-occlusive", "3.5", "patient's").

use super::{ExtractorError, ExtractorResult};

/// Preferred model: scientific/biomedical vocabulary.
pub const SCI_MODEL: &str = "en_core_sci_md";

/// General-purpose fallback model.
pub const GENERAL_MODEL: &str = "en_core_web_sm";

/// Models the rule tokenizer can stand in for.
pub const KNOWN_MODELS: &[&str] = &[SCI_MODEL, GENERAL_MODEL];

/// Tokenizer seam. Implementations must be shareable across threads.
pub trait Tokenizer: Send + Sync {
    /// Name of the loaded model.
    fn model_name(&self) -> &str;

    /// Tokenize `text`. Offsets in the result index into `text`.
    fn tokenize<'a>(&self, text: &'a str) -> TokenizedText<'a>;
}

/// A single token with byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Lowercased token text
    pub lower: String,
}

/// Token sequence borrowing its source text.
#[derive(Debug, Clone)]
pub struct TokenizedText<'a> {
    source: &'a str,
    tokens: Vec<Token>,
}

impl<'a> TokenizedText<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self { source, tokens }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Lowercased text of token `idx`.
    pub fn lower(&self, idx: usize) -> Option<&str> {
        self.tokens.get(idx).map(|t| t.lower.as_str())
    }

    /// Original text of token `idx`.
    pub fn token_text(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).map(|t| &self.source[t.start..t.end])
    }

    /// Original text covering tokens `[start, end)`, interior whitespace included.
    ///
    /// Out-of-range bounds are clipped; an empty range yields `""`.
    pub fn span_text(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.tokens.len());
        if start >= end {
            return "";
        }
        let from = self.tokens[start].start;
        let to = self.tokens[end - 1].end;
        &self.source[from..to]
    }
}

/// Deterministic whitespace/punctuation tokenizer.
#[derive(Debug, Clone)]
pub struct RuleTokenizer {
    model: String,
}

impl RuleTokenizer {
    /// Load the tokenizer for a named model.
    pub fn load(model_name: &str) -> ExtractorResult<Self> {
        if KNOWN_MODELS.contains(&model_name) {
            Ok(Self {
                model: model_name.to_string(),
            })
        } else {
            Err(ExtractorError::ModelNotFound(model_name.to_string()))
        }
    }

    /// The general-purpose model. Always available.
    pub fn general() -> Self {
        Self {
            model: GENERAL_MODEL.to_string(),
        }
    }
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self {
            model: SCI_MODEL.to_string(),
        }
    }
}

impl Tokenizer for RuleTokenizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn tokenize<'a>(&self, text: &'a str) -> TokenizedText<'a> {
        let mut tokens = Vec::new();
        let mut chunk_start = None;

        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(start) = chunk_start.take() {
                    split_chunk(text, start, idx, &mut tokens);
                }
            } else if chunk_start.is_none() {
                chunk_start = Some(idx);
            }
        }
        if let Some(start) = chunk_start {
            split_chunk(text, start, text.len(), &mut tokens);
        }

        TokenizedText::new(text, tokens)
    }
}

fn is_prefix_punct(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{' | '"' | '\'' | '“' | '‘')
}

fn is_suffix_punct(ch: char) -> bool {
    matches!(
        ch,
        '.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '}' | '"' | '\'' | '”' | '’'
    )
}

fn push_token(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    tokens.push(Token {
        start,
        end,
        lower: text[start..end].to_lowercase(),
    });
}

/// Split one whitespace-free chunk `text[start..end]` into tokens.
fn split_chunk(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    let mut lo = start;
    while let Some(ch) = text[lo..end].chars().next() {
        if !is_prefix_punct(ch) {
            break;
        }
        push_token(text, lo, lo + ch.len_utf8(), tokens);
        lo += ch.len_utf8();
    }

    let mut hi = end;
    let mut suffixes = Vec::new();
    while let Some(ch) = text[lo..hi].chars().next_back() {
        if !is_suffix_punct(ch) {
            break;
        }
        hi -= ch.len_utf8();
        suffixes.push((hi, hi + ch.len_utf8()));
    }

    if lo < hi {
        split_infixes(text, lo, hi, tokens);
    }
    for (s, e) in suffixes.into_iter().rev() {
        push_token(text, s, e, tokens);
    }
}

/// Emit the core of a chunk, splitting on `/`.
fn split_infixes(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    let mut piece_start = start;
    for (offset, ch) in text[start..end].char_indices() {
        if ch == '/' {
            let slash = start + offset;
            if piece_start < slash {
                push_token(text, piece_start, slash, tokens);
            }
            push_token(text, slash, slash + 1, tokens);
            piece_start = slash + 1;
        }
    }
    if piece_start < end {
        push_token(text, piece_start, end, tokens);
    }
}
