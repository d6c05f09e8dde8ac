//! VTE phenotype extraction.
//!
//! Pipeline: Tokenize → Ontology Match → Negation Check → Aggregate

mod negation;
mod ontology;
mod tokenizer;

pub use negation::*;
pub use ontology::*;
pub use tokenizer::*;

use rayon::prelude::*;
use thiserror::Error;

use crate::models::Finding;

/// Static confidence attached to positive findings.
pub const PLACEHOLDER_CONFIDENCE: f64 = 0.95;

/// Extractor errors.
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("NLP model not found: {0}")]
    ModelNotFound(String),
}

pub type ExtractorResult<T> = Result<T, ExtractorError>;

/// Extractor configuration. Fixed once the extractor is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Tokenizer model to load; falls back to [`GENERAL_MODEL`] if unknown
    pub model_name: String,
    /// Ontology phrases
    pub terms: Vec<String>,
    /// Negation trigger phrases
    pub negation_triggers: Vec<String>,
    /// Tokens scanned before each match
    pub negation_window: usize,
    /// Confidence reported on positive findings
    pub confidence: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model_name: SCI_MODEL.to_string(),
            terms: DEFAULT_VTE_TERMS.iter().map(|t| t.to_string()).collect(),
            negation_triggers: DEFAULT_NEGATION_TRIGGERS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            negation_window: DEFAULT_NEGATION_WINDOW,
            confidence: PLACEHOLDER_CONFIDENCE,
        }
    }
}

impl ExtractorConfig {
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_negation_window(mut self, window: usize) -> Self {
        self.negation_window = window;
        self
    }

    pub fn with_terms<S: AsRef<str>>(mut self, terms: &[S]) -> Self {
        self.terms = terms.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    /// Append triggers to the current list.
    pub fn with_extra_triggers<S: AsRef<str>>(mut self, triggers: &[S]) -> Self {
        self.negation_triggers
            .extend(triggers.iter().map(|t| t.as_ref().to_string()));
        self
    }
}

/// Negation-aware phrase extractor for Venous Thromboembolism.
///
/// Immutable after construction; share it behind an `Arc` across requests.
pub struct VteExtractor {
    tokenizer: Box<dyn Tokenizer>,
    ontology: Ontology,
    negation: NegationDetector,
    confidence: f64,
}

impl Default for VteExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl VteExtractor {
    /// Build an extractor, falling back to the general model if the configured
    /// one cannot be loaded.
    pub fn new(config: ExtractorConfig) -> Self {
        tracing::info!(model = %config.model_name, "Initializing NLP engine");
        match Self::try_new(config.clone()) {
            Ok(extractor) => extractor,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = GENERAL_MODEL,
                    "Model unavailable, falling back to general-purpose model"
                );
                Self::with_tokenizer(&config, Box::new(RuleTokenizer::general()))
            }
        }
    }

    /// Build an extractor, failing if the configured model cannot be loaded.
    pub fn try_new(config: ExtractorConfig) -> ExtractorResult<Self> {
        let tokenizer = RuleTokenizer::load(&config.model_name)?;
        Ok(Self::with_tokenizer(&config, Box::new(tokenizer)))
    }

    /// Build an extractor around any tokenizer.
    pub fn with_tokenizer(config: &ExtractorConfig, tokenizer: Box<dyn Tokenizer>) -> Self {
        let ontology = Ontology::new(&config.terms, &*tokenizer);
        let negation = NegationDetector::new(config.negation_window, &config.negation_triggers);
        tracing::info!(
            model = tokenizer.model_name(),
            terms = ontology.len(),
            window = negation.window(),
            "Loaded VTE ontology terms"
        );
        Self {
            tokenizer,
            ontology,
            negation,
            confidence: config.confidence,
        }
    }

    /// Model actually in use (the fallback if loading failed).
    pub fn model_name(&self) -> &str {
        self.tokenizer.model_name()
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn negation(&self) -> &NegationDetector {
        &self.negation
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> TokenizedText<'a> {
        self.tokenizer.tokenize(text)
    }

    /// Analyze one clinical text.
    pub fn analyze(&self, text: &str) -> Finding {
        let tokens = self.tokenizer.tokenize(text);
        self.analyze_tokens(&tokens)
    }

    /// Aggregate matches over an already tokenized text.
    ///
    /// A single non-negated match makes the whole document positive,
    /// however many negated mentions it also contains.
    pub fn analyze_tokens(&self, tokens: &TokenizedText<'_>) -> Finding {
        let matches = self.ontology.find_matches(tokens);
        if matches.is_empty() {
            return Finding::NoMention;
        }

        let mut evidence: Vec<String> = Vec::new();
        for m in &matches {
            let text = m.text(tokens);
            if let Some(trigger) = self.negation.trigger_for(m, tokens) {
                tracing::debug!(phrase = text, trigger, "Skipping negated mention");
                continue;
            }
            tracing::debug!(phrase = text, "Positive mention");
            if !evidence.iter().any(|e| e == text) {
                evidence.push(text.to_string());
            }
        }

        if evidence.is_empty() {
            Finding::negated_only()
        } else {
            Finding::PositiveVte {
                evidence,
                confidence: self.confidence,
            }
        }
    }

    /// Analyze many texts in parallel. Output order matches input order.
    pub fn process_many<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Finding> {
        texts
            .par_iter()
            .map(|text| self.analyze(text.as_ref()))
            .collect()
    }
}
