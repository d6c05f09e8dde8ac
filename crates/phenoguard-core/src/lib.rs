//! PhenoGuard Core Library
//!
//! Negation-aware phrase matching for Venous Thromboembolism (VTE) phenotype
//! extraction from radiology and clinical text.
//!
//! # Architecture
//!
//! ```text
//! Clinical text → Tokenize → Ontology Match → Negation Window → Aggregate
//!                                                                  │
//!                                   ┌──────────────────────────────┼──────────────┐
//!                                   ▼                              ▼              ▼
//!                              NO_MENTION                    POSITIVE_VTE   NEGATIVE_VTE
//!                                                                  │
//!                                                    [batch jobs: findings store]
//! ```
//!
//! # Core Principle
//!
//! **One non-negated mention makes the document positive.** There is no voting
//! between negated and non-negated mentions, and the confidence reported on a
//! positive finding is a fixed placeholder.
//!
//! # Modules
//!
//! - [`phenotype`]: Tokenizer, ontology matcher, negation detector, extractor
//! - [`models`]: Domain types (Finding, ClinicalNote, BatchJob, etc.)
//! - [`db`]: SQLite store for batch findings

pub mod db;
pub mod models;
pub mod phenotype;

// Re-export commonly used types
pub use db::{Database, DbError};
pub use models::{BatchJob, ClinicalNote, Finding, StoredFinding, VteStatus};
pub use phenotype::{
    ExtractorConfig, ExtractorError, NegationDetector, Ontology, PhraseMatch, RuleTokenizer,
    Tokenizer, VteExtractor,
};
