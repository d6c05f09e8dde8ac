//! Phenotype finding models emitted by the extractor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Evidence marker attached to documents whose every mention was negated.
pub const NEGATED_ONLY_EVIDENCE: &str = "Negated findings only";

/// Document-level VTE status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VteStatus {
    /// No ontology phrase occurs in the text
    NoMention,
    /// At least one non-negated ontology phrase
    PositiveVte,
    /// Ontology phrases occur but all of them are negated
    NegativeVte,
}

impl VteStatus {
    /// Wire form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            VteStatus::NoMention => "NO_MENTION",
            VteStatus::PositiveVte => "POSITIVE_VTE",
            VteStatus::NegativeVte => "NEGATIVE_VTE",
        }
    }

    /// Parse the wire form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NO_MENTION" => Some(VteStatus::NoMention),
            "POSITIVE_VTE" => Some(VteStatus::PositiveVte),
            "NEGATIVE_VTE" => Some(VteStatus::NegativeVte),
            _ => None,
        }
    }
}

impl fmt::Display for VteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated result for one clinical text.
///
/// Serialized as `{"status": "POSITIVE_VTE", "evidence": [...], "confidence": 0.95}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Finding {
    NoMention,
    PositiveVte {
        /// Distinct matched phrase texts, original casing, first appearance order
        evidence: Vec<String>,
        /// Static placeholder, not derived from the evidence
        confidence: f64,
    },
    NegativeVte {
        /// Always [`NEGATED_ONLY_EVIDENCE`]
        evidence: String,
    },
}

impl Finding {
    /// Finding for a document whose mentions were all negated.
    pub fn negated_only() -> Self {
        Finding::NegativeVte {
            evidence: NEGATED_ONLY_EVIDENCE.to_string(),
        }
    }

    pub fn status(&self) -> VteStatus {
        match self {
            Finding::NoMention => VteStatus::NoMention,
            Finding::PositiveVte { .. } => VteStatus::PositiveVte,
            Finding::NegativeVte { .. } => VteStatus::NegativeVte,
        }
    }

    /// True only for a positive finding.
    pub fn has_vte(&self) -> bool {
        matches!(self, Finding::PositiveVte { .. })
    }

    /// Confidence score, present only on positive findings.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            Finding::PositiveVte { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }

    /// Positive evidence phrases; empty for non-positive findings.
    pub fn evidence_phrases(&self) -> &[String] {
        match self {
            Finding::PositiveVte { evidence, .. } => evidence,
            _ => &[],
        }
    }
}
