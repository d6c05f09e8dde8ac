//! Clinical note and batch job models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::finding::{Finding, VteStatus};

/// A clinical note submitted for phenotype extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalNote {
    /// Patient identifier from the source system
    pub patient_id: String,
    /// Encounter identifier from the source system
    pub encounter_id: String,
    /// Free text of the note (radiology report, discharge summary, ...)
    pub text_content: String,
    /// Arbitrary caller metadata, carried but never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ClinicalNote {
    pub fn new(
        patient_id: impl Into<String>,
        encounter_id: impl Into<String>,
        text_content: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            encounter_id: encounter_id.into(),
            text_content: text_content.into(),
            metadata: None,
        }
    }

    /// SHA-256 hex digest of the note text. Stored in place of the text itself.
    pub fn text_digest(&self) -> String {
        hex::encode(Sha256::digest(self.text_content.as_bytes()))
    }
}

/// A submitted batch of notes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchJob {
    /// Unique job ID
    pub job_id: String,
    /// Number of notes in the batch
    pub note_count: usize,
    /// Submission timestamp (RFC 3339)
    pub submitted_at: String,
    /// Completion timestamp, set once every note is stored
    pub completed_at: Option<String>,
    /// Failure timestamp, set if processing or storage failed
    #[serde(default)]
    pub failed_at: Option<String>,
}

impl BatchJob {
    /// Create a new job for `note_count` notes.
    pub fn new(note_count: usize) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            note_count,
            submitted_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            failed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failed_at.is_some()
    }

    /// Neither completed nor failed yet.
    pub fn is_pending(&self) -> bool {
        !self.is_complete() && !self.is_failed()
    }
}

/// A persisted finding for one note of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFinding {
    pub job_id: String,
    /// Position of the note in the submitted batch
    pub position: usize,
    pub patient_id: String,
    pub encounter_id: String,
    /// SHA-256 of the note text
    pub text_sha256: String,
    pub finding: Finding,
    pub processed_at: String,
}

impl StoredFinding {
    /// Build the stored form of a note's finding.
    pub fn new(job_id: &str, position: usize, note: &ClinicalNote, finding: Finding) -> Self {
        Self {
            job_id: job_id.to_string(),
            position,
            patient_id: note.patient_id.clone(),
            encounter_id: note.encounter_id.clone(),
            text_sha256: note.text_digest(),
            finding,
            processed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn status(&self) -> VteStatus {
        self.finding.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_deserializes_without_metadata() {
        let json = r#"{"patient_id":"P1","encounter_id":"E1","text_content":"No PE."}"#;
        let note: ClinicalNote = serde_json::from_str(json).unwrap();
        assert_eq!(note.patient_id, "P1");
        assert!(note.metadata.is_none());
    }

    #[test]
    fn test_text_digest_is_stable() {
        let a = ClinicalNote::new("P1", "E1", "Clot in left femoral vein.");
        let b = ClinicalNote::new("P2", "E9", "Clot in left femoral vein.");
        assert_eq!(a.text_digest(), b.text_digest());
        assert_eq!(a.text_digest().len(), 64);
        assert!(!a.text_digest().contains("Clot"));
    }

    #[test]
    fn test_new_batch_job_is_pending() {
        let job = BatchJob::new(3);
        assert_eq!(job.note_count, 3);
        assert!(!job.is_complete());
        assert!(!job.is_failed());
        assert!(job.is_pending());
        assert!(!job.job_id.is_empty());
    }

    #[test]
    fn test_failed_batch_job_is_not_pending() {
        let mut job = BatchJob::new(1);
        job.failed_at = Some(chrono::Utc::now().to_rfc3339());
        assert!(job.is_failed());
        assert!(!job.is_pending());
    }
}
