//! SQLite schema definition.

/// Complete database schema for batch findings.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Batch Jobs
-- ============================================================================

CREATE TABLE IF NOT EXISTS batch_jobs (
    job_id TEXT PRIMARY KEY,
    note_count INTEGER NOT NULL,
    submitted_at TEXT NOT NULL,
    completed_at TEXT,                           -- NULL while processing
    failed_at TEXT                               -- set when processing failed
);

-- ============================================================================
-- Findings (one row per note; raw note text is never stored)
-- ============================================================================

CREATE TABLE IF NOT EXISTS findings (
    job_id TEXT NOT NULL REFERENCES batch_jobs(job_id),
    position INTEGER NOT NULL,                   -- index of the note in the batch
    patient_id TEXT NOT NULL,
    encounter_id TEXT NOT NULL,
    text_sha256 TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('NO_MENTION', 'POSITIVE_VTE', 'NEGATIVE_VTE')),
    finding TEXT NOT NULL,                       -- JSON Finding
    processed_at TEXT NOT NULL,
    PRIMARY KEY (job_id, position)
);

CREATE INDEX IF NOT EXISTS idx_findings_patient ON findings(patient_id);
CREATE INDEX IF NOT EXISTS idx_findings_status ON findings(status);
"#;
