//! Batch job and finding database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{BatchJob, Finding, StoredFinding};

impl Database {
    /// Record a newly submitted batch.
    pub fn insert_batch(&self, job: &BatchJob) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO batch_jobs (job_id, note_count, submitted_at, completed_at, failed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                job.job_id,
                job.note_count as i64,
                job.submitted_at,
                job.completed_at,
                job.failed_at,
            ],
        )?;
        Ok(())
    }

    /// Mark a batch as complete.
    pub fn complete_batch(&self, job_id: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE batch_jobs SET completed_at = ?2 WHERE job_id = ?1",
            params![job_id, chrono::Utc::now().to_rfc3339()],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("batch {}", job_id)));
        }
        Ok(())
    }

    /// Mark a batch as failed. Findings already stored are left in place.
    pub fn fail_batch(&self, job_id: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE batch_jobs SET failed_at = ?2 WHERE job_id = ?1",
            params![job_id, chrono::Utc::now().to_rfc3339()],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("batch {}", job_id)));
        }
        Ok(())
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, job_id: &str) -> DbResult<Option<BatchJob>> {
        let job = self
            .conn
            .query_row(
                r#"
                SELECT job_id, note_count, submitted_at, completed_at, failed_at
                FROM batch_jobs
                WHERE job_id = ?
                "#,
                [job_id],
                |row| {
                    Ok(BatchJob {
                        job_id: row.get(0)?,
                        note_count: row.get::<_, i64>(1)? as usize,
                        submitted_at: row.get(2)?,
                        completed_at: row.get(3)?,
                        failed_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(job)
    }

    /// Insert one finding.
    pub fn insert_finding(&self, finding: &StoredFinding) -> DbResult<()> {
        insert_finding_row(&self.conn, finding)
    }

    /// Insert all findings of a batch atomically.
    pub fn insert_findings(&mut self, findings: &[StoredFinding]) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        for finding in findings {
            insert_finding_row(&tx, finding)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Findings of a batch, in submission order.
    pub fn list_findings_for_batch(&self, job_id: &str) -> DbResult<Vec<StoredFinding>> {
        self.query_findings(
            r#"
            SELECT job_id, position, patient_id, encounter_id,
                   text_sha256, finding, processed_at
            FROM findings
            WHERE job_id = ?
            ORDER BY position ASC
            "#,
            job_id,
        )
    }

    /// Findings for a patient across all batches, newest first.
    pub fn list_findings_for_patient(&self, patient_id: &str) -> DbResult<Vec<StoredFinding>> {
        self.query_findings(
            r#"
            SELECT job_id, position, patient_id, encounter_id,
                   text_sha256, finding, processed_at
            FROM findings
            WHERE patient_id = ?
            ORDER BY processed_at DESC, job_id, position
            "#,
            patient_id,
        )
    }

    fn query_findings(&self, sql: &str, key: &str) -> DbResult<Vec<StoredFinding>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([key], |row| {
            Ok(FindingRow {
                job_id: row.get(0)?,
                position: row.get(1)?,
                patient_id: row.get(2)?,
                encounter_id: row.get(3)?,
                text_sha256: row.get(4)?,
                finding: row.get(5)?,
                processed_at: row.get(6)?,
            })
        })?;

        let mut findings = Vec::new();
        for row in rows {
            findings.push(row?.try_into()?);
        }
        Ok(findings)
    }
}

fn insert_finding_row(conn: &rusqlite::Connection, finding: &StoredFinding) -> DbResult<()> {
    let finding_json = serde_json::to_string(&finding.finding)?;
    conn.execute(
        r#"
        INSERT INTO findings (
            job_id, position, patient_id, encounter_id,
            text_sha256, status, finding, processed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            finding.job_id,
            finding.position as i64,
            finding.patient_id,
            finding.encounter_id,
            finding.text_sha256,
            finding.status().as_str(),
            finding_json,
            finding.processed_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct FindingRow {
    job_id: String,
    position: i64,
    patient_id: String,
    encounter_id: String,
    text_sha256: String,
    finding: String,
    processed_at: String,
}

impl TryFrom<FindingRow> for StoredFinding {
    type Error = DbError;

    fn try_from(row: FindingRow) -> Result<Self, Self::Error> {
        let finding: Finding = serde_json::from_str(&row.finding)?;
        Ok(StoredFinding {
            job_id: row.job_id,
            position: row.position as usize,
            patient_id: row.patient_id,
            encounter_id: row.encounter_id,
            text_sha256: row.text_sha256,
            finding,
            processed_at: row.processed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClinicalNote, VteStatus};

    fn stored(job: &BatchJob, position: usize, finding: Finding) -> StoredFinding {
        let note = ClinicalNote::new(
            format!("patient-{}", position),
            format!("enc-{}", position),
            format!("Report text {}", position),
        );
        StoredFinding::new(&job.job_id, position, &note, finding)
    }

    #[test]
    fn test_insert_and_get_batch() {
        let db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(2);
        db.insert_batch(&job).unwrap();

        let retrieved = db.get_batch(&job.job_id).unwrap().unwrap();
        assert_eq!(retrieved, job);
        assert!(!retrieved.is_complete());

        db.complete_batch(&job.job_id).unwrap();
        assert!(db.get_batch(&job.job_id).unwrap().unwrap().is_complete());
    }

    #[test]
    fn test_get_missing_batch() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_batch("nope").unwrap().is_none());
        assert!(matches!(db.complete_batch("nope"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_fail_batch() {
        let db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(1);
        db.insert_batch(&job).unwrap();

        db.fail_batch(&job.job_id).unwrap();
        let failed = db.get_batch(&job.job_id).unwrap().unwrap();
        assert!(failed.is_failed());
        assert!(!failed.is_complete());
        assert!(matches!(db.fail_batch("nope"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_findings_round_trip_in_order() {
        let mut db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(3);
        db.insert_batch(&job).unwrap();

        let findings = vec![
            stored(&job, 2, Finding::NoMention),
            stored(&job, 0, Finding::PositiveVte {
                evidence: vec!["DVT".into()],
                confidence: 0.95,
            }),
            stored(&job, 1, Finding::negated_only()),
        ];
        db.insert_findings(&findings).unwrap();

        let listed = db.list_findings_for_batch(&job.job_id).unwrap();
        let statuses: Vec<VteStatus> = listed.iter().map(|f| f.status()).collect();
        assert_eq!(
            statuses,
            vec![
                VteStatus::PositiveVte,
                VteStatus::NegativeVte,
                VteStatus::NoMention
            ]
        );
        assert_eq!(listed[0].finding.evidence_phrases(), &["DVT".to_string()]);
    }

    #[test]
    fn test_findings_require_existing_batch() {
        let db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(1);
        let result = db.insert_finding(&stored(&job, 0, Finding::NoMention));
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_list_findings_for_patient() {
        let db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(2);
        db.insert_batch(&job).unwrap();
        db.insert_finding(&stored(&job, 0, Finding::NoMention)).unwrap();
        db.insert_finding(&stored(&job, 1, Finding::negated_only())).unwrap();

        let for_patient = db.list_findings_for_patient("patient-1").unwrap();
        assert_eq!(for_patient.len(), 1);
        assert_eq!(for_patient[0].encounter_id, "enc-1");
    }

    #[test]
    fn test_patient_findings_with_equal_timestamps_are_ordered() {
        let db = Database::open_in_memory().unwrap();
        let job = BatchJob::new(3);
        db.insert_batch(&job).unwrap();

        let note = ClinicalNote::new("patient-7", "enc-7", "Report text");
        for position in [2, 0, 1] {
            let mut finding = StoredFinding::new(&job.job_id, position, &note, Finding::NoMention);
            finding.processed_at = "2024-01-01T00:00:00+00:00".to_string();
            db.insert_finding(&finding).unwrap();
        }

        let positions: Vec<usize> = db
            .list_findings_for_patient("patient-7")
            .unwrap()
            .iter()
            .map(|f| f.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }
}
