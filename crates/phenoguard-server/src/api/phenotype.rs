//! Phenotype NLP service: single-note extraction and background batches.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use phenoguard_core::db::{Database, DbResult};
use phenoguard_core::models::{BatchJob, ClinicalNote, Finding, StoredFinding};
use phenoguard_core::phenotype::VteExtractor;

use super::error::{ApiError, PROCESSING_FAILED};

/// Shared state for the phenotype routes.
#[derive(Clone)]
pub struct PhenotypeState {
    extractor: Arc<VteExtractor>,
    db: Arc<Mutex<Database>>,
}

impl PhenotypeState {
    pub fn new(extractor: VteExtractor, db: Database) -> Self {
        Self {
            extractor: Arc::new(extractor),
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }

    /// Record a batch failure. A worker that panicked mid-transaction has
    /// already rolled back, so a poisoned lock is taken over.
    fn mark_failed(&self, job_id: &str) -> DbResult<()> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.fail_batch(job_id)
    }
}

/// Response for `POST /extract/vte`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeResponse {
    pub patient_id: String,
    pub has_vte: bool,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

impl PhenotypeResponse {
    pub fn from_finding(patient_id: String, finding: &Finding) -> Self {
        Self {
            patient_id,
            has_vte: finding.has_vte(),
            confidence: finding.confidence().unwrap_or(0.0),
            evidence: finding.evidence_phrases().to_vec(),
        }
    }
}

/// Response for `POST /batch/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAccepted {
    pub message: String,
    pub count: usize,
    pub job_id: String,
}

/// Response for `GET /batch/:job_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    #[serde(flatten)]
    pub job: BatchJob,
    /// Fixed failure message once the job has failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub findings: Vec<StoredFinding>,
}

impl BatchStatus {
    pub fn new(job: BatchJob, findings: Vec<StoredFinding>) -> Self {
        let error = job.is_failed().then(|| PROCESSING_FAILED.to_string());
        Self {
            job,
            error,
            findings,
        }
    }
}

/// Build the phenotype NLP router.
pub fn router(state: PhenotypeState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract/vte", post(extract_vte))
        .route("/batch/process", post(batch_process))
        .route("/batch/:job_id", get(batch_status))
        .with_state(state)
}

async fn health(State(state): State<PhenotypeState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model_version": state.extractor.model_name(),
    }))
}

async fn extract_vte(
    State(state): State<PhenotypeState>,
    Json(note): Json<ClinicalNote>,
) -> Result<Json<PhenotypeResponse>, ApiError> {
    tracing::info!(patient_id = %note.patient_id, "Processing note");

    let extractor = state.extractor.clone();
    let text = note.text_content;
    let finding = tokio::task::spawn_blocking(move || extractor.analyze(&text))
        .await
        .map_err(|e| ApiError::Processing(e.to_string()))?;

    Ok(Json(PhenotypeResponse::from_finding(note.patient_id, &finding)))
}

async fn batch_process(
    State(state): State<PhenotypeState>,
    Json(notes): Json<Vec<ClinicalNote>>,
) -> Result<(StatusCode, Json<BatchAccepted>), ApiError> {
    let job = BatchJob::new(notes.len());
    state.lock_db()?.insert_batch(&job)?;

    tracing::info!(job_id = %job.job_id, count = notes.len(), "Batch received");
    tokio::spawn(run_batch_job(state, job.job_id.clone(), notes));

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchAccepted {
            message: "Batch received".to_string(),
            count: job.note_count,
            job_id: job.job_id,
        }),
    ))
}

async fn batch_status(
    State(state): State<PhenotypeState>,
    Path(job_id): Path<String>,
) -> Result<Json<BatchStatus>, ApiError> {
    let db = state.lock_db()?;
    let job = db
        .get_batch(&job_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Batch {} not found", job_id)))?;
    let findings = db.list_findings_for_batch(&job_id)?;
    Ok(Json(BatchStatus::new(job, findings)))
}

async fn run_batch_job(state: PhenotypeState, job_id: String, notes: Vec<ClinicalNote>) {
    let worker_state = state.clone();
    let worker_job = job_id.clone();
    let result =
        tokio::task::spawn_blocking(move || process_batch(&worker_state, &worker_job, &notes))
            .await;

    match result {
        Ok(Ok(stored)) => {
            tracing::info!(job_id = %job_id, stored, "Batch job complete");
            return;
        }
        Ok(Err(e)) => tracing::error!(job_id = %job_id, error = %e, "Batch job failed"),
        Err(e) => tracing::error!(job_id = %job_id, error = %e, "Batch job aborted"),
    }

    if let Err(e) = state.mark_failed(&job_id) {
        tracing::error!(job_id = %job_id, error = %e, "Could not record batch failure");
    }
}

/// Extract findings for every note and store them under the job.
fn process_batch(
    state: &PhenotypeState,
    job_id: &str,
    notes: &[ClinicalNote],
) -> Result<usize, ApiError> {
    tracing::info!(job_id, count = notes.len(), "Starting batch job");

    let texts: Vec<&str> = notes.iter().map(|n| n.text_content.as_str()).collect();
    let findings = state.extractor.process_many(&texts);

    let stored: Vec<StoredFinding> = notes
        .iter()
        .zip(findings)
        .enumerate()
        .map(|(position, (note, finding))| StoredFinding::new(job_id, position, note, finding))
        .collect();

    let mut db = state.lock_db()?;
    db.insert_findings(&stored)?;
    db.complete_batch(job_id)?;
    Ok(stored.len())
}
