// crates/server/src/routes/jobs.rs
//! API routes for uploading files and controlling their jobs.
//!
//! - POST /upload    - Store a CSV file and start a job for it
//! - POST /status    - Current status of a job
//! - POST /pause     - Pause a running job
//! - POST /resume    - Resume a paused job
//! - POST /terminate - Kill a running or paused job
//! - GET  /jobs        - Snapshots of all jobs
//! - GET  /jobs/stream - SSE stream of job snapshots

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::FormRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use pipeline_core::CsvFileSource;
use pipeline_jobs::{Job, JobSnapshot, JobStatus};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, Envelope, MessageData};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Form body naming a job.
#[derive(Debug, Default, Deserialize)]
pub struct JobIdForm {
    #[serde(default)]
    pub id: Option<String>,
}

/// Data of a successful POST /upload.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct UploadData {
    pub id: String,
}

/// Data of a successful POST /status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct StatusData {
    pub status: JobStatus,
    pub processed: u64,
    /// Why the job stopped, present only for `got-error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobSnapshot> for StatusData {
    fn from(snapshot: JobSnapshot) -> Self {
        Self {
            status: snapshot.status,
            processed: snapshot.processed,
            error: snapshot.error,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload - Store the multipart `file` field and start processing it.
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Envelope<UploadData>>> {
    let mut multipart = multipart.map_err(|_| file_required())?;

    let (filename, contents) = loop {
        let Some(field) = multipart.next_field().await.map_err(upload_error)? else {
            return Err(file_required());
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let contents = field.bytes().await.map_err(upload_error)?;
        break (filename, contents);
    };

    let id = uuid::Uuid::new_v4().to_string();
    let path = state
        .uploads
        .save(&id, filename.as_deref(), &contents)
        .await?;

    let job = Job::new(
        id.clone(),
        CsvFileSource::new(path),
        Arc::clone(&state.processor),
    );
    state.registry.insert(Arc::clone(&job))?;
    job.run();

    tracing::info!(
        job_id = %id,
        filename = filename.as_deref().unwrap_or_default(),
        bytes = contents.len(),
        "file uploaded"
    );
    Ok(Json(Envelope::success(UploadData { id })))
}

/// POST /status - Status, progress and error of a job.
async fn status(
    State(state): State<Arc<AppState>>,
    form: Result<Form<JobIdForm>, FormRejection>,
) -> ApiResult<Json<Envelope<StatusData>>> {
    let job = job_from_form(&state, form)?;
    Ok(Json(Envelope::success(job.snapshot().into())))
}

/// POST /pause - Blocks until the worker has parked.
async fn pause(
    State(state): State<Arc<AppState>>,
    form: Result<Form<JobIdForm>, FormRejection>,
) -> ApiResult<Json<Envelope<MessageData>>> {
    let job = job_from_form(&state, form)?;
    job.pause().await;
    Ok(Json(Envelope::success(MessageData::new("task paused"))))
}

/// POST /resume - Blocks until the worker has picked up the resume.
async fn resume(
    State(state): State<Arc<AppState>>,
    form: Result<Form<JobIdForm>, FormRejection>,
) -> ApiResult<Json<Envelope<MessageData>>> {
    let job = job_from_form(&state, form)?;
    job.resume().await;
    Ok(Json(Envelope::success(MessageData::new("task resumed"))))
}

/// POST /terminate - Blocks until the worker has stopped.
async fn terminate(
    State(state): State<Arc<AppState>>,
    form: Result<Form<JobIdForm>, FormRejection>,
) -> ApiResult<Json<Envelope<MessageData>>> {
    let job = job_from_form(&state, form)?;
    job.terminate().await;
    Ok(Json(Envelope::success(MessageData::new("task terminated"))))
}

/// GET /jobs - Snapshots of every job, oldest first.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Envelope<Vec<JobSnapshot>>> {
    Json(Envelope::success(state.registry.snapshots()))
}

/// GET /jobs/stream - SSE stream of all job snapshots.
async fn stream_jobs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.registry.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(snapshot) => match Event::default().event("job").json_data(&snapshot) {
                    Ok(event) => {
                        yield Ok(event);
                    }
                    Err(e) => {
                        tracing::error!(job_id = %snapshot.id, error = %e, "failed to encode job event");
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "job stream subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ============================================================================
// Helpers
// ============================================================================

fn job_from_form(
    state: &AppState,
    form: Result<Form<JobIdForm>, FormRejection>,
) -> ApiResult<Arc<Job>> {
    let id = form
        .ok()
        .and_then(|Form(form)| form.id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("id is required".to_string()))?;

    state
        .registry
        .lookup(&id)
        .ok_or_else(|| ApiError::BadRequest("invalid task id".to_string()))
}

fn file_required() -> ApiError {
    ApiError::BadRequest("file is required".to_string())
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        tracing::debug!(error = %err, "unreadable multipart body");
        file_required()
    }
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload))
        .route("/status", post(status))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/terminate", post(terminate))
        .route("/jobs", get(list_jobs))
        .route("/jobs/stream", get(stream_jobs))
}
