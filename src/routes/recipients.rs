use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    response::{IntoResponse, Response},
};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{
    domain::{BatchOutcome, RejectReason, TransitionError},
    ingest::{CsvError, CsvUpload, IngestOutcome},
    session::{CampaignSession, SessionError},
    startup::AppState,
};

#[derive(Deserialize, Debug)]
pub struct RecipientData {
    email: String,
}

#[tracing::instrument(
    name = "Adding a recipient manually",
    skip(app_state),
    fields(recipient_email = %form.email)
)]
pub async fn add_recipient(
    State(app_state): State<Arc<AppState>>,
    Json(form): Json<RecipientData>,
) -> Result<impl IntoResponse, RecipientError> {
    let mut session = app_state.session.lock().await;
    session.add_recipient(&form.email)?;
    Ok(Json(session.snapshot()))
}

#[derive(Deserialize, Debug)]
pub struct BatchData {
    emails: Vec<String>,
}

#[tracing::instrument(
    name = "Adding a batch of recipients",
    skip(app_state, form),
    fields(candidates = form.emails.len())
)]
pub async fn add_recipients(
    State(app_state): State<Arc<AppState>>,
    Json(form): Json<BatchData>,
) -> Result<Json<BatchOutcome>, RecipientError> {
    let mut session = app_state.session.lock().await;
    let outcome = session.add_recipients(&form.emails)?;
    Ok(Json(outcome))
}

#[tracing::instrument(name = "Removing a recipient by position", skip(app_state))]
pub async fn remove_recipient(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, RecipientError> {
    let mut session = app_state.session.lock().await;
    session.remove_recipient(index)?;
    Ok(Json(session.snapshot()))
}

#[tracing::instrument(name = "Removing the last recipient", skip(app_state))]
pub async fn remove_last_recipient(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, RecipientError> {
    let mut session = app_state.session.lock().await;
    session.remove_last_recipient()?;
    Ok(Json(session.snapshot()))
}

#[derive(thiserror::Error, Debug)]
pub enum RecipientError {
    #[error("rejected recipient, {0}")]
    Rejected(RejectReason),
    #[error("illegal wizard transition, {0}")]
    Transition(#[from] TransitionError),
}

impl From<SessionError> for RecipientError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Rejected(reason) => Self::Rejected(reason),
            SessionError::Transition(transition) => Self::Transition(transition),
        }
    }
}

impl IntoResponse for RecipientError {
    fn into_response(self) -> Response {
        match self {
            RecipientError::Rejected(RejectReason::InvalidFormat) => {
                tracing::error!("{}", RejectReason::InvalidFormat);
                StatusCode::BAD_REQUEST
            }
            RecipientError::Rejected(RejectReason::Duplicate) => {
                tracing::error!("{}", RejectReason::Duplicate);
                StatusCode::CONFLICT
            }
            RecipientError::Transition(e) => {
                tracing::error!("{}", e);
                StatusCode::CONFLICT
            }
        }
        .into_response()
    }
}

#[tracing::instrument(name = "Importing recipients from a CSV upload", skip(app_state, multipart))]
pub async fn import_recipients(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ImportError> {
    // Register this upload first: any still-running ingest is superseded
    // the moment a newer file arrives.
    let ticket = app_state.ingester.begin();

    let field = multipart
        .next_field()
        .await?
        .ok_or(ImportError::MissingFile)?;
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let data = field.bytes().await?.to_vec();

    let outcome = app_state
        .ingester
        .run(ticket, CsvUpload { file_name, data })
        .await?;

    match outcome {
        IngestOutcome::Candidates(candidates) => {
            let mut session = app_state.session.lock().await;
            let batch = session.add_recipients(candidates)?;
            log_import(&batch, &session);
            Ok(Json(batch).into_response())
        }
        // A later upload owns the operator-visible result.
        IngestOutcome::Superseded => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

fn log_import(batch: &BatchOutcome, session: &CampaignSession) {
    tracing::info!(
        added = batch.added.len(),
        skipped = batch.skipped.len(),
        total = session.recipients().len(),
        "csv import applied"
    );
}

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("the upload did not contain a file field")]
    MissingFile,
    #[error("couldn't read the multipart upload, {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("illegal wizard transition, {0}")]
    Transition(#[from] TransitionError),
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        match self {
            // A join failure is a server-side fault, not an operator
            // mistake with the file.
            ImportError::Csv(CsvError::Processing) => {
                tracing::error!("{}", CsvError::Processing);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ImportError::MissingFile | ImportError::Multipart(_) | ImportError::Csv(_) => {
                tracing::error!("{}", self);
                StatusCode::BAD_REQUEST
            }
            ImportError::Transition(e) => {
                tracing::error!("{}", e);
                StatusCode::CONFLICT
            }
        }
        .into_response()
    }
}
