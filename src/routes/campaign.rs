use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    configuration::InterfaceSettings,
    domain::{AcquisitionMethod, TransitionError},
    session::CampaignSnapshot,
    startup::AppState,
};

/// The session snapshot plus the interface preferences, so a rendering
/// client can bootstrap itself from a single request.
#[derive(Serialize)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: CampaignSnapshot,
    pub interface: InterfaceSettings,
}

#[tracing::instrument(name = "Fetching the campaign snapshot", skip(app_state))]
pub async fn campaign_snapshot(State(app_state): State<Arc<AppState>>) -> Json<CampaignView> {
    let session = app_state.session.lock().await;
    Json(CampaignView {
        campaign: session.snapshot(),
        interface: app_state.interface,
    })
}

#[derive(Deserialize, Debug)]
pub struct MethodData {
    method: AcquisitionMethod,
}

#[tracing::instrument(
    name = "Selecting a recipient acquisition method",
    skip(app_state),
    fields(method = ?form.method)
)]
pub async fn select_method(
    State(app_state): State<Arc<AppState>>,
    Json(form): Json<MethodData>,
) -> Result<Json<CampaignSnapshot>, CampaignError> {
    let mut session = app_state.session.lock().await;
    session.select_method(form.method)?;
    Ok(Json(session.snapshot()))
}

#[tracing::instrument(name = "Stepping back in the wizard", skip(app_state))]
pub async fn step_back(State(app_state): State<Arc<AppState>>) -> Json<CampaignSnapshot> {
    let mut session = app_state.session.lock().await;
    session.back();
    Json(session.snapshot())
}

#[tracing::instrument(name = "Advancing to composition", skip(app_state))]
pub async fn advance(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CampaignSnapshot>, CampaignError> {
    let mut session = app_state.session.lock().await;
    session.advance()?;
    Ok(Json(session.snapshot()))
}

#[derive(Deserialize, Debug)]
pub struct ContentData {
    content: String,
}

#[tracing::instrument(name = "Replacing the composed content", skip(app_state, form))]
pub async fn set_content(
    State(app_state): State<Arc<AppState>>,
    Json(form): Json<ContentData>,
) -> Json<CampaignSnapshot> {
    let mut session = app_state.session.lock().await;
    session.set_content(form.content);
    Json(session.snapshot())
}

#[tracing::instrument(name = "Submitting the campaign", skip(app_state))]
pub async fn submit_campaign(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CampaignSnapshot>, CampaignError> {
    // Snapshot the payload without holding the session lock across the
    // dispatch call.
    let payload = {
        let session = app_state.session.lock().await;
        if !session.is_composing() {
            return Err(TransitionError::WrongStep(session.step()).into());
        }
        session.build_payload()
    };

    // Single in-flight submission: a second trigger is rejected, never
    // queued, so the backend cannot receive a duplicate payload.
    if app_state
        .dispatch_in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(CampaignError::SubmissionInFlight);
    }
    // The flag must be released on every exit path, including this future
    // being dropped mid-dispatch when the operator's client goes away.
    let _in_flight = InFlightGuard(&app_state.dispatch_in_flight);

    let outcome = app_state.dispatch_client.send_campaign(&payload).await;

    // On failure the session is left untouched so the operator can retry
    // without re-entering anything.
    outcome?;

    let mut session = app_state.session.lock().await;
    session.submit_succeeded()?;
    Ok(Json(session.snapshot()))
}

/// Clears the in-flight flag when dropped, so a cancelled submission
/// cannot leave the gate stuck shut.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CampaignError {
    #[error("illegal wizard transition, {0}")]
    Transition(#[from] TransitionError),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("couldn't reach the delivery backend, reqwest error {0}")]
    Dispatch(#[from] reqwest::Error),
}

impl IntoResponse for CampaignError {
    fn into_response(self) -> Response {
        match self {
            CampaignError::Transition(e) => {
                tracing::error!("{}", e);
                StatusCode::CONFLICT
            }
            CampaignError::SubmissionInFlight => {
                tracing::warn!("submission rejected while another is in flight");
                StatusCode::CONFLICT
            }
            CampaignError::Dispatch(e) => {
                tracing::error!("{}", e);
                StatusCode::BAD_GATEWAY
            }
        }
        .into_response()
    }
}
