//! API Handlers
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use formgate_core::{StaticIdentity, SubmissionPayload};
use formgate_engine::Outcome;
use serde_json::{json, Value};
use std::sync::Arc;

/// Header carrying the authenticated submitter, set by the fronting proxy.
pub const SUBMITTER_HEADER: &str = "x-submitter";

fn identity(headers: &HeaderMap) -> StaticIdentity {
    let submitter = headers
        .get(SUBMITTER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);
    StaticIdentity(submitter)
}

fn status_of(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::NotSubmitted { .. } | Outcome::Completed { .. } => StatusCode::OK,
        Outcome::BlockedByProblems { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::BlockedBySetup { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": formgate_core::FORMGATE_VERSION,
            "forms": state.forms.keys().collect::<Vec<_>>(),
        })),
    )
}

/// Setup report and initial field states of a form.
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let hosted = state.forms.get(&id).ok_or_else(|| ApiError::FormNotFound(id.clone()))?;
    let identity = identity(&headers);
    let collaborators = state.collaborators(hosted, &identity);
    let ctx = hosted.form.context(&identity);

    let setup = hosted.form.setup_report(&collaborators);
    let fields = if setup.is_empty() {
        hosted.form.initial_states(&ctx, &state.environment)
    } else {
        Vec::new()
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "identifier": id,
            "operable": setup.is_empty(),
            "setup": setup,
            "fields": fields,
        })),
    ))
}

/// Process a submission. The body is the request data: the form's values
/// live under its identifier; a body without that key is not a submission.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = identity(&headers);

    let worker = state.clone();
    let form_id = id.clone();
    let (trace_id, outcome) = tokio::task::spawn_blocking(move || {
        let hosted = worker.forms.get(&form_id)?;
        let payload = SubmissionPayload::from_request(&body, &form_id);
        let ctx = hosted.form.context(&identity);
        let collaborators = worker.collaborators(hosted, &identity);
        let outcome = hosted.form.process(payload.as_ref(), &ctx, &collaborators);
        Some((ctx.trace_id, outcome))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .ok_or_else(|| ApiError::FormNotFound(id.clone()))?;

    state.metrics.record_outcome(&id, outcome.state_name());
    if let Some(channels) = outcome.channels() {
        for (channel, _) in channels.failures() {
            state.metrics.record_delivery_failure(&id, channel);
        }
    }

    let mut response = serde_json::to_value(&outcome).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Value::Object(map) = &mut response {
        map.insert("trace_id".to_string(), Value::String(trace_id));
    }
    Ok((status_of(&outcome), Json(response)))
}

pub async fn audit_stats(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!(state.audit.stats())))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state.metrics.encode().map_err(|e| ApiError::Internal(e.to_string()))
}
