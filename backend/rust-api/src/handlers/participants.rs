use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    metrics::TRIALS_SERVED_TOTAL,
    models::{
        answer::SubmitAnswerRequest,
        NextTrialResponse, ParticipantId, ProgressSummary, StimulusInfo, TrialPlan,
    },
    services::{answer_service::AnswerRecorder, trial_service::TrialSequencer, AppState},
};

use super::ApiError;

async fn load_plan(
    state: Arc<AppState>,
    participant: ParticipantId,
) -> Result<TrialPlan, ApiError> {
    let plan = tokio::task::spawn_blocking(move || {
        TrialSequencer::new(&state.catalog, &state.result_log).remaining(&participant)
    })
    .await??;
    Ok(plan)
}

/// GET /api/v1/participants/{id}/trial
pub async fn next_trial(
    State(state): State<Arc<AppState>>,
    Path(participant): Path<String>,
) -> Result<Json<NextTrialResponse>, ApiError> {
    let participant = ParticipantId::parse(&participant)?;
    tracing::info!("Next trial requested: participant={}", participant);

    let plan = load_plan(state, participant.clone()).await?;
    if plan.total == 0 {
        return Err(ApiError::service_unavailable(
            "No eligible stimuli found in image source",
        ));
    }

    let participant_state = plan.state();
    TRIALS_SERVED_TOTAL
        .with_label_values(&[participant_state.as_str()])
        .inc();

    Ok(Json(NextTrialResponse {
        participant: participant.to_string(),
        stimulus: plan.next().map(|stimulus| StimulusInfo {
            image_file: stimulus.file_name.clone(),
            position: plan.done() + 1,
        }),
        done: plan.done(),
        total: plan.total,
        state: participant_state,
    }))
}

/// GET /api/v1/participants/{id}/progress
pub async fn progress(
    State(state): State<Arc<AppState>>,
    Path(participant): Path<String>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let participant = ParticipantId::parse(&participant)?;
    let plan = load_plan(state, participant).await?;
    Ok(Json(plan.summary()))
}

/// POST /api/v1/participants/{id}/answers
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(participant): Path<String>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = ParticipantId::parse(&participant)?;

    let response = tokio::task::spawn_blocking(move || {
        AnswerRecorder::new(
            &state.catalog,
            &state.vocabulary,
            &state.result_log,
            &state.participant_locks,
        )
        .record(&participant, &req.image_file, &req.selected_region)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(response)))
}
