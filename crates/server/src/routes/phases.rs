use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use heist_core::{DistractionRequest, HitRequest, PhaseSnapshot, StartAck};

use crate::error::AppError;
use crate::state::CrewState;

#[utoipa::path(
    post,
    path = "/api/phases/distraction",
    request_body = DistractionRequest,
    responses(
        (status = 202, description = "Distraction started", body = StartAck),
        (status = 409, description = "A phase is already in progress"),
    ),
    tag = "phases"
)]
pub async fn start_distraction(
    State(state): State<CrewState>,
    Json(payload): Json<DistractionRequest>,
) -> Result<(StatusCode, Json<StartAck>), AppError> {
    let ack = state.engine.start_distraction(payload.turns_needed).await?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

#[utoipa::path(
    post,
    path = "/api/phases/hit",
    request_body = HitRequest,
    responses(
        (status = 202, description = "Hit started", body = StartAck),
        (status = 409, description = "A phase is already in progress"),
    ),
    tag = "phases"
)]
pub async fn start_hit(
    State(state): State<CrewState>,
    Json(payload): Json<HitRequest>,
) -> Result<(StatusCode, Json<StartAck>), AppError> {
    let ack = state
        .engine
        .start_hit(payload.turns_needed, payload.loot)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

#[utoipa::path(
    get,
    path = "/api/phases/status",
    responses(
        (status = 200, description = "Current phase record", body = PhaseSnapshot),
    ),
    tag = "phases"
)]
pub async fn phase_status(State(state): State<CrewState>) -> Json<PhaseSnapshot> {
    Json(state.engine.check_status())
}
