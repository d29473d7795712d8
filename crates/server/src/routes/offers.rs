use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use heist_core::{Ack, CutDetails, DecisionRequest, ProposeResponse};

use crate::state::LesterState;

#[utoipa::path(
    post,
    path = "/api/offers/propose",
    responses(
        (status = 200, description = "Next offer, null when the round was missed", body = ProposeResponse)
    ),
    tag = "offers"
)]
pub async fn propose_offer(State(state): State<LesterState>) -> Json<ProposeResponse> {
    let offer = state.service.propose_offer().await;
    Json(ProposeResponse { offer })
}

#[utoipa::path(
    post,
    path = "/api/offers/decision",
    request_body = DecisionRequest,
    responses(
        (status = 204, description = "Decision recorded")
    ),
    tag = "offers"
)]
pub async fn record_decision(
    State(state): State<LesterState>,
    Json(payload): Json<DecisionRequest>,
) -> StatusCode {
    state.service.record_decision(payload.accepted);
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/api/settlement/verify",
    request_body = CutDetails,
    responses(
        (status = 200, description = "Lester's verdict on his cut", body = Ack)
    ),
    tag = "settlement"
)]
pub async fn verify_settlement(
    State(state): State<LesterState>,
    Json(payload): Json<CutDetails>,
) -> Json<Ack> {
    Json(state.service.verify_settlement(&payload))
}
