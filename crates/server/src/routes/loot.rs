use axum::extract::State;
use axum::Json;
use heist_core::{Ack, CutDetails, LootDetails};

use crate::state::CrewState;

#[utoipa::path(
    get,
    path = "/api/loot",
    responses(
        (status = 200, description = "Loot from the last successful hit", body = LootDetails),
    ),
    tag = "loot"
)]
pub async fn retrieve_loot(State(state): State<CrewState>) -> Json<LootDetails> {
    Json(state.engine.retrieve_loot())
}

#[utoipa::path(
    post,
    path = "/api/cut/confirm",
    request_body = CutDetails,
    responses(
        (status = 200, description = "The crew member's verdict on their cut", body = Ack),
    ),
    tag = "loot"
)]
pub async fn confirm_cut(
    State(state): State<CrewState>,
    Json(payload): Json<CutDetails>,
) -> Json<Ack> {
    Json(state.engine.confirm_cut(&payload))
}
