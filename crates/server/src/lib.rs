pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::{CrewState, LesterState};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lester API",
        version = "0.1.0",
        description = "Offer negotiation, settlement check and the star feed"
    ),
    paths(
        routes::health_check,
        routes::propose_offer,
        routes::record_decision,
        routes::verify_settlement,
        routes::start_feed,
        routes::stop_feed,
        routes::feed_stream,
    ),
    components(schemas(
        routes::HealthResponse,
        heist_core::Offer,
        heist_core::ProposeResponse,
        heist_core::DecisionRequest,
        heist_core::CutDetails,
        heist_core::Ack,
        events::FeedStartRequest,
        events::StarsUpdate,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "offers", description = "Offer negotiation"),
        (name = "settlement", description = "Loot settlement"),
        (name = "feed", description = "Star feed control and stream (SSE)"),
    )
)]
pub struct LesterApiDoc;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crew API",
        version = "0.1.0",
        description = "Phase execution for one crew member"
    ),
    paths(
        routes::health_check,
        routes::start_distraction,
        routes::start_hit,
        routes::phase_status,
        routes::retrieve_loot,
        routes::confirm_cut,
    ),
    components(schemas(
        routes::HealthResponse,
        heist_core::DistractionRequest,
        heist_core::HitRequest,
        heist_core::StartAck,
        heist_core::PhaseKind,
        heist_core::PhaseStatus,
        heist_core::PhaseSnapshot,
        heist_core::LootDetails,
        heist_core::CutDetails,
        heist_core::Ack,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "phases", description = "Distraction and hit phases"),
        (name = "loot", description = "Loot and cut confirmation"),
    )
)]
pub struct CrewApiDoc;

pub fn lester_router(state: LesterState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", LesterApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/api/offers/propose", post(routes::propose_offer))
        .route("/api/offers/decision", post(routes::record_decision))
        .route("/api/settlement/verify", post(routes::verify_settlement))
        .route("/api/feed/start", post(routes::start_feed))
        .route("/api/feed/stop", post(routes::stop_feed))
        .route("/api/feed", get(routes::feed_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn crew_router(state: CrewState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", CrewApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/api/phases/distraction", post(routes::start_distraction))
        .route("/api/phases/hit", post(routes::start_hit))
        .route("/api/phases/status", get(routes::phase_status))
        .route("/api/loot", get(routes::retrieve_loot))
        .route("/api/cut/confirm", post(routes::confirm_cut))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
