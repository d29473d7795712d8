use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use events::{FeedStartRequest, StarsUpdate, STARS_EVENT};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::AppError;
use crate::state::LesterState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn update_to_sse_event(update: &StarsUpdate) -> Result<Event, Infallible> {
    let data = serde_json::to_string(update).unwrap_or_else(|_| "{}".to_string());

    Ok(Event::default()
        .id(update.id.to_string())
        .event(STARS_EVENT)
        .data(data))
}

#[utoipa::path(
    post,
    path = "/api/feed/start",
    request_body = FeedStartRequest,
    responses(
        (status = 204, description = "Star notifications started"),
        (status = 400, description = "Frequency must be positive"),
    ),
    tag = "feed"
)]
pub async fn start_feed(
    State(state): State<LesterState>,
    Json(payload): Json<FeedStartRequest>,
) -> Result<StatusCode, AppError> {
    if payload.frequency == 0 {
        return Err(AppError::BadRequest(
            "Frequency must be at least 1".to_string(),
        ));
    }

    state.producer.start(payload.frequency);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/feed/stop",
    responses(
        (status = 204, description = "Star notifications stopped, or were not running"),
    ),
    tag = "feed"
)]
pub async fn stop_feed(State(state): State<LesterState>) -> StatusCode {
    state.producer.stop();
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/api/feed",
    responses(
        (status = 200, description = "SSE stream of star updates"),
    ),
    tag = "feed"
)]
pub async fn feed_stream(
    State(state): State<LesterState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus().subscribe();
    tracing::debug!(
        subscribers = state.event_bus().subscriber_count(),
        "Star feed subscriber connected"
    );

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(update) => Some(update_to_sse_event(&update)),
            Err(e) => {
                tracing::warn!("Star feed broadcast error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
