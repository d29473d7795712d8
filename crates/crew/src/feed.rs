//! Star feed subscriptions used during a hit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use events::{EventBus, StarsUpdate, STARS_EVENT};
use futures::future;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{CrewError, Result};

/// Star counts in arrival order.
pub type SeverityStream = BoxStream<'static, u32>;

#[async_trait]
pub trait SeverityFeed: Send + Sync {
    async fn subscribe(&self) -> Result<SeverityStream>;
}

/// In-process feed reading straight off a bus.
#[derive(Clone)]
pub struct BusSeverityFeed {
    bus: EventBus,
}

impl BusSeverityFeed {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl SeverityFeed for BusSeverityFeed {
    async fn subscribe(&self) -> Result<SeverityStream> {
        let stream = BroadcastStream::new(self.bus.subscribe())
            .filter_map(|update| future::ready(update.ok().map(|update| update.stars)))
            .boxed();
        Ok(stream)
    }
}

/// Remote feed served over SSE by the offer service.
#[derive(Clone)]
pub struct SseSeverityFeed {
    url: String,
    client: reqwest::Client,
}

impl SseSeverityFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            url: format!("{}/api/feed", base_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SeverityFeed for SseSeverityFeed {
    async fn subscribe(&self) -> Result<SeverityStream> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CrewError::Feed(format!(
                "Failed to connect to star feed: {}",
                response.status()
            )));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(event.is_ok()))
            .filter_map(|event| {
                let stars = event.ok().and_then(|event| {
                    if event.event != STARS_EVENT || event.data.is_empty() {
                        return None;
                    }
                    match serde_json::from_str::<StarsUpdate>(&event.data) {
                        Ok(update) => Some(update.stars),
                        Err(e) => {
                            warn!("Failed to parse star update: {} - data: {}", e, event.data);
                            None
                        }
                    }
                });
                future::ready(stars)
            })
            .boxed();

        Ok(stream)
    }
}

/// A star count tagged with the hit it was received for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeverityUpdate {
    pub run_id: u64,
    pub stars: u32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FeedRetry {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

/// Forward stars to the engine until cancelled.
///
/// A failed subscription or an ended stream is retried with doubling backoff.
/// The budget resets whenever a star gets through.
pub(crate) async fn forward_severity(
    feed: Arc<dyn SeverityFeed>,
    run_id: u64,
    updates: mpsc::Sender<SeverityUpdate>,
    cancel: CancellationToken,
    retry: FeedRetry,
) {
    let mut failures = 0;
    let mut backoff = retry.initial_backoff;

    loop {
        let subscribed = tokio::select! {
            _ = cancel.cancelled() => return,
            result = feed.subscribe() => result,
        };

        match subscribed {
            Ok(mut stream) => {
                debug!(run_id, "Subscribed to star feed");
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        next = stream.next() => match next {
                            Some(stars) => {
                                failures = 0;
                                backoff = retry.initial_backoff;
                                if updates.send(SeverityUpdate { run_id, stars }).await.is_err() {
                                    return;
                                }
                            }
                            None => break,
                        }
                    }
                }
                debug!(run_id, "Star feed ended");
            }
            Err(e) => {
                warn!(run_id, error = %e, "Star feed subscription failed");
            }
        }

        failures += 1;
        if failures >= retry.attempts {
            warn!(
                run_id,
                attempts = failures,
                "Giving up on star feed, hit continues with the last known stars"
            );
            return;
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(retry.max_backoff);
    }
}
