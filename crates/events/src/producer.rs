//! Star producer: publishes an increasing counter at a fixed frequency.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bus::EventBus;
use crate::types::StarsUpdate;

/// Length of one simulated turn. A frequency of `n` means one star every `n` turns.
pub const TURN_DURATION: Duration = Duration::from_millis(10);

struct ProducerRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one running ticker. Starting again replaces the previous run;
/// stopping is idempotent.
#[derive(Clone)]
pub struct StarsProducer {
    bus: EventBus,
    turn: Duration,
    running: Arc<Mutex<Option<ProducerRun>>>,
}

impl StarsProducer {
    pub fn new(bus: EventBus) -> Self {
        Self::with_turn(bus, TURN_DURATION)
    }

    pub fn with_turn(bus: EventBus, turn: Duration) -> Self {
        Self {
            bus,
            turn,
            running: Arc::new(Mutex::new(None)),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Start publishing stars every `frequency` turns, counting from 1.
    pub fn start(&self, frequency: u32) {
        let period = self.turn * frequency.max(1);
        let cancel = CancellationToken::new();
        let bus = self.bus.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut stars: u32 = 0;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        stars += 1;
                        let delivered = bus.publish(StarsUpdate::new(stars));
                        debug!(stars, delivered, "Sent star update");
                    }
                }
            }
        });

        let previous = self
            .lock()
            .replace(ProducerRun { cancel, handle });
        if let Some(previous) = previous {
            debug!("Replacing running star producer");
            previous.cancel.cancel();
        }

        info!(frequency, period_ms = period.as_millis() as u64, "Star notifications started");
    }

    /// Stop the running ticker. Returns whether one was running.
    pub fn stop(&self) -> bool {
        match self.lock().take() {
            Some(run) => {
                run.cancel.cancel();
                info!("Star notifications stopped");
                true
            }
            None => {
                debug!("Stop requested with no star producer running");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|run| !run.handle.is_finished())
            .unwrap_or(false)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ProducerRun>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StarsProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StarsProducer")
            .field("turn", &self.turn)
            .field("running", &self.is_running())
            .finish()
    }
}
