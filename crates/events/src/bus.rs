//! Single-topic star channel shared by the producer and its listeners.

use tokio::sync::broadcast;

use crate::types::StarsUpdate;

/// Stars are only interesting while fresh; slow listeners lag rather than block.
const STAR_BACKLOG: usize = 256;

/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus(broadcast::Sender<StarsUpdate>);

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(STAR_BACKLOG);
        Self(sender)
    }

    /// Deliver to whoever is listening now; returns how many listeners got it.
    pub fn publish(&self, update: StarsUpdate) -> usize {
        self.0.send(update).unwrap_or(0)
    }

    /// Listen from this point on. There is no replay of earlier stars.
    pub fn subscribe(&self) -> broadcast::Receiver<StarsUpdate> {
        self.0.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_late_listener_misses_earlier_stars() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(StarsUpdate::new(1)), 0);

        let mut rx = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(StarsUpdate::new(2));

        assert_eq!(rx.recv().await.unwrap().stars, 2);
        assert!(rx.try_recv().is_err());
    }
}
