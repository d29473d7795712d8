use std::sync::Arc;

use crew::PhaseEngine;
use events::{EventBus, StarsProducer};
use offers::OfferService;

#[derive(Clone)]
pub struct LesterState {
    pub service: Arc<OfferService>,
    pub producer: StarsProducer,
}

impl LesterState {
    pub fn new(service: OfferService, bus: EventBus) -> Self {
        Self {
            service: Arc::new(service),
            producer: StarsProducer::new(bus),
        }
    }

    pub fn with_producer(service: OfferService, producer: StarsProducer) -> Self {
        Self {
            service: Arc::new(service),
            producer,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        self.producer.bus()
    }
}

#[derive(Clone)]
pub struct CrewState {
    pub engine: PhaseEngine,
}

impl CrewState {
    pub fn new(engine: PhaseEngine) -> Self {
        Self { engine }
    }
}
