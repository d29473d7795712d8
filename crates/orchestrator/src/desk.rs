//! The two remote counterparts Michael talks to.

use async_trait::async_trait;
use heist_core::{Ack, CutDetails, LootDetails, Offer, PhaseSnapshot, Role, StartAck};

use crate::error::Result;

/// Lester: offers, settlement check and the star feed switch.
#[async_trait]
pub trait OfferDesk: Send + Sync {
    async fn propose_offer(&self) -> Result<Option<Offer>>;

    async fn record_decision(&self, accepted: bool) -> Result<()>;

    async fn verify_settlement(&self, cut: CutDetails) -> Result<Ack>;

    async fn start_feed(&self, frequency: u32) -> Result<()>;

    async fn stop_feed(&self) -> Result<()>;
}

/// One executor of the crew.
#[async_trait]
pub trait Operator: Send + Sync {
    fn role(&self) -> Role;

    async fn start_distraction(&self, turns_needed: u32) -> Result<StartAck>;

    async fn start_hit(&self, turns_needed: u32, loot: u64) -> Result<StartAck>;

    async fn check_status(&self) -> Result<PhaseSnapshot>;

    async fn retrieve_loot(&self) -> Result<LootDetails>;

    async fn confirm_cut(&self, cut: CutDetails) -> Result<Ack>;
}
