//! Lester's side of the negotiation.

use std::sync::{Mutex, MutexGuard};

use heist_core::{verify_lester_cut, Ack, CutDetails, Offer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::OfferServiceConfig;
use crate::error::Result;

pub struct OfferService {
    catalog: Catalog,
    config: OfferServiceConfig,
    rng: Mutex<StdRng>,
    rejections: Mutex<u32>,
}

impl OfferService {
    pub fn new(catalog: Catalog, config: OfferServiceConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if catalog.is_empty() {
            info!("Offer catalog is empty, offers will be synthesized from configured ranges");
        }

        Ok(Self {
            catalog,
            config,
            rng: Mutex::new(rng),
            rejections: Mutex::new(0),
        })
    }

    pub fn config(&self) -> &OfferServiceConfig {
        &self.config
    }

    pub fn rejection_streak(&self) -> u32 {
        *self.rejections()
    }

    /// Propose the next offer, or nothing when the opportunity was missed.
    ///
    /// A full rejection streak is paid for first: the call clears the streak
    /// and sleeps the cooldown before any offer is generated. Only the caller
    /// that claims the streak waits.
    pub async fn propose_offer(&self) -> Option<Offer> {
        if self.claim_cooldown() {
            warn!(
                streak = self.config.cooldown_threshold,
                cooldown_secs = self.config.cooldown.as_secs_f64(),
                "Michael rejected too many offers, making him wait"
            );
            tokio::time::sleep(self.config.cooldown).await;
        }

        let mut rng = self.rng();
        if rng.gen_range(0..100) < self.config.miss_chance_percent {
            info!("No offer this round");
            return None;
        }

        let offer = match self.catalog.choose(&mut *rng) {
            Some(offer) => *offer,
            None => self.config.ranges.synthesize(&mut *rng),
        };

        info!(
            loot = ?offer.loot,
            police_risk = ?offer.police_risk,
            trevor_success = ?offer.trevor_success,
            franklin_success = ?offer.franklin_success,
            "Proposed offer"
        );
        Some(offer)
    }

    /// Record Michael's verdict on the last proposal.
    pub fn record_decision(&self, accepted: bool) {
        let mut rejections = self.rejections();
        if accepted {
            *rejections = 0;
        } else {
            *rejections += 1;
        }
        debug!(accepted, streak = *rejections, "Decision recorded");
    }

    pub fn verify_settlement(&self, cut: &CutDetails) -> Ack {
        let ack = verify_lester_cut(cut);
        info!(
            loot = cut.loot,
            extra_loot = cut.extra_loot,
            share = cut.share,
            ok = ack.ok,
            "Confirming Lester's cut"
        );
        ack
    }

    fn claim_cooldown(&self) -> bool {
        let mut rejections = self.rejections();
        if *rejections >= self.config.cooldown_threshold {
            *rejections = 0;
            true
        } else {
            false
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rejections(&self) -> MutexGuard<'_, u32> {
        self.rejections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
