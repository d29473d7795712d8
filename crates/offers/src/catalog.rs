//! Offer catalog loaded from a comma-delimited file.
//!
//! The first line is a header. Columns are, in order: loot, Franklin's success
//! chance, Trevor's success chance, police risk. A cell that is empty, not a
//! number, or outside its range becomes a missing field; it never fails the load.

use std::path::Path;

use heist_core::Offer;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{OfferError, Result};

const MAX_PERCENT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    offers: Vec<Offer>,
}

impl Catalog {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| OfferError::Catalog {
                    path: path.to_path_buf(),
                    source,
                })?;

        let catalog = Self::parse(&content);
        info!(
            path = %path.display(),
            offers = catalog.len(),
            incomplete = catalog.incomplete_count(),
            "Offer catalog loaded"
        );
        Ok(catalog)
    }

    pub fn parse(content: &str) -> Self {
        let offers = content
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(parse_row)
            .collect();

        Self { offers }
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Offer> {
        self.offers.choose(rng)
    }

    fn incomplete_count(&self) -> usize {
        self.offers
            .iter()
            .filter(|offer| offer.complete().is_err())
            .count()
    }
}

fn parse_row(line: &str) -> Offer {
    let mut cells = line.split(',').map(str::trim);
    let offer = Offer {
        loot: cells.next().and_then(|cell| cell.parse::<u64>().ok()),
        franklin_success: cells.next().and_then(parse_percent),
        trevor_success: cells.next().and_then(parse_percent),
        police_risk: cells.next().and_then(parse_percent),
    };
    if offer.complete().is_err() {
        debug!(line, "Catalog row has missing fields");
    }
    offer
}

fn parse_percent(cell: &str) -> Option<u32> {
    cell.parse::<u32>().ok().filter(|value| *value <= MAX_PERCENT)
}
