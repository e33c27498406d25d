//! Ask (sell-side) order book.
//!
//! Sell orders rest sorted by price ascending, lowest ask first.

use std::collections::BTreeMap;

use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::{BookEntry, PriceLevel};

/// The sell side of one instrument's book.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest an entry at its price level.
    pub fn insert(&mut self, price: Price, entry: BookEntry) {
        self.levels.entry(price).or_default().insert(entry);
    }

    /// Remove a resting entry; empty levels are pruned.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<BookEntry> {
        let level = self.levels.get_mut(&price)?;
        let entry = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(entry)
    }

    /// Lowest resting ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Levels in matching priority order (price ascending).
    pub fn levels_mut(&mut self) -> impl Iterator<Item = (Price, &mut PriceLevel)> {
        self.levels.iter_mut().map(|(p, l)| (*p, l))
    }

    /// Drop levels emptied during matching.
    pub fn prune_empty(&mut self) {
        self.levels.retain(|_, level| !level.is_empty());
    }

    /// Top `depth` levels as (price, total quantity), best first.
    pub fn depth(&self, depth: usize) -> Vec<(Price, u64)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(p, l)| (*p, l.total_quantity()))
            .collect()
    }

    pub fn total_quantity(&self) -> u64 {
        self.levels.values().map(PriceLevel::total_quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
