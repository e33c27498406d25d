//! Bid (buy-side) order book.
//!
//! Buy orders rest sorted by price descending, highest bid first. `BTreeMap`
//! keeps level iteration deterministic; FIFO within each level.

use std::collections::BTreeMap;

use types::ids::OrderId;
use types::numeric::Price;

use super::price_level::{BookEntry, PriceLevel};

/// The buy side of one instrument's book.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
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

    /// Highest resting bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Levels in matching priority order (price descending).
    pub fn levels_mut(&mut self) -> impl Iterator<Item = (Price, &mut PriceLevel)> {
        self.levels.iter_mut().rev().map(|(p, l)| (*p, l))
    }

    /// Drop levels emptied during matching.
    pub fn prune_empty(&mut self) {
        self.levels.retain(|_, level| !level.is_empty());
    }

    /// Top `depth` levels as (price, total quantity), best first.
    pub fn depth(&self, depth: usize) -> Vec<(Price, u64)> {
        self.levels
            .iter()
            .rev()
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

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;

    fn entry(remaining: u64, sequence: u64) -> BookEntry {
        BookEntry {
            order_id: OrderId::new(),
            account_id: AccountId::new(),
            remaining,
            sequence,
        }
    }

    #[test]
    fn test_best_price_is_highest() {
        let mut book = BidBook::new();
        book.insert(Price::from_int(100), entry(10, 1));
        book.insert(Price::from_int(102), entry(5, 2));
        book.insert(Price::from_int(99), entry(8, 3));

        assert_eq!(book.best_price(), Some(Price::from_int(102)));
    }

    #[test]
    fn test_levels_mut_descends_through_prices() {
        let mut book = BidBook::new();
        book.insert(Price::from_int(100), entry(10, 1));
        book.insert(Price::from_int(102), entry(5, 2));
        book.insert(Price::from_int(101), entry(8, 3));

        let prices: Vec<Price> = book.levels_mut().map(|(p, _)| p).collect();
        assert_eq!(
            prices,
            vec![Price::from_int(102), Price::from_int(101), Price::from_int(100)]
        );
    }

    #[test]
    fn test_remove_prunes_empty_level() {
        let mut book = BidBook::new();
        let resting = entry(10, 1);
        let order_id = resting.order_id;
        book.insert(Price::from_int(100), resting);

        assert!(book.remove(&order_id, Price::from_int(100)).is_some());
        assert!(book.is_empty());
        assert!(book.remove(&order_id, Price::from_int(100)).is_none());
    }

    #[test]
    fn test_depth_snapshot_best_first() {
        let mut book = BidBook::new();
        book.insert(Price::from_int(100), entry(10, 1));
        book.insert(Price::from_int(102), entry(5, 2));
        book.insert(Price::from_int(99), entry(8, 3));

        let depth = book.depth(2);
        assert_eq!(depth, vec![(Price::from_int(102), 5), (Price::from_int(100), 10)]);
        assert_eq!(book.total_quantity(), 23);
    }
}
