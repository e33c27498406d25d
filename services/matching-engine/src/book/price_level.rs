//! Price level with a FIFO queue of resting orders.
//!
//! All orders at one price point queue in arrival order; time priority is
//! fixed at insertion and never re-ranked, including after partial fills.

use std::collections::VecDeque;

use types::ids::{AccountId, OrderId};

/// A resting order's footprint in the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub account_id: AccountId,
    pub remaining: u64,
    /// Arrival sequence assigned by the book; ties at equal price resolve
    /// to the lower sequence.
    pub sequence: u64,
}

/// All resting orders at a single price, FIFO by arrival.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<BookEntry>,
    total_quantity: u64,
}

/// What a fill did to the entry it hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFill {
    /// Entry state after the fill was applied.
    pub entry: BookEntry,
    /// True when the entry was fully consumed and removed from the queue.
    pub removed: bool,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry at the back (time priority).
    pub fn insert(&mut self, entry: BookEntry) {
        self.total_quantity += entry.remaining;
        self.orders.push_back(entry);
    }

    /// Remove an entry by order id, returning it if present.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<BookEntry> {
        let position = self.orders.iter().position(|e| &e.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity -= entry.remaining;
        Some(entry)
    }

    /// Index of the first entry not owned by `taker`, scanning FIFO.
    ///
    /// Entries owned by the taker's own account are passed over without
    /// losing their queue position.
    pub fn first_counterparty(&self, taker: &AccountId, from: usize) -> Option<usize> {
        self.orders
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, e)| &e.account_id != taker)
            .map(|(i, _)| i)
    }

    pub fn entry(&self, index: usize) -> Option<&BookEntry> {
        self.orders.get(index)
    }

    /// Apply a fill of `quantity` to the entry at `index`.
    ///
    /// Fully consumed entries are removed; partially filled entries keep
    /// their position. Returns `None` when the index is out of range or the
    /// fill exceeds the entry's remaining quantity.
    pub fn fill_at(&mut self, index: usize, quantity: u64) -> Option<LevelFill> {
        let entry = self.orders.get_mut(index)?;
        if quantity > entry.remaining {
            return None;
        }
        entry.remaining -= quantity;
        self.total_quantity -= quantity;

        if entry.remaining == 0 {
            let entry = self.orders.remove(index)?;
            Some(LevelFill { entry, removed: true })
        } else {
            let entry = entry.clone();
            Some(LevelFill { entry, removed: false })
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookEntry> {
        self.orders.iter()
    }
}
