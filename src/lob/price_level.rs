//! Aggregated price levels for both sides of the book.
//!
//! The book only keeps the total resting size at each price, not the
//! individual orders behind it.
//!
//! # Invariant
//!
//! Every stored aggregate is strictly positive. A level whose size would
//! drop to zero is removed, never retained at zero.
//!
//! # Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `add_liquidity` | O(log n) |
//! | `remove_liquidity` | O(log n) |
//! | `top_levels` | O(log n + k) |

use std::collections::BTreeMap;

use crate::types::Side;

/// One aggregated level: total resting size at a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    /// Price in fixed-point format
    pub price: i64,
    /// Aggregate resting size (always > 0 inside the book)
    pub size: u32,
}

impl PriceLevel {
    #[inline]
    pub fn new(price: i64, size: u32) -> Self {
        Self { price, size }
    }
}

/// Two-sided price → aggregate size book.
///
/// Both sides are stored ascending in a `BTreeMap`; bids are read back in
/// reverse so the best (highest) bid comes first.
#[derive(Debug, Clone, Default)]
pub struct PriceLevelBook {
    bids: BTreeMap<i64, u32>,
    asks: BTreeMap<i64, u32>,
}

impl PriceLevelBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn side_mut(&mut self, side: Side) -> Option<&mut BTreeMap<i64, u32>> {
        match side {
            Side::Bid => Some(&mut self.bids),
            Side::Ask => Some(&mut self.asks),
            Side::None => None,
        }
    }

    /// Add `size` at `price`, creating the level if absent.
    ///
    /// A zero size or a non-directional side leaves the book untouched.
    #[inline]
    pub fn add_liquidity(&mut self, side: Side, price: i64, size: u32) {
        if size == 0 {
            return;
        }
        if let Some(levels) = self.side_mut(side) {
            let total = levels.entry(price).or_insert(0);
            *total = total.saturating_add(size);
        }
    }

    /// Subtract `size` from the level at `price`, pruning it at or below zero.
    ///
    /// Returns `false` when no level exists at `price` (a silent no-op).
    #[inline]
    pub fn remove_liquidity(&mut self, side: Side, price: i64, size: u32) -> bool {
        let Some(levels) = self.side_mut(side) else {
            return false;
        };
        match levels.get_mut(&price) {
            Some(total) if *total > size => {
                *total -= size;
                true
            }
            Some(_) => {
                levels.remove(&price);
                true
            }
            None => false,
        }
    }

    /// Remove `old_size` then add `new_size` (when positive) at the same price.
    #[inline]
    pub fn replace_liquidity(&mut self, side: Side, price: i64, old_size: u32, new_size: u32) {
        self.remove_liquidity(side, price, old_size);
        if new_size > 0 {
            self.add_liquidity(side, price, new_size);
        }
    }

    /// Up to `n` levels in canonical order: bids descending, asks ascending.
    ///
    /// Shorter than `n` when the side is thin; never padded.
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        let to_level = |(&price, &size): (&i64, &u32)| PriceLevel::new(price, size);
        match side {
            Side::Bid => self.bids.iter().rev().take(n).map(to_level).collect(),
            Side::Ask => self.asks.iter().take(n).map(to_level).collect(),
            Side::None => Vec::new(),
        }
    }

    /// Aggregate size at `price`, if a level exists.
    #[inline]
    pub fn size_at(&self, side: Side, price: i64) -> Option<u32> {
        match side {
            Side::Bid => self.bids.get(&price).copied(),
            Side::Ask => self.asks.get(&price).copied(),
            Side::None => None,
        }
    }

    /// Best (highest) bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    /// Best (lowest) ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Number of price levels on bid side.
    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of price levels on ask side.
    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Check if both sides are empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Drop every level on both sides.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P100: i64 = 100_000_000_000;
    const P101: i64 = 101_000_000_000;
    const P99: i64 = 99_000_000_000;

    #[test]
    fn test_new_book_is_empty() {
        let book = PriceLevelBook::new();
        assert!(book.is_empty());
        assert!(book.top_levels(Side::Bid, 10).is_empty());
        assert!(book.top_levels(Side::Ask, 10).is_empty());
    }

    #[test]
    fn test_add_accumulates_at_same_price() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 5);
        book.add_liquidity(Side::Bid, P100, 7);
        assert_eq!(book.top_levels(Side::Bid, 10), vec![PriceLevel::new(P100, 12)]);
    }

    #[test]
    fn test_remove_beyond_size_prunes_level() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 5);
        assert!(book.remove_liquidity(Side::Bid, P100, 10));
        assert_eq!(book.bid_levels(), 0);
        assert_eq!(book.size_at(Side::Bid, P100), None);
    }

    #[test]
    fn test_remove_exact_size_prunes_level() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Ask, P101, 30);
        book.remove_liquidity(Side::Ask, P101, 30);
        assert_eq!(book.ask_levels(), 0);
    }

    #[test]
    fn test_partial_remove() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Ask, P101, 30);
        book.remove_liquidity(Side::Ask, P101, 12);
        assert_eq!(book.size_at(Side::Ask, P101), Some(18));
    }

    #[test]
    fn test_remove_missing_level_is_noop() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 5);
        assert!(!book.remove_liquidity(Side::Bid, P99, 5));
        assert!(!book.remove_liquidity(Side::Ask, P100, 5));
        assert_eq!(book.size_at(Side::Bid, P100), Some(5));
    }

    #[test]
    fn test_none_side_is_ignored() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::None, P100, 5);
        assert!(book.is_empty());
        assert!(!book.remove_liquidity(Side::None, P100, 5));
    }

    #[test]
    fn test_zero_size_add_creates_nothing() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 0);
        assert!(book.is_empty());
    }

    #[test]
    fn test_replace_liquidity() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 10);
        book.replace_liquidity(Side::Bid, P100, 4, 9);
        assert_eq!(book.size_at(Side::Bid, P100), Some(15));

        // Zero old size never removes anything
        book.replace_liquidity(Side::Bid, P99, 0, 3);
        assert_eq!(book.size_at(Side::Bid, P99), Some(3));

        // Zero new size only removes
        book.replace_liquidity(Side::Bid, P99, 3, 0);
        assert_eq!(book.size_at(Side::Bid, P99), None);
    }

    #[test]
    fn test_canonical_ordering() {
        let mut book = PriceLevelBook::new();
        for (i, price) in [P99, P101, P100].into_iter().enumerate() {
            book.add_liquidity(Side::Bid, price, i as u32 + 1);
            book.add_liquidity(Side::Ask, price, i as u32 + 1);
        }

        let bids: Vec<i64> = book.top_levels(Side::Bid, 10).iter().map(|l| l.price).collect();
        let asks: Vec<i64> = book.top_levels(Side::Ask, 10).iter().map(|l| l.price).collect();
        assert_eq!(bids, vec![P101, P100, P99]);
        assert_eq!(asks, vec![P99, P100, P101]);
        assert_eq!(book.best_bid(), Some(P101));
        assert_eq!(book.best_ask(), Some(P99));
    }

    #[test]
    fn test_top_levels_truncates() {
        let mut book = PriceLevelBook::new();
        for i in 0..15 {
            book.add_liquidity(Side::Ask, P100 + i * 10_000_000, 1);
        }
        let top = book.top_levels(Side::Ask, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].price, P100);
        assert_eq!(top[9].price, P100 + 9 * 10_000_000);
    }

    #[test]
    fn test_levels_stay_positive_and_strictly_ordered() {
        let mut book = PriceLevelBook::new();
        let mut price = P100;
        for i in 0..200u32 {
            // Deterministic pseudo-random walk over a handful of prices
            price = P99 + ((price + i as i64 * 7_000_000) % 5) * 10_000_000;
            if i % 3 == 0 {
                book.remove_liquidity(Side::Bid, price, i % 11);
            } else {
                book.add_liquidity(Side::Bid, price, i % 13);
            }
        }
        let levels = book.top_levels(Side::Bid, usize::MAX);
        assert!(levels.iter().all(|l| l.size > 0));
        assert!(levels.windows(2).all(|w| w[0].price > w[1].price));
    }

    #[test]
    fn test_overflow_protection() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, u32::MAX);
        book.add_liquidity(Side::Bid, P100, 1);
        assert_eq!(book.size_at(Side::Bid, P100), Some(u32::MAX));
    }

    #[test]
    fn test_clear() {
        let mut book = PriceLevelBook::new();
        book.add_liquidity(Side::Bid, P100, 1);
        book.add_liquidity(Side::Ask, P101, 1);
        book.clear();
        assert!(book.is_empty());
    }
}
