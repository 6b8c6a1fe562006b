//! Bounded per-symbol price history

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of samples retained per symbol
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A single price sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Receive time in Unix milliseconds
    pub timestamp_millis: i64,
    /// Price in the display currency active when the sample was recorded
    pub price: Decimal,
}

impl PricePoint {
    pub fn new(timestamp_millis: i64, price: Decimal) -> Self {
        Self {
            timestamp_millis,
            price,
        }
    }
}

/// Fixed-capacity FIFO ring of price samples, oldest first
#[derive(Debug, Clone)]
pub struct PriceHistory {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl PriceHistory {
    /// Create an empty history; a zero capacity is bumped to one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn append(&mut self, point: PricePoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Copy out the samples for an immutable snapshot
    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().copied().collect()
    }
}
