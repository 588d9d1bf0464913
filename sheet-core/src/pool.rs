//! Bounded resource pools.
//!
//! Every consumable the sheet tracks (hit points, temporary hit points,
//! spell points, sorcery points, the armor class baseline) is a pool of
//! current over maximum.

use serde::{Deserialize, Serialize};

/// A current/maximum counter.
///
/// `gain` and `spend` clamp to `[0, maximum]` and shrinking the maximum
/// re-clamps the current value, so a pool never reports more than it can
/// hold. The one exception is [`ResourcePool::set`], a deliberate
/// unclamped override for house rules and manual corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub current: i32,
    pub maximum: i32,
}

impl ResourcePool {
    /// A full pool.
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Direct overwrite. No clamping.
    pub fn set(&mut self, value: i32) {
        self.current = value;
    }

    /// Add up to `delta`, capped at the maximum. Returns the amount
    /// actually gained.
    pub fn gain(&mut self, delta: i32) -> i32 {
        let old = self.current;
        self.current = (self.current + delta).clamp(0, self.maximum.max(0));
        self.current - old
    }

    /// Remove up to `delta`, floored at zero. Returns the amount actually
    /// spent.
    pub fn spend(&mut self, delta: i32) -> i32 {
        let old = self.current;
        self.current = (self.current - delta).clamp(0, self.maximum.max(0));
        old - self.current
    }

    /// Update the maximum, then pull current back down if it now exceeds
    /// the new ceiling.
    pub fn set_maximum(&mut self, value: i32) {
        self.maximum = value;
        if self.current > self.maximum {
            self.current = self.maximum;
        }
    }

    /// Restore to full.
    pub fn refill(&mut self) {
        self.current = self.maximum;
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0
    }

    /// Fill fraction for display bars, clamped to `[0, 1]`.
    pub fn ratio(&self) -> f32 {
        if self.maximum <= 0 {
            return 0.0;
        }
        (self.current as f32 / self.maximum as f32).clamp(0.0, 1.0)
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new(0)
    }
}
