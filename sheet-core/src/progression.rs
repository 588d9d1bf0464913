//! Experience thresholds and leveling.
//!
//! Levels follow the fixed 5e advancement table. The experience counter is
//! per-level progress: each level-up consumes that level's share of the
//! table and carries the remainder forward, so one large award can climb
//! several levels at once. There is no advancement past level 20.

use serde::{Deserialize, Serialize};

/// Total experience required to have reached each level, indexed by
/// `level - 1`.
const XP_TOTALS: [u32; 20] = [
    0, 300, 900, 2700, 6500, 14000, 23000, 34000, 48000, 64000, 85000, 100_000, 120_000, 140_000,
    165_000, 195_000, 225_000, 265_000, 305_000, 355_000,
];

/// The advancement table stops here.
pub const MAX_LEVEL: u8 = 20;

/// Experience needed to advance from `level` to the next one, or `None`
/// at or past the table's end (the unreachable sentinel).
pub fn threshold_for(level: u8) -> Option<u32> {
    if level == 0 || level >= MAX_LEVEL {
        return None;
    }
    let idx = level as usize;
    Some(XP_TOTALS[idx] - XP_TOTALS[idx - 1])
}

/// Current level plus progress toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceState {
    /// Experience accumulated since the last level-up.
    pub current: u32,
    pub level: u8,
}

impl ExperienceState {
    pub fn new() -> Self {
        Self {
            current: 0,
            level: 1,
        }
    }

    /// Add experience and resolve any level-ups it triggers. Returns the
    /// number of levels gained.
    pub fn award(&mut self, amount: u32) -> u8 {
        self.current = self.current.saturating_add(amount);
        self.check_level_up()
    }

    /// Overwrite the counter, then resolve level-ups. Every experience
    /// mutation re-evaluates the table.
    pub fn set(&mut self, value: u32) -> u8 {
        self.current = value;
        self.check_level_up()
    }

    /// Consume thresholds while the counter covers them. The remainder is
    /// carried into the new level, never discarded.
    pub fn check_level_up(&mut self) -> u8 {
        let start = self.level;
        while let Some(cost) = threshold_for(self.level) {
            if self.current < cost {
                break;
            }
            self.current -= cost;
            self.level += 1;
            tracing::debug!(level = self.level, "level up");
        }
        self.level - start
    }

    /// Experience still needed for the next level, if one exists.
    pub fn to_next_level(&self) -> Option<u32> {
        threshold_for(self.level).map(|cost| cost.saturating_sub(self.current))
    }
}

impl Default for ExperienceState {
    fn default() -> Self {
        Self::new()
    }
}
