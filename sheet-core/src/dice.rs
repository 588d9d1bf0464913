//! Damage-notation extraction.
//!
//! Spell and attack descriptions embed damage dice as free text ("deal
//! 2d6 + 3 fire damage"). This module pulls the first such expression out
//! and derives its damage range. It is a tracker, not a roller: nothing
//! here touches an RNG.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    // Ordered alternatives: the modifier form must win over the plain form
    // so a trailing "+ K" is never dropped.
    static ref DICE_WITH_MODIFIER: Regex =
        Regex::new(r"(?i)(\d+)d(\d+)\s*\+\s*(\d+)").expect("valid regex");
    static ref DICE_PLAIN: Regex = Regex::new(r"(?i)(\d+)d(\d+)").expect("valid regex");
}

/// A single `NdM` or `NdM + K` damage expression.
///
/// The grammar is deliberately narrow: one expression per string, first
/// occurrence wins, no multiplicative dice, no negative modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageExpression {
    pub dice_count: u32,
    pub die_size: u32,
    pub modifier: Option<u32>,
}

impl DamageExpression {
    /// Minimum total: every die rolls a 1.
    pub fn min(&self) -> u32 {
        self.dice_count + self.modifier.unwrap_or(0)
    }

    /// Maximum total: every die rolls its size.
    pub fn max(&self) -> u32 {
        self.dice_count * self.die_size + self.modifier.unwrap_or(0)
    }

    /// Normalized display form: `"2d6 + 3"` or `"1d4"`.
    pub fn notation(&self) -> String {
        match self.modifier {
            Some(bonus) => format!("{}d{} + {}", self.dice_count, self.die_size, bonus),
            None => format!("{}d{}", self.dice_count, self.die_size),
        }
    }

    /// Human-readable damage range: `"5 to 15"`.
    pub fn range(&self) -> String {
        format!("{} to {}", self.min(), self.max())
    }
}

impl fmt::Display for DamageExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation())
    }
}

/// Extract the first damage expression from free text.
///
/// Returns `None` when the text carries no damage annotation; callers must
/// treat that as absence, not as an error.
pub fn extract_damage(text: &str) -> Option<DamageExpression> {
    let text = text.trim();

    if let Some(caps) = DICE_WITH_MODIFIER.captures(text) {
        return Some(DamageExpression {
            dice_count: caps[1].parse().ok()?,
            die_size: caps[2].parse().ok()?,
            modifier: Some(caps[3].parse().ok()?),
        });
    }

    let caps = DICE_PLAIN.captures(text)?;
    Some(DamageExpression {
        dice_count: caps[1].parse().ok()?,
        die_size: caps[2].parse().ok()?,
        modifier: None,
    })
}
