//! Resource pool value object (action points, spell points, hit points).

use serde::{Deserialize, Serialize};

/// A consumable pool with a current value and a maximum.
///
/// Invariant: `0 <= value <= max` after every mutation performed through
/// this type. Mutations clamp rather than error - spending past zero
/// empties the pool, restoring past the maximum fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePool {
    pub value: i32,
    pub max: i32,
}

impl ResourcePool {
    pub fn new(value: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            value: value.clamp(0, max),
            max,
        }
    }

    /// A full pool.
    pub fn full(max: i32) -> Self {
        Self::new(max, max)
    }

    /// Remove up to `amount` points, clamping at 0. Returns the new value.
    pub fn spend(&mut self, amount: i32) -> i32 {
        self.value = (self.value - amount.max(0)).max(0);
        self.value
    }

    /// Restore up to `amount` points, clamping at `max`. Returns the new value.
    pub fn restore(&mut self, amount: i32) -> i32 {
        self.value = (self.value + amount.max(0)).min(self.max);
        self.value
    }

    /// Set the current value, clamped to `[0, max]`.
    pub fn set_clamped(&mut self, value: i32) -> i32 {
        self.value = value.clamp(0, self.max);
        self.value
    }

    pub fn is_full(&self) -> bool {
        self.value == self.max
    }

    /// Whether the pool can cover a cost.
    pub fn can_afford(&self, cost: i32) -> bool {
        self.value >= cost
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self { value: 0, max: 0 }
    }
}
