//! Direction and speed-tier selection shared by motion and scroll

use crate::config::{Bindings, SpeedTiers};
use crate::input::KeyStateTable;

/// -1, 0 or +1 from a pair of opposing keys (both held cancel out)
#[inline]
pub fn axis(table: &KeyStateTable, negative: u16, positive: u16) -> i32 {
    i32::from(table.is_pressed(positive)) - i32::from(table.is_pressed(negative))
}

/// Effective speed for the held modifiers.
///
/// Precedence is fast > slow > slower; normal when none is held.
pub fn select_speed(table: &KeyStateTable, bindings: &Bindings, tiers: &SpeedTiers) -> f64 {
    if table.is_pressed(bindings.fast_mod) {
        tiers.fast
    } else if table.is_pressed(bindings.slow_mod) {
        tiers.slow
    } else if table.is_pressed(bindings.slower_mod) {
        tiers.slower
    } else {
        tiers.normal
    }
}
