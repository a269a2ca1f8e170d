//! Key state table
//!
//! Dense pressed/released lookup indexed by evdev key code.
//! Codes outside the evdev key space are ignored, never indexed.

use crate::constants::KEY_CNT;

/// Held state of every key the keyboard can report
#[derive(Clone)]
pub struct KeyStateTable {
    states: [bool; KEY_CNT],
}

impl KeyStateTable {
    /// All keys released
    pub fn new() -> Self {
        Self {
            states: [false; KEY_CNT],
        }
    }

    /// Record the latest observed state of `code`.
    ///
    /// Returns false (and changes nothing) when `code` is out of range.
    pub fn set(&mut self, code: u16, pressed: bool) -> bool {
        match self.states.get_mut(code as usize) {
            Some(slot) => {
                *slot = pressed;
                true
            }
            None => false,
        }
    }

    /// Out-of-range codes read as released
    #[inline]
    pub fn is_pressed(&self, code: u16) -> bool {
        self.states.get(code as usize).copied().unwrap_or(false)
    }

    /// Release every key (no ghost key survives a mode transition)
    pub fn reset_all(&mut self) {
        self.states = [false; KEY_CNT];
    }

    #[cfg(test)]
    pub fn any_pressed(&self) -> bool {
        self.states.iter().any(|&pressed| pressed)
    }
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyStateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let held: Vec<usize> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, &pressed)| pressed)
            .map(|(code, _)| code)
            .collect();
        f.debug_struct("KeyStateTable").field("held", &held).finish()
    }
}
