//! Key combos
//!
//! A combo is a fixed-size list of keys that must all be held at once.
//! The first slot always names a real key; the remaining slots may be unused,
//! so single-key and multi-key combos are matched the same way.

use thiserror::Error;

use super::keycodes::display_code;
use super::state::KeyStateTable;
use crate::constants::{KEY_CNT, MAX_COMBO_KEYS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComboError {
    #[error("combo needs at least one key")]
    Empty,
    #[error("combo has {count} keys, at most {max} are supported")]
    TooManyKeys { count: usize, max: usize },
    #[error("key code {0} is outside the evdev key space")]
    OutOfRange(u16),
}

/// Fixed-length key combo
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Combo {
    first: u16,
    rest: [Option<u16>; MAX_COMBO_KEYS - 1],
}

impl Combo {
    /// Build a combo from 1..=MAX_COMBO_KEYS key codes
    pub fn new(keys: &[u16]) -> Result<Self, ComboError> {
        let (&first, tail) = keys.split_first().ok_or(ComboError::Empty)?;
        if keys.len() > MAX_COMBO_KEYS {
            return Err(ComboError::TooManyKeys {
                count: keys.len(),
                max: MAX_COMBO_KEYS,
            });
        }
        if let Some(&bad) = keys.iter().find(|&&code| code as usize >= KEY_CNT) {
            return Err(ComboError::OutOfRange(bad));
        }

        let mut rest = [None; MAX_COMBO_KEYS - 1];
        for (slot, &code) in rest.iter_mut().zip(tail) {
            *slot = Some(code);
        }
        Ok(Self { first, rest })
    }

    /// Single-key combo
    #[cfg(test)]
    pub const fn single(code: u16) -> Self {
        Self {
            first: code,
            rest: [None; MAX_COMBO_KEYS - 1],
        }
    }

    /// Keys in slot order, unused slots skipped
    pub fn keys(&self) -> impl Iterator<Item = u16> + '_ {
        std::iter::once(self.first).chain(self.rest.iter().flatten().copied())
    }

    /// True when `code` is one of this combo's keys
    #[cfg(test)]
    pub fn contains(&self, code: u16) -> bool {
        self.keys().any(|k| k == code)
    }

    #[inline]
    pub fn is_satisfied(&self, table: &KeyStateTable) -> bool {
        matches(table, self)
    }
}

impl std::fmt::Debug for Combo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.keys().map(display_code).collect();
        write!(f, "Combo({})", names.join("+"))
    }
}

/// True iff the first key and every used slot's key are currently held
pub fn matches(table: &KeyStateTable, combo: &Combo) -> bool {
    table.is_pressed(combo.first)
        && combo
            .rest
            .iter()
            .flatten()
            .all(|&code| table.is_pressed(code))
}
