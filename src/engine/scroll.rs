//! Scroll translator
//!
//! Scroll speeds rarely divide into whole steps per tick, so each axis keeps
//! the fractional remainder and only whole steps are emitted. The long-run
//! emitted rate converges to the configured speed.

use log::trace;
use std::io;

use super::speed::{axis, select_speed};
use crate::config::Settings;
use crate::input::KeyStateTable;
use crate::pointer::PointerSink;

/// Fractional scroll steps not yet emitted
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollCarry {
    horizontal: f64,
    vertical: f64,
}

impl ScrollCarry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining (horizontal, vertical) fractions
    pub fn remainder(&self) -> (f64, f64) {
        (self.horizontal, self.vertical)
    }

    /// Accumulate one tick and take the whole steps out.
    ///
    /// None when no scroll key direction is held (the carry is untouched).
    pub fn step(&mut self, table: &KeyStateTable, settings: &Settings) -> Option<(i32, i32)> {
        let b = &settings.bindings;
        // Wheel up is positive
        let x = axis(table, b.scroll_left, b.scroll_right);
        let y = axis(table, b.scroll_down, b.scroll_up);
        if x == 0 && y == 0 {
            return None;
        }

        let speed = select_speed(table, b, &settings.scroll_speed);
        let per_tick = speed * settings.scroll_interval.as_secs_f64();

        self.horizontal += f64::from(x) * per_tick;
        self.vertical += f64::from(y) * per_tick;

        let h = take_whole(&mut self.horizontal);
        let v = take_whole(&mut self.vertical);
        Some((h, v))
    }

    /// Emit this tick's whole steps; one frame commit if any axis moved
    pub fn run(
        &mut self,
        table: &KeyStateTable,
        settings: &Settings,
        sink: &mut impl PointerSink,
    ) -> io::Result<()> {
        let Some((h, v)) = self.step(table, settings) else {
            return Ok(());
        };
        if h == 0 && v == 0 {
            return Ok(());
        }
        trace!("scroll h={} v={} carry={:?}", h, v, self.remainder());
        sink.scroll(h, v)?;
        sink.commit()
    }
}

/// Truncate toward zero, leaving the fraction behind
fn take_whole(carry: &mut f64) -> i32 {
    let whole = carry.trunc();
    *carry -= whole;
    whole as i32
}
