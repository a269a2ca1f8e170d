//! Motion translator
//!
//! Held direction keys + speed tier -> one relative pointer step per tick.

use log::trace;
use std::io;

use super::speed::{axis, select_speed};
use crate::config::Settings;
use crate::input::KeyStateTable;
use crate::pointer::PointerSink;

/// Pixel delta for this tick, or None when the net direction is zero
pub fn motion_delta(table: &KeyStateTable, settings: &Settings) -> Option<(i32, i32)> {
    let b = &settings.bindings;
    let x = axis(table, b.left, b.right);
    let y = axis(table, b.up, b.down);
    if x == 0 && y == 0 {
        return None;
    }

    let speed = select_speed(table, b, &settings.motion_speed);
    let per_tick = speed * settings.motion_interval.as_secs_f64();

    let dx = (f64::from(x) * per_tick).round() as i32;
    let dy = (f64::from(y) * per_tick).round() as i32;
    Some((dx, dy))
}

/// Emit this tick's motion (if any) followed by a frame commit
pub fn run_motion(
    table: &KeyStateTable,
    settings: &Settings,
    sink: &mut impl PointerSink,
) -> io::Result<()> {
    let Some((dx, dy)) = motion_delta(table, settings) else {
        return Ok(());
    };
    trace!("motion dx={} dy={}", dx, dy);
    sink.move_relative(dx, dy)?;
    sink.commit()
}
