//! Pointer output
//!
//! Write-only sink for synthesized pointer events.
//! Events are grouped into frames; `commit()` ends a frame (SYN_REPORT).

pub mod uinput;

use std::io;

pub use uinput::UinputPointer;

use crate::input::keycodes::{BTN_LEFT, BTN_MIDDLE, BTN_RIGHT};

/// Mouse buttons keymouse can press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Middle,
    Right,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Left, Button::Middle, Button::Right];

    /// evdev BTN_* code
    pub const fn code(self) -> u16 {
        match self {
            Button::Left => BTN_LEFT,
            Button::Middle => BTN_MIDDLE,
            Button::Right => BTN_RIGHT,
        }
    }
}

/// Where translated pointer events go
pub trait PointerSink {
    /// Relative motion in pixels (positive x = right, positive y = down)
    fn move_relative(&mut self, dx: i32, dy: i32) -> io::Result<()>;

    /// Scroll steps (positive horizontal = right, positive vertical = up)
    fn scroll(&mut self, horizontal: i32, vertical: i32) -> io::Result<()>;

    fn button(&mut self, button: Button, pressed: bool) -> io::Result<()>;

    /// End the current frame
    fn commit(&mut self) -> io::Result<()>;
}
