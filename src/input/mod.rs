//! Input handling
//!
//! Keyboard side of keymouse.
//! - Key state table and combo matching
//! - evdev keyboard source (device discovery, grab, bounded wait)
//! - evdev keycode constants and key names

pub mod combo;
pub mod evdev;
pub mod keycodes;
pub mod state;

use std::io;
use std::time::Duration;

pub use combo::Combo;
pub use self::evdev::EvdevKeyboard;
pub use state::KeyStateTable;

/// One key transition from the keyboard source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// evdev keycode
    pub code: u16,
    /// true=press (or autorepeat), false=release
    pub pressed: bool,
}

#[cfg(test)]
impl KeyEvent {
    pub const fn press(code: u16) -> Self {
        Self { code, pressed: true }
    }

    pub const fn release(code: u16) -> Self {
        Self {
            code,
            pressed: false,
        }
    }
}

/// Where key events come from
///
/// The engine only needs a bounded wait for the next key event, exclusive
/// consumption control, and a snapshot of what is physically held.
pub trait KeySource {
    /// Wait up to `timeout` for the next key event.
    ///
    /// `Ok(None)` means nothing arrived (timeout or would-block).
    fn wait_event(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;

    /// Take exclusive consumption of the keyboard
    fn grab(&mut self) -> io::Result<()>;

    /// Give exclusive consumption back to the system
    fn ungrab(&mut self) -> io::Result<()>;

    /// True if any key is physically held right now
    fn any_physical_key_held(&mut self) -> io::Result<bool>;
}
