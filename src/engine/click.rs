//! Click translator
//!
//! Mirrors held button keys onto the virtual pointer buttons. Only state
//! changes are emitted, so holding a button key produces exactly one press.

use log::debug;
use std::io;

use crate::config::Bindings;
use crate::input::KeyStateTable;
use crate::pointer::{Button, PointerSink};

/// Last button state sent to the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonEdges {
    left: bool,
    middle: bool,
    right: bool,
}

impl ButtonEdges {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_down(&self, button: Button) -> bool {
        match button {
            Button::Left => self.left,
            Button::Middle => self.middle,
            Button::Right => self.right,
        }
    }

    /// True if any virtual button is currently pressed
    #[cfg(test)]
    pub fn any_down(&self) -> bool {
        self.left || self.middle || self.right
    }

    fn slot(&mut self, button: Button) -> &mut bool {
        match button {
            Button::Left => &mut self.left,
            Button::Middle => &mut self.middle,
            Button::Right => &mut self.right,
        }
    }

    /// Emit button transitions for the current key state; one commit if
    /// anything changed.
    ///
    /// With an empty table this releases every pressed button.
    pub fn run(
        &mut self,
        table: &KeyStateTable,
        bindings: &Bindings,
        sink: &mut impl PointerSink,
    ) -> io::Result<()> {
        let mut changed = false;
        for button in Button::ALL {
            let key = match button {
                Button::Left => bindings.button_left,
                Button::Middle => bindings.button_middle,
                Button::Right => bindings.button_right,
            };
            let held = table.is_pressed(key);
            let slot = self.slot(button);
            if *slot == held {
                continue;
            }
            debug!("button {:?} {}", button, if held { "down" } else { "up" });
            sink.button(button, held)?;
            *slot = held;
            changed = true;
        }

        if changed {
            sink.commit()?;
        }
        Ok(())
    }
}
