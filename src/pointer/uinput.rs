//! uinput virtual pointer
//!
//! Creates a relative pointer device (REL_X/Y, wheel, three buttons).
//! Events are buffered per frame and written in one batch on `commit()`;
//! the evdev crate terminates each batch with SYN_REPORT.

use ::evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use ::evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use anyhow::{Context, Result};
use log::{info, trace};
use std::io;

use super::{Button, PointerSink};

/// Pointer device backed by /dev/uinput
pub struct UinputPointer {
    device: VirtualDevice,
    frame: Vec<InputEvent>,
}

impl UinputPointer {
    pub fn new(name: &str) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for button in Button::ALL {
            keys.insert(Key::new(button.code()));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);
        axes.insert(RelativeAxisType::REL_HWHEEL);

        let device = VirtualDeviceBuilder::new()
            .context("Failed to open /dev/uinput (is the uinput module loaded?)")?
            .name(name)
            .with_keys(&keys)
            .context("Failed to set button capabilities")?
            .with_relative_axes(&axes)
            .context("Failed to set relative axis capabilities")?
            .build()
            .context("Failed to build uinput device")?;

        info!("Virtual pointer created: {}", name);

        Ok(Self {
            device,
            frame: Vec::with_capacity(8),
        })
    }

    fn push_relative(&mut self, axis: RelativeAxisType, value: i32) {
        if value != 0 {
            self.frame
                .push(InputEvent::new(EventType::RELATIVE, axis.0, value));
        }
    }
}

impl PointerSink for UinputPointer {
    fn move_relative(&mut self, dx: i32, dy: i32) -> io::Result<()> {
        self.push_relative(RelativeAxisType::REL_X, dx);
        self.push_relative(RelativeAxisType::REL_Y, dy);
        Ok(())
    }

    fn scroll(&mut self, horizontal: i32, vertical: i32) -> io::Result<()> {
        self.push_relative(RelativeAxisType::REL_HWHEEL, horizontal);
        self.push_relative(RelativeAxisType::REL_WHEEL, vertical);
        Ok(())
    }

    fn button(&mut self, button: Button, pressed: bool) -> io::Result<()> {
        self.frame.push(InputEvent::new(
            EventType::KEY,
            button.code(),
            i32::from(pressed),
        ));
        Ok(())
    }

    fn commit(&mut self) -> io::Result<()> {
        if self.frame.is_empty() {
            return Ok(());
        }
        trace!("uinput frame: {} events", self.frame.len());
        let result = self.device.emit(&self.frame);
        self.frame.clear();
        result
    }
}
