//! In-memory keyboard and pointer for engine tests

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::input::{KeyEvent, KeySource};
use crate::pointer::{Button, PointerSink};

/// One scripted `wait_event` outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Key(KeyEvent),
    /// Nothing arrives; sleeps for the full timeout like a real poll
    Timeout,
    /// Unrecoverable read error
    Fail,
}

/// Keyboard that replays a script.
///
/// Running past the end of the script is an `UnexpectedEof` read error,
/// so a test that forgets its kill combo ends instead of spinning.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pub script: VecDeque<Step>,
    /// Answers to `any_physical_key_held`; false once exhausted
    pub held_polls: VecDeque<bool>,
    /// Fail the first N grab calls
    pub fail_grabs: u32,
    /// Every `any_physical_key_held` call fails
    pub fail_polls: bool,

    pub grabbed: bool,
    pub grab_calls: u32,
    pub ungrab_calls: u32,
    pub polls: u32,
    /// Timeout passed to the most recent `wait_event`
    pub last_timeout: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Press then release each key, in order
pub fn tap(codes: &[u16]) -> Vec<Step> {
    let mut steps: Vec<Step> = codes.iter().map(|&c| Step::Key(KeyEvent::press(c))).collect();
    steps.extend(codes.iter().map(|&c| Step::Key(KeyEvent::release(c))));
    steps
}

impl KeySource for ScriptedSource {
    fn wait_event(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        self.last_timeout = Some(timeout);
        match self.script.pop_front() {
            Some(Step::Key(event)) => Ok(Some(event)),
            Some(Step::Timeout) => {
                std::thread::sleep(timeout);
                Ok(None)
            }
            Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::Other, "device gone")),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "script exhausted",
            )),
        }
    }

    fn grab(&mut self) -> io::Result<()> {
        self.grab_calls += 1;
        if self.fail_grabs > 0 {
            self.fail_grabs -= 1;
            return Err(io::Error::from_raw_os_error(libc::EBUSY));
        }
        self.grabbed = true;
        Ok(())
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.ungrab_calls += 1;
        self.grabbed = false;
        Ok(())
    }

    fn any_physical_key_held(&mut self) -> io::Result<bool> {
        self.polls += 1;
        if self.fail_polls {
            return Err(io::Error::new(io::ErrorKind::Other, "EVIOCGKEY failed"));
        }
        Ok(self.held_polls.pop_front().unwrap_or(false))
    }
}

/// What a `RecordingSink` received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Move(i32, i32),
    Scroll(i32, i32),
    Button(Button, bool),
    Commit,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Recorded>,
    /// Every write fails
    pub fail: bool,
}

impl RecordingSink {
    fn record(&mut self, event: Recorded) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "uinput closed"));
        }
        self.events.push(event);
        Ok(())
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Recorded::Move(dx, dy) => Some((dx, dy)),
                _ => None,
            })
            .collect()
    }

    pub fn buttons(&self) -> Vec<(Button, bool)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Recorded::Button(b, pressed) => Some((b, pressed)),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Recorded::Commit)
            .count()
    }
}

impl PointerSink for RecordingSink {
    fn move_relative(&mut self, dx: i32, dy: i32) -> io::Result<()> {
        self.record(Recorded::Move(dx, dy))
    }

    fn scroll(&mut self, horizontal: i32, vertical: i32) -> io::Result<()> {
        self.record(Recorded::Scroll(horizontal, vertical))
    }

    fn button(&mut self, button: Button, pressed: bool) -> io::Result<()> {
        self.record(Recorded::Button(button, pressed))
    }

    fn commit(&mut self) -> io::Result<()> {
        self.record(Recorded::Commit)
    }
}
