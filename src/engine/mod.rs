//! Remapping engine
//!
//! Single-threaded event loop tying the keyboard source, the grab state
//! machine and the pointer translators together.
//!
//! Per iteration:
//! 1. wait (bounded by the smallest cadence) for one key event
//! 2. update the key state table, then check start/kill/exit combos
//! 3. while grabbed, run whichever translators are due

pub mod click;
pub mod grab;
pub mod motion;
pub mod scheduler;
pub mod scroll;
pub mod speed;

#[cfg(test)]
pub mod mock;

use log::{debug, info, warn};
use std::io;
use std::time::Instant;
use thiserror::Error;

use crate::config::Settings;
use crate::input::{KeyEvent, KeySource, KeyStateTable};
use crate::pointer::PointerSink;

pub use grab::{AcquirePolicy, GrabState};

use click::ButtonEdges;
use grab::{Acquire, GrabMachine};
use scheduler::TickScheduler;
use scroll::ScrollCarry;

/// Fatal engine failures. The keyboard is always released before these
/// are returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("keyboard read failed")]
    Source(#[source] io::Error),
    #[error("pointer write failed")]
    Sink(#[source] io::Error),
}

pub struct Engine<'a, S: KeySource, P: PointerSink> {
    settings: &'a Settings,
    source: S,
    sink: P,
    table: KeyStateTable,
    grab: GrabMachine,
    scheduler: TickScheduler,
    scroll: ScrollCarry,
    buttons: ButtonEdges,
    terminate: bool,
}

impl<'a, S: KeySource, P: PointerSink> Engine<'a, S, P> {
    pub fn new(settings: &'a Settings, source: S, sink: P) -> Self {
        Self {
            settings,
            source,
            sink,
            table: KeyStateTable::new(),
            grab: GrabMachine::new(),
            scheduler: TickScheduler::new(settings),
            scroll: ScrollCarry::new(),
            buttons: ButtonEdges::new(),
            terminate: false,
        }
    }
}

#[cfg(test)]
impl<S: KeySource, P: PointerSink> Engine<'_, S, P> {
    pub fn state(&self) -> GrabState {
        self.grab.state()
    }

    pub fn table(&self) -> &KeyStateTable {
        &self.table
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }
}

impl<'a, S: KeySource, P: PointerSink> Engine<'a, S, P> {
    /// Run until the kill combo (Ok) or a fatal I/O error (Err)
    pub fn run(&mut self) -> Result<(), EngineError> {
        let result = self.run_loop();
        if self.grab.is_grabbed() {
            if let Err(e) = self.leave_grab() {
                warn!("Failed to release keyboard cleanly: {}", e);
            }
        }
        result
    }

    fn run_loop(&mut self) -> Result<(), EngineError> {
        while !self.terminate {
            self.step()?;
        }
        info!("Kill combo received, shutting down");
        Ok(())
    }

    /// One loop iteration: wait, update state, translate
    pub fn step(&mut self) -> Result<(), EngineError> {
        let timeout = self.settings.min_interval();
        if let Some(event) = self.source.wait_event(timeout).map_err(EngineError::Source)? {
            self.handle_key(event)?;
        }

        if self.grab.is_grabbed() {
            self.tick(Instant::now())?;
        }
        Ok(())
    }

    fn handle_key(&mut self, event: KeyEvent) -> Result<(), EngineError> {
        if !self.table.set(event.code, event.pressed) {
            debug!("ignoring out-of-range key code {}", event.code);
            return Ok(());
        }
        // Combos only fire on the press that completes them
        if !event.pressed {
            return Ok(());
        }

        let settings = self.settings;
        let bindings = &settings.bindings;
        match self.grab.state() {
            GrabState::Idle => {
                if bindings.start.is_satisfied(&self.table) {
                    self.enter_grab()?;
                }
            }
            GrabState::Grabbed => {
                if bindings.kill.is_satisfied(&self.table) {
                    self.leave_grab()?;
                    self.terminate = true;
                } else if bindings.exit.is_satisfied(&self.table) {
                    self.leave_grab()?;
                }
            }
        }
        Ok(())
    }

    fn enter_grab(&mut self) -> Result<(), EngineError> {
        info!("Start combo pressed, waiting for keys to be released");
        let outcome = self
            .grab
            .acquire(&mut self.source, &mut self.table, &self.settings.acquire)
            .map_err(EngineError::Source)?;

        match outcome {
            Acquire::Grabbed { attempts } => {
                debug!("grab took {} attempt(s)", attempts);
            }
            Acquire::GaveUp { .. } => {
                warn!("Staying idle: keys were never released");
            }
        }
        Ok(())
    }

    /// Ungrab, then release any virtual buttons still down.
    ///
    /// Both steps always run; the ungrab error wins if both fail.
    fn leave_grab(&mut self) -> Result<(), EngineError> {
        let released = self.grab.release(&mut self.source, &mut self.table);
        let buttons = self
            .buttons
            .run(&self.table, &self.settings.bindings, &mut self.sink);
        released.map_err(EngineError::Source)?;
        buttons.map_err(EngineError::Sink)
    }

    fn tick(&mut self, now: Instant) -> Result<(), EngineError> {
        let due = self.scheduler.take_due(now);
        let settings = self.settings;

        if due.click {
            self.buttons
                .run(&self.table, &settings.bindings, &mut self.sink)
                .map_err(EngineError::Sink)?;
        }
        if due.scroll {
            self.scroll
                .run(&self.table, settings, &mut self.sink)
                .map_err(EngineError::Sink)?;
        }
        if due.motion {
            motion::run_motion(&self.table, settings, &mut self.sink)
                .map_err(EngineError::Sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keycodes::*;
    use crate::input::Combo;
    use crate::pointer::Button;
    use mock::{tap, RecordingSink, ScriptedSource, Step};
    use std::time::Duration;

    fn press(code: u16) -> Step {
        Step::Key(KeyEvent::press(code))
    }

    fn release(code: u16) -> Step {
        Step::Key(KeyEvent::release(code))
    }

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.acquire.backoff = Duration::ZERO;
        settings
    }

    fn start_combo() -> Vec<Step> {
        vec![
            press(KEY_TAB),
            press(KEY_LEFTMETA),
            release(KEY_TAB),
            release(KEY_LEFTMETA),
        ]
    }

    fn step_all<S: KeySource, P: PointerSink>(engine: &mut Engine<'_, S, P>, n: usize) {
        for _ in 0..n {
            engine.step().unwrap();
        }
    }

    #[test]
    fn test_start_combo_grabs_with_cleared_table() {
        let settings = test_settings();
        let mut source = ScriptedSource::with_script(start_combo());
        // Combo keys are still down on the first poll
        source.held_polls = [true].into();
        let mut engine = Engine::new(&settings, source, RecordingSink::default());

        engine.step().unwrap();
        assert_eq!(engine.state(), GrabState::Idle);

        engine.step().unwrap();
        assert_eq!(engine.state(), GrabState::Grabbed);
        assert!(!engine.table().any_pressed());
        assert!(engine.source().grabbed);
        assert_eq!(engine.source().polls, 2);

        // Releases of the combo keys are harmless once grabbed
        step_all(&mut engine, 2);
        assert_eq!(engine.state(), GrabState::Grabbed);
        assert!(engine.sink().events.is_empty());
    }

    #[test]
    fn test_acquisition_completes_after_n_polls() {
        let settings = test_settings();
        let mut source = ScriptedSource::with_script(start_combo());
        source.held_polls = [true; 5].into();
        let mut engine = Engine::new(&settings, source, RecordingSink::default());

        step_all(&mut engine, 2);
        assert_eq!(engine.state(), GrabState::Grabbed);
        assert_eq!(engine.source().polls, 6);
        assert_eq!(engine.source().ungrab_calls, 5);
    }

    #[test]
    fn test_end_to_end_session() {
        let settings = test_settings();
        let mut script = start_combo();
        script.extend([press(KEY_K), Step::Timeout, Step::Timeout, release(KEY_K)]);
        script.extend(tap(&[KEY_SPACE]));
        script.extend(start_combo());
        script.extend([press(KEY_LEFTSHIFT), press(KEY_LEFTCTRL), press(KEY_X)]);
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        engine.run().unwrap();

        assert!(engine.is_terminated());
        assert_eq!(engine.state(), GrabState::Idle);
        assert!(!engine.source().grabbed);
        assert_eq!(engine.source().grab_calls, 2);

        // 800 px/s * 10 ms upward
        let moves = engine.sink().moves();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|&m| m == (0, -8)));
    }

    #[test]
    fn test_exit_returns_to_idle() {
        let settings = test_settings();
        let mut script = start_combo();
        script.extend(tap(&[KEY_SPACE]));
        let len = script.len();
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        step_all(&mut engine, len);
        assert_eq!(engine.state(), GrabState::Idle);
        assert!(!engine.source().grabbed);
        assert!(!engine.is_terminated());
        assert!(!engine.table().any_pressed());
    }

    #[test]
    fn test_exit_and_kill_ignored_while_idle() {
        let settings = test_settings();
        let mut script = tap(&[KEY_SPACE]);
        script.extend(tap(&[KEY_LEFTSHIFT, KEY_LEFTCTRL, KEY_X]));
        let len = script.len();
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        step_all(&mut engine, len);
        assert_eq!(engine.state(), GrabState::Idle);
        assert!(!engine.is_terminated());
        assert_eq!(engine.source().grab_calls, 0);
        assert!(engine.sink().events.is_empty());
    }

    #[test]
    fn test_kill_checked_before_exit() {
        let mut settings = test_settings();
        settings.bindings.exit = Combo::single(KEY_X);
        settings.bindings.kill = Combo::new(&[KEY_LEFTCTRL, KEY_X]).unwrap();
        let mut script = start_combo();
        script.extend([press(KEY_LEFTCTRL), press(KEY_X)]);
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        engine.run().unwrap();
        assert!(engine.is_terminated());
        assert!(!engine.source().grabbed);
    }

    #[test]
    fn test_held_button_released_on_exit() {
        let settings = test_settings();
        let mut script = start_combo();
        // Click cadence is 25 ms; four 10 ms waits cover it
        script.extend([press(KEY_S), Step::Timeout, Step::Timeout, Step::Timeout]);
        script.extend([Step::Timeout, press(KEY_SPACE)]);
        let len = script.len();
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        step_all(&mut engine, len);
        assert_eq!(engine.state(), GrabState::Idle);
        assert_eq!(
            engine.sink().buttons(),
            vec![(Button::Left, true), (Button::Left, false)]
        );
    }

    #[test]
    fn test_source_error_releases_grab() {
        let settings = test_settings();
        let mut script = start_combo();
        script.push(Step::Fail);
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Source(_)));
        assert!(!engine.source().grabbed);
        assert_eq!(engine.state(), GrabState::Idle);
    }

    #[test]
    fn test_sink_error_releases_grab() {
        let settings = test_settings();
        let mut script = start_combo();
        script.extend([press(KEY_K), Step::Timeout, Step::Timeout]);
        let sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let mut engine = Engine::new(&settings, ScriptedSource::with_script(script), sink);

        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Sink(_)));
        assert!(!engine.source().grabbed);
        assert_eq!(engine.state(), GrabState::Idle);
    }

    #[test]
    fn test_scroll_carry_survives_regrab() {
        let mut settings = test_settings();
        // 2.5 steps/s * 20 ms = 0.05 steps per tick: never a whole step here
        settings.scroll_speed.normal = 2.5;
        let mut script = start_combo();
        script.extend([press(KEY_U), Step::Timeout, Step::Timeout, Step::Timeout]);
        script.push(release(KEY_U));
        let first_session = script.len();
        script.extend(tap(&[KEY_SPACE]));
        script.extend(start_combo());
        let len = script.len();
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script(script),
            RecordingSink::default(),
        );

        step_all(&mut engine, first_session);
        let before = engine.scroll.remainder();
        assert!(before.1 > 0.0, "carry {:?}", before);

        step_all(&mut engine, len - first_session);
        assert_eq!(engine.state(), GrabState::Grabbed);
        assert_eq!(engine.source().grab_calls, 2);
        assert_eq!(engine.scroll.remainder(), before);
        assert!(engine.sink().events.is_empty());
    }

    #[test]
    fn test_wait_bounded_by_smallest_interval() {
        let mut settings = test_settings();
        settings.motion_interval = Duration::from_millis(30);
        settings.scroll_interval = Duration::from_millis(7);
        settings.click_interval = Duration::from_millis(12);
        let mut engine = Engine::new(
            &settings,
            ScriptedSource::with_script([Step::Timeout]),
            RecordingSink::default(),
        );

        engine.step().unwrap();
        assert_eq!(engine.source().last_timeout, Some(Duration::from_millis(7)));
    }

    #[test]
    fn test_bounded_acquire_stays_idle() {
        let mut settings = test_settings();
        settings.acquire.max_attempts = Some(2);
        let mut source = ScriptedSource::with_script(start_combo());
        source.held_polls = [true; 4].into();
        let mut engine = Engine::new(&settings, source, RecordingSink::default());

        step_all(&mut engine, 2);
        assert_eq!(engine.state(), GrabState::Idle);
        assert!(!engine.source().grabbed);
        assert_eq!(engine.source().polls, 2);
    }
}
