//! Tick scheduler
//!
//! Each translator runs on its own cadence. The event loop wakes at least
//! every `min_interval` and asks which cadences are due.

use std::time::{Duration, Instant};

use crate::config::Settings;

/// One subsystem's interval and last run time
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Due when it never ran or strictly more than `interval` has elapsed
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    /// If due, stamp `now` and return true
    pub fn take(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.last_run = Some(now);
        true
    }
}

/// Which subsystems should run on this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub click: bool,
    pub scroll: bool,
    pub motion: bool,
}

#[cfg(test)]
impl Due {
    pub fn any(&self) -> bool {
        self.click || self.scroll || self.motion
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    click: Cadence,
    scroll: Cadence,
    motion: Cadence,
}

impl TickScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            click: Cadence::new(settings.click_interval),
            scroll: Cadence::new(settings.scroll_interval),
            motion: Cadence::new(settings.motion_interval),
        }
    }

    /// Collect due subsystems and mark them as run at `now`
    pub fn take_due(&mut self, now: Instant) -> Due {
        Due {
            click: self.click.take(now),
            scroll: self.scroll.take(now),
            motion: self.motion.take(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_tick_runs_everything() {
        let mut scheduler = TickScheduler::new(&Settings::default());
        let due = scheduler.take_due(Instant::now());
        assert_eq!(
            due,
            Due {
                click: true,
                scroll: true,
                motion: true
            }
        );
    }

    #[test]
    fn test_due_requires_strictly_more_than_interval() {
        let start = Instant::now();
        let mut cadence = Cadence::new(ms(10));
        assert!(cadence.take(start));

        assert!(!cadence.take(start + ms(5)));
        assert!(!cadence.take(start + ms(10)));
        assert!(cadence.take(start + ms(11)));

        // Stamped at 11 ms, not at 10 ms
        assert!(!cadence.take(start + ms(21)));
        assert!(cadence.take(start + ms(22)));
    }

    #[test]
    fn test_independent_cadences() {
        // click 25 ms, scroll 20 ms, motion 10 ms
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(&Settings::default());
        scheduler.take_due(start);

        let due = scheduler.take_due(start + ms(11));
        assert_eq!(
            due,
            Due {
                click: false,
                scroll: false,
                motion: true
            }
        );

        let due = scheduler.take_due(start + ms(21));
        assert!(due.scroll);
        assert!(!due.click);
        assert!(!due.motion);

        let due = scheduler.take_due(start + ms(26));
        assert!(due.click);
        assert!(!due.scroll);

        assert!(!scheduler.take_due(start + ms(27)).any());
    }
}
