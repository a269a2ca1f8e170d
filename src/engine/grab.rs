//! Grab state machine
//!
//! Exclusive consumption of the keyboard is only taken once every physical
//! key is up. Otherwise the keys held while typing the start combo would
//! stay "down" for the rest of the system (and their releases would be
//! swallowed by the grab).

use log::{debug, info, warn};
use std::io;
use std::time::Duration;

use crate::constants::GRAB_RETRY_BACKOFF;
use crate::input::{KeySource, KeyStateTable};

/// Who owns the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabState {
    /// Events pass through to the system
    #[default]
    Idle,
    /// keymouse holds the keyboard; pointer control active
    Grabbed,
}

/// Retry parameters for grab acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirePolicy {
    /// Sleep between attempts while keys are still held
    pub backoff: Duration,
    /// None = retry until the keys are released
    pub max_attempts: Option<u32>,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            backoff: GRAB_RETRY_BACKOFF,
            max_attempts: None,
        }
    }
}

/// Result of an acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Grabbed { attempts: u32 },
    GaveUp { attempts: u32 },
}

#[derive(Debug, Default)]
pub struct GrabMachine {
    state: GrabState,
}

impl GrabMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn is_grabbed(&self) -> bool {
        self.state == GrabState::Grabbed
    }

    /// Grab the keyboard once no physical key is held.
    ///
    /// Grab failures are retried. A key-state query failure is fatal and
    /// leaves the keyboard ungrabbed.
    pub fn acquire<S: KeySource + ?Sized>(
        &mut self,
        source: &mut S,
        table: &mut KeyStateTable,
        policy: &AcquirePolicy,
    ) -> io::Result<Acquire> {
        let mut attempts: u32 = 0;
        loop {
            if policy.max_attempts.is_some_and(|max| attempts >= max) {
                // Best effort: never leave a half-taken grab behind
                if let Err(e) = source.ungrab() {
                    debug!("ungrab after giving up failed: {}", e);
                }
                warn!("Grab not acquired after {} attempts", attempts);
                return Ok(Acquire::GaveUp { attempts });
            }
            attempts += 1;

            if let Err(e) = source.grab() {
                debug!("grab attempt {} failed: {}", attempts, e);
                std::thread::sleep(policy.backoff);
                continue;
            }

            let held = match source.any_physical_key_held() {
                Ok(held) => held,
                Err(e) => {
                    if let Err(ue) = source.ungrab() {
                        debug!("ungrab after key query failure failed: {}", ue);
                    }
                    return Err(e);
                }
            };

            if !held {
                table.reset_all();
                self.state = GrabState::Grabbed;
                info!("Keyboard grabbed (attempt {})", attempts);
                return Ok(Acquire::Grabbed { attempts });
            }

            debug!("keys still held, retrying (attempt {})", attempts);
            source.ungrab()?;
            std::thread::sleep(policy.backoff);
        }
    }

    /// Return the keyboard to the system
    pub fn release<S: KeySource + ?Sized>(
        &mut self,
        source: &mut S,
        table: &mut KeyStateTable,
    ) -> io::Result<()> {
        table.reset_all();
        self.state = GrabState::Idle;
        source.ungrab()?;
        info!("Keyboard released");
        Ok(())
    }
}
