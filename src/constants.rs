//! Global constants for keymouse
//!
//! Consolidates timing, device and key-space constants
//! to eliminate magic numbers throughout the codebase.

use std::time::Duration;

// ============================================================================
// Key Space
// ============================================================================

/// Number of key codes in the evdev key space (KEY_CNT in linux/input-event-codes.h)
pub const KEY_CNT: usize = 0x300;

/// Maximum number of keys in one combo
pub const MAX_COMBO_KEYS: usize = 4;

// ============================================================================
// Timing Constants
// ============================================================================

/// Pause between grab attempts while waiting for all keys to be released
pub const GRAB_RETRY_BACKOFF: Duration = Duration::from_millis(1);

/// Default click update interval in milliseconds
pub const DEFAULT_CLICK_INTERVAL_MS: u64 = 25;

/// Default scroll update interval in milliseconds
pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 20;

/// Default motion update interval in milliseconds (lower = smoother)
pub const DEFAULT_MOTION_INTERVAL_MS: u64 = 10;

// ============================================================================
// Devices
// ============================================================================

/// Upper bound on evdev nodes inspected during keyboard auto-detection
pub const DEFAULT_MAX_SCAN: usize = 64;

/// Name of the uinput pointer device
pub const VIRTUAL_DEVICE_NAME: &str = "keymouse virtual pointer";

/// System-wide config location
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keymouse/config.toml";

/// Environment variable overriding the config location
pub const CONFIG_ENV_VAR: &str = "KEYMOUSE_CONFIG";
