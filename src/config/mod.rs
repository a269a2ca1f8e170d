//! Configuration file management
//!
//! Loads the TOML configuration file once at startup and resolves it into
//! immutable [`Settings`] (key codes, speeds, intervals) for the engine.
//! Default config path: ~/.config/keymouse/config.toml

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_CLICK_INTERVAL_MS, DEFAULT_MAX_SCAN, DEFAULT_MOTION_INTERVAL_MS,
    DEFAULT_SCROLL_INTERVAL_MS, GRAB_RETRY_BACKOFF, KEY_CNT, SYSTEM_CONFIG_PATH,
};
use crate::engine::AcquirePolicy;
use crate::input::keycodes::{self, *};
use crate::input::Combo;

/// Application settings as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyboard device settings
    pub device: DeviceConfig,
    /// Keybind settings
    pub keybinds: KeybindConfig,
    /// Pointer motion settings
    pub motion: MotionConfig,
    /// Scroll settings
    pub scroll: ScrollConfig,
    /// Button settings
    pub click: ClickConfig,
    /// Keyboard grab settings
    pub grab: GrabConfig,
}

/// Keyboard device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Keyboard device path, e.g. "/dev/input/by-id/usb-Logitech_USB_Keyboard-event-kbd"
    /// Empty = auto-detect (not always reliable)
    pub path: String,
    /// Number of /dev/input/eventN nodes inspected during auto-detection
    pub max_scan: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_scan: DEFAULT_MAX_SCAN,
        }
    }
}

/// Keybind settings
///
/// Keys are evdev key names ("k", "leftctrl", "space").
/// Combos accept a single key ("space") or several (["tab", "leftmeta"]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    /// Start controlling the pointer (default: tab+leftmeta)
    #[serde(deserialize_with = "deserialize_keybind")]
    pub start: Vec<String>,
    /// Stop controlling the pointer, keep running (default: space)
    #[serde(deserialize_with = "deserialize_keybind")]
    pub exit: Vec<String>,
    /// Terminate the program (default: leftshift+leftctrl+x)
    #[serde(deserialize_with = "deserialize_keybind")]
    pub kill: Vec<String>,

    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,

    pub button_left: String,
    pub button_middle: String,
    pub button_right: String,

    pub scroll_up: String,
    pub scroll_down: String,
    pub scroll_left: String,
    pub scroll_right: String,

    /// Speed modifiers (apply to motion and scroll)
    pub slower_mod: String,
    pub slow_mod: String,
    pub fast_mod: String,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        let name = |code: u16| keycodes::display_code(code);
        Self {
            start: vec![name(KEY_TAB), name(KEY_LEFTMETA)],
            exit: vec![name(KEY_SPACE)],
            kill: vec![name(KEY_LEFTSHIFT), name(KEY_LEFTCTRL), name(KEY_X)],
            up: name(KEY_K),
            down: name(KEY_J),
            left: name(KEY_H),
            right: name(KEY_L),
            button_left: name(KEY_S),
            button_middle: name(KEY_E),
            button_right: name(KEY_F),
            scroll_up: name(KEY_U),
            scroll_down: name(KEY_D),
            scroll_left: name(KEY_B),
            scroll_right: name(KEY_W),
            slower_mod: name(KEY_LEFTCTRL),
            slow_mod: name(KEY_LEFTSHIFT),
            fast_mod: name(KEY_LEFTALT),
        }
    }
}

/// Pointer motion settings (speeds in pixels per second)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Update interval in milliseconds (lower = smoother)
    pub interval_ms: u64,
    pub slower: f64,
    pub slow: f64,
    pub normal: f64,
    pub fast: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_MOTION_INTERVAL_MS,
            slower: 100.0,
            slow: 400.0,
            normal: 800.0,
            fast: 1200.0,
        }
    }
}

/// Scroll settings (speeds in scroll steps per second)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Update interval in milliseconds
    pub interval_ms: u64,
    pub slower: f64,
    pub slow: f64,
    pub normal: f64,
    pub fast: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SCROLL_INTERVAL_MS,
            slower: 8.0,
            slow: 12.0,
            normal: 20.0,
            fast: 30.0,
        }
    }
}

/// Button settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Minimum delay between button updates in milliseconds
    pub interval_ms: u64,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_CLICK_INTERVAL_MS,
        }
    }
}

/// Keyboard grab settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Pause between attempts while waiting for all keys to be released (ms)
    pub retry_backoff_ms: u64,
    /// Give up after this many attempts (unset = retry forever)
    pub max_attempts: Option<u32>,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ms: GRAB_RETRY_BACKOFF.as_millis() as u64,
            max_attempts: None,
        }
    }
}

/// Keybind deserializer: accepts string or array
fn deserialize_keybind<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeybindVisitor;

    impl<'de> Visitor<'de> for KeybindVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeybindVisitor)
}

// ============================================================================
// Resolved settings
// ============================================================================

/// Speed for each modifier tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedTiers {
    pub slower: f64,
    pub slow: f64,
    pub normal: f64,
    pub fast: f64,
}

/// Key bindings resolved to evdev codes
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings {
    pub start: Combo,
    pub exit: Combo,
    pub kill: Combo,

    pub up: u16,
    pub down: u16,
    pub left: u16,
    pub right: u16,

    pub button_left: u16,
    pub button_middle: u16,
    pub button_right: u16,

    pub scroll_up: u16,
    pub scroll_down: u16,
    pub scroll_left: u16,
    pub scroll_right: u16,

    pub slower_mod: u16,
    pub slow_mod: u16,
    pub fast_mod: u16,
}

/// Immutable runtime settings, built once at startup and passed by reference
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bindings: Bindings,
    /// Pixels per second
    pub motion_speed: SpeedTiers,
    /// Scroll steps per second
    pub scroll_speed: SpeedTiers,
    pub motion_interval: Duration,
    pub scroll_interval: Duration,
    pub click_interval: Duration,
    pub acquire: AcquirePolicy,
}

impl Settings {
    /// Loop wait timeout: the smallest cadence
    pub fn min_interval(&self) -> Duration {
        self.motion_interval
            .min(self.scroll_interval)
            .min(self.click_interval)
    }
}

/// Built-in defaults, resolved the same way a config file is
#[cfg(test)]
impl Default for Settings {
    fn default() -> Self {
        Config::default()
            .resolve()
            .expect("built-in config must resolve")
    }
}

fn resolve_key(field: &str, name: &str) -> Result<u16> {
    let code = keycodes::code_for_name(name)
        .ok_or_else(|| anyhow!("keybinds.{}: unknown key name {:?}", field, name))?;
    if code as usize >= KEY_CNT {
        bail!(
            "keybinds.{}: key code {} is outside the evdev key space (max {})",
            field,
            code,
            KEY_CNT - 1
        );
    }
    Ok(code)
}

fn resolve_combo(field: &str, names: &[String]) -> Result<Combo> {
    let codes = names
        .iter()
        .map(|name| resolve_key(field, name))
        .collect::<Result<Vec<u16>>>()?;
    Combo::new(&codes).with_context(|| format!("keybinds.{}", field))
}

fn resolve_interval(field: &str, ms: u64) -> Result<Duration> {
    if ms == 0 {
        bail!("{}.interval_ms must be greater than zero", field);
    }
    Ok(Duration::from_millis(ms))
}

fn resolve_tiers(field: &str, tiers: [f64; 4]) -> Result<SpeedTiers> {
    if let Some(bad) = tiers.iter().find(|s| !s.is_finite() || **s < 0.0) {
        bail!("{}: speed {} must be a non-negative number", field, bad);
    }
    let [slower, slow, normal, fast] = tiers;
    Ok(SpeedTiers {
        slower,
        slow,
        normal,
        fast,
    })
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. KEYMOUSE_CONFIG environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/keymouse/config.toml
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        // 3. System config: /etc/keymouse/config.toml
        let system_config = Path::new(SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. KEYMOUSE_CONFIG environment variable
    /// 2. ~/.config/keymouse/config.toml (user config)
    /// 3. /etc/keymouse/config.toml (system config)
    /// 4. Built-in defaults
    ///
    /// A config file that exists but cannot be parsed is an error.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                info!("Loaded config: {}", path.display());
                Ok(config)
            }
            None => {
                info!("Using built-in default config");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve key names and validate values into runtime settings
    pub fn resolve(&self) -> Result<Settings> {
        let kb = &self.keybinds;
        let bindings = Bindings {
            start: resolve_combo("start", &kb.start)?,
            exit: resolve_combo("exit", &kb.exit)?,
            kill: resolve_combo("kill", &kb.kill)?,
            up: resolve_key("up", &kb.up)?,
            down: resolve_key("down", &kb.down)?,
            left: resolve_key("left", &kb.left)?,
            right: resolve_key("right", &kb.right)?,
            button_left: resolve_key("button_left", &kb.button_left)?,
            button_middle: resolve_key("button_middle", &kb.button_middle)?,
            button_right: resolve_key("button_right", &kb.button_right)?,
            scroll_up: resolve_key("scroll_up", &kb.scroll_up)?,
            scroll_down: resolve_key("scroll_down", &kb.scroll_down)?,
            scroll_left: resolve_key("scroll_left", &kb.scroll_left)?,
            scroll_right: resolve_key("scroll_right", &kb.scroll_right)?,
            slower_mod: resolve_key("slower_mod", &kb.slower_mod)?,
            slow_mod: resolve_key("slow_mod", &kb.slow_mod)?,
            fast_mod: resolve_key("fast_mod", &kb.fast_mod)?,
        };

        let m = &self.motion;
        let s = &self.scroll;

        if self.grab.max_attempts == Some(0) {
            bail!("grab.max_attempts must be at least 1 (omit it to retry forever)");
        }

        Ok(Settings {
            bindings,
            motion_speed: resolve_tiers("motion", [m.slower, m.slow, m.normal, m.fast])?,
            scroll_speed: resolve_tiers("scroll", [s.slower, s.slow, s.normal, s.fast])?,
            motion_interval: resolve_interval("motion", m.interval_ms)?,
            scroll_interval: resolve_interval("scroll", s.interval_ms)?,
            click_interval: resolve_interval("click", self.click.interval_ms)?,
            acquire: AcquirePolicy {
                backoff: Duration::from_millis(self.grab.retry_backoff_ms),
                max_attempts: self.grab.max_attempts,
            },
        })
    }

    /// Render the default config as TOML with a short header
    pub fn default_toml() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        Ok(format!(
            "# keymouse configuration\n\
             #\n\
             # Key names are evdev names without the KEY_ prefix (\"k\", \"leftctrl\").\n\
             # Unnamed keys can be given as \"code:N\".\n\
             # Speeds: motion in pixels/second, scroll in steps/second.\n\
             # Speed modifier precedence: fast > slow > slower.\n\n{}",
            body
        ))
    }

    /// Write the default config to `path`, creating parent directories
    pub fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, Self::default_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keymouse").join("config.toml"))
}
