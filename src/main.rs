//! keymouse - drive the mouse pointer from the keyboard
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Event Loop                  │
//! ├──────────────────────────────────────────┤
//! │  Keyboard (evdev)  →  Key State Table    │
//! │                          ↓               │
//! │       Grab State Machine / Combos        │
//! │                          ↓               │
//! │   Click / Scroll / Motion Translators    │
//! │                          ↓               │
//! │         Virtual Pointer (uinput)         │
//! └──────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod engine;
mod input;
mod pointer;

use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use input::EvdevKeyboard;
use pointer::UinputPointer;

fn print_help() {
    println!(
        r#"keymouse {} - control the mouse pointer with the keyboard

USAGE:
    keymouse [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --init-config           Generate the default config file
    -f, --force             Overwrite an existing config file
    --device=PATH           Keyboard device to use (e.g. /dev/input/event3)
    --list-devices          List input devices and exit

DEFAULT KEYS:
    Tab+LeftMeta            Take over the keyboard (pointer mode)
    Space                   Give the keyboard back
    LeftShift+LeftCtrl+X    Quit
    K / J / H / L           Move up / down / left / right
    S / E / F               Left / middle / right button
    U / D / B / W           Scroll up / down / left / right
    LeftCtrl / LeftShift / LeftAlt   Slower / slow / fast

EXAMPLES:
    sudo keymouse                          Auto-detect the keyboard
    sudo keymouse --device=/dev/input/event3
    keymouse --init-config                 Write ~/.config/keymouse/config.toml

CONFIG FILE:
    $KEYMOUSE_CONFIG, ~/.config/keymouse/config.toml or /etc/keymouse/config.toml

Requires read access to /dev/input/event* and write access to /dev/uinput
(run as root or join the input group).
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Print every candidate device and whether it looks like a keyboard
fn list_devices(max_scan: usize) {
    let devices = EvdevKeyboard::list_devices(max_scan);
    if devices.is_empty() {
        println!("No input devices found (permission denied or none present).");
        return;
    }
    for dev in devices {
        println!(
            "{}  {}{}",
            dev.path.display(),
            dev.name,
            if dev.is_keyboard { "  [keyboard]" } else { "" }
        );
    }
}

/// Write the default config, refusing to overwrite without --force
fn init_config(force: bool) -> Result<()> {
    let path = config::default_config_path()
        .context("Could not determine config directory (is $HOME set?)")?;

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    config::Config::write_default_config(&path)?;
    println!("Config file generated:");
    println!("  Path: {}", path.display());
    Ok(())
}

/// --device wins over device.path, which wins over auto-detection
fn open_keyboard(device_arg: Option<&str>, cfg: &config::DeviceConfig) -> Result<EvdevKeyboard> {
    if let Some(path) = device_arg {
        return EvdevKeyboard::open(Path::new(path));
    }
    if !cfg.path.is_empty() {
        return EvdevKeyboard::open(Path::new(&cfg.path))
            .context("Check device.path in the config file");
    }
    EvdevKeyboard::autodetect(cfg.max_scan)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("keymouse {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Config file generation mode
    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        return init_config(force);
    }

    info!("keymouse starting...");

    let cfg = config::Config::load()?;

    if args.iter().any(|a| a == "--list-devices") {
        list_devices(cfg.device.max_scan);
        return Ok(());
    }

    let settings = cfg.resolve().context("Invalid configuration")?;

    let device_arg = args
        .iter()
        .find_map(|a| a.strip_prefix("--device="));

    let keyboard = open_keyboard(device_arg, &cfg.device)?;
    info!("Keyboard: {}", keyboard.path().display());

    let pointer = UinputPointer::new(constants::VIRTUAL_DEVICE_NAME)?;

    // Tell systemd we're ready (no-op when not under systemd)
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("sd_notify failed: {}", e);
    }

    info!(
        "Ready: press {:?} to take over the keyboard",
        settings.bindings.start
    );

    let mut engine = engine::Engine::new(&settings, keyboard, pointer);
    engine.run()?;

    info!("keymouse exiting");
    Ok(())
}
