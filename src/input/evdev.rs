//! evdev keyboard source
//!
//! Read key events directly from /dev/input/eventN.
//! Take and release the exclusive grab (EVIOCGRAB) and query the physical
//! key state (EVIOCGKEY) for the grab state machine.

use ::evdev::{Device, EventType, InputEventKind, Key};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{KeyEvent, KeySource};

/// evdev value for a key release (1 = press, 2 = autorepeat)
const KEY_VALUE_RELEASE: i32 = 0;

/// Summary of one evdev node, for `--list-devices`
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_keyboard: bool,
}

/// Keyboard read through evdev
pub struct EvdevKeyboard {
    device: Device,
    path: PathBuf,
    /// Key events fetched but not yet handed to the engine
    pending: VecDeque<KeyEvent>,
    /// Whether we currently hold EVIOCGRAB
    grabbed: bool,
}

impl EvdevKeyboard {
    /// Open `path` and check that it looks like a keyboard
    pub fn open(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| open_error(path, e))?;

        if !looks_like_keyboard(&device) {
            return Err(anyhow!(
                "{} ({}) does not look like a keyboard. Set device.path in the config or pass --device",
                path.display(),
                device.name().unwrap_or("unnamed")
            ));
        }

        set_nonblocking(&device)
            .with_context(|| format!("Failed to set {} non-blocking", path.display()))?;

        info!(
            "Keyboard opened: {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed")
        );

        Ok(Self {
            device,
            path: path.to_path_buf(),
            pending: VecDeque::new(),
            grabbed: false,
        })
    }

    /// Scan /dev/input/event0..max_scan and open the first keyboard found
    pub fn autodetect(max_scan: usize) -> Result<Self> {
        let mut denied = 0;

        for index in 0..max_scan {
            let path = PathBuf::from(format!("/dev/input/event{}", index));
            let device = match Device::open(&path) {
                Ok(device) => device,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    debug!("Permission denied opening {}, skipping", path.display());
                    denied += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Cannot open {}: {}", path.display(), e);
                    continue;
                }
            };

            if looks_like_keyboard(&device) {
                debug!(
                    "Keyboard candidate: {} ({})",
                    path.display(),
                    device.name().unwrap_or("unnamed")
                );
                drop(device);
                return Self::open(&path);
            }
        }

        if denied > 0 {
            return Err(anyhow!(
                "No keyboard found ({} devices were not readable). Run as root or add your user to the input group",
                denied
            ));
        }
        Err(anyhow!(
            "No keyboard device found. Set device.path in the config or pass --device"
        ))
    }

    /// Describe every readable evdev node
    pub fn list_devices(max_scan: usize) -> Vec<DeviceInfo> {
        (0..max_scan)
            .filter_map(|index| {
                let path = PathBuf::from(format!("/dev/input/event{}", index));
                let device = Device::open(&path).ok()?;
                Some(DeviceInfo {
                    name: device.name().unwrap_or("unnamed").to_string(),
                    is_keyboard: looks_like_keyboard(&device),
                    path,
                })
            })
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move every key event currently readable into `pending`.
    ///
    /// Would-block is not an error; it just adds nothing.
    fn fetch_pending(&mut self) -> io::Result<()> {
        let events = match self.device.fetch_events() {
            Ok(events) => events,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(e),
        };

        for ev in events {
            if let InputEventKind::Key(key) = ev.kind() {
                self.pending.push_back(KeyEvent {
                    code: key.code(),
                    pressed: ev.value() != KEY_VALUE_RELEASE,
                });
            }
        }
        Ok(())
    }
}

impl KeySource for EvdevKeyboard {
    fn wait_event(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        if !wait_readable(self.device.as_raw_fd(), timeout)? {
            return Ok(None);
        }

        self.fetch_pending()?;
        Ok(self.pending.pop_front())
    }

    fn grab(&mut self) -> io::Result<()> {
        if !self.grabbed {
            self.device.grab()?;
            self.grabbed = true;
        }
        Ok(())
    }

    fn ungrab(&mut self) -> io::Result<()> {
        if self.grabbed {
            self.device.ungrab()?;
            self.grabbed = false;
        }
        Ok(())
    }

    fn any_physical_key_held(&mut self) -> io::Result<bool> {
        let held = self.device.get_key_state()?;
        Ok(held.iter().next().is_some())
    }
}

impl Drop for EvdevKeyboard {
    fn drop(&mut self) {
        if self.grabbed {
            if let Err(e) = self.device.ungrab() {
                warn!("Failed to release keyboard grab: {}", e);
            }
        }
    }
}

/// Keyboards report EV_KEY with KEY_A and support autorepeat
fn looks_like_keyboard(device: &Device) -> bool {
    let events = device.supported_events();
    events.contains(EventType::KEY)
        && events.contains(EventType::REPEAT)
        && device
            .supported_keys()
            .map_or(false, |keys| keys.contains(Key::KEY_A))
}

fn open_error(path: &Path, e: io::Error) -> anyhow::Error {
    match e.kind() {
        io::ErrorKind::NotFound => anyhow!("No such input device: {}", path.display()),
        io::ErrorKind::PermissionDenied => anyhow!(
            "Permission denied opening {}. Run as root or add your user to the input group",
            path.display()
        ),
        _ => anyhow!("Cannot open {}: {}", path.display(), e),
    }
}

fn set_nonblocking(device: &Device) -> Result<()> {
    let fd = device.as_raw_fd();
    let flags = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_GETFL)
        .map_err(|e| anyhow!("F_GETFL failed: {}", e))?;
    let mut flags = nix::fcntl::OFlag::from_bits_truncate(flags);
    flags.insert(nix::fcntl::OFlag::O_NONBLOCK);
    nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_SETFL(flags))
        .map_err(|e| anyhow!("F_SETFL failed: {}", e))?;
    Ok(())
}

/// poll(2) the fd for input, bounded by `timeout`.
///
/// Returns Ok(false) on timeout or EINTR.
fn wait_readable(fd: i32, timeout: Duration) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;

    let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        return Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "keyboard device disappeared",
        ));
    }
    Ok(rc > 0)
}
