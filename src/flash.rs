// SPDX-License-Identifier: GPL-3.0-only

//! Flash LED control via Linux sysfs
//!
//! Flash units show up as `/sys/class/leds/*:flash`. We drive them through
//! the `brightness` file (torch mode), which desktop and phone images make
//! group-writable, instead of the root-only strobe interface.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default sysfs class directory for LEDs
pub const LEDS_DIR: &str = "/sys/class/leds";

/// Still-capture flash mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashMode {
    /// Flash does not fire
    #[default]
    Off,
    /// Flash fires for every still capture
    On,
}

impl FlashMode {
    /// The opposite mode
    pub fn toggled(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Off,
        }
    }
}

/// A controllable flash LED
#[derive(Debug, Clone)]
pub struct FlashDevice {
    path: PathBuf,
    max_brightness: u32,
    name: String,
}

impl FlashDevice {
    /// Device name, e.g. `white:flash`
    pub fn name(&self) -> &str {
        &self.name
    }

    fn set_brightness(&self, value: u32) -> io::Result<()> {
        std::fs::write(
            self.path.join("brightness"),
            value.min(self.max_brightness).to_string(),
        )
    }

    /// Full brightness
    pub fn on(&self) -> io::Result<()> {
        self.set_brightness(self.max_brightness)
    }

    /// Off
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }
}

/// Flash LEDs discovered on this machine
#[derive(Debug, Clone, Default)]
pub struct FlashHardware {
    devices: Vec<FlashDevice>,
}

impl FlashHardware {
    /// Scan the system LED class directory
    pub fn detect() -> Self {
        Self::detect_in(Path::new(LEDS_DIR))
    }

    /// Scan `leds_dir` for writable `*:flash` entries
    pub fn detect_in(leds_dir: &Path) -> Self {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(dir = %leds_dir.display(), "No LED class directory - flash unavailable");
            return Self::default();
        };

        let mut devices: Vec<FlashDevice> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if !name.ends_with(":flash") {
                    return None;
                }
                let path = entry.path();

                let max_brightness = std::fs::read_to_string(path.join("max_brightness"))
                    .ok()
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .filter(|v| *v > 0);
                let Some(max_brightness) = max_brightness else {
                    warn!(led = %name, "Flash LED has no usable max_brightness");
                    return None;
                };

                if let Err(e) = std::fs::OpenOptions::new()
                    .write(true)
                    .open(path.join("brightness"))
                {
                    warn!(led = %name, error = %e, "Flash LED found but not writable");
                    return None;
                }

                info!(led = %name, max_brightness, "Discovered flash LED");
                Some(FlashDevice {
                    path,
                    max_brightness,
                    name,
                })
            })
            .collect();

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Self { devices }
    }

    /// Whether a controllable flash exists
    pub fn is_available(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Discovered devices
    pub fn devices(&self) -> &[FlashDevice] {
        &self.devices
    }

    /// Light all flash LEDs
    pub fn fire(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.on() {
                warn!(led = %dev.name, error = %e, "Failed to turn on flash LED");
            }
        }
    }

    /// Switch all flash LEDs off
    pub fn release(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.off() {
                warn!(led = %dev.name, error = %e, "Failed to turn off flash LED");
            }
        }
    }
}

/// Flash setting carried on a capture session
#[derive(Debug, Clone, Default)]
pub struct FlashState {
    mode: FlashMode,
    hardware: FlashHardware,
    pre_capture: Duration,
}

/// Outcome of a flash toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashToggle {
    /// The mode changed
    Switched(FlashMode),
    /// No controllable flash on this device; nothing changed
    Unavailable,
}

impl FlashState {
    /// Flash state for the given hardware, starting with flash off
    pub fn new(hardware: FlashHardware, pre_capture: Duration) -> Self {
        Self {
            mode: FlashMode::Off,
            hardware,
            pre_capture,
        }
    }

    /// Current mode
    pub fn mode(&self) -> FlashMode {
        self.mode
    }

    /// Change how long the LEDs burn before the grab
    pub fn set_pre_capture(&mut self, pre_capture: Duration) {
        self.pre_capture = pre_capture;
    }

    /// Flip between on and off, if a flash exists
    pub fn toggle(&mut self) -> FlashToggle {
        if !self.hardware.is_available() {
            return FlashToggle::Unavailable;
        }
        self.mode = self.mode.toggled();
        info!(mode = ?self.mode, "Flash toggled");
        FlashToggle::Switched(self.mode)
    }

    /// Run `grab` with the flash lit when the mode is on
    ///
    /// The LEDs are always switched off again, whatever `grab` returns.
    pub fn with_flash<T>(&self, grab: impl FnOnce() -> T) -> T {
        if self.mode == FlashMode::Off || !self.hardware.is_available() {
            return grab();
        }

        self.hardware.fire();
        std::thread::sleep(self.pre_capture);
        let result = grab();
        self.hardware.release();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_leds(names: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snapcam-leds-{}", uuid::Uuid::new_v4()));
        for name in names {
            let led = dir.join(name);
            std::fs::create_dir_all(&led).unwrap();
            std::fs::write(led.join("max_brightness"), "255\n").unwrap();
            std::fs::write(led.join("brightness"), "0\n").unwrap();
        }
        dir
    }

    #[test]
    fn test_detect_only_flash_leds() {
        let dir = fake_leds(&["white:flash", "input3::capslock"]);
        let hw = FlashHardware::detect_in(&dir);
        assert_eq!(hw.devices().len(), 1);
        assert_eq!(hw.devices()[0].name(), "white:flash");
    }

    #[test]
    fn test_toggle_without_hardware_is_refused() {
        let mut state = FlashState::new(FlashHardware::default(), Duration::ZERO);
        assert_eq!(state.toggle(), FlashToggle::Unavailable);
        assert_eq!(state.mode(), FlashMode::Off);
    }

    #[test]
    fn test_with_flash_fires_and_releases() {
        let dir = fake_leds(&["white:flash"]);
        let mut state = FlashState::new(FlashHardware::detect_in(&dir), Duration::ZERO);
        assert_eq!(state.toggle(), FlashToggle::Switched(FlashMode::On));

        let brightness = dir.join("white:flash").join("brightness");
        let during = state.with_flash(|| std::fs::read_to_string(&brightness).unwrap());
        assert_eq!(during, "255");
        assert_eq!(std::fs::read_to_string(&brightness).unwrap(), "0");
    }
}
