//! Linux sysfs GPIO pin (`/sys/class/gpio`).
//!
//! Implements the embedded-hal 1.0 digital traits so the pin can be
//! plugged into [`HalPins`](crate::adapters::hardware::HalPins).
//!
//! ## Lifecycle
//!
//! `export_*` writes the line number to `export` (unless the line is
//! already exported), waits for the kernel/udev to make `direction`
//! writable, then configures it.  Outputs are created with their initial
//! level in the same `direction` write, so a freshly exported motor line
//! never glitches on.  Dropping the pin unexports it.
//!
//! Pull resistors cannot be set through sysfs; the board provides them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};
use log::{debug, warn};

/// Default sysfs root.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// How long to wait for udev to hand over a freshly exported line.
const EXPORT_RETRIES: u32 = 50;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// I/O failure on a sysfs attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysfsError(pub io::ErrorKind);

impl digital::Error for SysfsError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl core::fmt::Display for SysfsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sysfs gpio: {}", self.0)
    }
}

impl From<io::Error> for SysfsError {
    fn from(e: io::Error) -> Self {
        Self(e.kind())
    }
}

/// One exported GPIO line.
#[derive(Debug)]
pub struct SysfsPin {
    gpio: u32,
    root: PathBuf,
    value: PathBuf,
}

impl SysfsPin {
    /// Export `gpio` as an input under the default root.
    pub fn export_input(gpio: u32) -> io::Result<Self> {
        Self::export_input_at(Path::new(SYSFS_GPIO_ROOT), gpio)
    }

    /// Export `gpio` as an output driven to `initial_high`.
    pub fn export_output(gpio: u32, initial_high: bool) -> io::Result<Self> {
        Self::export_output_at(Path::new(SYSFS_GPIO_ROOT), gpio, initial_high)
    }

    pub fn export_input_at(root: &Path, gpio: u32) -> io::Result<Self> {
        let pin = Self::export(root, gpio)?;
        pin.write_direction("in")?;
        Ok(pin)
    }

    pub fn export_output_at(root: &Path, gpio: u32, initial_high: bool) -> io::Result<Self> {
        let pin = Self::export(root, gpio)?;
        pin.write_direction(if initial_high { "high" } else { "low" })?;
        Ok(pin)
    }

    fn export(root: &Path, gpio: u32) -> io::Result<Self> {
        let dir = root.join(format!("gpio{gpio}"));
        if !dir.exists() {
            debug!("exporting gpio{}", gpio);
            fs::write(root.join("export"), gpio.to_string())?;
        }
        Ok(Self {
            gpio,
            root: root.to_path_buf(),
            value: dir.join("value"),
        })
    }

    fn write_direction(&self, direction: &str) -> io::Result<()> {
        let path = self.root.join(format!("gpio{}", self.gpio)).join("direction");
        let mut attempt = 0;
        loop {
            match fs::write(&path, direction) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < EXPORT_RETRIES && is_transient(&e) => {
                    attempt += 1;
                    thread::sleep(EXPORT_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read_level(&self) -> Result<bool, SysfsError> {
        let raw = fs::read_to_string(&self.value)?;
        Ok(raw.trim() == "1")
    }

    fn write_level(&self, high: bool) -> Result<(), SysfsError> {
        fs::write(&self.value, if high { "1" } else { "0" })?;
        Ok(())
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    )
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = fs::write(self.root.join("unexport"), self.gpio.to_string()) {
            warn!("gpio{} unexport failed: {}", self.gpio, e);
        }
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsError;
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, SysfsError> {
        self.read_level()
    }

    fn is_low(&mut self) -> Result<bool, SysfsError> {
        self.read_level().map(|high| !high)
    }
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), SysfsError> {
        self.write_level(false)
    }

    fn set_high(&mut self) -> Result<(), SysfsError> {
        self.write_level(true)
    }
}
