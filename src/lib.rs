//! Silicon Labs produces the CP210x series of USB to UART bridges (CP2101 through CP2109 and
//! the CP2102N family). Silicon Labs provides a proprietary "Manufacturing" library which exposes
//! the functions used to customise these devices in production: USB identity, descriptor strings,
//! power settings, pin configuration and the one-time-programmable lock.
//!
//! This crate provides a safe, idiomatic Rust wrapper around the CP210x Manufacturing library.
//!
//! # Disclaimer
//!
//! This crate is unofficial and is not affiliated with Silicon Labs in any way.
//!
//! The crate is still in early development and is unstable/experimental.
//! Feedback and contributions are welcome!
//!
//! # What This Crate Does
//!
//! This crate wraps all of the Manufacturing API:
//! - Device enumeration
//! - USB identity (VID, PID, release version) and descriptor strings
//! - Power configuration
//! - Port, dual-port and quad-port pin configuration
//! - Flush buffer, device mode and baud rate alias table
//! - Locking, reset, hex file export
//! - CP2102N firmware version, configuration blob and firmware update
//!
//! With the `runtime` feature (enabled by default), the [`gpio`] module also wraps the CP210x
//! Runtime library, which reads and writes GPIO latches through an open serial port, and can
//! pulse reset lines through the latch or, failing that, the DTR and RTS lines.
//!
//! # Requirements
//!
//! The library is loaded at runtime, so this crate builds without it. To talk to devices, the
//! CP210x Manufacturing library must be installed where the platform loader finds it, or its path
//! given in the `CP210X_MANUFACTURING_LIB` environment variable. See [`Library`] for details.
//!
//! # Library Constraints
//!
//! The Manufacturing library does not document its thread-safety, and some of its settings are
//! stored in one-time-programmable memory. This crate puts in place some restrictions to keep its
//! use safe:
//!
//! 1. The library is not assumed to be thread-safe. Operations which address devices by index
//!    are serialised by a global lock, and [`Device`] is `!Sync`.
//! 2. Values are validated before they are written, so that an out-of-range value cannot be
//!    burned into OTP memory. The length of descriptor strings is checked against the limit of
//!    the part it is written to.
//!
//! Writes to OTP memory can only be made a limited number of times, and [`Device::lock`] is
//! permanent. Test any programming sequence on a spare device first.
//!
//! ## Error Handling
//!
//! The documentation on most functions in this crate returning a `Result<T, Cp210xError>` does
//! not include an explanation about the error conditions. The library reports a small set of
//! status codes, mapped one-to-one onto [`Cp210xError`] variants, but does not document which
//! call may return which code. It is recommended to use a catch-all approach in most cases.
//!
//! ## Global Lock
//!
//! Listing devices must be done with the lock held since the operation consists of a rebuild of
//! the library's device table followed by reads of it, which may be invalidated at any point by
//! another thread.
//!
//! The operations which acquire the lock do so transparently by calling
//! [`with_global_lock`](crate::ffi::with_global_lock). This function is also available for use
//! by the user if access to the bindings are needed. The lock is not reentrant, so calling a
//! locking operation of this crate from inside the closure deadlocks.
//!
//! # Simple Example
//!
//! ```no_run
//! use cp210x::list_devices;
//!
//! // Scan for connected devices.
//! let all_devices = list_devices().expect("failed to list devices");
//!
//! // Open the first device found.
//! let device = all_devices[0].open().expect("failed to open device");
//!
//! println!("part: {:?}", device.part_number());
//! println!("VID:PID {:04x}:{:04x}", device.vendor_id().unwrap(), device.product_id().unwrap());
//!
//! device
//!     .set_product_string("Widget Controller")
//!     .expect("failed to set product string");
//! ```
#![warn(clippy::all, clippy::pedantic, clippy::cargo, missing_docs)]
// Allow missing error documentation since the library is vague about error conditions.
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::fmt;

pub mod configuration;
pub mod descriptor;
mod device;
mod error;
pub mod ffi;
#[cfg(feature = "runtime")]
pub mod gpio;
mod library;
mod part;
pub mod prelude;
mod scan;
pub(crate) mod util;

#[cfg(test)]
mod mock;

pub use descriptor::{DescriptorString, ProductStringKind};
pub use device::Device;
pub use error::{Cp210xError, Result};
pub use library::{Library, LIBRARY_PATH_ENV};
pub use part::PartNumber;
pub use scan::{device_count, list_devices, DeviceInfo};

/// Device release number (`bcdDevice`).
///
/// Stored as two BCD bytes, `major.minor`. Values read from a device are kept
/// as-is even when they are not valid BCD.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DeviceVersion(u16);

impl DeviceVersion {
    /// Create a version from decimal major and minor numbers, each below 100.
    pub fn new(major: u8, minor: u8) -> Result<Self> {
        let encode = |what, value| {
            util::to_bcd(value).ok_or(Cp210xError::OutOfRange {
                what,
                value: u32::from(value),
                max: 99,
            })
        };
        let major = encode("major version", major)?;
        let minor = encode("minor version", minor)?;
        Ok(Self(u16::from_be_bytes([major, minor])))
    }

    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Major version number, `None` if the high byte is not valid BCD.
    #[must_use]
    pub fn major(self) -> Option<u8> {
        util::from_bcd(self.0.to_be_bytes()[0])
    }

    /// Minor version number, `None` if the low byte is not valid BCD.
    #[must_use]
    pub fn minor(self) -> Option<u8> {
        util::from_bcd(self.0.to_be_bytes()[1])
    }
}

impl fmt::Display for DeviceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.major(), self.minor()) {
            (Some(major), Some(minor)) => write!(f, "{major}.{minor:02}"),
            _ => write!(f, "{:#06x}", self.0),
        }
    }
}

/// Firmware version of a CP2102N.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FirmwareVersion {
    major: u8,
    minor: u8,
    build: u8,
}

impl FirmwareVersion {
    /// Major version number.
    #[must_use]
    pub fn major(&self) -> u8 {
        self.major
    }

    /// Minor version number.
    #[must_use]
    pub fn minor(&self) -> u8 {
        self.minor
    }

    /// Build number.
    #[must_use]
    pub fn build(&self) -> u8 {
        self.build
    }
}

impl From<ffi::firmware_t> for FirmwareVersion {
    fn from(value: ffi::firmware_t) -> Self {
        Self {
            major: value.major,
            minor: value.minor,
            build: value.build,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}
