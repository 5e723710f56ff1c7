use std::ptr::addr_of_mut;

use log::debug;
use widestring::{WideCStr, WideChar, WideStr};

use crate::{
    descriptor::{self, ProductStringKind},
    error::try_cp210x,
    ffi::{self, with_global_lock},
    Cp210xError, Device, Library, Result,
};

/// Information about an attached device, as reported by the host.
///
/// Obtained from [`Library::list_devices`] or the free [`list_devices`]
/// function. None of the strings are read from the device itself, so listing
/// does not disturb open handles. A string the host fails to report is `None`;
/// the device is still listed.
#[derive(Debug, Clone)]
pub struct DeviceInfo<'lib> {
    library: &'lib Library,
    index: u32,
    serial_number: Option<String>,
    description: Option<String>,
    full_path: Option<String>,
}

impl<'lib> DeviceInfo<'lib> {
    /// Open the device.
    ///
    /// The device is looked up again by serial number, in case the device
    /// indices changed since enumeration. Devices with an empty or unknown
    /// serial number are opened by index instead.
    pub fn open(&self) -> Result<Device<'lib>> {
        match self.serial_number.as_deref() {
            Some(serial_number) if !serial_number.is_empty() => {
                self.library.open_by_serial(serial_number)
            }
            _ => Device::open(self.library, self.index),
        }
    }

    /// Index of the device at enumeration time.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Serial number reported by the host.
    #[must_use]
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Product description reported by the host.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Device path, if the platform reports one.
    #[must_use]
    pub fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }
}

impl Library {
    /// Number of attached CP210x devices.
    ///
    /// This also rebuilds the library's device table, which invalidates
    /// indices from earlier enumerations.
    pub fn device_count(&self) -> Result<u32> {
        let mut count: u32 = 0;
        try_cp210x!(unsafe { (self.api().GetNumDevices)(addr_of_mut!(count)) })?;
        Ok(count)
    }

    /// Host-side product string of the device at the given index.
    ///
    /// Uses the wide-character entry point when the library exports it.
    pub fn product_string(&self, index: u32, kind: ProductStringKind) -> Result<String> {
        match self.api().GetProductStringSafe {
            Some(get) => {
                let mut buf: [WideChar; ffi::CP210x_MAX_DEVICE_STRLEN] =
                    [0; ffi::CP210x_MAX_DEVICE_STRLEN];
                try_cp210x!(unsafe {
                    get(
                        index,
                        kind as u32,
                        buf.as_mut_ptr(),
                        std::mem::size_of_val(&buf),
                    )
                })?;
                Ok(match WideCStr::from_slice_truncate(&buf) {
                    Ok(string) => string.to_string_lossy(),
                    Err(_) => WideStr::from_slice(&buf).to_string_lossy(),
                })
            }
            None => {
                let mut buf = [0u8; ffi::CP210x_MAX_DEVICE_STRLEN];
                try_cp210x!(unsafe {
                    (self.api().GetProductString)(index, buf.as_mut_ptr().cast(), kind as u32)
                })?;
                Ok(descriptor::decode_narrow(&buf))
            }
        }
    }

    /// List attached devices.
    ///
    /// Each host string is `None` if the library fails to report it; the
    /// device path in particular is not available on every platform. Only a
    /// failure to count the devices fails the listing.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cp210x::Library;
    ///
    /// let library = Library::load().unwrap();
    /// for info in library.list_devices().unwrap() {
    ///     let description = info.description().unwrap_or("unknown device");
    ///     println!("{}: {description} ({:?})", info.index(), info.serial_number());
    /// }
    /// ```
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo<'_>>> {
        // the device table is rebuilt by the count, so the per-index queries
        // must not interleave with another enumeration
        with_global_lock(|| {
            let count = self.device_count()?;
            debug!("found {count} device(s)");
            Ok((0..count)
                .map(|index| DeviceInfo {
                    library: self,
                    index,
                    serial_number: self.host_string(index, ProductStringKind::SerialNumber),
                    description: self.host_string(index, ProductStringKind::Description),
                    full_path: self.host_string(index, ProductStringKind::FullPath),
                })
                .collect())
        })
    }

    fn host_string(&self, index: u32, kind: ProductStringKind) -> Option<String> {
        self.product_string(index, kind)
            .map_err(|e| debug!("device {index}: no {kind:?} string: {e}"))
            .ok()
    }

    /// Open the device at the given index.
    pub fn open(&self, index: u32) -> Result<Device<'_>> {
        Device::open(self, index)
    }

    /// Open the first device with the given serial number.
    pub fn open_by_serial(&self, serial_number: &str) -> Result<Device<'_>> {
        with_global_lock(|| {
            for index in 0..self.device_count()? {
                if self.product_string(index, ProductStringKind::SerialNumber)? == serial_number {
                    return Device::open_unlocked(self, index);
                }
            }
            Err(Cp210xError::DeviceNotFound)
        })
    }
}

/// List attached devices through the process-wide library.
///
/// See [`Library::global`] for how the library is located.
///
/// # Example
///
/// ```no_run
/// let devices = cp210x::list_devices().unwrap();
/// let device = devices[0].open().unwrap();
/// println!("{}", device.product_string().unwrap());
/// ```
pub fn list_devices() -> Result<Vec<DeviceInfo<'static>>> {
    Library::global()?.list_devices()
}

/// Number of attached devices, through the process-wide library.
pub fn device_count() -> Result<u32> {
    Library::global()?.device_count()
}
