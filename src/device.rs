use std::{
    ffi::CString,
    marker::PhantomData,
    mem::ManuallyDrop,
    path::Path,
    ptr::addr_of_mut,
};

use log::{debug, error, trace, warn};

use crate::{
    configuration::{
        BaudRateAliases, Cp2102nConfig, DeviceMode, DualPortConfig, FlushBufferConfig,
        InterfaceMode, LockValue, PortConfig, PowerConfig, QuadPortConfig, CP2102N_CONFIG_SIZE,
    },
    descriptor::{self, DescriptorString},
    error::try_cp210x,
    ffi::{self, util, with_global_lock},
    part::PartNumber,
    util::PhantomUnsync,
    Cp210xError, DeviceVersion, FirmwareVersion, Library, Result,
};

/// Handle to an open CP210x device.
///
/// The handle is the primary interface for customising a CP210x device. It
/// provides getters and setters for every field the manufacturing library
/// exposes. The device is closed when the handle is dropped.
///
/// A `Device` borrows the [`Library`] it was opened through, so the library
/// cannot be unloaded while the device is open.
///
/// # Example
///
/// ```no_run
/// use cp210x::{Device, Library};
///
/// let library = Library::load().unwrap();
/// let device = Device::open(&library, 0).unwrap();
///
/// println!("{} {:04x}:{:04x}", device.part_number().unwrap(),
///     device.vendor_id().unwrap(), device.product_id().unwrap());
/// device.set_product_string("Widget Programmer").unwrap();
/// ```
#[derive(Debug)]
pub struct Device<'lib> {
    /// Handle returned by the library when the device is opened.
    handle: ffi::HANDLE,
    library: &'lib Library,
    part_number: u8,
    // The library is not thread-safe, so a handle must not be shared
    // across threads.
    _unsync: PhantomUnsync,
}

impl<'lib> Device<'lib> {
    /// Open the device at the given index.
    ///
    /// Indices are assigned by the most recent enumeration, see
    /// [`Library::list_devices`]. Prefer [`DeviceInfo::open`](crate::DeviceInfo::open)
    /// or [`Library::open_by_serial`] if devices may be attached or detached
    /// in the meantime.
    pub fn open(library: &'lib Library, index: u32) -> Result<Self> {
        with_global_lock(|| Self::open_unlocked(library, index))
    }

    /// Open the device at the given index without taking the global lock.
    pub(crate) fn open_unlocked(library: &'lib Library, index: u32) -> Result<Self> {
        let mut handle: ffi::HANDLE = std::ptr::null_mut();
        try_cp210x!(unsafe { (library.api().Open)(index, addr_of_mut!(handle)) })?;
        if handle.is_null() {
            return Err(Cp210xError::DeviceNotFound);
        }
        // SAFETY: the handle was just opened and is owned by nothing else
        let device = unsafe { Self::with_handle(library, handle) }?;
        debug!(
            "opened device {index} (part number {:#04x})",
            device.part_number
        );
        Ok(device)
    }

    /// Wrap a handle obtained directly from the library.
    ///
    /// The part number is queried immediately. If that fails the handle is
    /// closed and the error returned.
    ///
    /// # Safety
    ///
    /// The handle must have been opened through `library`, and must not be
    /// used or closed elsewhere once wrapped.
    pub unsafe fn with_handle(library: &'lib Library, handle: ffi::HANDLE) -> Result<Self> {
        let mut device = Self {
            handle,
            library,
            part_number: 0,
            _unsync: PhantomData,
        };
        let mut part_number: u8 = 0;
        try_cp210x!((library.api().GetPartNumber)(handle, addr_of_mut!(part_number)))?;
        device.part_number = part_number;
        Ok(device)
    }

    /// Get the device's handle.
    ///
    /// Although not recommended for typical users, it may be used with the
    /// raw entry points in [`Library::api`].
    #[must_use]
    pub fn handle(&self) -> ffi::HANDLE {
        self.handle
    }

    /// Close the device, reporting any error.
    ///
    /// Dropping the device also closes it, but only logs a failure.
    pub fn close(self) -> Result<()> {
        let device = ManuallyDrop::new(self);
        debug!("closing device");
        try_cp210x!(unsafe { (device.api().Close)(device.handle) })
    }

    fn api(&self) -> &'lib ffi::Manufacturing {
        self.library.api()
    }

    /// Part number reported by the device when it was opened.
    pub fn part_number(&self) -> Result<PartNumber> {
        PartNumber::try_from(self.part_number)
            .map_err(|_| Cp210xError::UnknownPartNumber(self.part_number))
    }

    /// Raw part number, for parts this crate does not know.
    #[must_use]
    pub fn raw_part_number(&self) -> u8 {
        self.part_number
    }

    /// Log a warning before writing to one-time-programmable memory.
    fn warn_otp(&self, what: &str) {
        if let Ok(part) = self.part_number() {
            if part.is_otp() {
                warn!("writing {what} to one-time-programmable memory of {part}");
            }
        }
    }

    fn check_interface(&self, interface: u8) -> Result<()> {
        let Ok(part) = self.part_number() else {
            return Ok(());
        };
        let count = part.interface_count();
        if interface < count {
            Ok(())
        } else {
            Err(Cp210xError::OutOfRange {
                what: "interface",
                value: u32::from(interface),
                max: u32::from(count - 1),
            })
        }
    }

    /// USB vendor ID (`idVendor`).
    pub fn vendor_id(&self) -> Result<u16> {
        let mut vid: u16 = 0;
        try_cp210x!(unsafe { (self.api().GetDeviceVid)(self.handle, addr_of_mut!(vid)) })?;
        Ok(vid)
    }

    /// Set the USB vendor ID.
    pub fn set_vendor_id(&self, vid: u16) -> Result<()> {
        trace!("setting vendor ID to {vid:#06x}");
        self.warn_otp("vendor ID");
        try_cp210x!(unsafe { (self.api().SetVid)(self.handle, vid) })
    }

    /// USB product ID (`idProduct`).
    pub fn product_id(&self) -> Result<u16> {
        let mut pid: u16 = 0;
        try_cp210x!(unsafe { (self.api().GetDevicePid)(self.handle, addr_of_mut!(pid)) })?;
        Ok(pid)
    }

    /// Set the USB product ID.
    pub fn set_product_id(&self, pid: u16) -> Result<()> {
        trace!("setting product ID to {pid:#06x}");
        self.warn_otp("product ID");
        try_cp210x!(unsafe { (self.api().SetPid)(self.handle, pid) })
    }

    /// Release number (`bcdDevice`).
    pub fn device_version(&self) -> Result<DeviceVersion> {
        let mut version: u16 = 0;
        try_cp210x!(unsafe {
            (self.api().GetDeviceVersion)(self.handle, addr_of_mut!(version))
        })?;
        Ok(DeviceVersion::from_raw(version))
    }

    /// Set the release number.
    pub fn set_device_version(&self, version: DeviceVersion) -> Result<()> {
        trace!("setting device version to {version}");
        self.warn_otp("device version");
        try_cp210x!(unsafe { (self.api().SetDeviceVersion)(self.handle, version.raw()) })
    }

    /// Manufacturer string, as stored on the device.
    pub fn manufacturer_string(&self) -> Result<String> {
        let get = self.api().GetDeviceManufacturerString;
        util::read_string(|buf, len| unsafe { get(self.handle, buf, len, ffi::FALSE) })
    }

    /// Set the manufacturer string.
    ///
    /// The string is checked against the part's length limit before the
    /// library is called.
    pub fn set_manufacturer_string(&self, value: &str) -> Result<()> {
        let set = self.api().SetManufacturerString;
        self.write_string(DescriptorString::Manufacturer, value, |buf, len| unsafe {
            set(self.handle, buf, len, ffi::FALSE)
        })
    }

    /// Product string, as stored on the device.
    pub fn product_string(&self) -> Result<String> {
        let get = self.api().GetDeviceProductString;
        util::read_string(|buf, len| unsafe { get(self.handle, buf, len, ffi::FALSE) })
    }

    /// Set the product string.
    pub fn set_product_string(&self, value: &str) -> Result<()> {
        let set = self.api().SetProductString;
        self.write_string(DescriptorString::Product, value, |buf, len| unsafe {
            set(self.handle, buf, len, ffi::FALSE)
        })
    }

    /// Serial number string, as stored on the device.
    pub fn serial_number(&self) -> Result<String> {
        let get = self.api().GetDeviceSerialNumber;
        util::read_string(|buf, len| unsafe { get(self.handle, buf, len, ffi::FALSE) })
    }

    /// Set the serial number string.
    ///
    /// The host identifies devices by serial number, so each device should
    /// get a distinct one.
    pub fn set_serial_number(&self, value: &str) -> Result<()> {
        let set = self.api().SetSerialNumber;
        self.write_string(DescriptorString::SerialNumber, value, |buf, len| unsafe {
            set(self.handle, buf, len, ffi::FALSE)
        })
    }

    /// Interface string of a CP2105 or CP2108 interface.
    pub fn interface_string(&self, interface: u8) -> Result<String> {
        self.check_interface(interface)?;
        let get = self.api().GetDeviceInterfaceString;
        util::read_string(|buf, len| unsafe { get(self.handle, interface, buf, len, ffi::FALSE) })
    }

    /// Set the interface string of a CP2105 or CP2108 interface.
    ///
    /// Fails with [`Cp210xError::OutOfRange`] before calling the library if the
    /// part has no such interface.
    pub fn set_interface_string(&self, interface: u8, value: &str) -> Result<()> {
        self.check_interface(interface)?;
        let set = self.api().SetInterfaceString;
        self.write_string(DescriptorString::Interface(interface), value, |buf, len| unsafe {
            set(self.handle, interface, buf, len, ffi::FALSE)
        })
    }

    fn write_string<F>(&self, string: DescriptorString, value: &str, f: F) -> Result<()>
    where
        F: FnOnce(*mut std::ffi::c_void, u8) -> ffi::CP210x_STATUS,
    {
        let mut units = descriptor::encode(self.part_number().ok(), string, value)?;
        trace!("setting {string} string to {value:?}");
        self.warn_otp(&format!("{string} string"));
        util::write_string(&mut units, f)
    }

    /// Whether the device reports itself as self-powered.
    pub fn self_powered(&self) -> Result<bool> {
        let mut self_power: ffi::BOOL = ffi::FALSE;
        try_cp210x!(unsafe {
            (self.api().GetSelfPower)(self.handle, addr_of_mut!(self_power))
        })?;
        Ok(util::to_bool(self_power))
    }

    /// Set the self-powered attribute.
    pub fn set_self_powered(&self, self_powered: bool) -> Result<()> {
        trace!("setting self-powered to {self_powered}");
        self.warn_otp("power attributes");
        try_cp210x!(unsafe { (self.api().SetSelfPower)(self.handle, util::from_bool(self_powered)) })
    }

    /// Maximum current requested from the bus, in milliamps.
    pub fn max_power(&self) -> Result<u16> {
        Ok(self.power_config()?.max_power())
    }

    /// Set the maximum current requested from the bus, in milliamps.
    ///
    /// The value is rounded up to the next multiple of 2mA and may not
    /// exceed [`MAX_POWER_MILLIAMPS`](crate::configuration::MAX_POWER_MILLIAMPS).
    pub fn set_max_power(&self, milliamps: u16) -> Result<()> {
        let units = PowerConfig::new(false, milliamps)?.max_power_units();
        self.set_max_power_units(units)
    }

    fn max_power_units(&self) -> Result<u8> {
        let mut units: u8 = 0;
        try_cp210x!(unsafe { (self.api().GetMaxPower)(self.handle, addr_of_mut!(units)) })?;
        Ok(units)
    }

    fn set_max_power_units(&self, units: u8) -> Result<()> {
        trace!("setting max power to {units} units");
        self.warn_otp("max power");
        try_cp210x!(unsafe { (self.api().SetMaxPower)(self.handle, units) })
    }

    /// Read both power attributes.
    pub fn power_config(&self) -> Result<PowerConfig> {
        let self_powered = self.self_powered()?;
        let units = self.max_power_units()?;
        Ok(PowerConfig::from_raw(self_powered, units))
    }

    /// Write both power attributes.
    pub fn set_power_config(&self, config: &PowerConfig) -> Result<()> {
        self.set_self_powered(config.self_powered())?;
        self.set_max_power_units(config.max_power_units())
    }

    /// Which buffers are flushed when a port is opened or closed.
    pub fn flush_buffer_config(&self) -> Result<FlushBufferConfig> {
        let mut config: u16 = 0;
        try_cp210x!(unsafe {
            (self.api().GetFlushBufferConfig)(self.handle, addr_of_mut!(config))
        })?;
        Ok(FlushBufferConfig::from_bits(config))
    }

    /// Set the buffer flush behaviour.
    pub fn set_flush_buffer_config(&self, config: FlushBufferConfig) -> Result<()> {
        trace!("setting flush buffer config to {:#06x}", config.bits());
        self.warn_otp("flush buffer config");
        try_cp210x!(unsafe { (self.api().SetFlushBufferConfig)(self.handle, config.bits()) })
    }

    /// Modes of the CP2105 interfaces.
    pub fn device_mode(&self) -> Result<DeviceMode> {
        let mut eci: u8 = 0;
        let mut sci: u8 = 0;
        try_cp210x!(unsafe {
            (self.api().GetDeviceMode)(self.handle, addr_of_mut!(eci), addr_of_mut!(sci))
        })?;
        Ok(DeviceMode {
            eci: InterfaceMode::from_raw(eci)?,
            sci: InterfaceMode::from_raw(sci)?,
        })
    }

    /// Set the modes of the CP2105 interfaces.
    pub fn set_device_mode(&self, mode: DeviceMode) -> Result<()> {
        trace!("setting device mode to {mode:?}");
        self.warn_otp("device mode");
        try_cp210x!(unsafe {
            (self.api().SetDeviceMode)(self.handle, mode.eci.into(), mode.sci.into())
        })
    }

    /// The 32-entry baud rate alias table.
    pub fn baud_rate_config(&self) -> Result<BaudRateAliases> {
        let mut data = ffi::BAUD_CONFIG_DATA::default();
        try_cp210x!(unsafe { (self.api().GetBaudRateConfig)(self.handle, data.as_mut_ptr()) })?;
        Ok(data.into())
    }

    /// Write the whole baud rate alias table.
    pub fn set_baud_rate_config(&self, aliases: &BaudRateAliases) -> Result<()> {
        trace!("setting baud rate alias table");
        self.warn_otp("baud rate config");
        let mut data = ffi::BAUD_CONFIG_DATA::from(*aliases);
        try_cp210x!(unsafe { (self.api().SetBaudRateConfig)(self.handle, data.as_mut_ptr()) })
    }

    /// Port configuration of a CP2103 or CP2104.
    pub fn port_config(&self) -> Result<PortConfig> {
        let mut config = ffi::PORT_CONFIG::default();
        try_cp210x!(unsafe {
            (self.api().GetPortConfig)(self.handle, addr_of_mut!(config))
        })?;
        Ok(config.into())
    }

    /// Write the port configuration of a CP2103 or CP2104.
    ///
    /// The reserved enhanced-function bit is written cleared.
    pub fn set_port_config(&self, config: &PortConfig) -> Result<()> {
        trace!("setting port config to {config:?}");
        self.warn_otp("port config");
        let mut config = ffi::PORT_CONFIG::from(*config);
        try_cp210x!(unsafe { (self.api().SetPortConfig)(self.handle, addr_of_mut!(config)) })
    }

    /// Port configuration of a CP2105.
    pub fn dual_port_config(&self) -> Result<DualPortConfig> {
        let mut config = ffi::DUAL_PORT_CONFIG::default();
        try_cp210x!(unsafe {
            (self.api().GetDualPortConfig)(self.handle, addr_of_mut!(config))
        })?;
        Ok(config.into())
    }

    /// Write the port configuration of a CP2105.
    pub fn set_dual_port_config(&self, config: &DualPortConfig) -> Result<()> {
        trace!("setting dual port config to {config:?}");
        self.warn_otp("dual port config");
        let mut config = ffi::DUAL_PORT_CONFIG::from(*config);
        try_cp210x!(unsafe {
            (self.api().SetDualPortConfig)(self.handle, addr_of_mut!(config))
        })
    }

    /// Port configuration of a CP2108.
    pub fn quad_port_config(&self) -> Result<QuadPortConfig> {
        let mut config = ffi::QUAD_PORT_CONFIG::default();
        try_cp210x!(unsafe {
            (self.api().GetQuadPortConfig)(self.handle, addr_of_mut!(config))
        })?;
        Ok(config.into())
    }

    /// Write the port configuration of a CP2108.
    pub fn set_quad_port_config(&self, config: &QuadPortConfig) -> Result<()> {
        trace!("setting quad port config");
        let mut config = ffi::QUAD_PORT_CONFIG::from(*config);
        try_cp210x!(unsafe {
            (self.api().SetQuadPortConfig)(self.handle, addr_of_mut!(config))
        })
    }

    /// Lock state of the device configuration.
    pub fn lock_value(&self) -> Result<LockValue> {
        let mut lock: u8 = 0;
        try_cp210x!(unsafe { (self.api().GetLockValue)(self.handle, addr_of_mut!(lock)) })?;
        Ok(lock.into())
    }

    /// Permanently lock the device configuration.
    ///
    /// **This cannot be undone.** Every setter fails on a locked device.
    pub fn lock(&self) -> Result<()> {
        warn!("locking device configuration, this is permanent");
        try_cp210x!(unsafe { (self.api().SetLockValue)(self.handle) })
    }

    /// Reset the device, causing it to re-enumerate with its new configuration.
    ///
    /// The handle is closed afterwards, since the device it refers to goes
    /// away.
    pub fn reset(self) -> Result<()> {
        debug!("resetting device");
        let result = try_cp210x!(unsafe { (self.api().Reset)(self.handle) });
        if let Err(e) = self.close() {
            debug!("closing handle after reset: {e}");
        }
        result
    }

    /// Write the device configuration to an Intel hex file.
    ///
    /// Supported by the CP2102, CP2103 and CP2109.
    pub fn create_hex_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path
            .to_str()
            .and_then(|name| CString::new(name).ok())
            .ok_or_else(|| Cp210xError::InvalidFileName(path.display().to_string()))?;
        debug!("writing configuration to {}", path.display());
        try_cp210x!(unsafe { (self.api().CreateHexFile)(self.handle, name.as_ptr()) })
    }

    /// Firmware version of a CP2102N, CP2105 or CP2108.
    pub fn firmware_version(&self) -> Result<FirmwareVersion> {
        let get = supported(self.api().GetFirmwareVersion)?;
        let mut version = ffi::firmware_t::default();
        try_cp210x!(unsafe { get(self.handle, addr_of_mut!(version)) })?;
        Ok(version.into())
    }

    /// Read the configuration blob of a CP2102N.
    pub fn config(&self) -> Result<Cp2102nConfig> {
        let get = supported(self.api().GetConfig)?;
        let mut buf = vec![0u8; CP2102N_CONFIG_SIZE];
        let len = util::buffer_len(buf.len())?;
        try_cp210x!(unsafe { get(self.handle, buf.as_mut_ptr(), len) })?;
        Cp2102nConfig::from_bytes(&buf)
    }

    /// Write the configuration blob of a CP2102N.
    pub fn set_config(&self, config: &Cp2102nConfig) -> Result<()> {
        let set = supported(self.api().SetConfig)?;
        trace!("writing CP2102N configuration {config:?}");
        let mut buf = config.as_bytes().to_vec();
        let len = util::buffer_len(buf.len())?;
        try_cp210x!(unsafe { set(self.handle, buf.as_mut_ptr(), len) })
    }

    /// Put the device into its firmware update mode.
    ///
    /// The device re-enumerates as a bootloader, so the handle is closed
    /// afterwards.
    pub fn update_firmware(self) -> Result<()> {
        let update = supported(self.api().UpdateFirmware)?;
        warn!("switching device to firmware update mode");
        let result = try_cp210x!(unsafe { update(self.handle) });
        if let Err(e) = self.close() {
            debug!("closing handle after firmware update request: {e}");
        }
        result
    }

    /// Read a vendor-defined block through the generic command interface.
    ///
    /// `buf` is filled in full; its length is sent as the request length.
    pub fn get_generic(&self, buf: &mut [u8]) -> Result<()> {
        let get = supported(self.api().GetGeneric)?;
        let len = util::buffer_len(buf.len())?;
        try_cp210x!(unsafe { get(self.handle, buf.as_mut_ptr(), len) })
    }

    /// Send a vendor-defined block through the generic command interface.
    pub fn set_generic(&self, data: &[u8]) -> Result<()> {
        let set = supported(self.api().SetGeneric)?;
        let len = util::buffer_len(data.len())?;
        trace!("sending {len} byte generic command");
        let mut buf = data.to_vec();
        try_cp210x!(unsafe { set(self.handle, buf.as_mut_ptr(), len) })
    }

    /// USB address assigned to the device by the host.
    #[cfg(not(windows))]
    pub fn device_address(&self) -> Result<u8> {
        let get = supported(self.api().GetDeviceAddress)?;
        let mut address: u8 = 0;
        try_cp210x!(unsafe { get(self.handle, addr_of_mut!(address)) })?;
        Ok(address)
    }
}

/// Entry point exported only by newer library releases.
fn supported<F>(function: Option<F>) -> Result<F> {
    function.ok_or(Cp210xError::FunctionNotSupported)
}

impl Drop for Device<'_> {
    fn drop(&mut self) {
        match try_cp210x!(unsafe { (self.api().Close)(self.handle) }) {
            Ok(()) => debug!("closed device"),
            Err(e) => error!("failed to close device: {e}"),
        }
    }
}
