use crate::{ffi, Cp210xError, Result};

/// Largest current a device may request from the bus.
pub const MAX_POWER_MILLIAMPS: u16 = ffi::CP210x_MAX_MAXPOWER as u16 * 2;

/// Power configuration contained in the configuration descriptor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PowerConfig {
    self_powered: bool,
    max_power: u8,
}

impl PowerConfig {
    /// Create a power configuration requesting `max_power` milliamps.
    ///
    /// The descriptor stores the current in 2mA units, so odd values are
    /// rounded up.
    pub fn new(self_powered: bool, max_power: u16) -> Result<Self> {
        Ok(Self {
            self_powered,
            max_power: milliamps_to_units(max_power)?,
        })
    }

    pub(crate) fn from_raw(self_powered: bool, max_power: u8) -> Self {
        Self {
            self_powered,
            max_power,
        }
    }

    /// Check if the device is bus-powered.
    #[must_use]
    pub fn bus_powered(&self) -> bool {
        !self.self_powered()
    }

    /// Check if the device is self-powered.
    #[must_use]
    pub fn self_powered(&self) -> bool {
        self.self_powered
    }

    /// Get the maximum power consumption in milliamps.
    #[must_use]
    pub fn max_power(&self) -> u16 {
        units_to_milliamps(self.max_power)
    }

    /// Maximum power consumption in 2mA units, as stored on the device.
    #[must_use]
    pub fn max_power_units(&self) -> u8 {
        self.max_power
    }
}

pub(crate) fn milliamps_to_units(milliamps: u16) -> Result<u8> {
    if milliamps > MAX_POWER_MILLIAMPS {
        return Err(Cp210xError::OutOfRange {
            what: "max power (mA)",
            value: u32::from(milliamps),
            max: u32::from(MAX_POWER_MILLIAMPS),
        });
    }
    // bounded by the check above
    Ok(u8::try_from(milliamps.div_ceil(2)).unwrap_or(ffi::CP210x_MAX_MAXPOWER))
}

pub(crate) fn units_to_milliamps(units: u8) -> u16 {
    u16::from(units) * 2 // 2mA units
}
