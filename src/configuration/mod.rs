//! Typed models of the configuration stored on a CP210x device.
//!
//! Each model converts to and from the raw structure exchanged with the
//! library (see [`ffi`](crate::ffi)). Conversions from raw values keep every
//! bit, named or not, so a value read from a device can be written back
//! unchanged. The reserved enhanced-function bit is always written cleared.

mod baud;
mod cp2102n;
mod dual_port;
mod flush;
mod port;
mod power;
mod quad_port;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{Cp210xError, Result};

pub use self::{
    baud::{BaudConfig, BaudRateAliases},
    cp2102n::{Cp2102nConfig, CP2102N_CONFIG_SIZE},
    dual_port::{DualPortConfig, DualPortPins, EciFunctions, SciFunctions},
    flush::{FlushBufferConfig, FlushEvents, FlushInterface},
    port::{EnhancedFunctions, PortConfig, PortPins},
    power::{PowerConfig, MAX_POWER_MILLIAMPS},
    quad_port::{
        BankState, Pb0, Pb1, Pb2, Pb3, Pb4, PortBank, QuadDeviceFunctions,
        QuadInterfaceFunctions, QuadPortConfig, QuadPortState,
    },
};

/// Function of a CP2105 interface.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum InterfaceMode {
    /// Full modem control lines.
    Modem = 0,
    /// Modem control pins are used as GPIO.
    Gpio = 1,
}

impl InterfaceMode {
    pub(crate) fn from_raw(value: u8) -> Result<Self> {
        Self::try_from(value).map_err(|_| Cp210xError::InvalidConfig("unknown interface mode"))
    }
}

/// Modes of both CP2105 interfaces.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DeviceMode {
    /// Enhanced Communications Interface (interface 0).
    pub eci: InterfaceMode,
    /// Standard Communications Interface (interface 1).
    pub sci: InterfaceMode,
}

/// Lock state of the device configuration.
///
/// Once locked, a device's configuration cannot be changed again.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LockValue {
    /// Reported as `0`; the configuration can still be written.
    Unlocked,
    /// Locked, with the raw value reported by the device.
    Locked(u8),
}

impl LockValue {
    /// `true` unless the device reports [`LockValue::Unlocked`].
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockValue::Locked(_))
    }
}

impl From<u8> for LockValue {
    fn from(value: u8) -> Self {
        match value {
            0x00 => LockValue::Unlocked,
            raw => LockValue::Locked(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_mode() {
        assert_eq!(InterfaceMode::from_raw(0), Ok(InterfaceMode::Modem));
        assert_eq!(InterfaceMode::from_raw(1), Ok(InterfaceMode::Gpio));
        assert!(InterfaceMode::from_raw(2).is_err());
        assert_eq!(u8::from(InterfaceMode::Gpio), 1);
    }

    #[test]
    fn lock_value() {
        assert_eq!(LockValue::from(0x00), LockValue::Unlocked);
        assert_eq!(LockValue::from(0xF0), LockValue::Locked(0xF0));
        assert!(LockValue::from(0x01).is_locked());
        assert!(!LockValue::Unlocked.is_locked());
    }
}
