use bitflags::bitflags;

use crate::ffi;

bitflags! {
    /// Pins of a CP2103 or CP2104.
    ///
    /// In [`PortConfig::mode`] a set bit selects push-pull output, a clear bit
    /// open-drain. In the latch fields a set bit drives the pin high.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct PortPins: u16 {
        const RI = ffi::PORT_RI_ON;
        const DCD = ffi::PORT_DCD_ON;
        const DTR = ffi::PORT_DTR_ON;
        const DSR = ffi::PORT_DSR_ON;
        const TXD = ffi::PORT_TXD_ON;
        const RXD = ffi::PORT_RXD_ON;
        const RTS = ffi::PORT_RTS_ON;
        const CTS = ffi::PORT_CTS_ON;
        const GPIO_0 = ffi::PORT_GPIO_0_ON;
        const GPIO_1 = ffi::PORT_GPIO_1_ON;
        const GPIO_2 = ffi::PORT_GPIO_2_ON;
        const GPIO_3 = ffi::PORT_GPIO_3_ON;
        const SUSPEND = ffi::PORT_SUSPEND_ON;
        const SUSPEND_BAR = ffi::PORT_SUSPEND_BAR_ON;
    }

    /// Alternate pin functions of a CP2103 or CP2104.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct EnhancedFunctions: u8 {
        /// GPIO.0 toggles on transmit.
        const GPIO_0_TXLED = ffi::EF_GPIO_0_TXLED;
        /// GPIO.1 toggles on receive.
        const GPIO_1_RXLED = ffi::EF_GPIO_1_RXLED;
        /// GPIO.2 drives an RS-485 transceiver.
        const GPIO_2_RS485 = ffi::EF_GPIO_2_RS485;
        const RS485_INVERT = ffi::EF_RS485_INVERT;
        /// Weak pull-ups stay enabled in suspend.
        const WEAK_PULLUP = ffi::EF_WEAKPULLUP;
        const SERIAL_DYNAMIC_SUSPEND = ffi::EF_SERIAL_DYNAMIC_SUSPEND;
        const GPIO_DYNAMIC_SUSPEND = ffi::EF_GPIO_DYNAMIC_SUSPEND;
    }
}

/// Port configuration of a CP2103 or CP2104.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PortConfig {
    /// Output mode of each pin.
    pub mode: PortPins,
    /// Pin levels after reset.
    pub reset_latch: PortPins,
    /// Pin levels while suspended.
    pub suspend_latch: PortPins,
    /// GPIO alternate functions and suspend behaviour.
    pub enhanced_functions: EnhancedFunctions,
}

impl From<ffi::PORT_CONFIG> for PortConfig {
    fn from(value: ffi::PORT_CONFIG) -> Self {
        Self {
            mode: PortPins::from_bits_retain(value.Mode),
            reset_latch: PortPins::from_bits_retain(value.Reset_Latch),
            suspend_latch: PortPins::from_bits_retain(value.Suspend_Latch),
            enhanced_functions: EnhancedFunctions::from_bits_retain(value.EnhancedFxn),
        }
    }
}

impl From<PortConfig> for ffi::PORT_CONFIG {
    fn from(value: PortConfig) -> Self {
        Self {
            Mode: value.mode.bits(),
            Reset_Latch: value.reset_latch.bits(),
            Suspend_Latch: value.suspend_latch.bits(),
            EnhancedFxn: value.enhanced_functions.bits() & !ffi::EF_RESERVED_1,
        }
    }
}
