use bitflags::bitflags;

use crate::ffi;

bitflags! {
    /// Pins of a CP2105.
    ///
    /// The low byte belongs to the SCI, the high byte to the ECI. When an
    /// interface runs in [`Gpio`](super::InterfaceMode::Gpio) mode some bits
    /// name GPIO or suspend pins instead; see the associated constants.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct DualPortPins: u16 {
        const RI_SCI = ffi::PORT_RI_SCI_ON;
        const DCD_SCI = ffi::PORT_DCD_SCI_ON;
        const DTR_SCI = ffi::PORT_DTR_SCI_ON;
        const DSR_SCI = ffi::PORT_DSR_SCI_ON;
        const TXD_SCI = ffi::PORT_TXD_SCI_ON;
        const RXD_SCI = ffi::PORT_RXD_SCI_ON;
        const RTS_SCI = ffi::PORT_RTS_SCI_ON;
        const CTS_SCI = ffi::PORT_CTS_SCI_ON;
        const RI_ECI = ffi::PORT_RI_ECI_ON;
        const DCD_ECI = ffi::PORT_DCD_ECI_ON;
        const DTR_ECI = ffi::PORT_DTR_ECI_ON;
        const DSR_ECI = ffi::PORT_DSR_ECI_ON;
        const TXD_ECI = ffi::PORT_TXD_ECI_ON;
        const RXD_ECI = ffi::PORT_RXD_ECI_ON;
        const RTS_ECI = ffi::PORT_RTS_ECI_ON;
        const CTS_ECI = ffi::PORT_CTS_ECI_ON;
    }
}

impl DualPortPins {
    pub const SUSPEND_SCI: Self = Self::from_bits_retain(ffi::PORT_SUSPEND_SCI_ON);
    pub const GPIO_0_SCI: Self = Self::from_bits_retain(ffi::PORT_GPIO_0_SCI_ON);
    pub const GPIO_1_SCI: Self = Self::from_bits_retain(ffi::PORT_GPIO_1_SCI_ON);
    pub const GPIO_2_SCI: Self = Self::from_bits_retain(ffi::PORT_GPIO_2_SCI_ON);
    pub const SUSPEND_ECI: Self = Self::from_bits_retain(ffi::PORT_SUSPEND_ECI_ON);
    pub const GPIO_0_ECI: Self = Self::from_bits_retain(ffi::PORT_GPIO_0_ECI_ON);
    pub const GPIO_1_ECI: Self = Self::from_bits_retain(ffi::PORT_GPIO_1_ECI_ON);
}

bitflags! {
    /// Alternate pin functions of the CP2105 ECI.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct EciFunctions: u8 {
        const GPIO_0_TXLED = ffi::EF_GPIO_0_TXLED_ECI;
        const GPIO_1_RXLED = ffi::EF_GPIO_1_RXLED_ECI;
        const GPIO_1_RS485 = ffi::EF_GPIO_1_RS485_ECI;
        /// RS-485 driver enable is active high.
        const RS485_INVERT = ffi::EF_RS485_INVERT;
        const INVERT_SUSPEND = ffi::EF_INVERT_SUSPEND_ECI;
        const DYNAMIC_SUSPEND = ffi::EF_DYNAMIC_SUSPEND_ECI;
    }

    /// Alternate pin functions of the CP2105 SCI.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct SciFunctions: u8 {
        const GPIO_0_TXLED = ffi::EF_GPIO_0_TXLED_SCI;
        const GPIO_1_RXLED = ffi::EF_GPIO_1_RXLED_SCI;
        const INVERT_SUSPEND = ffi::EF_INVERT_SUSPEND_SCI;
        const DYNAMIC_SUSPEND = ffi::EF_DYNAMIC_SUSPEND_SCI;
    }
}

/// Port configuration of a CP2105.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DualPortConfig {
    /// Output mode of each pin, set for push-pull.
    pub mode: DualPortPins,
    /// Pin levels after reset.
    pub reset_latch: DualPortPins,
    /// Pin levels while suspended.
    pub suspend_latch: DualPortPins,
    /// Enhanced functions of the ECI.
    pub eci_functions: EciFunctions,
    /// Enhanced functions of the SCI.
    pub sci_functions: SciFunctions,
    /// Device-wide function bits, kept as reported by the device.
    pub device_functions: u8,
}

impl From<ffi::DUAL_PORT_CONFIG> for DualPortConfig {
    fn from(value: ffi::DUAL_PORT_CONFIG) -> Self {
        Self {
            mode: DualPortPins::from_bits_retain(value.Mode),
            reset_latch: DualPortPins::from_bits_retain(value.Reset_Latch),
            suspend_latch: DualPortPins::from_bits_retain(value.Suspend_Latch),
            eci_functions: EciFunctions::from_bits_retain(value.EnhancedFxn_ECI),
            sci_functions: SciFunctions::from_bits_retain(value.EnhancedFxn_SCI),
            device_functions: value.EnhancedFxn_Device,
        }
    }
}

impl From<DualPortConfig> for ffi::DUAL_PORT_CONFIG {
    fn from(value: DualPortConfig) -> Self {
        Self {
            Mode: value.mode.bits(),
            Reset_Latch: value.reset_latch.bits(),
            Suspend_Latch: value.suspend_latch.bits(),
            EnhancedFxn_ECI: value.eci_functions.bits() & !ffi::EF_RESERVED_1,
            EnhancedFxn_SCI: value.sci_functions.bits() & !ffi::EF_RESERVED_1,
            EnhancedFxn_Device: value.device_functions & !ffi::EF_RESERVED_1,
        }
    }
}
