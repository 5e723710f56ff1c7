//! CP2108 port configuration.
//!
//! The CP2108 groups its pins into five 16-bit port banks. Each bank has a
//! mode, a low-power and a latch register, and the device keeps one full set
//! for reset and one for suspend.

use bitflags::bitflags;

use crate::ffi;

bitflags! {
    /// Pins of port bank 0: modem lines of interfaces 0 and 1.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Pb0: u16 {
        const TX0 = ffi::PORT_TX0;
        const RX0 = ffi::PORT_RX0;
        const RTS0 = ffi::PORT_RTS0;
        const CTS0 = ffi::PORT_CTS0;
        const DTR0 = ffi::PORT_DTR0;
        const DSR0 = ffi::PORT_DSR0;
        const DCD0 = ffi::PORT_DCD0;
        const RI0 = ffi::PORT_RI0;
        const TX1 = ffi::PORT_TX1;
        const RX1 = ffi::PORT_RX1;
        const RTS1 = ffi::PORT_RTS1;
        const CTS1 = ffi::PORT_CTS1;
        const DTR1 = ffi::PORT_DTR1;
        const DSR1 = ffi::PORT_DSR1;
        const DCD1 = ffi::PORT_DCD1;
        const RI1 = ffi::PORT_RI1;
    }

    /// Pins of port bank 1: GPIO.0 to GPIO.15.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Pb1: u16 {
        const GPIO_0 = ffi::PORT_GPIO_0;
        const GPIO_1 = ffi::PORT_GPIO_1;
        const GPIO_2 = ffi::PORT_GPIO_2;
        const GPIO_3 = ffi::PORT_GPIO_3;
        const GPIO_4 = ffi::PORT_GPIO_4;
        const GPIO_5 = ffi::PORT_GPIO_5;
        const GPIO_6 = ffi::PORT_GPIO_6;
        const GPIO_7 = ffi::PORT_GPIO_7;
        const GPIO_8 = ffi::PORT_GPIO_8;
        const GPIO_9 = ffi::PORT_GPIO_9;
        const GPIO_10 = ffi::PORT_GPIO_10;
        const GPIO_11 = ffi::PORT_GPIO_11;
        const GPIO_12 = ffi::PORT_GPIO_12;
        const GPIO_13 = ffi::PORT_GPIO_13;
        const GPIO_14 = ffi::PORT_GPIO_14;
        const GPIO_15 = ffi::PORT_GPIO_15;
    }

    /// Pins of port bank 2.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Pb2: u16 {
        const SUSPEND = ffi::PORT_SUSPEND;
        const SUSPEND_BAR = ffi::PORT_SUSPEND_BAR;
        const DTR2 = ffi::PORT_DTR2;
        const DSR2 = ffi::PORT_DSR2;
    }

    /// Pins of port bank 3.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Pb3: u16 {
        const TX2 = ffi::PORT_TX2;
        const RX2 = ffi::PORT_RX2;
        const RTS2 = ffi::PORT_RTS2;
        const CTS2 = ffi::PORT_CTS2;
        const DCD2 = ffi::PORT_DCD2;
        const RI2 = ffi::PORT_RI2;
        const DTR3 = ffi::PORT_DTR3;
        const DSR3 = ffi::PORT_DSR3;
        const DCD3 = ffi::PORT_DCD3;
        const RI3 = ffi::PORT_RI3;
    }

    /// Pins of port bank 4.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct Pb4: u16 {
        const RTS3 = ffi::PORT_RTS3;
        const CTS3 = ffi::PORT_CTS3;
        const TX3 = ffi::PORT_TX3;
        const RX3 = ffi::PORT_RX3;
    }

    /// Alternate pin functions of one CP2108 interface.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct QuadInterfaceFunctions: u8 {
        const GPIO_TXLED = ffi::EF_IFC_GPIO_TXLED;
        const GPIO_RXLED = ffi::EF_IFC_GPIO_RXLED;
        const GPIO_RS485 = ffi::EF_IFC_GPIO_RS485;
        /// RS-485 driver enable is active high.
        const GPIO_RS485_LOGIC = ffi::EF_IFC_GPIO_RS485_LOGIC;
        /// The interface's clock output pin is enabled.
        const GPIO_CLOCK = ffi::EF_IFC_GPIO_CLOCK;
        const DYNAMIC_SUSPEND = ffi::EF_IFC_DYNAMIC_SUSPEND;
    }

    /// Device-wide CP2108 functions.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct QuadDeviceFunctions: u8 {
        const WEAK_PULLUP_RESET = ffi::EF_DEVICE_WEAKPULLUP_RESET;
        const WEAK_PULLUP_SUSPEND = ffi::EF_DEVICE_WEAKPULLUP_SUSPEND;
        const DYNAMIC_SUSPEND = ffi::EF_DEVICE_DYNAMIC_SUSPEND;
    }
}

/// One of the five CP2108 port banks.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum PortBank {
    Pb0 = 0,
    Pb1 = 1,
    Pb2 = 2,
    Pb3 = 3,
    Pb4 = 4,
}

impl PortBank {
    /// Every bank, in register order.
    pub const ALL: [PortBank; 5] = [
        PortBank::Pb0,
        PortBank::Pb1,
        PortBank::Pb2,
        PortBank::Pb3,
        PortBank::Pb4,
    ];
}

/// Registers of one port bank.
///
/// The raw masks can be built from the [`Pb0`] to [`Pb4`] flags.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BankState {
    /// Set for push-pull output, clear for open-drain.
    pub mode: u16,
    /// Set to enable low-power mode for the pin.
    pub low_power: u16,
    /// Set to drive the pin high.
    pub latch: u16,
}

/// State of all port banks at reset or in suspend.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct QuadPortState {
    banks: [BankState; 5],
}

impl QuadPortState {
    /// Registers of one bank.
    #[must_use]
    pub fn bank(&self, bank: PortBank) -> BankState {
        self.banks[bank as usize]
    }

    /// Mutable registers of one bank.
    pub fn bank_mut(&mut self, bank: PortBank) -> &mut BankState {
        &mut self.banks[bank as usize]
    }
}

impl From<ffi::QUAD_PORT_STATE> for QuadPortState {
    fn from(value: ffi::QUAD_PORT_STATE) -> Self {
        let bank = |mode, low_power, latch| BankState {
            mode,
            low_power,
            latch,
        };
        Self {
            banks: [
                bank(value.Mode_PB0, value.LowPower_PB0, value.Latch_PB0),
                bank(value.Mode_PB1, value.LowPower_PB1, value.Latch_PB1),
                bank(value.Mode_PB2, value.LowPower_PB2, value.Latch_PB2),
                bank(value.Mode_PB3, value.LowPower_PB3, value.Latch_PB3),
                bank(value.Mode_PB4, value.LowPower_PB4, value.Latch_PB4),
            ],
        }
    }
}

impl From<QuadPortState> for ffi::QUAD_PORT_STATE {
    fn from(value: QuadPortState) -> Self {
        let [pb0, pb1, pb2, pb3, pb4] = value.banks;
        Self {
            Mode_PB0: pb0.mode,
            Mode_PB1: pb1.mode,
            Mode_PB2: pb2.mode,
            Mode_PB3: pb3.mode,
            Mode_PB4: pb4.mode,
            LowPower_PB0: pb0.low_power,
            LowPower_PB1: pb1.low_power,
            LowPower_PB2: pb2.low_power,
            LowPower_PB3: pb3.low_power,
            LowPower_PB4: pb4.low_power,
            Latch_PB0: pb0.latch,
            Latch_PB1: pb1.latch,
            Latch_PB2: pb2.latch,
            Latch_PB3: pb3.latch,
            Latch_PB4: pb4.latch,
        }
    }
}

/// Port configuration of a CP2108.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct QuadPortConfig {
    /// Pin state after reset.
    pub reset_latch: QuadPortState,
    /// Pin state while suspended.
    pub suspend_latch: QuadPortState,
    /// Inter-packet delay of each interface.
    pub ip_delay: [u8; 4],
    /// Enhanced functions of each interface.
    pub interface_functions: [QuadInterfaceFunctions; 4],
    /// Device-wide enhanced functions.
    pub device_functions: QuadDeviceFunctions,
    /// Clock output divider of each interface.
    pub ext_clock_freq: [u8; 4],
}

impl From<ffi::QUAD_PORT_CONFIG> for QuadPortConfig {
    fn from(value: ffi::QUAD_PORT_CONFIG) -> Self {
        Self {
            reset_latch: value.Reset_Latch.into(),
            suspend_latch: value.Suspend_Latch.into(),
            ip_delay: [
                value.IPDelay_IFC0,
                value.IPDelay_IFC1,
                value.IPDelay_IFC2,
                value.IPDelay_IFC3,
            ],
            interface_functions: [
                value.EnhancedFxn_IFC0,
                value.EnhancedFxn_IFC1,
                value.EnhancedFxn_IFC2,
                value.EnhancedFxn_IFC3,
            ]
            .map(QuadInterfaceFunctions::from_bits_retain),
            device_functions: QuadDeviceFunctions::from_bits_retain(value.EnhancedFxn_Device),
            ext_clock_freq: [
                value.ExtClk0Freq,
                value.ExtClk1Freq,
                value.ExtClk2Freq,
                value.ExtClk3Freq,
            ],
        }
    }
}

impl From<QuadPortConfig> for ffi::QUAD_PORT_CONFIG {
    fn from(value: QuadPortConfig) -> Self {
        let [ifc0, ifc1, ifc2, ifc3] = value
            .interface_functions
            .map(|functions| functions.bits() & !ffi::EF_RESERVED_1);
        Self {
            Reset_Latch: value.reset_latch.into(),
            Suspend_Latch: value.suspend_latch.into(),
            IPDelay_IFC0: value.ip_delay[0],
            IPDelay_IFC1: value.ip_delay[1],
            IPDelay_IFC2: value.ip_delay[2],
            IPDelay_IFC3: value.ip_delay[3],
            EnhancedFxn_IFC0: ifc0,
            EnhancedFxn_IFC1: ifc1,
            EnhancedFxn_IFC2: ifc2,
            EnhancedFxn_IFC3: ifc3,
            EnhancedFxn_Device: value.device_functions.bits(),
            ExtClk0Freq: value.ext_clock_freq[0],
            ExtClk1Freq: value.ext_clock_freq[1],
            ExtClk2Freq: value.ext_clock_freq[2],
            ExtClk3Freq: value.ext_clock_freq[3],
        }
    }
}
