use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{descriptor::DescriptorString, ffi};

/// CP210x part number, as reported by the device.
///
/// The part number determines which configuration calls a device accepts and
/// how long its descriptor strings may be.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PartNumber {
    Cp2101 = 0x01,
    Cp2102 = 0x02,
    Cp2103 = 0x03,
    Cp2104 = 0x04,
    Cp2105 = 0x05,
    Cp2108 = 0x08,
    Cp2109 = 0x09,
    Cp2102nQfn28 = 0x20,
    Cp2102nQfn24 = 0x21,
    Cp2102nQfn20 = 0x22,
}

impl PartNumber {
    /// Any of the CP2102N packages.
    #[must_use]
    pub fn is_cp2102n(self) -> bool {
        matches!(
            self,
            PartNumber::Cp2102nQfn28 | PartNumber::Cp2102nQfn24 | PartNumber::Cp2102nQfn20
        )
    }

    /// Configuration is stored in one-time-programmable memory.
    ///
    /// Each setting on these parts can only be written a limited number of times.
    #[must_use]
    pub fn is_otp(self) -> bool {
        matches!(
            self,
            PartNumber::Cp2104 | PartNumber::Cp2105 | PartNumber::Cp2109
        )
    }

    /// Number of UART interfaces.
    #[must_use]
    pub fn interface_count(self) -> u8 {
        match self {
            PartNumber::Cp2105 => 2,
            PartNumber::Cp2108 => 4,
            _ => 1,
        }
    }

    /// Each interface has its own interface string.
    #[must_use]
    pub fn has_interface_strings(self) -> bool {
        self.interface_count() > 1
    }

    /// Maximum length, in characters, of the given descriptor string.
    ///
    /// `None` if the library does not publish a limit for this part, in which
    /// case the library itself validates the length.
    #[must_use]
    pub fn max_string_len(self, string: DescriptorString) -> Option<usize> {
        use DescriptorString::{Interface, Manufacturer, Product, SerialNumber};

        match (self, string) {
            (PartNumber::Cp2105, Manufacturer) => Some(ffi::CP2105_MAX_MANUFACTURER_STRLEN),
            (PartNumber::Cp2105, Product) => Some(ffi::CP2105_MAX_PRODUCT_STRLEN),
            (PartNumber::Cp2105, SerialNumber) => Some(ffi::CP2105_MAX_SERIAL_STRLEN),
            (PartNumber::Cp2105, Interface(_)) => Some(ffi::CP2105_MAX_INTERFACE_STRLEN),
            (PartNumber::Cp2108, Manufacturer) => Some(ffi::CP2108_MAX_MANUFACTURER_STRLEN),
            (PartNumber::Cp2108, Product) => Some(ffi::CP2108_MAX_PRODUCT_STRLEN),
            (PartNumber::Cp2108, SerialNumber) => Some(ffi::CP2108_MAX_SERIAL_STRLEN),
            (PartNumber::Cp2108, Interface(_)) => Some(ffi::CP2108_MAX_INTERFACE_STRLEN),
            (part, _) if part.is_cp2102n() => None,
            (_, Manufacturer) => Some(ffi::CP210x_MAX_MANUFACTURER_STRLEN),
            (_, Product) => Some(ffi::CP210x_MAX_PRODUCT_STRLEN),
            (_, SerialNumber) => Some(ffi::CP210x_MAX_SERIAL_STRLEN),
            (_, Interface(_)) => None,
        }
    }

    /// Supports the baud rate alias table.
    #[must_use]
    pub fn supports_baud_rate_config(self) -> bool {
        matches!(
            self,
            PartNumber::Cp2102 | PartNumber::Cp2103 | PartNumber::Cp2109
        )
    }

    /// Supports [`PortConfig`](crate::configuration::PortConfig).
    #[must_use]
    pub fn supports_port_config(self) -> bool {
        matches!(self, PartNumber::Cp2103 | PartNumber::Cp2104)
    }

    /// Supports [`DualPortConfig`](crate::configuration::DualPortConfig) and interface modes.
    #[must_use]
    pub fn supports_dual_port_config(self) -> bool {
        self == PartNumber::Cp2105
    }

    /// Supports [`QuadPortConfig`](crate::configuration::QuadPortConfig).
    #[must_use]
    pub fn supports_quad_port_config(self) -> bool {
        self == PartNumber::Cp2108
    }

    /// Supports the flush buffer configuration.
    #[must_use]
    pub fn supports_flush_buffer_config(self) -> bool {
        matches!(
            self,
            PartNumber::Cp2104 | PartNumber::Cp2105 | PartNumber::Cp2108
        )
    }

    /// Reports a firmware version.
    #[must_use]
    pub fn supports_firmware_version(self) -> bool {
        self.is_cp2102n() || matches!(self, PartNumber::Cp2105 | PartNumber::Cp2108)
    }

    /// Can dump its configuration to a hex file.
    #[must_use]
    pub fn supports_hex_file(self) -> bool {
        matches!(
            self,
            PartNumber::Cp2102 | PartNumber::Cp2103 | PartNumber::Cp2109
        )
    }
}

impl std::fmt::Display for PartNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PartNumber::Cp2101 => "CP2101",
            PartNumber::Cp2102 => "CP2102",
            PartNumber::Cp2103 => "CP2103",
            PartNumber::Cp2104 => "CP2104",
            PartNumber::Cp2105 => "CP2105",
            PartNumber::Cp2108 => "CP2108",
            PartNumber::Cp2109 => "CP2109",
            PartNumber::Cp2102nQfn28 => "CP2102N-QFN28",
            PartNumber::Cp2102nQfn24 => "CP2102N-QFN24",
            PartNumber::Cp2102nQfn20 => "CP2102N-QFN20",
        };
        f.write_str(name)
    }
}
