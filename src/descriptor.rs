//! USB string descriptors.
//!
//! A CP210x device carries up to four kinds of string descriptors in its
//! programmable memory:
//!
//! 1. The manufacturer string (`iManufacturer`)
//! 2. The product string (`iProduct`)
//! 3. The serial number string (`iSerialNumber`)
//! 4. One interface string per UART interface (`iInterface`), CP2105 and CP2108 only
//!
//! USB string descriptors are UCS-2: every character occupies exactly one
//! little-endian 16-bit code unit. Characters outside the Basic Multilingual
//! Plane would need a surrogate pair and cannot be stored.
//!
//! Separately, the library keeps host-side "product strings" for each attached
//! device (see [`ProductStringKind`]). These come from the operating system
//! rather than from the device.
//!
//! # Resources
//! - <https://www.beyondlogic.org/usbnutshell/usb5.shtml#StringDescriptors>

use std::fmt::Display;

use crate::{ffi, part::PartNumber, Cp210xError, Result};

/// Identifies one of the string descriptors stored on the device.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DescriptorString {
    Manufacturer,
    Product,
    SerialNumber,
    /// Interface string for the given zero-based interface number.
    Interface(u8),
}

impl Display for DescriptorString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorString::Manufacturer => f.write_str("manufacturer"),
            DescriptorString::Product => f.write_str("product"),
            DescriptorString::SerialNumber => f.write_str("serial number"),
            DescriptorString::Interface(n) => write!(f, "interface {n}"),
        }
    }
}

/// Which host-side product string to query for an attached device.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum ProductStringKind {
    /// Serial number, derived from the device path.
    SerialNumber = ffi::CP210x_GETPRODUCTSTRING_SERIAL_NUMBER,
    /// Friendly name or description registered with the operating system.
    Description = ffi::CP210x_GETPRODUCTSTRING_DESCRIPTION,
    /// Device interface path, usable to open the device with OS calls.
    FullPath = ffi::CP210x_GETPRODUCTSTRING_FULL_PATH,
}

/// Encode a string for writing to the device.
///
/// Fails if the string contains characters outside the BMP, or if it is longer
/// than the limit of the given part. Parts without a published limit are only
/// checked against the 8-bit length field of the library call.
pub(crate) fn encode(
    part: Option<PartNumber>,
    string: DescriptorString,
    value: &str,
) -> Result<Vec<u16>> {
    let units: Vec<u16> = value.encode_utf16().collect();
    if units.len() != value.chars().count() {
        return Err(Cp210xError::InvalidString(string));
    }
    let max = part
        .and_then(|part| part.max_string_len(string))
        .unwrap_or(usize::from(u8::MAX));
    if units.len() > max {
        return Err(Cp210xError::StringTooLong {
            string,
            len: units.len(),
            max,
        });
    }
    Ok(units)
}

/// Decode a UCS-2 string as returned by the library.
///
/// `len` is the byte count reported by the library and is clamped to the
/// buffer size. A trailing odd byte is ignored.
pub(crate) fn decode(buf: &[u8], len: usize) -> String {
    let wide_chars = buf[..len.min(buf.len())]
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&c| c != 0)
        .collect::<Vec<_>>();
    String::from_utf16_lossy(&wide_chars)
}

/// Decode a NUL-terminated 8-bit string.
pub(crate) fn decode_narrow(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_within_limit() {
        let units = encode(
            Some(PartNumber::Cp2102),
            DescriptorString::Product,
            "CP2102 USB to UART Bridge Controller",
        )
        .unwrap();
        assert_eq!(units.len(), 36);
        assert_eq!(units[0], u16::from(b'C'));
    }

    #[test]
    fn encode_rejects_long_strings() {
        let serial = "0123456789abcdefX";
        assert_eq!(
            encode(
                Some(PartNumber::Cp2105),
                DescriptorString::SerialNumber,
                serial
            ),
            Err(Cp210xError::StringTooLong {
                string: DescriptorString::SerialNumber,
                len: 17,
                max: 16,
            })
        );
        // no published limit, only the length field applies
        assert!(encode(
            Some(PartNumber::Cp2102nQfn28),
            DescriptorString::SerialNumber,
            serial
        )
        .is_ok());
        assert!(encode(None, DescriptorString::Product, &"x".repeat(256)).is_err());
    }

    #[test]
    fn encode_rejects_astral_characters() {
        assert_eq!(
            encode(None, DescriptorString::Manufacturer, "ACME \u{1F680}"),
            Err(Cp210xError::InvalidString(DescriptorString::Manufacturer))
        );
        // non-ASCII BMP characters are fine
        assert!(encode(None, DescriptorString::Manufacturer, "Müller").is_ok());
    }

    #[test]
    fn decode_wide() {
        let buf = [b'S', 0, b'i', 0, b'L', 0, 0, 0, b'x', 0];
        assert_eq!(decode(&buf, 6), "SiL");
        // terminator inside the reported length
        assert_eq!(decode(&buf, 10), "SiL");
        // odd length and oversized length
        assert_eq!(decode(&buf, 5), "Si");
        assert_eq!(decode(&buf[..4], 200), "Si");
    }

    #[test]
    fn decode_narrow_stops_at_nul() {
        assert_eq!(decode_narrow(b"COM3\0garbage"), "COM3");
        assert_eq!(decode_narrow(b"no terminator"), "no terminator");
    }

    #[test]
    fn display() {
        assert_eq!(DescriptorString::Interface(2).to_string(), "interface 2");
        assert_eq!(DescriptorString::SerialNumber.to_string(), "serial number");
    }
}
