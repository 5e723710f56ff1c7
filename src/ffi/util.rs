//! Miscellaneous utility functions.
//!
//! This module contains functions which are used internally by the crate, but are not
//! part of the public API. These functions may be changed or removed at any time.

use std::ptr::addr_of_mut;

use super::*;
use crate::{descriptor, error::try_cp210x, Cp210xError, Result};

/// Size in bytes of the buffer handed to the string getters.
///
/// The library reports the string length in a single byte, so a longer string
/// cannot be returned.
pub(crate) const STRING_BUFFER_LEN: usize = CP210x_MAX_DEVICE_STRLEN;

/// Read a descriptor string through one of the `CP210x_GetDevice*String` calls.
///
/// The closure receives the output buffer and the length out-parameter, and
/// must request the string unconverted (UCS-2).
pub(crate) fn read_string<F>(f: F) -> Result<String>
where
    F: FnOnce(*mut c_void, *mut u8) -> CP210x_STATUS,
{
    let mut buf = [0u8; STRING_BUFFER_LEN];
    let mut len: u8 = 0;
    try_cp210x!(f(buf.as_mut_ptr().cast(), addr_of_mut!(len)))?;
    Ok(descriptor::decode(&buf, usize::from(len)))
}

/// Write a descriptor string through one of the `CP210x_Set*String` calls.
///
/// The closure receives the UCS-2 buffer and its length in characters.
pub(crate) fn write_string<F>(units: &mut [u16], f: F) -> Result<()>
where
    F: FnOnce(*mut c_void, u8) -> CP210x_STATUS,
{
    let len = u8::try_from(units.len()).map_err(|_| Cp210xError::OutOfRange {
        what: "string length",
        value: u32::try_from(units.len()).unwrap_or(u32::MAX),
        max: u32::from(u8::MAX),
    })?;
    try_cp210x!(f(units.as_mut_ptr().cast(), len))
}

/// Length argument for the buffer calls (`CP210x_GetConfig` and friends).
pub(crate) fn buffer_len(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Cp210xError::OutOfRange {
        what: "buffer length",
        value: u32::try_from(len).unwrap_or(u32::MAX),
        max: u32::from(u16::MAX),
    })
}

#[inline]
pub(crate) fn to_bool(value: BOOL) -> bool {
    value != FALSE
}

#[inline]
pub(crate) fn from_bool(value: bool) -> BOOL {
    if value {
        TRUE
    } else {
        FALSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_string_passes_buffer() {
        let s = read_string(|buf, len| {
            let bytes = [b'O', 0, b'K', 0];
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), bytes.len());
                *len = 4;
            }
            CP210x_SUCCESS
        })
        .unwrap();
        assert_eq!(s, "OK");
    }

    #[test]
    fn read_string_propagates_status() {
        let err = read_string(|_, _| CP210x_DEVICE_IO_FAILED).unwrap_err();
        assert_eq!(err, Cp210xError::DeviceIoFailed);
    }

    #[test]
    fn write_string_length_is_in_characters() {
        let mut units: Vec<u16> = "abc".encode_utf16().collect();
        write_string(&mut units, |_, len| {
            assert_eq!(len, 3);
            CP210x_SUCCESS
        })
        .unwrap();

        let mut long = vec![0x41u16; 256];
        assert!(matches!(
            write_string(&mut long, |_, _| CP210x_SUCCESS),
            Err(Cp210xError::OutOfRange { value: 256, .. })
        ));
    }

    #[test]
    fn bool_conversion() {
        assert!(to_bool(TRUE));
        assert!(to_bool(-1));
        assert!(!to_bool(FALSE));
        assert_eq!(from_bool(true), TRUE);
        assert_eq!(buffer_len(0x2A6), Ok(0x2A6));
        assert!(buffer_len(0x1_0000).is_err());
    }
}
