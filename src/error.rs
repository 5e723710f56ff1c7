use crate::{descriptor::DescriptorString, ffi};

/// Result of a CP210x operation.
pub type Result<T, E = Cp210xError> = std::result::Result<T, E>;

/// Represents an error returned by the CP210x library, or detected by this crate
/// before a call was made.
///
/// The first group of variants corresponds one-to-one with the status codes
/// declared by the library. If necessary, a [`Cp210xError`] may be constructed
/// from a status code:
///
/// ```
/// use cp210x::Cp210xError;
///
/// let err = Cp210xError::from(2);
/// assert_eq!(err, Cp210xError::InvalidParameter);
/// assert_eq!(err.code(), Some(2));
/// ```
///
/// Note that the `from` method will panic if the given code is
/// [`CP210x_SUCCESS`](crate::ffi::CP210x_SUCCESS).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cp210xError {
    #[error("invalid handle (error code 0x01)")]
    InvalidHandle,
    #[error("invalid parameter (error code 0x02)")]
    InvalidParameter,
    #[error("device I/O failed (error code 0x03)")]
    DeviceIoFailed,
    #[error("function not supported (error code 0x04)")]
    FunctionNotSupported,
    #[error("global data error (error code 0x05)")]
    GlobalDataError,
    #[error("file error (error code 0x06)")]
    FileError,
    #[error("command failed (error code 0x08)")]
    CommandFailed,
    #[error("invalid access type (error code 0x09)")]
    InvalidAccessType,
    #[error("device not found (error code 0xff)")]
    DeviceNotFound,
    /// A status code the library is not documented to return.
    #[error("unrecognized status (error code {0:#04x})")]
    Unknown(ffi::CP210x_STATUS),

    /// The shared library could not be loaded.
    #[error("failed to load {path}: {reason}")]
    LibraryLoad { path: String, reason: String },
    /// A required entry point is not exported by the loaded library.
    #[error("entry point {0} not found in library")]
    MissingSymbol(&'static str),
    /// The part number reported by the device is not one this crate knows.
    #[error("unknown part number {0:#04x}")]
    UnknownPartNumber(u8),
    /// A descriptor string exceeds the limit of the device.
    #[error("{string} string is {len} characters long, the device allows at most {max}")]
    StringTooLong {
        string: DescriptorString,
        len: usize,
        max: usize,
    },
    /// A descriptor string contains characters that cannot be stored as UCS-2.
    #[error("{0} string contains characters outside the Basic Multilingual Plane")]
    InvalidString(DescriptorString),
    /// A numeric argument is out of the range accepted by the device.
    #[error("{what} out of range: {value} (maximum {max})")]
    OutOfRange {
        what: &'static str,
        value: u32,
        max: u32,
    },
    /// A configuration blob or raw register value is malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A file name cannot be passed to the library.
    #[error("invalid file name {0:?}")]
    InvalidFileName(String),
    /// A serial port could not be opened.
    #[error("failed to open {port}: {reason}")]
    PortOpen { port: String, reason: String },
    /// The DTR or RTS line of a serial port could not be set.
    #[error("failed to set modem lines of {port}: {reason}")]
    ModemLines { port: String, reason: String },
}

impl Cp210xError {
    /// Get the library status code, if this error originated from the library.
    #[must_use]
    pub fn code(&self) -> Option<ffi::CP210x_STATUS> {
        Some(match self {
            Cp210xError::InvalidHandle => ffi::CP210x_INVALID_HANDLE,
            Cp210xError::InvalidParameter => ffi::CP210x_INVALID_PARAMETER,
            Cp210xError::DeviceIoFailed => ffi::CP210x_DEVICE_IO_FAILED,
            Cp210xError::FunctionNotSupported => ffi::CP210x_FUNCTION_NOT_SUPPORTED,
            Cp210xError::GlobalDataError => ffi::CP210x_GLOBAL_DATA_ERROR,
            Cp210xError::FileError => ffi::CP210x_FILE_ERROR,
            Cp210xError::CommandFailed => ffi::CP210x_COMMAND_FAILED,
            Cp210xError::InvalidAccessType => ffi::CP210x_INVALID_ACCESS_TYPE,
            Cp210xError::DeviceNotFound => ffi::CP210x_DEVICE_NOT_FOUND,
            Cp210xError::Unknown(code) => *code,
            _ => return None,
        })
    }
}

impl From<ffi::CP210x_STATUS> for Cp210xError {
    fn from(value: ffi::CP210x_STATUS) -> Self {
        match value {
            ffi::CP210x_SUCCESS => panic!("success is not an error"),
            ffi::CP210x_INVALID_HANDLE => Cp210xError::InvalidHandle,
            ffi::CP210x_INVALID_PARAMETER => Cp210xError::InvalidParameter,
            ffi::CP210x_DEVICE_IO_FAILED => Cp210xError::DeviceIoFailed,
            ffi::CP210x_FUNCTION_NOT_SUPPORTED => Cp210xError::FunctionNotSupported,
            ffi::CP210x_GLOBAL_DATA_ERROR => Cp210xError::GlobalDataError,
            ffi::CP210x_FILE_ERROR => Cp210xError::FileError,
            ffi::CP210x_COMMAND_FAILED => Cp210xError::CommandFailed,
            ffi::CP210x_INVALID_ACCESS_TYPE => Cp210xError::InvalidAccessType,
            ffi::CP210x_DEVICE_NOT_FOUND => Cp210xError::DeviceNotFound,
            code => Cp210xError::Unknown(code),
        }
    }
}

macro_rules! try_cp210x {
    ($expr:expr) => {
        match $expr {
            $crate::ffi::CP210x_SUCCESS => Ok(()),
            code => Err($crate::error::Cp210xError::from(code)),
        }
    };
}

pub(crate) use try_cp210x;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in [1, 2, 3, 4, 5, 6, 8, 9, 0xFF] {
            assert_eq!(Cp210xError::from(code).code(), Some(code));
        }
    }

    #[test]
    fn undocumented_status_is_kept() {
        let err = Cp210xError::from(0x07);
        assert_eq!(err, Cp210xError::Unknown(0x07));
        assert_eq!(err.code(), Some(0x07));
        assert_eq!(err.to_string(), "unrecognized status (error code 0x07)");
    }

    #[test]
    #[should_panic(expected = "success is not an error")]
    fn success_is_not_an_error() {
        let _ = Cp210xError::from(ffi::CP210x_SUCCESS);
    }

    #[test]
    fn crate_errors_have_no_code() {
        assert_eq!(Cp210xError::MissingSymbol("CP210x_Open").code(), None);
        assert_eq!(Cp210xError::InvalidConfig("bad checksum").code(), None);
    }

    #[test]
    fn try_macro() {
        assert_eq!(try_cp210x!(ffi::CP210x_SUCCESS), Ok(()));
        assert_eq!(
            try_cp210x!(ffi::CP210x_DEVICE_NOT_FOUND),
            Err(Cp210xError::DeviceNotFound)
        );
    }
}
