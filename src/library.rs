use std::{
    ffi::OsString,
    path::Path,
    sync::{Mutex, OnceLock},
};

use log::{debug, warn};

use crate::{ffi, Cp210xError, Result};

/// Environment variable overriding the path of the manufacturing library.
pub const LIBRARY_PATH_ENV: &str = "CP210X_MANUFACTURING_LIB";

/// A loaded CP210x Manufacturing library.
///
/// The library is loaded at runtime rather than linked, so that programs using
/// this crate can start (and report a useful error) on machines without it.
/// Devices opened through a [`Library`] borrow it, so it cannot be unloaded
/// while a handle is open.
///
/// Most programs use the process-wide instance returned by [`Library::global`],
/// which the free functions [`list_devices`](crate::list_devices) and
/// [`device_count`](crate::device_count) go through.
#[derive(Debug)]
pub struct Library {
    api: ffi::Manufacturing,
}

static GLOBAL: OnceLock<Library> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

impl Library {
    /// Load the library from [`LIBRARY_PATH_ENV`] if set, else by its default name.
    ///
    /// The default name is `CP210xManufacturing.dll` on Windows and
    /// `libcp210xmanufacturing.so` (`.dylib` on macOS) elsewhere, resolved
    /// through the platform's usual search path.
    pub fn load() -> Result<Self> {
        Self::load_from(default_path())
    }

    /// Load the library from the given path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading CP210x manufacturing library from {}", path.display());
        // SAFETY: loading runs the library's initialisers. The vendor library
        // does not have any initialisation requirements of its own.
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            Cp210xError::LibraryLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let api = unsafe { resolve(library)? };
        Ok(Self { api })
    }

    /// Get the process-wide library, loading it on first use.
    ///
    /// If loading fails the error is returned and the next call tries again.
    pub fn global() -> Result<&'static Library> {
        if let Some(library) = GLOBAL.get() {
            return Ok(library);
        }
        let _guard = GLOBAL_INIT
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(library) = GLOBAL.get() {
            return Ok(library);
        }
        let library = Self::load()?;
        Ok(GLOBAL.get_or_init(|| library))
    }

    /// Raw function table.
    ///
    /// Although not recommended for typical users, the entry points may be
    /// called directly, e.g. with a handle obtained from
    /// [`Device::handle`](crate::Device::handle).
    #[must_use]
    pub fn api(&self) -> &ffi::Manufacturing {
        &self.api
    }

    #[cfg(test)]
    pub(crate) fn from_api(api: ffi::Manufacturing) -> Self {
        Self { api }
    }
}

fn default_path() -> OsString {
    match std::env::var_os(LIBRARY_PATH_ENV) {
        Some(path) if !path.is_empty() => path,
        _ => default_name(),
    }
}

#[cfg(windows)]
fn default_name() -> OsString {
    OsString::from("CP210xManufacturing.dll")
}

#[cfg(not(windows))]
fn default_name() -> OsString {
    libloading::library_filename("cp210xmanufacturing")
}

/// Resolve a required entry point, copying the function pointer out of the symbol.
macro_rules! required {
    ($library:expr, $name:literal) => {{
        let symbol = $library
            .get(concat!($name, "\0").as_bytes())
            .map_err(|_| Cp210xError::MissingSymbol($name))?;
        let function = *symbol;
        function
    }};
}

/// Resolve an entry point which older library releases do not export.
macro_rules! optional {
    ($library:expr, $name:literal) => {{
        let function = match $library.get(concat!($name, "\0").as_bytes()) {
            Ok(symbol) => {
                let function = *symbol;
                Some(function)
            }
            Err(_) => None,
        };
        if function.is_none() {
            warn!("{} not exported by the loaded library", $name);
        }
        function
    }};
}

/// Build the function table for a freshly loaded library.
///
/// # Safety
///
/// The library must be a CP210x Manufacturing library, so that each exported
/// name has the signature declared in [`ffi`].
unsafe fn resolve(library: libloading::Library) -> Result<ffi::Manufacturing> {
    Ok(ffi::Manufacturing {
        GetNumDevices: required!(library, "CP210x_GetNumDevices"),
        GetProductString: required!(library, "CP210x_GetProductString"),
        GetProductStringSafe: optional!(library, "CP210x_GetProductStringSafe"),
        Open: required!(library, "CP210x_Open"),
        Close: required!(library, "CP210x_Close"),
        GetPartNumber: required!(library, "CP210x_GetPartNumber"),

        SetVid: required!(library, "CP210x_SetVid"),
        SetPid: required!(library, "CP210x_SetPid"),
        SetManufacturerString: required!(library, "CP210x_SetManufacturerString"),
        SetProductString: required!(library, "CP210x_SetProductString"),
        SetInterfaceString: required!(library, "CP210x_SetInterfaceString"),
        SetSerialNumber: required!(library, "CP210x_SetSerialNumber"),
        SetSelfPower: required!(library, "CP210x_SetSelfPower"),
        SetMaxPower: required!(library, "CP210x_SetMaxPower"),
        SetFlushBufferConfig: required!(library, "CP210x_SetFlushBufferConfig"),
        SetDeviceMode: required!(library, "CP210x_SetDeviceMode"),
        SetDeviceVersion: required!(library, "CP210x_SetDeviceVersion"),
        SetBaudRateConfig: required!(library, "CP210x_SetBaudRateConfig"),
        SetPortConfig: required!(library, "CP210x_SetPortConfig"),
        SetDualPortConfig: required!(library, "CP210x_SetDualPortConfig"),
        SetQuadPortConfig: required!(library, "CP210x_SetQuadPortConfig"),
        SetLockValue: required!(library, "CP210x_SetLockValue"),

        GetDeviceVid: required!(library, "CP210x_GetDeviceVid"),
        GetDevicePid: required!(library, "CP210x_GetDevicePid"),
        GetDeviceManufacturerString: required!(library, "CP210x_GetDeviceManufacturerString"),
        GetDeviceProductString: required!(library, "CP210x_GetDeviceProductString"),
        GetDeviceInterfaceString: required!(library, "CP210x_GetDeviceInterfaceString"),
        GetDeviceSerialNumber: required!(library, "CP210x_GetDeviceSerialNumber"),
        GetDeviceAddress: optional!(library, "CP210x_GetDeviceAddress"),
        GetSelfPower: required!(library, "CP210x_GetSelfPower"),
        GetMaxPower: required!(library, "CP210x_GetMaxPower"),
        GetFlushBufferConfig: required!(library, "CP210x_GetFlushBufferConfig"),
        GetDeviceMode: required!(library, "CP210x_GetDeviceMode"),
        GetDeviceVersion: required!(library, "CP210x_GetDeviceVersion"),
        GetBaudRateConfig: required!(library, "CP210x_GetBaudRateConfig"),
        GetPortConfig: required!(library, "CP210x_GetPortConfig"),
        GetDualPortConfig: required!(library, "CP210x_GetDualPortConfig"),
        GetQuadPortConfig: required!(library, "CP210x_GetQuadPortConfig"),
        GetLockValue: required!(library, "CP210x_GetLockValue"),

        Reset: required!(library, "CP210x_Reset"),
        CreateHexFile: required!(library, "CP210x_CreateHexFile"),
        GetFirmwareVersion: optional!(library, "CP210x_GetFirmwareVersion"),
        GetConfig: optional!(library, "CP210x_GetConfig"),
        SetConfig: optional!(library, "CP210x_SetConfig"),
        UpdateFirmware: optional!(library, "CP210x_UpdateFirmware"),
        GetGeneric: optional!(library, "CP210x_GetGeneric"),
        SetGeneric: optional!(library, "CP210x_SetGeneric"),

        library: Some(library),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_library() {
        let err = Library::load_from("/nonexistent/libcp210xmanufacturing.so").unwrap_err();
        match err {
            Cp210xError::LibraryLoad { path, .. } => {
                assert_eq!(path, "/nonexistent/libcp210xmanufacturing.so");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn default_library_name() {
        let name = default_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("libcp210xmanufacturing."));
    }
}
