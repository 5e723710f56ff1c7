//! Raw bindings to the CP210x Manufacturing library.
//!
//! This module mirrors `CP210xManufacturingDLL.h`: the status codes, the
//! constants, the `#[repr(C)]` structures, and one function-pointer type per
//! exported entry point. Most users will not need to use this module directly,
//! and should instead use the higher-level abstractions provided by the rest of
//! the crate.
//!
//! The entry points of a loaded library are available through
//! [`Library::api`](crate::Library::api).
#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(missing_docs)]

pub(crate) mod util;

use std::{
    ffi::{c_char, c_void},
    panic::catch_unwind,
    sync::Mutex,
};

use widestring::WideChar;

pub type HANDLE = *mut c_void;
pub type PHANDLE = *mut HANDLE;
pub type BOOL = i32;
pub type CP210x_STATUS = i32;

pub const TRUE: BOOL = 1;
pub const FALSE: BOOL = 0;

// Status codes
pub const CP210x_SUCCESS: CP210x_STATUS = 0x00;
pub const CP210x_INVALID_HANDLE: CP210x_STATUS = 0x01;
pub const CP210x_INVALID_PARAMETER: CP210x_STATUS = 0x02;
pub const CP210x_DEVICE_IO_FAILED: CP210x_STATUS = 0x03;
pub const CP210x_FUNCTION_NOT_SUPPORTED: CP210x_STATUS = 0x04;
pub const CP210x_GLOBAL_DATA_ERROR: CP210x_STATUS = 0x05;
pub const CP210x_FILE_ERROR: CP210x_STATUS = 0x06;
pub const CP210x_COMMAND_FAILED: CP210x_STATUS = 0x08;
pub const CP210x_INVALID_ACCESS_TYPE: CP210x_STATUS = 0x09;
pub const CP210x_DEVICE_NOT_FOUND: CP210x_STATUS = 0xFF;

// Which "product string" CP210x_GetProductString returns
pub const CP210x_GETPRODUCTSTRING_SERIAL_NUMBER: u32 = 0x00;
pub const CP210x_GETPRODUCTSTRING_DESCRIPTION: u32 = 0x01;
pub const CP210x_GETPRODUCTSTRING_FULL_PATH: u32 = 0x02;
pub const CP210x_RETURN_SERIAL_NUMBER: u32 = CP210x_GETPRODUCTSTRING_SERIAL_NUMBER;
pub const CP210x_RETURN_DESCRIPTION: u32 = CP210x_GETPRODUCTSTRING_DESCRIPTION;
pub const CP210x_RETURN_FULL_PATH: u32 = CP210x_GETPRODUCTSTRING_FULL_PATH;

// Part numbers as returned by CP210x_GetPartNumber
pub const CP210x_PARTNUM_CP2101: u8 = 0x01;
pub const CP210x_PARTNUM_CP2102: u8 = 0x02;
pub const CP210x_PARTNUM_CP2103: u8 = 0x03;
pub const CP210x_PARTNUM_CP2104: u8 = 0x04;
pub const CP210x_PARTNUM_CP2105: u8 = 0x05;
pub const CP210x_PARTNUM_CP2108: u8 = 0x08;
pub const CP210x_PARTNUM_CP2109: u8 = 0x09;
pub const CP210x_PARTNUM_CP2102N_QFN28: u8 = 0x20;
pub const CP210x_PARTNUM_CP2102N_QFN24: u8 = 0x21;
pub const CP210x_PARTNUM_CP2102N_QFN20: u8 = 0x22;

// String lengths, in characters
pub const CP210x_MAX_DEVICE_STRLEN: usize = 256;
pub const CP210x_MAX_MANUFACTURER_STRLEN: usize = 45;
pub const CP210x_MAX_PRODUCT_STRLEN: usize = 126;
pub const CP210x_MAX_SERIAL_STRLEN: usize = 63;
pub const CP2105_MAX_MANUFACTURER_STRLEN: usize = 12;
pub const CP2105_MAX_PRODUCT_STRLEN: usize = 47;
pub const CP2105_MAX_SERIAL_STRLEN: usize = 16;
pub const CP2105_MAX_INTERFACE_STRLEN: usize = 32;
pub const CP2108_MAX_MANUFACTURER_STRLEN: usize = 126;
pub const CP2108_MAX_PRODUCT_STRLEN: usize = 126;
pub const CP2108_MAX_SERIAL_STRLEN: usize = 126;
pub const CP2108_MAX_INTERFACE_STRLEN: usize = 126;

pub type CP210x_DEVICE_STRING = [c_char; CP210x_MAX_DEVICE_STRLEN];

pub const CP210x_MAX_MAXPOWER: u8 = 250;

pub const NUM_BAUD_CONFIGS: usize = 32;
pub const BAUD_CONFIG_SIZE: usize = 10;

// Flush buffer configuration
pub const FC_OPEN_TX: u16 = 0x01;
pub const FC_OPEN_RX: u16 = 0x02;
pub const FC_CLOSE_TX: u16 = 0x04;
pub const FC_CLOSE_RX: u16 = 0x08;
pub const FC_OPEN_TX_SCI: u16 = FC_OPEN_TX;
pub const FC_OPEN_RX_SCI: u16 = FC_OPEN_RX;
pub const FC_CLOSE_TX_SCI: u16 = FC_CLOSE_TX;
pub const FC_CLOSE_RX_SCI: u16 = FC_CLOSE_RX;
pub const FC_OPEN_TX_ECI: u16 = 0x10;
pub const FC_OPEN_RX_ECI: u16 = 0x20;
pub const FC_CLOSE_TX_ECI: u16 = 0x40;
pub const FC_CLOSE_RX_ECI: u16 = 0x80;
pub const FC_OPEN_TX_IFC0: u16 = 0x0001;
pub const FC_OPEN_RX_IFC0: u16 = 0x0002;
pub const FC_CLOSE_TX_IFC0: u16 = 0x0004;
pub const FC_CLOSE_RX_IFC0: u16 = 0x0008;
pub const FC_OPEN_TX_IFC1: u16 = 0x0010;
pub const FC_OPEN_RX_IFC1: u16 = 0x0020;
pub const FC_CLOSE_TX_IFC1: u16 = 0x0040;
pub const FC_CLOSE_RX_IFC1: u16 = 0x0080;
pub const FC_OPEN_TX_IFC2: u16 = 0x0100;
pub const FC_OPEN_RX_IFC2: u16 = 0x0200;
pub const FC_CLOSE_TX_IFC2: u16 = 0x0400;
pub const FC_CLOSE_RX_IFC2: u16 = 0x0800;
pub const FC_OPEN_TX_IFC3: u16 = 0x1000;
pub const FC_OPEN_RX_IFC3: u16 = 0x2000;
pub const FC_CLOSE_TX_IFC3: u16 = 0x4000;
pub const FC_CLOSE_RX_IFC3: u16 = 0x8000;

// Single port (CP2103/CP2104) pins
pub const PORT_RI_ON: u16 = 0x0001;
pub const PORT_DCD_ON: u16 = 0x0002;
pub const PORT_DTR_ON: u16 = 0x0004;
pub const PORT_DSR_ON: u16 = 0x0008;
pub const PORT_TXD_ON: u16 = 0x0010;
pub const PORT_RXD_ON: u16 = 0x0020;
pub const PORT_RTS_ON: u16 = 0x0040;
pub const PORT_CTS_ON: u16 = 0x0080;
pub const PORT_GPIO_0_ON: u16 = 0x0100;
pub const PORT_GPIO_1_ON: u16 = 0x0200;
pub const PORT_GPIO_2_ON: u16 = 0x0400;
pub const PORT_GPIO_3_ON: u16 = 0x0800;
pub const PORT_SUSPEND_ON: u16 = 0x4000;
pub const PORT_SUSPEND_BAR_ON: u16 = 0x8000;

// Single port enhanced functions
pub const EF_GPIO_0_TXLED: u8 = 0x01;
pub const EF_GPIO_1_RXLED: u8 = 0x02;
pub const EF_GPIO_2_RS485: u8 = 0x04;
pub const EF_RS485_INVERT: u8 = 0x08;
pub const EF_WEAKPULLUP: u8 = 0x10;
pub const EF_RESERVED_1: u8 = 0x20;
pub const EF_SERIAL_DYNAMIC_SUSPEND: u8 = 0x40;
pub const EF_GPIO_DYNAMIC_SUSPEND: u8 = 0x80;

// Dual port (CP2105) pins
pub const PORT_RI_SCI_ON: u16 = 0x0001;
pub const PORT_DCD_SCI_ON: u16 = 0x0002;
pub const PORT_DTR_SCI_ON: u16 = 0x0004;
pub const PORT_DSR_SCI_ON: u16 = 0x0008;
pub const PORT_TXD_SCI_ON: u16 = 0x0010;
pub const PORT_RXD_SCI_ON: u16 = 0x0020;
pub const PORT_RTS_SCI_ON: u16 = 0x0040;
pub const PORT_CTS_SCI_ON: u16 = 0x0080;
pub const PORT_GPIO_0_SCI_ON: u16 = 0x0002;
pub const PORT_GPIO_1_SCI_ON: u16 = 0x0004;
pub const PORT_GPIO_2_SCI_ON: u16 = 0x0008;
pub const PORT_SUSPEND_SCI_ON: u16 = 0x0001;
pub const PORT_RI_ECI_ON: u16 = 0x0100;
pub const PORT_DCD_ECI_ON: u16 = 0x0200;
pub const PORT_DTR_ECI_ON: u16 = 0x0400;
pub const PORT_DSR_ECI_ON: u16 = 0x0800;
pub const PORT_TXD_ECI_ON: u16 = 0x1000;
pub const PORT_RXD_ECI_ON: u16 = 0x2000;
pub const PORT_RTS_ECI_ON: u16 = 0x4000;
pub const PORT_CTS_ECI_ON: u16 = 0x8000;
pub const PORT_GPIO_0_ECI_ON: u16 = 0x0400;
pub const PORT_GPIO_1_ECI_ON: u16 = 0x0800;
pub const PORT_SUSPEND_ECI_ON: u16 = 0x0100;

// Dual port enhanced functions
pub const EF_GPIO_0_TXLED_ECI: u8 = 0x01;
pub const EF_GPIO_1_RXLED_ECI: u8 = 0x02;
pub const EF_GPIO_1_RS485_ECI: u8 = 0x04;
pub const EF_INVERT_SUSPEND_ECI: u8 = 0x10;
pub const EF_DYNAMIC_SUSPEND_ECI: u8 = 0x40;
pub const EF_GPIO_0_TXLED_SCI: u8 = 0x01;
pub const EF_GPIO_1_RXLED_SCI: u8 = 0x02;
pub const EF_INVERT_SUSPEND_SCI: u8 = 0x10;
pub const EF_DYNAMIC_SUSPEND_SCI: u8 = 0x40;

// Quad port (CP2108) pins, PB0
pub const PORT_TX0: u16 = 0x0001;
pub const PORT_RX0: u16 = 0x0002;
pub const PORT_RTS0: u16 = 0x0004;
pub const PORT_CTS0: u16 = 0x0008;
pub const PORT_DTR0: u16 = 0x0010;
pub const PORT_DSR0: u16 = 0x0020;
pub const PORT_DCD0: u16 = 0x0040;
pub const PORT_RI0: u16 = 0x0080;
pub const PORT_TX1: u16 = 0x0100;
pub const PORT_RX1: u16 = 0x0200;
pub const PORT_RTS1: u16 = 0x0400;
pub const PORT_CTS1: u16 = 0x0800;
pub const PORT_DTR1: u16 = 0x1000;
pub const PORT_DSR1: u16 = 0x2000;
pub const PORT_DCD1: u16 = 0x4000;
pub const PORT_RI1: u16 = 0x8000;
// PB1
pub const PORT_GPIO_0: u16 = 0x0001;
pub const PORT_GPIO_1: u16 = 0x0002;
pub const PORT_GPIO_2: u16 = 0x0004;
pub const PORT_GPIO_3: u16 = 0x0008;
pub const PORT_GPIO_4: u16 = 0x0010;
pub const PORT_GPIO_5: u16 = 0x0020;
pub const PORT_GPIO_6: u16 = 0x0040;
pub const PORT_GPIO_7: u16 = 0x0080;
pub const PORT_GPIO_8: u16 = 0x0100;
pub const PORT_GPIO_9: u16 = 0x0200;
pub const PORT_GPIO_10: u16 = 0x0400;
pub const PORT_GPIO_11: u16 = 0x0800;
pub const PORT_GPIO_12: u16 = 0x1000;
pub const PORT_GPIO_13: u16 = 0x2000;
pub const PORT_GPIO_14: u16 = 0x4000;
pub const PORT_GPIO_15: u16 = 0x8000;
// PB2
pub const PORT_SUSPEND: u16 = 0x0001;
pub const PORT_SUSPEND_BAR: u16 = 0x0002;
pub const PORT_DTR2: u16 = 0x0004;
pub const PORT_DSR2: u16 = 0x0008;
// PB3
pub const PORT_TX2: u16 = 0x0001;
pub const PORT_RX2: u16 = 0x0002;
pub const PORT_RTS2: u16 = 0x0004;
pub const PORT_CTS2: u16 = 0x0008;
pub const PORT_DCD2: u16 = 0x0010;
pub const PORT_RI2: u16 = 0x0020;
pub const PORT_DTR3: u16 = 0x0040;
pub const PORT_DSR3: u16 = 0x0080;
pub const PORT_DCD3: u16 = 0x0100;
pub const PORT_RI3: u16 = 0x0200;
// PB4
pub const PORT_RTS3: u16 = 0x0001;
pub const PORT_CTS3: u16 = 0x0002;
pub const PORT_TX3: u16 = 0x0004;
pub const PORT_RX3: u16 = 0x0008;

// Quad port enhanced functions, per interface
pub const EF_IFC_GPIO_TXLED: u8 = 0x01;
pub const EF_IFC_GPIO_RXLED: u8 = 0x02;
pub const EF_IFC_GPIO_RS485: u8 = 0x04;
pub const EF_IFC_GPIO_RS485_LOGIC: u8 = 0x08;
pub const EF_IFC_GPIO_CLOCK: u8 = 0x10;
pub const EF_IFC_DYNAMIC_SUSPEND: u8 = 0x40;
// Quad port enhanced functions, device-wide
pub const EF_DEVICE_WEAKPULLUP_RESET: u8 = 0x10;
pub const EF_DEVICE_WEAKPULLUP_SUSPEND: u8 = 0x20;
pub const EF_DEVICE_DYNAMIC_SUSPEND: u8 = 0x40;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BAUD_CONFIG {
    pub BaudGen: u16,
    pub Timer0Reload: u16,
    pub Prescaler: u8,
    pub BaudRate: u32,
}

pub type PBAUD_CONFIG = *mut BAUD_CONFIG;
pub type BAUD_CONFIG_DATA = [BAUD_CONFIG; NUM_BAUD_CONFIGS];

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PORT_CONFIG {
    pub Mode: u16,
    pub Reset_Latch: u16,
    pub Suspend_Latch: u16,
    pub EnhancedFxn: u8,
}

pub type PPORT_CONFIG = *mut PORT_CONFIG;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DUAL_PORT_CONFIG {
    pub Mode: u16,
    pub Reset_Latch: u16,
    pub Suspend_Latch: u16,
    pub EnhancedFxn_ECI: u8,
    pub EnhancedFxn_SCI: u8,
    pub EnhancedFxn_Device: u8,
}

pub type PDUAL_PORT_CONFIG = *mut DUAL_PORT_CONFIG;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QUAD_PORT_STATE {
    pub Mode_PB0: u16,
    pub Mode_PB1: u16,
    pub Mode_PB2: u16,
    pub Mode_PB3: u16,
    pub Mode_PB4: u16,
    pub LowPower_PB0: u16,
    pub LowPower_PB1: u16,
    pub LowPower_PB2: u16,
    pub LowPower_PB3: u16,
    pub LowPower_PB4: u16,
    pub Latch_PB0: u16,
    pub Latch_PB1: u16,
    pub Latch_PB2: u16,
    pub Latch_PB3: u16,
    pub Latch_PB4: u16,
}

pub type PQUAD_PORT_STATE = *mut QUAD_PORT_STATE;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QUAD_PORT_CONFIG {
    pub Reset_Latch: QUAD_PORT_STATE,
    pub Suspend_Latch: QUAD_PORT_STATE,
    pub IPDelay_IFC0: u8,
    pub IPDelay_IFC1: u8,
    pub IPDelay_IFC2: u8,
    pub IPDelay_IFC3: u8,
    pub EnhancedFxn_IFC0: u8,
    pub EnhancedFxn_IFC1: u8,
    pub EnhancedFxn_IFC2: u8,
    pub EnhancedFxn_IFC3: u8,
    pub EnhancedFxn_Device: u8,
    pub ExtClk0Freq: u8,
    pub ExtClk1Freq: u8,
    pub ExtClk2Freq: u8,
    pub ExtClk3Freq: u8,
}

pub type PQUAD_PORT_CONFIG = *mut QUAD_PORT_CONFIG;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct firmware_t {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
}

pub type pFirmware_t = *mut firmware_t;

pub type CP210x_GetNumDevices = unsafe extern "system" fn(lpdwNumDevices: *mut u32) -> CP210x_STATUS;
pub type CP210x_GetProductString = unsafe extern "system" fn(
    dwDeviceIndex: u32,
    lpvProductString: *mut c_void,
    dwFlags: u32,
) -> CP210x_STATUS;
pub type CP210x_GetProductStringSafe = unsafe extern "system" fn(
    dwDeviceIndex: u32,
    WhichProductStringToReturn: u32,
    pProductString: *mut WideChar,
    ProductStringLenInBytes: usize,
) -> CP210x_STATUS;
pub type CP210x_Open =
    unsafe extern "system" fn(DeviceIndex: u32, pcyHandle: PHANDLE) -> CP210x_STATUS;
pub type CP210x_Close = unsafe extern "system" fn(cyHandle: HANDLE) -> CP210x_STATUS;
pub type CP210x_GetPartNumber =
    unsafe extern "system" fn(cyHandle: HANDLE, lpbPartNum: *mut u8) -> CP210x_STATUS;
pub type CP210x_SetU16 = unsafe extern "system" fn(cyHandle: HANDLE, value: u16) -> CP210x_STATUS;
pub type CP210x_GetU16 =
    unsafe extern "system" fn(cyHandle: HANDLE, value: *mut u16) -> CP210x_STATUS;
pub type CP210x_SetU8 = unsafe extern "system" fn(cyHandle: HANDLE, value: u8) -> CP210x_STATUS;
pub type CP210x_GetU8 = unsafe extern "system" fn(cyHandle: HANDLE, value: *mut u8) -> CP210x_STATUS;
pub type CP210x_SetString = unsafe extern "system" fn(
    cyHandle: HANDLE,
    lpvString: *mut c_void,
    bStringLength: u8,
    bIsStringASCII: BOOL,
) -> CP210x_STATUS;
pub type CP210x_SetInterfaceString = unsafe extern "system" fn(
    cyHandle: HANDLE,
    bInterfaceNumber: u8,
    lpvInterfaceString: *mut c_void,
    bInterfaceStringLength: u8,
    bIsStringASCII: BOOL,
) -> CP210x_STATUS;
pub type CP210x_GetString = unsafe extern "system" fn(
    cyHandle: HANDLE,
    pString: *mut c_void,
    lpbStringLengthInBytes: *mut u8,
    bConvertToASCII: BOOL,
) -> CP210x_STATUS;
pub type CP210x_GetDeviceInterfaceString = unsafe extern "system" fn(
    cyHandle: HANDLE,
    bInterfaceNumber: u8,
    pInterfaceString: *mut c_void,
    lpbInterfaceStringLengthInBytes: *mut u8,
    bConvertToASCII: BOOL,
) -> CP210x_STATUS;
pub type CP210x_SetSelfPower =
    unsafe extern "system" fn(cyHandle: HANDLE, bSelfPower: BOOL) -> CP210x_STATUS;
pub type CP210x_GetSelfPower =
    unsafe extern "system" fn(cyHandle: HANDLE, lpbSelfPower: *mut BOOL) -> CP210x_STATUS;
pub type CP210x_SetDeviceMode = unsafe extern "system" fn(
    cyHandle: HANDLE,
    bDeviceModeECI: u8,
    bDeviceModeSCI: u8,
) -> CP210x_STATUS;
pub type CP210x_GetDeviceMode = unsafe extern "system" fn(
    cyHandle: HANDLE,
    lpbDeviceModeECI: *mut u8,
    lpbDeviceModeSCI: *mut u8,
) -> CP210x_STATUS;
pub type CP210x_BaudRateConfig =
    unsafe extern "system" fn(cyHandle: HANDLE, pBaudConfig: PBAUD_CONFIG) -> CP210x_STATUS;
pub type CP210x_PortConfig =
    unsafe extern "system" fn(cyHandle: HANDLE, pPortConfig: PPORT_CONFIG) -> CP210x_STATUS;
pub type CP210x_DualPortConfig = unsafe extern "system" fn(
    cyHandle: HANDLE,
    pDualPortConfig: PDUAL_PORT_CONFIG,
) -> CP210x_STATUS;
pub type CP210x_QuadPortConfig = unsafe extern "system" fn(
    cyHandle: HANDLE,
    pQuadPortConfig: PQUAD_PORT_CONFIG,
) -> CP210x_STATUS;
pub type CP210x_HandleOnly = unsafe extern "system" fn(cyHandle: HANDLE) -> CP210x_STATUS;
pub type CP210x_CreateHexFile =
    unsafe extern "system" fn(cyHandle: HANDLE, lpvFileName: *const c_char) -> CP210x_STATUS;
pub type CP210x_GetFirmwareVersion =
    unsafe extern "system" fn(cyHandle: HANDLE, lpVersion: pFirmware_t) -> CP210x_STATUS;
pub type CP210x_Buffer =
    unsafe extern "system" fn(cyHandle: HANDLE, lpbBuffer: *mut u8, bLength: u16) -> CP210x_STATUS;

pub type CP210xRT_ReadLatch =
    unsafe extern "system" fn(cyHandle: HANDLE, lpLatch: *mut u16) -> CP210x_STATUS;
pub type CP210xRT_WriteLatch =
    unsafe extern "system" fn(cyHandle: HANDLE, Mask: u16, Latch: u16) -> CP210x_STATUS;
pub type CP210xRT_GetPartNumber =
    unsafe extern "system" fn(cyHandle: HANDLE, lpbPartNum: *mut u8) -> CP210x_STATUS;

/// Function table of a loaded CP210x Manufacturing library.
///
/// Each field holds the address of one exported entry point. The pointers are
/// only valid for as long as the library they were resolved from stays loaded,
/// which is why the table owns the library handle.
///
/// Entry points which were added in later releases of the library are optional;
/// calling through the safe wrappers yields
/// [`FunctionNotSupported`](crate::Cp210xError::FunctionNotSupported) when
/// they are absent.
pub struct Manufacturing {
    pub GetNumDevices: CP210x_GetNumDevices,
    pub GetProductString: CP210x_GetProductString,
    pub GetProductStringSafe: Option<CP210x_GetProductStringSafe>,
    pub Open: CP210x_Open,
    pub Close: CP210x_Close,
    pub GetPartNumber: CP210x_GetPartNumber,

    pub SetVid: CP210x_SetU16,
    pub SetPid: CP210x_SetU16,
    pub SetManufacturerString: CP210x_SetString,
    pub SetProductString: CP210x_SetString,
    pub SetInterfaceString: CP210x_SetInterfaceString,
    pub SetSerialNumber: CP210x_SetString,
    pub SetSelfPower: CP210x_SetSelfPower,
    pub SetMaxPower: CP210x_SetU8,
    pub SetFlushBufferConfig: CP210x_SetU16,
    pub SetDeviceMode: CP210x_SetDeviceMode,
    pub SetDeviceVersion: CP210x_SetU16,
    pub SetBaudRateConfig: CP210x_BaudRateConfig,
    pub SetPortConfig: CP210x_PortConfig,
    pub SetDualPortConfig: CP210x_DualPortConfig,
    pub SetQuadPortConfig: CP210x_QuadPortConfig,
    pub SetLockValue: CP210x_HandleOnly,

    pub GetDeviceVid: CP210x_GetU16,
    pub GetDevicePid: CP210x_GetU16,
    pub GetDeviceManufacturerString: CP210x_GetString,
    pub GetDeviceProductString: CP210x_GetString,
    pub GetDeviceInterfaceString: CP210x_GetDeviceInterfaceString,
    pub GetDeviceSerialNumber: CP210x_GetString,
    pub GetDeviceAddress: Option<CP210x_GetU8>,
    pub GetSelfPower: CP210x_GetSelfPower,
    pub GetMaxPower: CP210x_GetU8,
    pub GetFlushBufferConfig: CP210x_GetU16,
    pub GetDeviceMode: CP210x_GetDeviceMode,
    pub GetDeviceVersion: CP210x_GetU16,
    pub GetBaudRateConfig: CP210x_BaudRateConfig,
    pub GetPortConfig: CP210x_PortConfig,
    pub GetDualPortConfig: CP210x_DualPortConfig,
    pub GetQuadPortConfig: CP210x_QuadPortConfig,
    pub GetLockValue: CP210x_GetU8,

    pub Reset: CP210x_HandleOnly,
    pub CreateHexFile: CP210x_CreateHexFile,
    pub GetFirmwareVersion: Option<CP210x_GetFirmwareVersion>,
    pub GetConfig: Option<CP210x_Buffer>,
    pub SetConfig: Option<CP210x_Buffer>,
    pub UpdateFirmware: Option<CP210x_HandleOnly>,
    pub GetGeneric: Option<CP210x_Buffer>,
    pub SetGeneric: Option<CP210x_Buffer>,

    /// Keeps the function pointers above valid. `None` for in-crate test tables.
    pub(crate) library: Option<libloading::Library>,
}

impl std::fmt::Debug for Manufacturing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manufacturing")
            .field("loaded", &self.library.is_some())
            .finish_non_exhaustive()
    }
}

/// Function table of a loaded CP210x Runtime library.
///
/// The runtime library operates on the handle of an open serial port rather
/// than on a handle from [`Manufacturing::Open`].
#[cfg(feature = "runtime")]
pub struct Runtime {
    pub ReadLatch: CP210xRT_ReadLatch,
    pub WriteLatch: CP210xRT_WriteLatch,
    pub GetPartNumber: CP210xRT_GetPartNumber,

    pub(crate) library: Option<libloading::Library>,
}

#[cfg(feature = "runtime")]
impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("loaded", &self.library.is_some())
            .finish_non_exhaustive()
    }
}

/// Global lock is necessary for certain operations when working with the CP210x library.
static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

/// Run the given closure with the global lock held.
///
/// This is necessary for operations which address devices by index. The
/// library's device table is rebuilt on every call to `CP210x_GetNumDevices`,
/// so a count followed by per-index queries must not interleave with the same
/// sequence on another thread.
#[allow(clippy::missing_panics_doc)]
pub fn with_global_lock<F, R>(f: F) -> R
where
    F: FnOnce() -> R + std::panic::UnwindSafe,
{
    // a panic inside `f` is caught below, so the lock can only be poisoned by a
    // panic in the unwinding machinery itself
    let lock = GLOBAL_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    match catch_unwind(f) {
        Ok(result) => result,
        Err(e) => {
            drop(lock);
            panic!("panicked while holding global lock: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::*;

    #[test]
    fn test_global_lock() {
        let _guard = GLOBAL_LOCK.lock().unwrap();
        assert!(GLOBAL_LOCK.try_lock().is_err());
    }

    #[test]
    fn test_global_lock_unpoisoning() {
        let result = std::panic::catch_unwind(|| {
            with_global_lock(|| {
                panic!("test panic");
            });
        });
        assert!(result.is_err());
        assert!(!matches!(
            GLOBAL_LOCK.try_lock(),
            Err(std::sync::TryLockError::Poisoned(_))
        ));
    }

    #[test]
    fn test_struct_layouts() {
        assert_eq!(size_of::<BAUD_CONFIG>(), 12);
        assert_eq!(size_of::<BAUD_CONFIG_DATA>(), 12 * NUM_BAUD_CONFIGS);
        assert_eq!(size_of::<PORT_CONFIG>(), 8);
        assert_eq!(size_of::<DUAL_PORT_CONFIG>(), 10);
        assert_eq!(size_of::<QUAD_PORT_STATE>(), 30);
        assert_eq!(size_of::<QUAD_PORT_CONFIG>(), 74);
        assert_eq!(size_of::<firmware_t>(), 3);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CP210x_SUCCESS, 0);
        assert_eq!(CP210x_COMMAND_FAILED, 8);
        assert_eq!(CP210x_INVALID_ACCESS_TYPE, 9);
        assert_eq!(CP210x_DEVICE_NOT_FOUND, 0xFF);
    }
}
