//! In-process stand-in for the manufacturing library, used by unit tests.
//!
//! Every entry point is an `extern "system"` function operating on
//! thread-local device state, so tests running in parallel do not see each
//! other's devices. Handles are the device's index plus one.

use std::{
    cell::RefCell,
    ffi::{c_char, c_void, CStr},
    ptr::copy_nonoverlapping,
    slice,
};

use widestring::{WideCString, WideChar};

use crate::{
    configuration::CP2102N_CONFIG_SIZE,
    ffi::{
        self, CP210x_DEVICE_NOT_FOUND, CP210x_FUNCTION_NOT_SUPPORTED, CP210x_INVALID_HANDLE,
        CP210x_INVALID_PARAMETER, CP210x_STATUS, CP210x_SUCCESS, BOOL, FALSE, HANDLE, TRUE,
    },
    Library,
};

#[derive(Debug, Clone)]
pub(crate) struct MockDevice {
    pub part: u8,
    pub vid: u16,
    pub pid: u16,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub interfaces: Vec<String>,
    pub self_power: bool,
    pub max_power: u8,
    pub flush: u16,
    pub mode: (u8, u8),
    pub version: u16,
    pub baud: ffi::BAUD_CONFIG_DATA,
    pub port: ffi::PORT_CONFIG,
    pub dual: ffi::DUAL_PORT_CONFIG,
    pub quad: ffi::QUAD_PORT_CONFIG,
    pub lock: u8,
    pub firmware: ffi::firmware_t,
    pub config: Vec<u8>,
    pub generic: Vec<u8>,
    pub address: u8,
    pub hex_files: Vec<String>,
    /// Host-side description, as reported by `CP210x_GetProductString`.
    pub description: String,
    /// Host-side device path.
    pub path: String,
    /// Host string kinds whose query fails with `CP210x_DEVICE_IO_FAILED`.
    pub unreadable: Vec<u32>,
    pub open: bool,
    pub resets: u32,
    pub firmware_updates: u32,
}

impl MockDevice {
    pub fn new(part: u8, serial: &str) -> Self {
        Self {
            part,
            vid: 0x10C4,
            pid: 0xEA60,
            manufacturer: "Silicon Labs".to_string(),
            product: "CP210x UART Bridge".to_string(),
            serial: serial.to_string(),
            interfaces: vec![String::new(); 4],
            self_power: false,
            max_power: 50,
            flush: 0,
            mode: (0, 0),
            version: 0x0100,
            baud: ffi::BAUD_CONFIG_DATA::default(),
            port: ffi::PORT_CONFIG::default(),
            dual: ffi::DUAL_PORT_CONFIG::default(),
            quad: ffi::QUAD_PORT_CONFIG::default(),
            lock: 0,
            firmware: ffi::firmware_t {
                major: 1,
                minor: 0,
                build: 8,
            },
            config: vec![0; CP2102N_CONFIG_SIZE],
            generic: Vec::new(),
            address: 7,
            hex_files: Vec::new(),
            description: "CP2102N USB to UART Bridge Controller".to_string(),
            path: format!("/dev/bus/usb/001/{serial}"),
            unreadable: Vec::new(),
            open: false,
            resets: 0,
            firmware_updates: 0,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub devices: Vec<MockDevice>,
    /// Status returned by the next call instead of running it.
    pub fail_next: Option<CP210x_STATUS>,
    pub closed: usize,
}

thread_local! {
    static STATE: RefCell<MockState> = RefCell::new(MockState::default());
}

/// Replace this thread's devices and return a library backed by them.
pub(crate) fn install(devices: Vec<MockDevice>) -> Library {
    with_state(|state| {
        *state = MockState {
            devices,
            ..MockState::default()
        };
    });
    Library::from_api(api())
}

pub(crate) fn with_state<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

pub(crate) fn device(index: usize) -> MockDevice {
    with_state(|state| state.devices[index].clone())
}

pub(crate) fn fail_next(status: CP210x_STATUS) {
    with_state(|state| state.fail_next = Some(status));
}

pub(crate) fn api() -> ffi::Manufacturing {
    ffi::Manufacturing {
        GetNumDevices: get_num_devices,
        GetProductString: get_product_string,
        GetProductStringSafe: Some(get_product_string_safe),
        Open: open,
        Close: close,
        GetPartNumber: get_part_number,

        SetVid: set_vid,
        SetPid: set_pid,
        SetManufacturerString: set_manufacturer_string,
        SetProductString: set_product_string,
        SetInterfaceString: set_interface_string,
        SetSerialNumber: set_serial_number,
        SetSelfPower: set_self_power,
        SetMaxPower: set_max_power,
        SetFlushBufferConfig: set_flush_buffer_config,
        SetDeviceMode: set_device_mode,
        SetDeviceVersion: set_device_version,
        SetBaudRateConfig: set_baud_rate_config,
        SetPortConfig: set_port_config,
        SetDualPortConfig: set_dual_port_config,
        SetQuadPortConfig: set_quad_port_config,
        SetLockValue: set_lock_value,

        GetDeviceVid: get_device_vid,
        GetDevicePid: get_device_pid,
        GetDeviceManufacturerString: get_device_manufacturer_string,
        GetDeviceProductString: get_device_product_string,
        GetDeviceInterfaceString: get_device_interface_string,
        GetDeviceSerialNumber: get_device_serial_number,
        GetDeviceAddress: Some(get_device_address),
        GetSelfPower: get_self_power,
        GetMaxPower: get_max_power,
        GetFlushBufferConfig: get_flush_buffer_config,
        GetDeviceMode: get_device_mode,
        GetDeviceVersion: get_device_version,
        GetBaudRateConfig: get_baud_rate_config,
        GetPortConfig: get_port_config,
        GetDualPortConfig: get_dual_port_config,
        GetQuadPortConfig: get_quad_port_config,
        GetLockValue: get_lock_value,

        Reset: reset,
        CreateHexFile: create_hex_file,
        GetFirmwareVersion: Some(get_firmware_version),
        GetConfig: Some(get_config),
        SetConfig: Some(set_config),
        UpdateFirmware: Some(update_firmware),
        GetGeneric: Some(get_generic),
        SetGeneric: Some(set_generic),

        library: None,
    }
}

/// Run `f` on the open device behind `handle`.
fn call(handle: HANDLE, f: impl FnOnce(&mut MockDevice) -> CP210x_STATUS) -> CP210x_STATUS {
    with_state(|state| {
        if let Some(status) = state.fail_next.take() {
            return status;
        }
        let device = (handle as usize)
            .checked_sub(1)
            .and_then(|index| state.devices.get_mut(index))
            .filter(|device| device.open);
        match device {
            Some(device) => f(device),
            None => CP210x_INVALID_HANDLE,
        }
    })
}

/// Run `f` on the device at `index`, open or not.
fn call_index(index: u32, f: impl FnOnce(&mut MockDevice) -> CP210x_STATUS) -> CP210x_STATUS {
    with_state(|state| {
        if let Some(status) = state.fail_next.take() {
            return status;
        }
        match state.devices.get_mut(index as usize) {
            Some(device) => f(device),
            None => CP210x_DEVICE_NOT_FOUND,
        }
    })
}

fn host_string(device: &MockDevice, flags: u32) -> std::result::Result<&str, CP210x_STATUS> {
    if device.unreadable.contains(&flags) {
        return Err(ffi::CP210x_DEVICE_IO_FAILED);
    }
    match flags {
        ffi::CP210x_GETPRODUCTSTRING_SERIAL_NUMBER => Ok(&device.serial),
        ffi::CP210x_GETPRODUCTSTRING_DESCRIPTION => Ok(&device.description),
        ffi::CP210x_GETPRODUCTSTRING_FULL_PATH => Ok(&device.path),
        _ => Err(CP210x_INVALID_PARAMETER),
    }
}

unsafe extern "system" fn get_num_devices(count: *mut u32) -> CP210x_STATUS {
    with_state(|state| {
        if let Some(status) = state.fail_next.take() {
            return status;
        }
        *count = state.devices.len() as u32;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_product_string(
    index: u32,
    buf: *mut c_void,
    flags: u32,
) -> CP210x_STATUS {
    call_index(index, |device| {
        let string = match host_string(device, flags) {
            Ok(string) => string,
            Err(status) => return status,
        };
        let len = string.len().min(ffi::CP210x_MAX_DEVICE_STRLEN - 1);
        copy_nonoverlapping(string.as_ptr(), buf.cast::<u8>(), len);
        *buf.cast::<u8>().add(len) = 0;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_product_string_safe(
    index: u32,
    flags: u32,
    buf: *mut WideChar,
    len_in_bytes: usize,
) -> CP210x_STATUS {
    call_index(index, |device| {
        let string = match host_string(device, flags) {
            Ok(string) => string,
            Err(status) => return status,
        };
        let wide = WideCString::from_str_truncate(string);
        let units = wide.as_slice_with_nul();
        if units.len() * std::mem::size_of::<WideChar>() > len_in_bytes {
            return CP210x_INVALID_PARAMETER;
        }
        copy_nonoverlapping(units.as_ptr(), buf, units.len());
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn open(index: u32, handle: *mut HANDLE) -> CP210x_STATUS {
    call_index(index, |device| {
        device.open = true;
        *handle = (index as usize + 1) as HANDLE;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn close(handle: HANDLE) -> CP210x_STATUS {
    let status = call(handle, |device| {
        device.open = false;
        CP210x_SUCCESS
    });
    if status == CP210x_SUCCESS {
        with_state(|state| state.closed += 1);
    }
    status
}

unsafe extern "system" fn get_part_number(handle: HANDLE, part: *mut u8) -> CP210x_STATUS {
    call(handle, |device| {
        *part = device.part;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_vid(handle: HANDLE, vid: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.vid = vid;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_pid(handle: HANDLE, pid: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.pid = pid;
        CP210x_SUCCESS
    })
}

unsafe fn set_string<F>(
    handle: HANDLE,
    buf: *mut c_void,
    len: u8,
    is_ascii: BOOL,
    store: F,
) -> CP210x_STATUS
where
    F: FnOnce(&mut MockDevice, String) -> bool,
{
    call(handle, |device| {
        if is_ascii != FALSE {
            return CP210x_INVALID_PARAMETER;
        }
        let units = slice::from_raw_parts(buf.cast::<u16>(), usize::from(len));
        if store(device, String::from_utf16_lossy(units)) {
            CP210x_SUCCESS
        } else {
            CP210x_INVALID_PARAMETER
        }
    })
}

unsafe fn get_string<F>(
    handle: HANDLE,
    buf: *mut c_void,
    len: *mut u8,
    convert_to_ascii: BOOL,
    load: F,
) -> CP210x_STATUS
where
    F: FnOnce(&MockDevice) -> Option<String>,
{
    call(handle, |device| {
        if convert_to_ascii != FALSE {
            return CP210x_INVALID_PARAMETER;
        }
        let Some(string) = load(device) else {
            return CP210x_INVALID_PARAMETER;
        };
        let bytes: Vec<u8> = string.encode_utf16().flat_map(u16::to_le_bytes).collect();
        copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), bytes.len());
        *len = bytes.len() as u8;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_manufacturer_string(
    handle: HANDLE,
    buf: *mut c_void,
    len: u8,
    is_ascii: BOOL,
) -> CP210x_STATUS {
    set_string(handle, buf, len, is_ascii, |device, value| {
        device.manufacturer = value;
        true
    })
}

unsafe extern "system" fn set_product_string(
    handle: HANDLE,
    buf: *mut c_void,
    len: u8,
    is_ascii: BOOL,
) -> CP210x_STATUS {
    set_string(handle, buf, len, is_ascii, |device, value| {
        device.product = value;
        true
    })
}

unsafe extern "system" fn set_serial_number(
    handle: HANDLE,
    buf: *mut c_void,
    len: u8,
    is_ascii: BOOL,
) -> CP210x_STATUS {
    set_string(handle, buf, len, is_ascii, |device, value| {
        device.serial = value;
        true
    })
}

unsafe extern "system" fn set_interface_string(
    handle: HANDLE,
    interface: u8,
    buf: *mut c_void,
    len: u8,
    is_ascii: BOOL,
) -> CP210x_STATUS {
    set_string(handle, buf, len, is_ascii, |device, value| {
        match device.interfaces.get_mut(usize::from(interface)) {
            Some(string) => {
                *string = value;
                true
            }
            None => false,
        }
    })
}

unsafe extern "system" fn get_device_manufacturer_string(
    handle: HANDLE,
    buf: *mut c_void,
    len: *mut u8,
    convert: BOOL,
) -> CP210x_STATUS {
    get_string(handle, buf, len, convert, |device| Some(device.manufacturer.clone()))
}

unsafe extern "system" fn get_device_product_string(
    handle: HANDLE,
    buf: *mut c_void,
    len: *mut u8,
    convert: BOOL,
) -> CP210x_STATUS {
    get_string(handle, buf, len, convert, |device| Some(device.product.clone()))
}

unsafe extern "system" fn get_device_serial_number(
    handle: HANDLE,
    buf: *mut c_void,
    len: *mut u8,
    convert: BOOL,
) -> CP210x_STATUS {
    get_string(handle, buf, len, convert, |device| Some(device.serial.clone()))
}

unsafe extern "system" fn get_device_interface_string(
    handle: HANDLE,
    interface: u8,
    buf: *mut c_void,
    len: *mut u8,
    convert: BOOL,
) -> CP210x_STATUS {
    get_string(handle, buf, len, convert, |device| {
        device.interfaces.get(usize::from(interface)).cloned()
    })
}

unsafe extern "system" fn set_self_power(handle: HANDLE, self_power: BOOL) -> CP210x_STATUS {
    call(handle, |device| {
        device.self_power = self_power != FALSE;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_self_power(handle: HANDLE, self_power: *mut BOOL) -> CP210x_STATUS {
    call(handle, |device| {
        *self_power = if device.self_power { TRUE } else { FALSE };
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_max_power(handle: HANDLE, max_power: u8) -> CP210x_STATUS {
    call(handle, |device| {
        if max_power > ffi::CP210x_MAX_MAXPOWER {
            return CP210x_INVALID_PARAMETER;
        }
        device.max_power = max_power;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_max_power(handle: HANDLE, max_power: *mut u8) -> CP210x_STATUS {
    call(handle, |device| {
        *max_power = device.max_power;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_flush_buffer_config(handle: HANDLE, flush: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.flush = flush;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_flush_buffer_config(handle: HANDLE, flush: *mut u16) -> CP210x_STATUS {
    call(handle, |device| {
        *flush = device.flush;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_device_mode(handle: HANDLE, eci: u8, sci: u8) -> CP210x_STATUS {
    call(handle, |device| {
        device.mode = (eci, sci);
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_device_mode(handle: HANDLE, eci: *mut u8, sci: *mut u8) -> CP210x_STATUS {
    call(handle, |device| {
        (*eci, *sci) = device.mode;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_device_version(handle: HANDLE, version: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.version = version;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_device_version(handle: HANDLE, version: *mut u16) -> CP210x_STATUS {
    call(handle, |device| {
        *version = device.version;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_baud_rate_config(
    handle: HANDLE,
    config: ffi::PBAUD_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        device.baud = *config.cast::<ffi::BAUD_CONFIG_DATA>();
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_baud_rate_config(
    handle: HANDLE,
    config: ffi::PBAUD_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        *config.cast::<ffi::BAUD_CONFIG_DATA>() = device.baud;
        CP210x_SUCCESS
    })
}

fn has_port_config(device: &MockDevice) -> bool {
    matches!(
        device.part,
        ffi::CP210x_PARTNUM_CP2103 | ffi::CP210x_PARTNUM_CP2104
    )
}

unsafe extern "system" fn set_port_config(handle: HANDLE, config: ffi::PPORT_CONFIG) -> CP210x_STATUS {
    call(handle, |device| {
        if !has_port_config(device) {
            return CP210x_FUNCTION_NOT_SUPPORTED;
        }
        device.port = *config;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_port_config(handle: HANDLE, config: ffi::PPORT_CONFIG) -> CP210x_STATUS {
    call(handle, |device| {
        if !has_port_config(device) {
            return CP210x_FUNCTION_NOT_SUPPORTED;
        }
        *config = device.port;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_dual_port_config(
    handle: HANDLE,
    config: ffi::PDUAL_PORT_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        device.dual = *config;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_dual_port_config(
    handle: HANDLE,
    config: ffi::PDUAL_PORT_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        *config = device.dual;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_quad_port_config(
    handle: HANDLE,
    config: ffi::PQUAD_PORT_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        device.quad = *config;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_quad_port_config(
    handle: HANDLE,
    config: ffi::PQUAD_PORT_CONFIG,
) -> CP210x_STATUS {
    call(handle, |device| {
        *config = device.quad;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_lock_value(handle: HANDLE) -> CP210x_STATUS {
    call(handle, |device| {
        device.lock = 0xF0;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_lock_value(handle: HANDLE, lock: *mut u8) -> CP210x_STATUS {
    call(handle, |device| {
        *lock = device.lock;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_device_vid(handle: HANDLE, vid: *mut u16) -> CP210x_STATUS {
    call(handle, |device| {
        *vid = device.vid;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_device_pid(handle: HANDLE, pid: *mut u16) -> CP210x_STATUS {
    call(handle, |device| {
        *pid = device.pid;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_device_address(handle: HANDLE, address: *mut u8) -> CP210x_STATUS {
    call(handle, |device| {
        *address = device.address;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn reset(handle: HANDLE) -> CP210x_STATUS {
    call(handle, |device| {
        device.resets += 1;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn create_hex_file(handle: HANDLE, name: *const c_char) -> CP210x_STATUS {
    call(handle, |device| {
        let name = CStr::from_ptr(name).to_string_lossy().into_owned();
        device.hex_files.push(name);
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_firmware_version(
    handle: HANDLE,
    version: ffi::pFirmware_t,
) -> CP210x_STATUS {
    call(handle, |device| {
        *version = device.firmware;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_config(handle: HANDLE, buf: *mut u8, len: u16) -> CP210x_STATUS {
    call(handle, |device| {
        let len = usize::from(len).min(device.config.len());
        copy_nonoverlapping(device.config.as_ptr(), buf, len);
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_config(handle: HANDLE, buf: *mut u8, len: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.config = slice::from_raw_parts(buf, usize::from(len)).to_vec();
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn update_firmware(handle: HANDLE) -> CP210x_STATUS {
    call(handle, |device| {
        device.firmware_updates += 1;
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn get_generic(handle: HANDLE, buf: *mut u8, len: u16) -> CP210x_STATUS {
    call(handle, |device| {
        let len = usize::from(len).min(device.generic.len());
        copy_nonoverlapping(device.generic.as_ptr(), buf, len);
        CP210x_SUCCESS
    })
}

unsafe extern "system" fn set_generic(handle: HANDLE, buf: *mut u8, len: u16) -> CP210x_STATUS {
    call(handle, |device| {
        device.generic = slice::from_raw_parts(buf, usize::from(len)).to_vec();
        CP210x_SUCCESS
    })
}
