//! GPIO latch access through the CP210x Runtime library.
//!
//! The Runtime library works on the handle of an open serial port (a COM port on
//! Windows), not on a handle from the Manufacturing library, so it can be used
//! while the port is in use by an application.
//!
//! The Runtime library takes a Win32 handle and ships for Windows only. On
//! other platforms [`reset_port`] drives the DTR and RTS lines of the port
//! instead of the latch.

use std::{ffi::OsString, fs::File, path::Path, ptr::addr_of_mut, time::Duration};

use log::{debug, trace, warn};

use crate::{
    error::try_cp210x,
    ffi::{self, HANDLE},
    util::{PhantomLifetime, PhantomUnsync},
    Cp210xError, PartNumber, Result,
};

/// Environment variable overriding the path of the runtime library.
pub const RUNTIME_PATH_ENV: &str = "CP210X_RUNTIME_LIB";

/// A loaded CP210x Runtime library.
#[derive(Debug)]
pub struct Runtime {
    api: ffi::Runtime,
}

impl Runtime {
    /// Load the library from [`RUNTIME_PATH_ENV`] if set, else by its default name.
    pub fn load() -> Result<Self> {
        Self::load_from(default_path())
    }

    /// Load the library from the given path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading CP210x runtime library from {}", path.display());
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            Cp210xError::LibraryLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        // SAFETY: each symbol is declared with the signature of the runtime header.
        let api = unsafe {
            let read_latch: ffi::CP210xRT_ReadLatch = *library
                .get(b"CP210xRT_ReadLatch\0")
                .map_err(|_| Cp210xError::MissingSymbol("CP210xRT_ReadLatch"))?;
            let write_latch: ffi::CP210xRT_WriteLatch = *library
                .get(b"CP210xRT_WriteLatch\0")
                .map_err(|_| Cp210xError::MissingSymbol("CP210xRT_WriteLatch"))?;
            let get_part_number: ffi::CP210xRT_GetPartNumber = *library
                .get(b"CP210xRT_GetPartNumber\0")
                .map_err(|_| Cp210xError::MissingSymbol("CP210xRT_GetPartNumber"))?;
            ffi::Runtime {
                ReadLatch: read_latch,
                WriteLatch: write_latch,
                GetPartNumber: get_part_number,
                library: Some(library),
            }
        };
        Ok(Self { api })
    }

    /// Raw function table.
    #[must_use]
    pub fn api(&self) -> &ffi::Runtime {
        &self.api
    }

    #[cfg(test)]
    pub(crate) fn from_api(api: ffi::Runtime) -> Self {
        Self { api }
    }
}

fn default_path() -> OsString {
    match std::env::var_os(RUNTIME_PATH_ENV) {
        Some(path) if !path.is_empty() => path,
        _ => default_name(),
    }
}

#[cfg(windows)]
fn default_name() -> OsString {
    OsString::from("CP210xRuntime.dll")
}

#[cfg(not(windows))]
fn default_name() -> OsString {
    libloading::library_filename("cp210xruntime")
}

/// Logic level of a GPIO pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Level {
    /// Driven low.
    Low = 0,
    /// Driven high.
    High = 1,
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Latch values written one after the other, with a fixed pause in between.
///
/// Used to pulse reset or boot-select lines wired to GPIO pins, e.g. to put a
/// target microcontroller into its bootloader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResetSequence {
    /// Pause after each write.
    pub step: Duration,
    /// Pins affected by the sequence.
    pub mask: u16,
    /// Latch values, applied under `mask`.
    ///
    /// When the sequence runs on the modem lines, bit 0 of each value drives
    /// DTR and bit 1 drives RTS.
    pub values: Vec<u16>,
}

impl ResetSequence {
    /// Drive the sequence on the DTR and RTS lines, pausing for `step` after
    /// each value. `mask` does not apply.
    pub fn run_on_modem_lines(&self, port: &impl ModemLines) -> Result<()> {
        debug!("running modem line sequence of {} step(s)", self.values.len());
        for &value in &self.values {
            port.set_modem_lines(value & 0x0001 != 0, value & 0x0002 != 0)?;
            std::thread::sleep(self.step);
        }
        Ok(())
    }

    /// Run the sequence on the latch if one is given, falling back to the
    /// modem lines of `port` if there is none or a latch write fails.
    ///
    /// A failed latch write may leave part of the sequence applied before the
    /// fallback starts.
    pub fn run(&self, port: &impl ModemLines, latch: Option<&RuntimePort<'_>>) -> Result<ResetMethod> {
        if let Some(latch) = latch {
            match latch.run_sequence(self) {
                Ok(()) => return Ok(ResetMethod::Latch),
                Err(e) => warn!("latch sequence failed, falling back to DTR/RTS: {e}"),
            }
        }
        self.run_on_modem_lines(port)?;
        Ok(ResetMethod::ModemLines)
    }
}

/// How a [`ResetSequence`] reached the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResetMethod {
    /// Written to the GPIO latch through the Runtime library.
    Latch,
    /// Driven on the DTR and RTS lines of the serial port.
    ModemLines,
}

/// A serial port whose DTR and RTS lines can be set.
pub trait ModemLines {
    /// Set both lines, `true` being asserted.
    fn set_modem_lines(&self, dtr: bool, rts: bool) -> Result<()>;
}

/// A serial port opened by name, e.g. `COM3` or `/dev/ttyUSB0`.
///
/// The port is not configured; it is only opened to reach its modem lines
/// and, on Windows, its GPIO latch.
#[derive(Debug)]
pub struct SerialPort {
    name: String,
    file: File,
}

impl SerialPort {
    /// Open the port for reading and writing.
    pub fn open(name: &str) -> Result<Self> {
        debug!("opening serial port {name}");
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(sys::device_path(name))
            .map_err(|e| Cp210xError::PortOpen {
                port: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name: name.to_string(),
            file,
        })
    }

    /// Name the port was opened by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// GPIO latch of this port.
    #[cfg(windows)]
    #[must_use]
    pub fn latch<'a>(&'a self, runtime: &'a Runtime) -> RuntimePort<'a> {
        RuntimePort::from_port(runtime, &self.file)
    }

    fn modem_error(&self, reason: impl ToString) -> Cp210xError {
        Cp210xError::ModemLines {
            port: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl ModemLines for SerialPort {
    fn set_modem_lines(&self, dtr: bool, rts: bool) -> Result<()> {
        trace!("setting DTR={dtr} RTS={rts} on {}", self.name);
        sys::set_modem_lines(&self.file, dtr, rts).map_err(|e| self.modem_error(e))
    }
}

/// Open the named port and run a reset sequence on it.
///
/// On Windows the sequence goes to the GPIO latch through the Runtime library
/// (see [`Runtime::load`]). If the library cannot be loaded, or a latch write
/// fails, the sequence is driven on DTR and RTS instead. Other platforms
/// always use DTR and RTS.
///
/// ```no_run
/// use std::time::Duration;
/// use cp210x::gpio::{reset_port, ResetSequence};
///
/// // pull the target's reset (bit 0) low, then release it
/// let sequence = ResetSequence {
///     step: Duration::from_millis(50),
///     mask: 0b01,
///     values: vec![0b00, 0b01],
/// };
/// let method = reset_port("/dev/ttyUSB0", &sequence).unwrap();
/// println!("reset via {method:?}");
/// ```
pub fn reset_port(name: &str, sequence: &ResetSequence) -> Result<ResetMethod> {
    let port = SerialPort::open(name)?;
    #[cfg(windows)]
    {
        match Runtime::load() {
            Ok(runtime) => return sequence.run(&port, Some(&port.latch(&runtime))),
            Err(e) => warn!("no runtime library, falling back to DTR/RTS: {e}"),
        }
    }
    sequence.run(&port, None)
}

/// GPIO latch of an open serial port.
///
/// The handle is borrowed, so the port must stay open for the lifetime `'a`.
#[derive(Debug)]
pub struct RuntimePort<'a> {
    runtime: &'a Runtime,
    handle: HANDLE,
    _lifetime: PhantomLifetime<'a>,
    _unsync: PhantomUnsync,
}

impl<'a> RuntimePort<'a> {
    /// Wrap a raw serial port handle.
    ///
    /// # Safety
    ///
    /// The handle must be an open CP210x serial port handle, and must stay open
    /// for as long as the returned value is in use.
    #[must_use]
    pub unsafe fn new(runtime: &'a Runtime, handle: HANDLE) -> Self {
        Self {
            runtime,
            handle,
            _lifetime: PhantomLifetime::default(),
            _unsync: PhantomUnsync::default(),
        }
    }

    /// Borrow the handle of an open serial port.
    ///
    /// The port is not checked to be a CP210x; calls on another device fail
    /// with an error from the library. Windows only, as the library expects a
    /// Win32 handle; elsewhere use [`RuntimePort::new`] with the handle type
    /// of a platform build of the library, or [`reset_port`].
    #[cfg(windows)]
    pub fn from_port<P: std::os::windows::io::AsRawHandle>(runtime: &'a Runtime, port: &'a P) -> Self {
        // SAFETY: the handle is valid for as long as `port` is borrowed.
        unsafe { Self::new(runtime, port.as_raw_handle().cast()) }
    }

    /// Current latch value, one bit per GPIO pin.
    pub fn read_latch(&self) -> Result<u16> {
        let mut latch: u16 = 0;
        try_cp210x!(unsafe { (self.runtime.api.ReadLatch)(self.handle, addr_of_mut!(latch)) })?;
        Ok(latch)
    }

    /// Write the bits of `latch` selected by `mask`, leaving the other pins as they are.
    pub fn write_latch(&self, mask: u16, latch: u16) -> Result<()> {
        trace!("writing latch {latch:#06x} under mask {mask:#06x}");
        try_cp210x!(unsafe { (self.runtime.api.WriteLatch)(self.handle, mask, latch) })
    }

    /// Part number of the device behind the port.
    pub fn part_number(&self) -> Result<PartNumber> {
        let mut part: u8 = 0;
        try_cp210x!(unsafe { (self.runtime.api.GetPartNumber)(self.handle, addr_of_mut!(part)) })?;
        PartNumber::try_from(part).map_err(|_| Cp210xError::UnknownPartNumber(part))
    }

    /// Level of a single pin.
    pub fn read_pin(&self, pin: u8) -> Result<Level> {
        let bit = pin_mask(pin)?;
        Ok(Level::from(self.read_latch()? & bit != 0))
    }

    /// Drive a single pin.
    pub fn write_pin(&self, pin: u8, level: Level) -> Result<()> {
        let bit = pin_mask(pin)?;
        let latch = match level {
            Level::Low => 0,
            Level::High => bit,
        };
        self.write_latch(bit, latch)
    }

    /// Write each value of the sequence, pausing for `sequence.step` after each.
    ///
    /// Stops at the first failed write.
    pub fn run_sequence(&self, sequence: &ResetSequence) -> Result<()> {
        debug!(
            "running latch sequence of {} step(s) under mask {:#06x}",
            sequence.values.len(),
            sequence.mask
        );
        for &value in &sequence.values {
            self.write_latch(sequence.mask, value)?;
            std::thread::sleep(sequence.step);
        }
        Ok(())
    }
}

fn pin_mask(pin: u8) -> Result<u16> {
    if pin > 15 {
        return Err(Cp210xError::OutOfRange {
            what: "GPIO pin",
            value: u32::from(pin),
            max: 15,
        });
    }
    Ok(1 << pin)
}

#[cfg(unix)]
mod sys {
    use std::{ffi::c_int, fs::File, io, os::unix::io::AsRawFd, path::PathBuf, ptr::addr_of_mut};

    pub(super) fn device_path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    pub(super) fn set_modem_lines(file: &File, dtr: bool, rts: bool) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let mut flags: c_int = 0;
        // SAFETY: `fd` is open for the duration of the call and `flags` outlives it.
        if unsafe { libc::ioctl(fd, libc::TIOCMGET, addr_of_mut!(flags)) } == -1 {
            return Err(io::Error::last_os_error());
        }
        flags = with_line(flags, libc::TIOCM_DTR, dtr);
        flags = with_line(flags, libc::TIOCM_RTS, rts);
        if unsafe { libc::ioctl(fd, libc::TIOCMSET, addr_of_mut!(flags)) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn with_line(flags: c_int, line: c_int, on: bool) -> c_int {
        if on {
            flags | line
        } else {
            flags & !line
        }
    }
}

#[cfg(windows)]
mod sys {
    use std::{fs::File, io, os::windows::io::AsRawHandle, path::PathBuf};

    use crate::ffi::{BOOL, HANDLE};

    const SETRTS: u32 = 3;
    const CLRRTS: u32 = 4;
    const SETDTR: u32 = 5;
    const CLRDTR: u32 = 6;

    #[link(name = "kernel32")]
    extern "system" {
        fn EscapeCommFunction(file: HANDLE, func: u32) -> BOOL;
    }

    /// `COM10` and up are only reachable through the device namespace.
    pub(super) fn device_path(name: &str) -> PathBuf {
        if name.starts_with(r"\\") {
            PathBuf::from(name)
        } else {
            PathBuf::from(format!(r"\\.\{name}"))
        }
    }

    pub(super) fn set_modem_lines(file: &File, dtr: bool, rts: bool) -> io::Result<()> {
        let handle: HANDLE = file.as_raw_handle().cast();
        for func in [
            if dtr { SETDTR } else { CLRDTR },
            if rts { SETRTS } else { CLRRTS },
        ] {
            // SAFETY: the handle stays open while `file` is borrowed.
            if unsafe { EscapeCommFunction(handle, func) } == 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}
