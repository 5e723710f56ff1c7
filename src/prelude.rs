//! Public prelude of the crate containing the most commonly used types and functions.

pub use crate::{
    list_devices, Cp210xError, Device, DeviceInfo, DeviceVersion, Library, PartNumber, Result,
};
