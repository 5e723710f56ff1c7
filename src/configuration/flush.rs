use bitflags::bitflags;

use crate::ffi;

bitflags! {
    /// Buffers purged when an interface is opened or closed.
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct FlushEvents: u16 {
        const OPEN_TX = ffi::FC_OPEN_TX;
        const OPEN_RX = ffi::FC_OPEN_RX;
        const CLOSE_TX = ffi::FC_CLOSE_TX;
        const CLOSE_RX = ffi::FC_CLOSE_RX;
    }
}

/// Selects the four flush bits belonging to one interface.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FlushInterface {
    Interface0,
    Interface1,
    Interface2,
    Interface3,
}

impl FlushInterface {
    /// The only interface of a single port device (CP2104).
    pub const SINGLE: Self = Self::Interface0;
    /// Standard Communications Interface of the CP2105.
    pub const SCI: Self = Self::Interface0;
    /// Enhanced Communications Interface of the CP2105.
    pub const ECI: Self = Self::Interface1;

    fn shift(self) -> u32 {
        match self {
            FlushInterface::Interface0 => 0,
            FlushInterface::Interface1 => 4,
            FlushInterface::Interface2 => 8,
            FlushInterface::Interface3 => 12,
        }
    }
}

/// Flush buffer configuration of a CP2104, CP2105 or CP2108.
///
/// Each interface occupies four bits, laid out as in [`FlushEvents`]. Note
/// that on the CP2105 the SCI comes first even though it is interface 1 on
/// the bus.
///
/// ```
/// use cp210x::configuration::{FlushBufferConfig, FlushEvents, FlushInterface};
///
/// let config = FlushBufferConfig::default()
///     .with_events(FlushInterface::ECI, FlushEvents::OPEN_RX | FlushEvents::OPEN_TX);
/// assert_eq!(config.bits(), 0x0030);
/// ```
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FlushBufferConfig(u16);

impl FlushBufferConfig {
    /// Wrap the raw value reported by the device.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw value, as written to the device.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Events configured for the given interface.
    #[must_use]
    pub fn events(self, interface: FlushInterface) -> FlushEvents {
        FlushEvents::from_bits_truncate(self.0 >> interface.shift())
    }

    /// Replace the events configured for the given interface.
    pub fn set_events(&mut self, interface: FlushInterface, events: FlushEvents) {
        let shift = interface.shift();
        self.0 = (self.0 & !(FlushEvents::all().bits() << shift)) | (events.bits() << shift);
    }

    /// Builder form of [`set_events`](Self::set_events).
    #[must_use]
    pub fn with_events(mut self, interface: FlushInterface, events: FlushEvents) -> Self {
        self.set_events(interface, events);
        self
    }
}

impl From<u16> for FlushBufferConfig {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<FlushBufferConfig> for u16 {
    fn from(value: FlushBufferConfig) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_interface_bits() {
        let config = FlushBufferConfig::from_bits(
            ffi::FC_OPEN_TX_IFC0 | ffi::FC_CLOSE_RX_IFC2 | ffi::FC_OPEN_RX_IFC3,
        );
        assert_eq!(config.events(FlushInterface::Interface0), FlushEvents::OPEN_TX);
        assert_eq!(config.events(FlushInterface::Interface1), FlushEvents::empty());
        assert_eq!(config.events(FlushInterface::Interface2), FlushEvents::CLOSE_RX);
        assert_eq!(config.events(FlushInterface::Interface3), FlushEvents::OPEN_RX);
    }

    #[test]
    fn dual_port_layout() {
        let config = FlushBufferConfig::default()
            .with_events(FlushInterface::SCI, FlushEvents::CLOSE_TX)
            .with_events(FlushInterface::ECI, FlushEvents::all());
        assert_eq!(
            config.bits(),
            ffi::FC_CLOSE_TX_SCI
                | ffi::FC_OPEN_TX_ECI
                | ffi::FC_OPEN_RX_ECI
                | ffi::FC_CLOSE_TX_ECI
                | ffi::FC_CLOSE_RX_ECI
        );
    }

    #[test]
    fn set_events_replaces_only_one_interface() {
        let mut config = FlushBufferConfig::from_bits(0xFFFF);
        config.set_events(FlushInterface::Interface1, FlushEvents::OPEN_RX);
        assert_eq!(config.bits(), 0xFF2F);
    }
}
