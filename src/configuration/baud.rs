use std::ops::{Index, IndexMut};

use crate::ffi;

/// Reference clock the baud rate generator divides down.
const BAUD_CLOCK_HZ: u32 = 24_000_000;

/// One entry of the baud rate alias table.
///
/// When the host requests a rate within an entry's range, the device runs at
/// the rate produced by the entry's generator settings instead. The table is
/// supported by the CP2102, CP2103 and CP2109.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BaudConfig {
    /// Baud rate generator reload value.
    pub baud_gen: u16,
    /// Timer 0 reload value, used for receive timeouts.
    pub timer0_reload: u16,
    /// Clock prescaler, 1 or 4.
    pub prescaler: u8,
    /// Requested rate this entry stands for.
    pub baud_rate: u32,
}

impl BaudConfig {
    /// Rate the device actually runs at with these generator settings.
    ///
    /// `None` if the prescaler is zero.
    #[must_use]
    pub fn actual_baud_rate(&self) -> Option<u32> {
        let divisor = u32::from(self.prescaler) * (0x1_0000 - u32::from(self.baud_gen));
        BAUD_CLOCK_HZ.checked_div(divisor)
    }
}

impl From<ffi::BAUD_CONFIG> for BaudConfig {
    fn from(value: ffi::BAUD_CONFIG) -> Self {
        Self {
            baud_gen: value.BaudGen,
            timer0_reload: value.Timer0Reload,
            prescaler: value.Prescaler,
            baud_rate: value.BaudRate,
        }
    }
}

impl From<BaudConfig> for ffi::BAUD_CONFIG {
    fn from(value: BaudConfig) -> Self {
        Self {
            BaudGen: value.baud_gen,
            Timer0Reload: value.timer0_reload,
            Prescaler: value.prescaler,
            BaudRate: value.baud_rate,
        }
    }
}

/// The full baud rate alias table of a device.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BaudRateAliases([BaudConfig; ffi::NUM_BAUD_CONFIGS]);

impl BaudRateAliases {
    /// Iterate over all entries.
    pub fn iter(&self) -> std::slice::Iter<'_, BaudConfig> {
        self.0.iter()
    }

    /// Iterate mutably over all entries.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BaudConfig> {
        self.0.iter_mut()
    }
}

impl Index<usize> for BaudRateAliases {
    type Output = BaudConfig;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for BaudRateAliases {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<'a> IntoIterator for &'a BaudRateAliases {
    type Item = &'a BaudConfig;
    type IntoIter = std::slice::Iter<'a, BaudConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<ffi::BAUD_CONFIG_DATA> for BaudRateAliases {
    fn from(value: ffi::BAUD_CONFIG_DATA) -> Self {
        Self(value.map(BaudConfig::from))
    }
}

impl From<BaudRateAliases> for ffi::BAUD_CONFIG_DATA {
    fn from(value: BaudRateAliases) -> Self {
        value.0.map(ffi::BAUD_CONFIG::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actual_baud_rate() {
        // 115200 on a CP2102: 24MHz / (1 * 208) = 115384
        let entry = BaudConfig {
            baud_gen: 0xFF30,
            timer0_reload: 0xFFEC,
            prescaler: 1,
            baud_rate: 115_200,
        };
        assert_eq!(entry.actual_baud_rate(), Some(115_384));

        let slow = BaudConfig {
            baud_gen: 0xFB1E,
            prescaler: 4,
            ..entry
        };
        assert_eq!(slow.actual_baud_rate(), Some(4800));
        assert_eq!(BaudConfig::default().actual_baud_rate(), None);
    }

    #[test]
    fn table_access() {
        let mut table = BaudRateAliases::default();
        table[0].baud_rate = 921_600;
        for entry in table.iter_mut().skip(1) {
            entry.prescaler = 1;
        }
        assert_eq!(table[0].baud_rate, 921_600);
        assert_eq!(table[0].prescaler, 0);
        assert_eq!((&table).into_iter().filter(|e| e.prescaler == 1).count(), 31);
        assert_eq!(table.iter().count(), ffi::NUM_BAUD_CONFIGS);
    }

    #[test]
    fn raw_conversion() {
        let mut raw = ffi::BAUD_CONFIG_DATA::default();
        raw[31].BaudRate = 300;
        raw[31].Prescaler = 4;
        let table = BaudRateAliases::from(raw);
        assert_eq!(table[31].baud_rate, 300);
        assert_eq!(ffi::BAUD_CONFIG_DATA::from(table), raw);
    }
}
