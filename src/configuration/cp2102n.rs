use crate::{Cp210xError, Result};

/// Size in bytes of the CP2102N configuration blob, checksum included.
pub const CP2102N_CONFIG_SIZE: usize = 0x2A6;

/// Configuration blob of a CP2102N.
///
/// The last two bytes hold a Fletcher-16 checksum of everything before them,
/// stored big-endian. A blob read from a device is rejected if the checksum
/// does not match; edits made through [`Cp2102nConfig::modify`] keep it
/// current.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Cp2102nConfig(Box<[u8; CP2102N_CONFIG_SIZE]>);

impl Cp2102nConfig {
    /// Parse a blob, checking its length and checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; CP2102N_CONFIG_SIZE] = bytes
            .try_into()
            .map_err(|_| Cp210xError::InvalidConfig("CP2102N configuration has the wrong length"))?;
        let config = Self(Box::new(bytes));
        if config.checksum() != config.compute_checksum() {
            return Err(Cp210xError::InvalidConfig(
                "CP2102N configuration checksum mismatch",
            ));
        }
        Ok(config)
    }

    /// Raw blob, checksum included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Checksum stored in the blob.
    #[must_use]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.0[CP2102N_CONFIG_SIZE - 2], self.0[CP2102N_CONFIG_SIZE - 1]])
    }

    /// Edit the configuration bytes, excluding the checksum, which is
    /// recomputed afterwards.
    pub fn modify<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let result = f(&mut self.0[..CP2102N_CONFIG_SIZE - 2]);
        self.refresh_checksum();
        result
    }

    fn compute_checksum(&self) -> u16 {
        fletcher16(&self.0[..CP2102N_CONFIG_SIZE - 2])
    }

    fn refresh_checksum(&mut self) {
        let [high, low] = self.compute_checksum().to_be_bytes();
        self.0[CP2102N_CONFIG_SIZE - 2] = high;
        self.0[CP2102N_CONFIG_SIZE - 1] = low;
    }
}

impl std::fmt::Debug for Cp2102nConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cp2102nConfig")
            .field("checksum", &format_args!("{:#06x}", self.checksum()))
            .finish_non_exhaustive()
    }
}

fn fletcher16(data: &[u8]) -> u16 {
    let (sum1, sum2) = data.iter().fold((0u16, 0u16), |(sum1, sum2), &byte| {
        let sum1 = (sum1 + u16::from(byte)) % 255;
        (sum1, (sum2 + sum1) % 255)
    });
    (sum2 << 8) | sum1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fletcher16_reference_values() {
        assert_eq!(fletcher16(b"abcde"), 0xC8F0);
        assert_eq!(fletcher16(b"abcdef"), 0x2057);
        assert_eq!(fletcher16(b"abcdefgh"), 0x0627);
        assert_eq!(fletcher16(&[]), 0);
    }

    #[test]
    fn blank_blob_is_valid() {
        let config = Cp2102nConfig::from_bytes(&[0; CP2102N_CONFIG_SIZE]).unwrap();
        assert_eq!(config.checksum(), 0);
    }

    #[test]
    fn rejects_bad_blobs() {
        assert_eq!(
            Cp2102nConfig::from_bytes(&[0; 16]),
            Err(Cp210xError::InvalidConfig(
                "CP2102N configuration has the wrong length"
            ))
        );
        let mut bytes = vec![0; CP2102N_CONFIG_SIZE];
        bytes[3] = 1;
        assert_eq!(
            Cp2102nConfig::from_bytes(&bytes),
            Err(Cp210xError::InvalidConfig(
                "CP2102N configuration checksum mismatch"
            ))
        );
    }

    #[test]
    fn modify_refreshes_checksum() {
        let mut config = Cp2102nConfig::from_bytes(&[0; CP2102N_CONFIG_SIZE]).unwrap();
        assert_eq!(config.checksum(), 0);
        config.modify(|bytes| bytes[0] = 0x01);
        // sum1 = 1, sum2 = 0x2A4 % 255
        assert_eq!(config.checksum(), (((0x2A4 % 255) as u16) << 8) | 1);
        assert!(Cp2102nConfig::from_bytes(config.as_bytes()).is_ok());
    }
}
