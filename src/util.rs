//! Internal utility types and functions.

use std::marker::PhantomData;

/// Used to force a lifetime constraint on a type which does not contain any references.
///
/// A raw serial port handle carries no lifetime of its own, so this ties it to
/// the port object it was taken from.
#[cfg(feature = "runtime")]
pub type PhantomLifetime<'a, T = ()> = PhantomData<&'a T>;

/// Used to force a type to be `!Sync`.
pub type PhantomUnsync = PhantomData<std::cell::Cell<()>>;

/// Decode a BCD byte, `None` if either nibble is not a decimal digit.
pub(crate) fn from_bcd(value: u8) -> Option<u8> {
    let (high, low) = (value >> 4, value & 0x0F);
    (high < 10 && low < 10).then_some(high * 10 + low)
}

/// Encode a value below 100 as BCD.
pub(crate) fn to_bcd(value: u8) -> Option<u8> {
    (value < 100).then_some(((value / 10) << 4) | (value % 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd() {
        assert_eq!(from_bcd(0x42), Some(42));
        assert_eq!(from_bcd(0x0A), None);
        assert_eq!(to_bcd(7), Some(0x07));
        assert_eq!(to_bcd(99), Some(0x99));
        assert_eq!(to_bcd(100), None);
    }
}
