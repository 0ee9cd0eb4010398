//! 24-bit RGB color.

use std::fmt;

use serde::Deserialize;

use crate::error::RuleError;

/// A 24-bit RGB color stored as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(u32);

impl Rgb {
    /// Pure white
    pub const WHITE: Self = Self::new(0xFF_FF_FF);

    /// Create a color from a packed `0xRRGGBB` value. Bits above 24 are
    /// dropped.
    pub const fn new(packed: u32) -> Self {
        Self(packed & 0x00FF_FFFF)
    }

    /// Parse bare hex digits without a leading marker (`"1A2B3C"`).
    ///
    /// Short values are zero-extended on the left, so `"FF"` is blue.
    ///
    /// # Errors
    ///
    /// `RuleError::InvalidColor` if the text is empty, longer than 6 digits,
    /// or contains anything other than hex digits.
    pub fn from_hex(text: &str) -> Result<Self, RuleError> {
        let text = text.trim();
        if text.is_empty() || text.len() > 6 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RuleError::InvalidColor(text.to_owned()));
        }
        u32::from_str_radix(text, 16)
            .map(Self::new)
            .map_err(|_| RuleError::InvalidColor(text.to_owned()))
    }

    /// Packed `0xRRGGBB` value.
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Red channel.
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl TryFrom<String> for Rgb {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_hex() {
        let color = Rgb::from_hex("028E51").unwrap();
        assert_eq!(color.packed(), 0x02_8E_51);
        assert_eq!((color.red(), color.green(), color.blue()), (0x02, 0x8E, 0x51));
        assert_eq!(Rgb::from_hex("fdb71a").unwrap(), Rgb::new(0xFD_B7_1A));
    }

    #[test]
    fn short_hex_is_zero_extended() {
        assert_eq!(Rgb::from_hex("FF").unwrap(), Rgb::new(0x00_00_FF));
    }

    #[test]
    fn rejects_bad_hex() {
        for bad in ["", "#028E51", "0x28E51", "1234567", "GG0000", "+12"] {
            assert!(Rgb::from_hex(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn displays_as_bare_hex() {
        assert_eq!(Rgb::new(0x20_FF_00).to_string(), "20FF00");
        assert_eq!(Rgb::new(0xFF_20_FF_00).to_string(), "20FF00");
    }
}
