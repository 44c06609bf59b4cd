//! Fixed-width conversions of unsigned integers into display cells.
//!
//! The buffers are NUL-terminated so they can be passed straight to
//! [HD44780Driver::send_string](crate::lcd::hd44780::driver::HD44780Driver::send_string).

use std::fmt::{Debug, Formatter};

/// A fixed-size, NUL-terminated character buffer.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TextCells<const N: usize>([u8; N]);

impl<const N: usize> TextCells<N> {
    /// Gets the whole buffer, terminator and padding included.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Gets the text up to the first NUL byte.
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        // Only ASCII digits and spaces are ever written
        std::str::from_utf8(&self.0[..len]).unwrap_or_default()
    }

    fn with_digits(fill: u8, digits: &str) -> Self {
        let mut cells = [fill; N];
        cells[..digits.len()].copy_from_slice(digits.as_bytes());
        TextCells(cells)
    }
}

impl<const N: usize> Debug for TextCells<N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TextCells({:?})", self.as_str())
    }
}

/// Converts a `u8` into up to 3 digits followed by NUL bytes.
pub fn u8_to_text(value: u8) -> TextCells<4> {
    let mut buffer = itoa::Buffer::new();
    TextCells::with_digits(0, buffer.format(value))
}

/// Converts a `u16` into a 5-character field, digits first and padded with spaces,
/// followed by a NUL byte.
///
/// The padding overwrites the digits of a previously shown longer number.
pub fn u16_to_text(value: u16) -> TextCells<6> {
    let mut buffer = itoa::Buffer::new();
    let mut cells = TextCells::with_digits(b' ', buffer.format(value));
    cells.0[5] = 0;
    cells
}

/// Converts a `u32` into up to 10 digits followed by NUL bytes.
pub fn u32_to_text(value: u32) -> TextCells<11> {
    let mut buffer = itoa::Buffer::new();
    TextCells::with_digits(0, buffer.format(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_values() {
        assert_eq!(u8_to_text(0).as_bytes(), b"0\0\0\0");
        assert_eq!(u8_to_text(42).as_str(), "42");
        assert_eq!(u8_to_text(255).as_bytes(), b"255\0");
    }

    #[test]
    fn u16_values_fill_a_5_character_field() {
        assert_eq!(u16_to_text(0).as_bytes(), b"0    \0");
        assert_eq!(u16_to_text(7).as_str(), "7    ");
        assert_eq!(u16_to_text(1234).as_str(), "1234 ");
        assert_eq!(u16_to_text(u16::MAX).as_bytes(), b"65535\0");
    }

    #[test]
    fn u32_values() {
        assert_eq!(u32_to_text(0).as_str(), "0");
        assert_eq!(u32_to_text(100_000).as_str(), "100000");
        assert_eq!(u32_to_text(u32::MAX).as_bytes(), b"4294967295\0");
    }

    #[test]
    fn debug_shows_the_text() {
        assert_eq!(format!("{:?}", u8_to_text(9)), "TextCells(\"9\")");
    }
}
