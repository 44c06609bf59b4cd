mod gpio;

use std::fmt::Debug;
use crate::GpioResult;
pub use gpio::*;

/// Number of rows of the supported keypads.
pub const KEYPAD_ROWS: usize = 4;
/// Number of columns of the supported keypads.
pub const KEYPAD_COLUMNS: usize = 4;

/// Maps a (row, column) intersection to the character printed on the key.
pub type KeyMap = [[u8; KEYPAD_COLUMNS]; KEYPAD_ROWS];

/// Calculator-style 4x4 layout.
pub const CALCULATOR_KEYS: KeyMap = [
    *b"789/",
    *b"456*",
    *b"123-",
    *b"#0=+",
];

/// Phone-style 4x4 layout with the letter column on the right.
pub const PHONE_KEYS: KeyMap = [
    *b"123A",
    *b"456B",
    *b"789C",
    *b"*0#D",
];

/// The `Keypad` trait defines the interface for keypad input devices.
pub trait Keypad: Debug {
    type Key: Copy;

    /// Configures the keypad pins.
    fn initialize(&self) -> GpioResult<()>;

    /// Scans the keypad once, overwriting `value` only if a key is pressed.
    ///
    /// The caller is expected to set `value` to a sentinel beforehand, since "no key pressed"
    /// leaves it untouched.
    fn get_value(&self, value: &mut Self::Key) -> GpioResult<()>;

    /// Scans the keypad once, returning the pressed key, if any.
    fn read(&self) -> GpioResult<Option<Self::Key>>;
}
