//! Character LCD support.

pub mod format;
pub mod hd44780;
