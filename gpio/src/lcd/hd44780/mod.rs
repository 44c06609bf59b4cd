//! HD44780 character LCD module.
//!
//! The controller is driven over a parallel bus: a register select line (RS), an enable
//! line (E) and either 4 or 8 data lines. Reading back from the controller is not supported,
//! the R/W line of the display is expected to be tied to GND.
//!
//! See [driver::HD44780Driver] for the command set and [driver::GpioHD44780Driver] for the
//! bus protocol implemented on top of [crate::PinDriver].

pub mod driver;
