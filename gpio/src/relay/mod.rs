use crate::{Direction, GpioResult, Logic, PinDriver, PinRef};
use log::debug;

/// A relay coil switched by a single output pin, energized while the pin is high.
#[derive(Debug)]
pub struct Relay<'a> {
    pins: &'a dyn PinDriver,
    pin: PinRef,
    initial: Logic,
}

impl<'a> Relay<'a> {
    /// # Errors
    /// - `GpioError::OutOfRange` if the pin index is out of range.
    pub fn new(pins: &'a dyn PinDriver, pin: PinRef, initial: Logic) -> GpioResult<Self> {
        pin.validate()?;
        Ok(Relay { pins, pin, initial })
    }

    pub fn initialize(&self) -> GpioResult<()> {
        self.pins.initialize(self.pin, Direction::Output, self.initial)
    }

    pub fn turn_on(&self) -> GpioResult<()> {
        debug!("Relay {} energized", self.pin);
        self.pins.write_logic(self.pin, Logic::High)
    }

    pub fn turn_off(&self) -> GpioResult<()> {
        debug!("Relay {} released", self.pin);
        self.pins.write_logic(self.pin, Logic::Low)
    }
}
