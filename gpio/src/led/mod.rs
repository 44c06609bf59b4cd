use crate::{Direction, GpioResult, Logic, PinDriver, PinRef};
use log::trace;

/// An LED on a single output pin, lit while the pin is high.
#[derive(Debug)]
pub struct Led<'a> {
    pins: &'a dyn PinDriver,
    pin: PinRef,
    initial: Logic,
}

impl<'a> Led<'a> {
    /// Creates the driver. The pin is configured by [Led::initialize].
    ///
    /// # Errors
    /// - `GpioError::OutOfRange` if the pin index is out of range.
    pub fn new(pins: &'a dyn PinDriver, pin: PinRef, initial: Logic) -> GpioResult<Self> {
        pin.validate()?;
        Ok(Led { pins, pin, initial })
    }

    pub fn pin(&self) -> PinRef {
        self.pin
    }

    /// Makes the pin an output driving the initial level.
    pub fn initialize(&self) -> GpioResult<()> {
        self.pins.initialize(self.pin, Direction::Output, self.initial)
    }

    pub fn turn_on(&self) -> GpioResult<()> {
        trace!("LED {} on", self.pin);
        self.pins.write_logic(self.pin, Logic::High)
    }

    pub fn turn_off(&self) -> GpioResult<()> {
        trace!("LED {} off", self.pin);
        self.pins.write_logic(self.pin, Logic::Low)
    }

    pub fn toggle(&self) -> GpioResult<()> {
        self.pins.toggle_logic(self.pin)
    }

    /// Gets whether the LED is lit, from the output latch.
    pub fn is_on(&self) -> GpioResult<bool> {
        Ok(self.pins.read_logic(self.pin)?.is_high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;
    use crate::{GpioError, Port};

    const C2: PinRef = PinRef::new(Port::C, 2);

    #[test]
    fn led_follows_commands() {
        let board = SimBoard::new();
        let led = Led::new(&board, C2, Logic::High).unwrap();
        led.initialize().unwrap();
        assert_eq!(board.direction(C2), Ok(Direction::Output));
        assert_eq!(led.is_on(), Ok(true));

        led.turn_off().unwrap();
        assert_eq!(led.is_on(), Ok(false));
        led.toggle().unwrap();
        assert_eq!(led.is_on(), Ok(true));
        led.turn_on().unwrap();
        assert_eq!(led.is_on(), Ok(true));
    }

    #[test]
    fn rejects_out_of_range_pin() {
        let board = SimBoard::new();
        let bad = PinRef::new(Port::C, 8);
        assert_eq!(Led::new(&board, bad, Logic::Low).err(), Some(GpioError::OutOfRange(bad)));
    }
}
