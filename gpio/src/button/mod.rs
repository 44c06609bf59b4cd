use crate::{Direction, GpioResult, Logic, PinDriver, PinRef};
use log::trace;

/// Which level a pressed button puts on its pin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ButtonActive {
    /// Pull-down wiring, the pin reads high while pressed.
    #[default]
    ActiveHigh,
    /// Pull-up wiring, the pin reads low while pressed.
    ActiveLow,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// A push button on a single input pin. Reads are not debounced.
#[derive(Debug)]
pub struct Button<'a> {
    pins: &'a dyn PinDriver,
    pin: PinRef,
    active: ButtonActive,
}

impl<'a> Button<'a> {
    /// # Errors
    /// - `GpioError::OutOfRange` if the pin index is out of range.
    pub fn new(pins: &'a dyn PinDriver, pin: PinRef, active: ButtonActive) -> GpioResult<Self> {
        pin.validate()?;
        Ok(Button { pins, pin, active })
    }

    pub fn initialize(&self) -> GpioResult<()> {
        self.pins.set_direction(self.pin, Direction::Input)
    }

    pub fn read_state(&self) -> GpioResult<ButtonState> {
        let level = self.pins.read_logic(self.pin)?;
        let pressed = match self.active {
            ButtonActive::ActiveHigh => level == Logic::High,
            ButtonActive::ActiveLow => level == Logic::Low,
        };
        trace!("Button {} reads {:?}, pressed: {}", self.pin, level, pressed);
        Ok(if pressed { ButtonState::Pressed } else { ButtonState::Released })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;
    use crate::Port;

    const A5: PinRef = PinRef::new(Port::A, 5);

    #[test]
    fn active_high() {
        let board = SimBoard::new();
        let button = Button::new(&board, A5, ButtonActive::ActiveHigh).unwrap();
        button.initialize().unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Released));
        board.set_input_level(A5, Logic::High).unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Pressed));
    }

    #[test]
    fn active_low() {
        let board = SimBoard::new();
        let button = Button::new(&board, A5, ButtonActive::ActiveLow).unwrap();
        button.initialize().unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Pressed));
        board.set_input_level(A5, Logic::High).unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Released));
    }

    #[test]
    fn initialize_turns_an_output_back_into_an_input() {
        let board = SimBoard::new();
        board.initialize(A5, Direction::Output, Logic::High).unwrap();
        let button = Button::new(&board, A5, ButtonActive::ActiveHigh).unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Pressed));

        button.initialize().unwrap();
        assert_eq!(button.read_state(), Ok(ButtonState::Released));
    }
}
