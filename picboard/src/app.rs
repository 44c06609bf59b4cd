//! The module for the main app state and logic.

use log::{debug, info, warn};
use picboard_gpio::GpioResult;
use picboard_gpio::keypad::Keypad;
use picboard_gpio::lcd::format::{u16_to_text, u32_to_text, u8_to_text};
use picboard_gpio::lcd::hd44780::driver::HD44780Driver;
use thiserror::Error;

/// Number of characters in a display row.
pub const DISPLAY_WIDTH: usize = 20;

/// The main app state struct.
pub struct App<'a> {
    /// The current state of the app.
    state: AppState,
    /// The LCD driver for the app.
    lcd: &'a mut dyn HD44780Driver,
    /// The keypad used for the input.
    keypad: &'a dyn Keypad<Key = u8>,
    /// The key seen by the previous update, used to react to presses only once.
    prev_key: Option<u8>,
    /// Number of key presses since start, wrapping.
    presses: u16,
}

impl<'a> App<'a> {
    /// Creates a new instance of the App.
    pub fn new(lcd: &'a mut dyn HD44780Driver, keypad: &'a dyn Keypad<Key = u8>) -> App<'a> {
        App {
            state: AppState::default(),
            lcd,
            keypad,
            prev_key: None,
            presses: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Scans the keypad once and updates the app state. If needed, refreshes the display.
    pub fn update(&mut self) -> GpioResult<()> {
        let key = self.keypad.read()?;
        let pressed = match (self.prev_key, key) {
            (None, Some(key)) => Some(key),
            _ => None,
        };
        self.prev_key = key;

        if let AppState::Starting = self.state {
            info!("Starting calculator.");
            self.state = AppState::Entering { input: String::new() };
            return self.state.draw(self.lcd, self.presses);
        }

        if let Some(key) = pressed {
            self.presses = self.presses.wrapping_add(1);
            self.handle_key(key);
            self.state.draw(self.lcd, self.presses)?;
        }
        Ok(())
    }

    fn handle_key(&mut self, key: u8) {
        let key = key as char;
        debug!("Key {:?} in state {:?}", key, self.state);

        self.state = match (std::mem::take(&mut self.state), key) {
            (_, '#') => AppState::Entering { input: String::new() },
            (AppState::Entering { input }, '=') => match evaluate(&input) {
                Ok(value) => {
                    info!("{} = {}", input, value);
                    AppState::Result { expression: input, value }
                }
                Err(error) => {
                    warn!("Cannot evaluate {:?}: {}", input, error);
                    AppState::Failed { expression: input, error }
                }
            },
            // Operators continue from the last result
            (AppState::Result { value, .. }, op) if is_operator(op) => AppState::Entering {
                input: format!("{}{}", value, op),
            },
            (AppState::Entering { mut input }, key) => {
                if input.len() < DISPLAY_WIDTH {
                    input.push(key);
                } else {
                    debug!("Input is full, ignoring {:?}", key);
                }
                AppState::Entering { input }
            }
            (_, '=') => AppState::Entering { input: String::new() },
            (_, key) => AppState::Entering { input: key.to_string() },
        };
    }
}

/// Enum that can represent the different states of the application.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub enum AppState {
    /// The initial state of the application, before the first draw.
    #[default]
    Starting,
    /// The user is typing an expression.
    Entering {
        input: String,
    },
    /// The last expression was evaluated.
    Result {
        expression: String,
        value: u32,
    },
    /// The last expression could not be evaluated.
    Failed {
        expression: String,
        error: EvalError,
    },
}

impl AppState {
    /// Draws the current state of the application on the provided LCD driver.
    ///
    /// Called automatically by [App::update] when needed.
    fn draw(&self, lcd: &mut dyn HD44780Driver, presses: u16) -> GpioResult<()> {
        lcd.clear_display()?;
        match self {
            AppState::Starting => {}
            AppState::Entering { input } => {
                lcd.send_string_at(1, 1, input.as_bytes())?;
                lcd.send_string_at(3, 1, b"Len ")?;
                lcd.send_string(u8_to_text(input.len() as u8).as_bytes())?;
            }
            AppState::Result { expression, value } => {
                lcd.send_string_at(1, 1, expression.as_bytes())?;
                lcd.send_string_at(2, 1, b"=")?;
                lcd.send_string(u32_to_text(*value).as_bytes())?;
            }
            AppState::Failed { expression, error } => {
                lcd.send_string_at(1, 1, expression.as_bytes())?;
                lcd.set_cursor(2, 1)?;
                lcd.print(&error.to_string())?;
            }
        }
        lcd.send_string_at(4, 1, b"Keys ")?;
        lcd.send_string(u16_to_text(presses).as_bytes())?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum EvalError {
    #[error("Empty")]
    Empty,
    #[error("Syntax at {0}")]
    Syntax(usize),
    #[error("Div by zero")]
    DivisionByZero,
    #[error("Overflow")]
    Overflow,
}

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/')
}

fn apply(lhs: u32, op: char, rhs: u32) -> Result<u32, EvalError> {
    match op {
        '+' => lhs.checked_add(rhs).ok_or(EvalError::Overflow),
        '-' => lhs.checked_sub(rhs).ok_or(EvalError::Overflow),
        '*' => lhs.checked_mul(rhs).ok_or(EvalError::Overflow),
        _ => lhs.checked_div(rhs).ok_or(EvalError::DivisionByZero),
    }
}

/// Evaluates `input` strictly left to right, like a pocket calculator.
///
/// Operands are unsigned 32-bit integers; a result below zero is an overflow.
pub fn evaluate(input: &str) -> Result<u32, EvalError> {
    if input.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut result: Option<u32> = None;
    let mut pending_op: Option<char> = None;
    let mut operand: Option<u32> = None;

    for (position, c) in input.chars().enumerate() {
        if let Some(digit) = c.to_digit(10) {
            let value = operand.unwrap_or(0);
            operand = Some(
                value
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(digit))
                    .ok_or(EvalError::Overflow)?,
            );
        } else if is_operator(c) {
            let rhs = operand.take().ok_or(EvalError::Syntax(position))?;
            result = Some(match (result, pending_op) {
                (Some(lhs), Some(op)) => apply(lhs, op, rhs)?,
                _ => rhs,
            });
            pending_op = Some(c);
        } else {
            return Err(EvalError::Syntax(position));
        }
    }

    let rhs = operand.ok_or(EvalError::Syntax(input.chars().count()))?;
    match (result, pending_op) {
        (Some(lhs), Some(op)) => apply(lhs, op, rhs),
        _ => Ok(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picboard_gpio::keypad::{GpioKeypad, KeypadDescriptor, CALCULATOR_KEYS};
    use picboard_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Bus};
    use picboard_gpio::sim::SimBoard;
    use picboard_gpio::{PinRef, Port};
    use crate::utils::key_position;

    #[test]
    fn evaluates_left_to_right() {
        assert_eq!(evaluate("12+3"), Ok(15));
        assert_eq!(evaluate("2+3*4"), Ok(20));
        assert_eq!(evaluate("100/7"), Ok(14));
        assert_eq!(evaluate("42"), Ok(42));
    }

    #[test]
    fn evaluation_errors() {
        assert_eq!(evaluate(""), Err(EvalError::Empty));
        assert_eq!(evaluate("+1"), Err(EvalError::Syntax(0)));
        assert_eq!(evaluate("1+"), Err(EvalError::Syntax(2)));
        assert_eq!(evaluate("1+*2"), Err(EvalError::Syntax(2)));
        assert_eq!(evaluate("5/0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("1-2"), Err(EvalError::Overflow));
        assert_eq!(evaluate("99999999999"), Err(EvalError::Overflow));
    }

    fn press(board: &SimBoard, app: &mut App, keys: &str) {
        for key in keys.chars() {
            let (row, column) = key_position(&CALCULATOR_KEYS, key).unwrap();
            board.press_key(row, column);
            app.update().unwrap();
            board.release_key(row, column);
            app.update().unwrap();
        }
    }

    #[test]
    fn calculator_screen() {
        let bus = HD44780Bus::new_4bit(
            PinRef::new(Port::C, 0),
            PinRef::new(Port::C, 1),
            std::array::from_fn(|i| PinRef::new(Port::C, i as u8 + 4)),
        )
        .unwrap();
        let descriptor = KeypadDescriptor::new(
            std::array::from_fn(|i| PinRef::new(Port::B, i as u8)),
            std::array::from_fn(|i| PinRef::new(Port::B, i as u8 + 4)),
        )
        .unwrap();
        let board = SimBoard::new().with_lcd(&bus).with_keypad(&descriptor);
        let mut lcd = GpioHD44780Driver::new(&board, &board, &bus);
        lcd.init().unwrap();
        let keypad = GpioKeypad::new(&board, &board, &descriptor, &CALCULATOR_KEYS);
        keypad.initialize().unwrap();

        let mut app = App::new(&mut lcd, &keypad);
        app.update().unwrap();
        assert_eq!(app.state(), &AppState::Entering { input: String::new() });

        press(&board, &mut app, "12+3");
        assert_eq!(app.state(), &AppState::Entering { input: "12+3".to_string() });
        {
            let sim = board.lcd().unwrap();
            assert_eq!(sim.row_text(1, 4), "12+3");
            assert_eq!(sim.row_text(3, 6), "Len 4 ");
            assert_eq!(sim.row_text(4, 10), "Keys 4    ");
        }

        press(&board, &mut app, "=");
        assert_eq!(
            app.state(),
            &AppState::Result { expression: "12+3".to_string(), value: 15 }
        );
        assert_eq!(board.lcd().unwrap().row_text(2, 3), "=15");

        press(&board, &mut app, "*2=");
        assert_eq!(
            app.state(),
            &AppState::Result { expression: "15*2".to_string(), value: 30 }
        );

        press(&board, &mut app, "7/0=");
        assert_eq!(
            app.state(),
            &AppState::Failed { expression: "7/0".to_string(), error: EvalError::DivisionByZero }
        );
        assert_eq!(board.lcd().unwrap().row_text(2, 11), "Div by zero");

        press(&board, &mut app, "#");
        assert_eq!(app.state(), &AppState::Entering { input: String::new() });
        assert_eq!(board.lcd().unwrap().row_text(4, 8), "Keys 13 ");
    }

    #[test]
    fn held_keys_count_once() {
        let bus = HD44780Bus::new_8bit(
            PinRef::new(Port::E, 0),
            PinRef::new(Port::E, 1),
            std::array::from_fn(|i| PinRef::new(Port::D, i as u8)),
        )
        .unwrap();
        let descriptor = KeypadDescriptor::new(
            std::array::from_fn(|i| PinRef::new(Port::B, i as u8)),
            std::array::from_fn(|i| PinRef::new(Port::B, i as u8 + 4)),
        )
        .unwrap();
        let board = SimBoard::new().with_lcd(&bus).with_keypad(&descriptor);
        let mut lcd = GpioHD44780Driver::new(&board, &board, &bus);
        lcd.init().unwrap();
        let keypad = GpioKeypad::new(&board, &board, &descriptor, &CALCULATOR_KEYS);

        let mut app = App::new(&mut lcd, &keypad);
        app.update().unwrap();
        board.press_key(0, 0);
        for _ in 0..5 {
            app.update().unwrap();
        }
        assert_eq!(app.state(), &AppState::Entering { input: "7".to_string() });
    }
}
