use std::fmt::{Debug, Formatter};
use log::{debug, trace};
use crate::delay::Delay;
use crate::keypad::{KeyMap, Keypad, KEYPAD_COLUMNS, KEYPAD_ROWS};
use crate::policy::{ErrorPolicy, Sequence};
use crate::{validate_pins, Direction, GpioResult, Logic, PinDriver, PinRef};

/// Pin mapping of a 4x4 matrix keypad.
///
/// Rows are driven by the microcontroller, columns are sensed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeypadDescriptor {
    rows: [PinRef; KEYPAD_ROWS],
    columns: [PinRef; KEYPAD_COLUMNS],
}

impl KeypadDescriptor {
    /// Creates a keypad descriptor.
    ///
    /// # Errors
    /// - `GpioError::OutOfRange` if a pin index is out of range.
    /// - `GpioError::AlreadyInUse` if a pin appears twice.
    pub fn new(rows: [PinRef; KEYPAD_ROWS], columns: [PinRef; KEYPAD_COLUMNS]) -> GpioResult<Self> {
        let mut pins = rows.to_vec();
        pins.extend_from_slice(&columns);
        validate_pins(&pins)?;
        Ok(KeypadDescriptor { rows, columns })
    }

    pub fn rows(&self) -> &[PinRef; KEYPAD_ROWS] {
        &self.rows
    }

    pub fn columns(&self) -> &[PinRef; KEYPAD_COLUMNS] {
        &self.columns
    }
}

/// The `GpioKeypad` struct scans a diode matrix keypad row by row.
///
/// For each row, all rows are driven low, the current row is driven high and, after a settle
/// delay, every column is read. A high column identifies the key at the intersection. All
/// rows are always scanned, so when several keys are held the last one in scan order (highest
/// row, then highest column) wins.
pub struct GpioKeypad<'a> {
    pins: &'a dyn PinDriver,
    delay: &'a dyn Delay,
    descriptor: &'a KeypadDescriptor,
    keys: &'a KeyMap,
    policy: ErrorPolicy,
}

impl Debug for GpioKeypad<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioKeypad({:?}, {:?})", self.descriptor.rows, self.descriptor.columns)
    }
}

impl<'a> GpioKeypad<'a> {
    /// Time given to the column lines to settle after a row is driven.
    pub const SETTLE_DELAY_MS: u32 = 15;

    pub fn new(
        pins: &'a dyn PinDriver,
        delay: &'a dyn Delay,
        descriptor: &'a KeypadDescriptor,
        keys: &'a KeyMap,
    ) -> Self {
        GpioKeypad {
            pins,
            delay,
            descriptor,
            keys,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one full scan pass, calling `on_press` for every high column.
    ///
    /// Under [ErrorPolicy::Permissive] a failed column read counts as "not pressed".
    fn scan(&self, mut on_press: impl FnMut(usize, usize)) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy);
        let rows = self.descriptor.rows();
        let columns = self.descriptor.columns();

        for &row in rows {
            seq.step(self.pins.set_direction(row, Direction::Output))?;
        }
        for &column in columns {
            seq.step(self.pins.set_direction(column, Direction::Input))?;
        }

        for (row_index, &row) in rows.iter().enumerate() {
            for &pin in rows {
                seq.step(self.pins.write_logic(pin, Logic::Low))?;
            }
            seq.step(self.pins.write_logic(row, Logic::High))?;
            self.delay.delay_ms(Self::SETTLE_DELAY_MS);

            for (column_index, &column) in columns.iter().enumerate() {
                let level = seq.step_value(self.pins.read_logic(column), Logic::Low)?;
                if level.is_high() {
                    trace!("Key at ({}, {}) is pressed", row_index, column_index);
                    on_press(row_index, column_index);
                }
            }
        }

        seq.finish()
    }
}

impl Keypad for GpioKeypad<'_> {
    type Key = u8;

    fn initialize(&self) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy);
        for &row in self.descriptor.rows() {
            seq.step(self.pins.initialize(row, Direction::Output, Logic::Low))?;
        }
        for &column in self.descriptor.columns() {
            seq.step(self.pins.set_direction(column, Direction::Input))?;
        }
        seq.finish()
    }

    fn get_value(&self, value: &mut u8) -> GpioResult<()> {
        self.scan(|row, column| *value = self.keys[row][column])
    }

    fn read(&self) -> GpioResult<Option<u8>> {
        let mut key = None;
        self.scan(|row, column| key = Some(self.keys[row][column]))?;
        if let Some(key) = key {
            debug!("Key pressed: {:?}", key as char);
        }
        Ok(key)
    }
}
