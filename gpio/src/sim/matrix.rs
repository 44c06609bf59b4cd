use crate::keypad::{KeypadDescriptor, KEYPAD_COLUMNS, KEYPAD_ROWS};
use crate::raw::RegisterFile;
use crate::{GpioResult, Logic};
use log::warn;

/// Model of a passive 4x4 key matrix.
///
/// A held key connects its row and column line. A column reads high while at least one of
/// its held keys sits on a row that is driven high.
#[derive(Debug, Clone)]
pub struct MatrixSim {
    descriptor: KeypadDescriptor,
    held: [[bool; KEYPAD_COLUMNS]; KEYPAD_ROWS],
}

impl MatrixSim {
    pub fn new(descriptor: &KeypadDescriptor) -> Self {
        MatrixSim {
            descriptor: descriptor.clone(),
            held: [[false; KEYPAD_COLUMNS]; KEYPAD_ROWS],
        }
    }

    fn set(&mut self, row: usize, column: usize, held: bool) {
        match self.held.get_mut(row).and_then(|keys| keys.get_mut(column)) {
            Some(key) => *key = held,
            None => warn!("No key at ({}, {})", row, column),
        }
    }

    /// Holds down the key at the 0-based `row` and `column`.
    pub fn press(&mut self, row: usize, column: usize) {
        self.set(row, column, true);
    }

    pub fn release(&mut self, row: usize, column: usize) {
        self.set(row, column, false);
    }

    pub fn release_all(&mut self) {
        self.held = [[false; KEYPAD_COLUMNS]; KEYPAD_ROWS];
    }

    pub fn is_held(&self, row: usize, column: usize) -> bool {
        self.held
            .get(row)
            .and_then(|keys| keys.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// Drives the column lines from the current row levels.
    pub fn drive(&self, registers: &RegisterFile) -> GpioResult<()> {
        let rows = self.descriptor.rows().map(|pin| registers.raw_port(pin.port()) & pin.mask() != 0);

        for (column, &pin) in self.descriptor.columns().iter().enumerate() {
            let high = rows
                .iter()
                .enumerate()
                .any(|(row, &driven)| driven && self.held[row][column]);
            registers.set_input_level(pin, Logic::from(high))?;
        }
        Ok(())
    }
}
