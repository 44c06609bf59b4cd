use crate::policy::{ErrorPolicy, Sequence};
use crate::{validate_pins, Direction, GpioError, GpioResult, Logic, PinDriver, PinRef};
use log::trace;

/// Common terminal of the display, which decides the BCD decoder it is paired with.
///
/// The decoder takes care of the segment polarity, the BCD lines are the same for both.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SegmentKind {
    #[default]
    CommonAnode,
    CommonCathode,
}

/// A single digit seven-segment display behind a BCD decoder.
///
/// Pin `i` carries bit `i` of the digit.
#[derive(Debug)]
pub struct SevenSegment<'a> {
    pins: &'a dyn PinDriver,
    bcd: [PinRef; 4],
    kind: SegmentKind,
    policy: ErrorPolicy,
}

impl<'a> SevenSegment<'a> {
    /// Largest digit that can be shown.
    pub const MAX_DIGIT: u8 = 9;

    /// # Errors
    /// - `GpioError::OutOfRange` if a pin index is out of range.
    /// - `GpioError::AlreadyInUse` if a pin appears twice.
    pub fn new(pins: &'a dyn PinDriver, bcd: [PinRef; 4], kind: SegmentKind) -> GpioResult<Self> {
        validate_pins(&bcd)?;
        Ok(SevenSegment {
            pins,
            bcd,
            kind,
            policy: ErrorPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Makes the BCD pins outputs showing `0`.
    pub fn initialize(&self) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy);
        for &pin in &self.bcd {
            seq.step(self.pins.initialize(pin, Direction::Output, Logic::Low))?;
        }
        seq.finish()
    }

    /// Shows a digit.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `number` is greater than 9. No pin is written.
    pub fn write_number(&self, number: u8) -> GpioResult<()> {
        if number > Self::MAX_DIGIT {
            return Err(GpioError::InvalidArgument);
        }
        trace!("Showing {} on {:?}", number, self.bcd);
        let mut seq = Sequence::new(self.policy);
        for (i, &pin) in self.bcd.iter().enumerate() {
            seq.step(self.pins.write_logic(pin, Logic::from((number >> i) & 1 != 0)))?;
        }
        seq.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;
    use crate::Port;

    fn bcd() -> [PinRef; 4] {
        std::array::from_fn(|i| PinRef::new(Port::D, i as u8 + 2))
    }

    #[test]
    fn digits_are_written_in_bcd() {
        let board = SimBoard::new();
        let segment = SevenSegment::new(&board, bcd(), SegmentKind::CommonCathode).unwrap();
        segment.initialize().unwrap();
        assert_eq!(board.registers().raw_tris(Port::D), 0b1100_0011);

        for number in 0..=9u8 {
            segment.write_number(number).unwrap();
            assert_eq!(board.registers().raw_lat(Port::D), number << 2);
        }
    }

    #[test]
    fn rejects_numbers_above_9() {
        let board = SimBoard::new();
        let segment = SevenSegment::new(&board, bcd(), SegmentKind::CommonAnode).unwrap();
        segment.write_number(5).unwrap();
        assert_eq!(segment.write_number(10), Err(GpioError::InvalidArgument));
        assert_eq!(board.registers().raw_lat(Port::D), 5 << 2);
    }
}
