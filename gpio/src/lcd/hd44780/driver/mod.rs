mod gpio;

use crate::policy::{ErrorPolicy, Sequence};
use crate::{GpioError, GpioResult};
pub use gpio::*;
use log::{debug, warn};
use std::fmt::Debug;

/// DDRAM address commands of the first cell of each row, for rows 1 to 4.
///
/// Rows 3 and 4 continue rows 1 and 2 in the controller memory, 20 cells later.
pub const ROW_ADDRESSES: [u8; 4] = [0x80, 0xC0, 0x94, 0xD4];

/// Number of user-programmable glyphs in CGRAM.
pub const GLYPH_SLOTS: u8 = 8;

/// A custom glyph, one byte per pixel row, 5 least significant bits used.
pub type Glyph = [u8; 8];

/// The `HD44780Driver` trait defines the command set of the HD44780 controller on top of the
/// two raw transfers, [HD44780Driver::send_command] and [HD44780Driver::send_data].
///
/// Multi-step operations follow the [ErrorPolicy] returned by [HD44780Driver::policy].
pub trait HD44780Driver: Debug {
    /// Runs the power-up initialization sequence of the controller, leaving it with a
    /// 2-line display, the cursor hidden and the address counter at the start of DDRAM.
    fn init(&mut self) -> GpioResult<()>;

    /// Gets the error policy used by the multi-step operations.
    fn policy(&self) -> ErrorPolicy;

    /// Sends a command to the HD44780 controller.
    /// Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends data to the HD44780 controller.
    /// Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(0b00000001)
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(0b00000010)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> GpioResult<()> {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the interface width, the number of lines and the font.
    fn function_set(&mut self, eight_bit: bool, two_lines: bool, alt_font: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if eight_bit {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if alt_font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b01000000 | address;
        self.send_command(command)
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    /// Moves the cursor to the 1-based `row` and `column`.
    ///
    /// Rows outside 1..=4 and column 0 address nothing. Under [ErrorPolicy::Permissive]
    /// no command is sent and `Ok` is returned, under [ErrorPolicy::Strict] the call fails
    /// with `GpioError::InvalidArgument`. Columns past the visible width are not checked.
    fn set_cursor(&mut self, row: u8, column: u8) -> GpioResult<()> {
        let base = row
            .checked_sub(1)
            .and_then(|index| ROW_ADDRESSES.get(index as usize))
            .filter(|_| column >= 1);

        match base {
            Some(&base) => {
                let address = base.wrapping_add(column - 1) & 0b01111111;
                self.set_ddram_address(address)
            }
            None => match self.policy() {
                ErrorPolicy::Permissive => {
                    debug!("Ignoring cursor position ({}, {})", row, column);
                    Ok(())
                }
                ErrorPolicy::Strict => Err(GpioError::InvalidArgument),
            },
        }
    }

    /// Writes a single character at the given position.
    fn send_char_at(&mut self, row: u8, column: u8, data: u8) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy());
        seq.step(self.set_cursor(row, column))?;
        seq.step(self.send_data(data))?;
        seq.finish()
    }

    /// Writes the bytes of `text` up to the first NUL byte or the end of the slice.
    ///
    /// The text is not wrapped or truncated to the display width.
    fn send_string(&mut self, text: &[u8]) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy());
        for &byte in text.iter().take_while(|&&byte| byte != 0) {
            seq.step(self.send_data(byte))?;
        }
        seq.finish()
    }

    /// Moves the cursor and writes `text` like [HD44780Driver::send_string].
    fn send_string_at(&mut self, row: u8, column: u8, text: &[u8]) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy());
        seq.step(self.set_cursor(row, column))?;
        seq.step(self.send_string(text))?;
        seq.finish()
    }

    /// Writes an ASCII string. Non-ASCII characters are shown as `?`.
    fn print(&mut self, s: &str) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy());
        for c in s.chars() {
            if c.is_ascii() {
                seq.step(self.send_data(c as u8))?;
            } else {
                warn!("Non-ASCII character: {}", c);
                seq.step(self.send_data(b'?'))?;
            }
        }
        seq.finish()
    }

    /// Uploads `glyph` into CGRAM `slot` and shows it at the given position.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `slot` is 8 or more. Nothing is sent in that case.
    fn write_custom_char(&mut self, row: u8, column: u8, glyph: &Glyph, slot: u8) -> GpioResult<()> {
        if slot >= GLYPH_SLOTS {
            return Err(GpioError::InvalidArgument);
        }
        let mut seq = Sequence::new(self.policy());
        seq.step(self.set_cgram_address(slot * 8))?;
        for &line in glyph {
            seq.step(self.send_data(line))?;
        }
        seq.step(self.send_char_at(row, column, slot))?;
        seq.finish()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PinRef, Port};

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    enum Sent {
        Command(u8),
        Data(u8),
    }

    /// Records the raw transfers, optionally failing one of them.
    #[derive(Debug, Default)]
    struct Recorder {
        policy: ErrorPolicy,
        sent: Vec<Sent>,
        fail_at: Option<usize>,
    }

    impl Recorder {
        fn strict() -> Self {
            Recorder {
                policy: ErrorPolicy::Strict,
                ..Default::default()
            }
        }

        fn push(&mut self, sent: Sent) -> GpioResult<()> {
            let index = self.sent.len();
            self.sent.push(sent);
            if self.fail_at == Some(index) {
                return Err(GpioError::Transport(PinRef::new(Port::D, 0)));
            }
            Ok(())
        }
    }

    impl HD44780Driver for Recorder {
        fn init(&mut self) -> GpioResult<()> {
            Ok(())
        }

        fn policy(&self) -> ErrorPolicy {
            self.policy
        }

        fn send_command(&mut self, command: u8) -> GpioResult<()> {
            self.push(Sent::Command(command))
        }

        fn send_data(&mut self, data: u8) -> GpioResult<()> {
            self.push(Sent::Data(data))
        }
    }

    #[test]
    fn cursor_addresses_follow_row_bases() {
        for row in 1..=4u8 {
            for column in 1..=20u8 {
                let mut lcd = Recorder::default();
                lcd.send_char_at(row, column, b'x').unwrap();
                let expected = ROW_ADDRESSES[row as usize - 1] + (column - 1);
                assert_eq!(lcd.sent, vec![Sent::Command(expected), Sent::Data(b'x')]);
            }
        }
    }

    #[test]
    fn invalid_rows_are_dropped_when_permissive() {
        let mut lcd = Recorder::default();
        assert_eq!(lcd.set_cursor(5, 1), Ok(()));
        assert_eq!(lcd.set_cursor(0, 1), Ok(()));
        assert_eq!(lcd.set_cursor(1, 0), Ok(()));
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn invalid_rows_are_rejected_when_strict() {
        let mut lcd = Recorder::strict();
        assert_eq!(lcd.set_cursor(5, 1), Err(GpioError::InvalidArgument));
        assert_eq!(lcd.send_char_at(5, 1, b'x'), Err(GpioError::InvalidArgument));
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn strings_stop_at_nul() {
        let mut lcd = Recorder::default();
        lcd.send_string(b"ab\0cd").unwrap();
        assert_eq!(lcd.sent, vec![Sent::Data(b'a'), Sent::Data(b'b')]);

        let mut lcd = Recorder::default();
        lcd.send_string_at(2, 3, b"hi").unwrap();
        assert_eq!(
            lcd.sent,
            vec![Sent::Command(0xC2), Sent::Data(b'h'), Sent::Data(b'i')]
        );
    }

    #[test]
    fn print_replaces_non_ascii() {
        let mut lcd = Recorder::default();
        lcd.print("a°").unwrap();
        assert_eq!(lcd.sent, vec![Sent::Data(b'a'), Sent::Data(b'?')]);
    }

    #[test]
    fn custom_char_upload_sequence() {
        let glyph: Glyph = [0x00, 0x0A, 0x1F, 0x1F, 0x0E, 0x04, 0x00, 0x00];
        let mut lcd = Recorder::default();
        lcd.write_custom_char(1, 5, &glyph, 3).unwrap();

        let mut expected = vec![Sent::Command(0x40 + 3 * 8)];
        expected.extend(glyph.iter().map(|&line| Sent::Data(line)));
        expected.push(Sent::Command(0x84));
        expected.push(Sent::Data(3));
        assert_eq!(lcd.sent, expected);
    }

    #[test]
    fn custom_char_rejects_slot_8() {
        let mut lcd = Recorder::default();
        assert_eq!(
            lcd.write_custom_char(1, 1, &[0; 8], 8),
            Err(GpioError::InvalidArgument)
        );
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn policy_decides_how_far_a_string_gets() {
        let mut lcd = Recorder {
            fail_at: Some(1),
            ..Default::default()
        };
        // The failure of the second byte is masked by the success of the third
        assert_eq!(lcd.send_string(b"abc"), Ok(()));
        assert_eq!(lcd.sent.len(), 3);

        let mut lcd = Recorder {
            fail_at: Some(1),
            ..Recorder::strict()
        };
        assert!(lcd.send_string(b"abc").is_err());
        assert_eq!(lcd.sent.len(), 2);
    }

    #[test]
    fn command_encodings() {
        let mut lcd = Recorder::default();
        lcd.clear_display().unwrap();
        lcd.return_home().unwrap();
        lcd.set_entry_mode(CursorDirection::Right, false).unwrap();
        lcd.set_display_control(true, false, false).unwrap();
        lcd.function_set(false, true, false).unwrap();
        lcd.function_set(true, true, false).unwrap();
        lcd.cursor_shift(false, CursorDirection::Left).unwrap();
        assert_eq!(
            lcd.sent,
            [0x01, 0x02, 0x06, 0x0C, 0x28, 0x38, 0x10].map(Sent::Command).to_vec()
        );
        assert_eq!(lcd.set_ddram_address(0x80), Err(GpioError::InvalidArgument));
        assert_eq!(lcd.set_cgram_address(0x40), Err(GpioError::InvalidArgument));
    }
}
