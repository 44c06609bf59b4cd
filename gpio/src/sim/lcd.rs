use crate::lcd::hd44780::driver::{Glyph, HD44780Bus};
use crate::raw::RegisterFile;
use crate::PinRef;
use log::trace;
use std::fmt::{Debug, Formatter};

/// One falling edge of the E line, as seen by the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Strobe {
    /// Level of RS when E fell.
    pub rs: bool,
    /// Levels of the data lines when E fell, line `i` in bit `i`.
    pub lines: u8,
    /// How long E was held high.
    pub high_us: u64,
    /// Time of the falling edge.
    pub at_us: u64,
}

/// A complete byte received by the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transfer {
    Command(u8),
    Data(u8),
}

/// Behavioral model of an HD44780 controller attached to an [HD44780Bus].
///
/// The model samples RS and the data lines on every falling edge of E. On a 4-bit bus the
/// data lines are wired to DB4..DB7 and DB0..DB3 read as low. Like the real controller it
/// powers up in 8-bit interface mode, so a 4-bit bus only works after the initialization
/// sequence switched the interface width.
pub struct Hd44780Sim {
    bus: HD44780Bus,

    eight_bit: bool,
    two_lines: bool,
    alt_font: bool,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    increment: bool,
    entry_shift: bool,
    display_offset: u8,

    ddram: [u8; Self::DDRAM_SIZE],
    cgram: [u8; Self::CGRAM_SIZE],
    address: u8,
    cgram_selected: bool,
    pending_nibble: Option<u8>,

    enable: bool,
    enable_rose_us: u64,
    strobes: Vec<Strobe>,
    transfers: Vec<Transfer>,
}

impl Hd44780Sim {
    const DDRAM_SIZE: usize = 128;
    const CGRAM_SIZE: usize = 64;
    /// DDRAM offset of the first cell of each row.
    const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];
    /// Length of a display line in DDRAM, used for display shifts.
    const LINE_LENGTH: u8 = 40;

    pub fn new(bus: &HD44780Bus) -> Self {
        Hd44780Sim {
            bus: bus.clone(),
            eight_bit: true,
            two_lines: false,
            alt_font: false,
            display_on: false,
            cursor_on: false,
            blink_on: false,
            increment: true,
            entry_shift: false,
            display_offset: 0,
            ddram: [b' '; Self::DDRAM_SIZE],
            cgram: [0; Self::CGRAM_SIZE],
            address: 0,
            cgram_selected: false,
            pending_nibble: None,
            enable: false,
            enable_rose_us: 0,
            strobes: Vec::new(),
            transfers: Vec::new(),
        }
    }

    /// Samples the bus lines from the register file. Called after every pin change.
    pub fn observe(&mut self, registers: &RegisterFile, now_us: u64) {
        let level = |pin: PinRef| registers.raw_port(pin.port()) & pin.mask() != 0;

        let enable = level(self.bus.en());
        match (self.enable, enable) {
            (false, true) => self.enable_rose_us = now_us,
            (true, false) => {
                let rs = level(self.bus.rs());
                let lines = self
                    .bus
                    .data()
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &pin)| acc | (level(pin) as u8) << i);
                let strobe = Strobe {
                    rs,
                    lines,
                    high_us: now_us - self.enable_rose_us,
                    at_us: now_us,
                };
                self.latch(strobe);
            }
            _ => {}
        }
        self.enable = enable;
    }

    fn latch(&mut self, strobe: Strobe) {
        trace!("LCD strobe: {:?}", strobe);
        self.strobes.push(strobe);

        let wire = if self.bus.is_8bit() { strobe.lines } else { strobe.lines << 4 };
        if self.eight_bit {
            self.accept(strobe.rs, wire);
        } else {
            match self.pending_nibble.take() {
                None => self.pending_nibble = Some(wire & 0xF0),
                Some(high) => self.accept(strobe.rs, high | (wire >> 4)),
            }
        }
    }

    fn accept(&mut self, rs: bool, byte: u8) {
        if rs {
            self.transfers.push(Transfer::Data(byte));
            self.write_data(byte);
        } else {
            self.transfers.push(Transfer::Command(byte));
            self.execute(byte);
        }
    }

    fn write_data(&mut self, byte: u8) {
        if self.cgram_selected {
            self.cgram[(self.address & 0x3F) as usize] = byte;
        } else {
            self.ddram[(self.address & 0x7F) as usize] = byte;
            if self.entry_shift {
                self.shift_display(self.increment);
            }
        }
        self.move_address(self.increment);
    }

    fn move_address(&mut self, forward: bool) {
        let mask = if self.cgram_selected { 0x3F } else { 0x7F };
        let address = if forward {
            self.address.wrapping_add(1)
        } else {
            self.address.wrapping_sub(1)
        };
        self.address = address & mask;
    }

    fn shift_display(&mut self, left: bool) {
        self.display_offset = if left {
            (self.display_offset + 1) % Self::LINE_LENGTH
        } else {
            (self.display_offset + Self::LINE_LENGTH - 1) % Self::LINE_LENGTH
        };
    }

    fn execute(&mut self, command: u8) {
        if command & 0x80 != 0 {
            self.address = command & 0x7F;
            self.cgram_selected = false;
        } else if command & 0x40 != 0 {
            self.address = command & 0x3F;
            self.cgram_selected = true;
        } else if command & 0x20 != 0 {
            let eight_bit = command & 0x10 != 0;
            if eight_bit != self.eight_bit {
                self.pending_nibble = None;
            }
            self.eight_bit = eight_bit;
            self.two_lines = command & 0x08 != 0;
            self.alt_font = command & 0x04 != 0;
        } else if command & 0x10 != 0 {
            let right = command & 0x04 != 0;
            if command & 0x08 != 0 {
                self.shift_display(!right);
            } else {
                self.move_address(right);
            }
        } else if command & 0x08 != 0 {
            self.display_on = command & 0x04 != 0;
            self.cursor_on = command & 0x02 != 0;
            self.blink_on = command & 0x01 != 0;
        } else if command & 0x04 != 0 {
            self.increment = command & 0x02 != 0;
            self.entry_shift = command & 0x01 != 0;
        } else if command & 0x02 != 0 {
            self.address = 0;
            self.cgram_selected = false;
            self.display_offset = 0;
        } else if command == 0x01 {
            self.ddram.fill(b' ');
            self.address = 0;
            self.cgram_selected = false;
            self.increment = true;
            self.display_offset = 0;
        }
    }

    pub fn is_8bit(&self) -> bool {
        self.eight_bit
    }

    pub fn is_two_lines(&self) -> bool {
        self.two_lines
    }

    pub fn is_alt_font(&self) -> bool {
        self.alt_font
    }

    pub fn is_display_on(&self) -> bool {
        self.display_on
    }

    pub fn is_cursor_on(&self) -> bool {
        self.cursor_on
    }

    pub fn is_blink_on(&self) -> bool {
        self.blink_on
    }

    pub fn is_incrementing(&self) -> bool {
        self.increment
    }

    pub fn display_offset(&self) -> u8 {
        self.display_offset
    }

    pub fn address_counter(&self) -> u8 {
        self.address
    }

    pub fn is_ddram_selected(&self) -> bool {
        !self.cgram_selected
    }

    /// Gets every strobe since creation or the last [Hd44780Sim::clear_log].
    pub fn strobes(&self) -> &[Strobe] {
        &self.strobes
    }

    /// Gets every complete byte since creation or the last [Hd44780Sim::clear_log].
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn clear_log(&mut self) {
        self.strobes.clear();
        self.transfers.clear();
    }

    fn cell_index(row: u8, column: u8) -> usize {
        let offset = Self::ROW_OFFSETS[row as usize - 1];
        (offset.wrapping_add(column.wrapping_sub(1)) & 0x7F) as usize
    }

    /// Gets the character code stored for the 1-based `row` and `column`.
    ///
    /// # Panics
    /// If `row` is not in 1..=4.
    pub fn char_at(&self, row: u8, column: u8) -> u8 {
        self.ddram[Self::cell_index(row, column)]
    }

    /// Gets the glyph shown at the position, if it holds a CGRAM character code.
    ///
    /// # Panics
    /// If `row` is not in 1..=4.
    pub fn glyph_at(&self, row: u8, column: u8) -> Option<Glyph> {
        let code = self.char_at(row, column);
        if code >= 0x10 {
            return None;
        }
        let start = (code & 0x07) as usize * 8;
        let mut glyph = Glyph::default();
        glyph.copy_from_slice(&self.cgram[start..start + 8]);
        Some(glyph)
    }

    /// Gets `width` characters of a row, starting at column 1.
    ///
    /// # Panics
    /// If `row` is not in 1..=4.
    pub fn row_text(&self, row: u8, width: u8) -> String {
        (1..=width)
            .map(|column| self.char_at(row, column) as char)
            .collect()
    }
}

impl Debug for Hd44780Sim {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hd44780Sim")
            .field("eight_bit", &self.eight_bit)
            .field("two_lines", &self.two_lines)
            .field("display_on", &self.display_on)
            .field("address", &self.address)
            .field("cgram_selected", &self.cgram_selected)
            .field("strobes", &self.strobes.len())
            .finish()
    }
}
