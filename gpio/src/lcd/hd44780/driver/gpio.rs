use crate::delay::Delay;
use crate::lcd::hd44780::driver::{CursorDirection, HD44780Driver};
use crate::policy::{ErrorPolicy, Sequence};
use crate::{validate_pins, Direction, GpioResult, Logic, PinDriver, PinRef};
use log::{debug, trace};

/// The data lines of an HD44780 bus. Line `i` carries bit `i` of the nibble or byte.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum HD44780DataLines {
    Bus8Bit([PinRef; 8]),
    Bus4Bit([PinRef; 4]),
}

/// Pin mapping of an HD44780 display: register select, enable and the data lines.
///
/// Built once at configuration time and borrowed by the driver on every call.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HD44780Bus {
    rs: PinRef,
    en: PinRef,
    data: HD44780DataLines,
}

impl HD44780Bus {
    /// Creates a 4-bit bus descriptor.
    ///
    /// # Errors
    /// - `GpioError::OutOfRange` if a pin index is out of range.
    /// - `GpioError::AlreadyInUse` if a pin appears twice.
    pub fn new_4bit(rs: PinRef, en: PinRef, data: [PinRef; 4]) -> GpioResult<Self> {
        Self::create(rs, en, HD44780DataLines::Bus4Bit(data))
    }

    /// Creates an 8-bit bus descriptor. See [HD44780Bus::new_4bit] for the errors.
    pub fn new_8bit(rs: PinRef, en: PinRef, data: [PinRef; 8]) -> GpioResult<Self> {
        Self::create(rs, en, HD44780DataLines::Bus8Bit(data))
    }

    fn create(rs: PinRef, en: PinRef, data: HD44780DataLines) -> GpioResult<Self> {
        let bus = HD44780Bus { rs, en, data };
        validate_pins(&bus.pins().collect::<Vec<_>>())?;
        Ok(bus)
    }

    pub fn rs(&self) -> PinRef {
        self.rs
    }

    pub fn en(&self) -> PinRef {
        self.en
    }

    pub fn data(&self) -> &[PinRef] {
        match &self.data {
            HD44780DataLines::Bus8Bit(lines) => lines,
            HD44780DataLines::Bus4Bit(lines) => lines,
        }
    }

    pub fn is_8bit(&self) -> bool {
        matches!(self.data, HD44780DataLines::Bus8Bit(_))
    }

    pub fn is_4bit(&self) -> bool {
        matches!(self.data, HD44780DataLines::Bus4Bit(_))
    }

    /// Iterates over every pin of the bus: RS, E and then the data lines.
    pub fn pins(&self) -> impl Iterator<Item = PinRef> + '_ {
        [self.rs, self.en].into_iter().chain(self.data().iter().copied())
    }
}

/// GPIO implementation of [HD44780Driver], bit-banging the parallel bus through a [PinDriver].
///
/// Every transfer re-asserts the pin directions, sets RS, puts the value on the data lines
/// and strobes E high for 5 us. On a 4-bit bus the high nibble goes first.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    pins: &'a dyn PinDriver,
    delay: &'a dyn Delay,
    bus: &'a HD44780Bus,
    policy: ErrorPolicy,
}

impl<'a> GpioHD44780Driver<'a> {
    /// Minimum time E is held high.
    pub const ENABLE_PULSE_US: u32 = 5;
    /// Wait after supply stabilizes, before the first command.
    pub const POWER_ON_DELAY_MS: u32 = 20;
    /// Wait after the first synchronizing function set.
    pub const FIRST_SYNC_DELAY_MS: u32 = 5;
    /// Wait after the second synchronizing function set.
    pub const SECOND_SYNC_DELAY_US: u32 = 150;
    /// Execution time of clear display and return home.
    pub const LONG_COMMAND_DELAY_US: u32 = 1600;

    const FUNCTION_SET_8BIT_2LINE: u8 = 0b00111000;

    pub fn new(pins: &'a dyn PinDriver, delay: &'a dyn Delay, bus: &'a HD44780Bus) -> Self {
        GpioHD44780Driver {
            pins,
            delay,
            bus,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn bus(&self) -> &HD44780Bus {
        self.bus
    }

    fn pulse_e(&self, seq: &mut Sequence) -> GpioResult<()> {
        // Set E pin to high
        seq.step(self.pins.write_logic(self.bus.en(), Logic::High))?;
        self.delay.delay_us(Self::ENABLE_PULSE_US);
        // Set E pin to low
        seq.step(self.pins.write_logic(self.bus.en(), Logic::Low))?;
        Ok(())
    }

    fn write_lines(&self, seq: &mut Sequence, value: u8) -> GpioResult<()> {
        for (i, &pin) in self.bus.data().iter().enumerate() {
            seq.step(self.pins.write_logic(pin, Logic::from((value >> i) & 1 != 0)))?;
        }
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);
        let mut seq = Sequence::new(self.policy);

        for pin in self.bus.pins() {
            seq.step(self.pins.set_direction(pin, Direction::Output))?;
        }

        // Set RS pin
        seq.step(self.pins.write_logic(self.bus.rs(), Logic::from(rs)))?;

        // Write data to the data bus
        if self.bus.is_8bit() {
            self.write_lines(&mut seq, data)?;
            self.pulse_e(&mut seq)?;
        } else {
            let high_nibble = (data >> 4) & 0x0F;
            let low_nibble = data & 0x0F;

            trace!("Writing HN: {:04b}", high_nibble);
            self.write_lines(&mut seq, high_nibble)?;
            self.pulse_e(&mut seq)?;

            trace!("Writing LN: {:04b}", low_nibble);
            self.write_lines(&mut seq, low_nibble)?;
            self.pulse_e(&mut seq)?;
        }

        seq.finish()
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    fn init(&mut self) -> GpioResult<()> {
        debug!("Initializing HD44780 on {:?}", self.bus);
        let mut seq = Sequence::new(self.policy);

        for pin in self.bus.pins() {
            seq.step(self.pins.initialize(pin, Direction::Output, Logic::Low))?;
        }

        // Synchronize. The controller might be in either interface width, three 8-bit
        // function sets bring it to 8-bit mode from any state.
        self.delay.delay_ms(Self::POWER_ON_DELAY_MS);
        seq.step(self.send_command(Self::FUNCTION_SET_8BIT_2LINE))?;
        self.delay.delay_ms(Self::FIRST_SYNC_DELAY_MS);
        seq.step(self.send_command(Self::FUNCTION_SET_8BIT_2LINE))?;
        self.delay.delay_us(Self::SECOND_SYNC_DELAY_US);
        seq.step(self.send_command(Self::FUNCTION_SET_8BIT_2LINE))?;

        seq.step(self.clear_display())?;
        seq.step(self.return_home())?;
        seq.step(self.set_entry_mode(CursorDirection::Right, false))?;
        seq.step(self.set_display_control(true, false, false))?;
        seq.step(self.function_set(self.bus.is_8bit(), true, false))?;
        seq.step(self.set_ddram_address(0))?;

        let status = seq.finish();
        debug!("HD44780 initialized: {:?}", status);
        status
    }

    fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        let status = self.send(command, false);
        if command & 0b11111100 == 0 && command != 0 {
            self.delay.delay_us(Self::LONG_COMMAND_DELAY_US);
        }
        status
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}
