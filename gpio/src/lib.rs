pub mod raw;
pub mod delay;
pub mod policy;
pub mod lcd;
pub mod keypad;
pub mod led;
pub mod relay;
pub mod button;
pub mod motor;
pub mod segment;
pub mod sim;

use bitvec::array::BitArray;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Not;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin {0} already in use")]
    AlreadyInUse(PinRef),
    #[error("invalid argument")]
    InvalidArgument,
    #[error("port index {0} is out of range")]
    InvalidPort(u8),
    #[error("pin {0} is out of range")]
    OutOfRange(PinRef),
    #[error("transport failure on pin {0}")]
    Transport(PinRef),
    #[error("error: {0}")]
    Other(String),
}

/// Coarse classification of a [GpioError].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The request was rejected before any register was touched.
    Configuration,
    /// A pin operation was attempted and reported as failed.
    Transport,
}

impl GpioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GpioError::Transport(_) => ErrorKind::Transport,
            _ => ErrorKind::Configuration,
        }
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// One of the five 8-bit I/O ports of the microcontroller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
}

impl Port {
    pub const COUNT: usize = 5;
    pub const ALL: [Port; Port::COUNT] = [Port::A, Port::B, Port::C, Port::D, Port::E];

    /// Gets the index of the port, usable for port-indexed register tables.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Port {
    type Error = GpioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Port::ALL
            .get(value as usize)
            .copied()
            .ok_or(GpioError::InvalidPort(value))
    }
}

impl TryFrom<char> for Port {
    type Error = GpioError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            c @ 'A'..='E' => Port::try_from(c as u8 - b'A'),
            _ => Err(GpioError::Other(format!("unknown port {:?}", value))),
        }
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let c = (b'A' + *self as u8) as char;
        write!(f, "{}", c)
    }
}

/// Addresses a single physical pin by port and pin index.
///
/// The pin index is not checked on construction so descriptors can be built in `const`
/// context; every [PinDriver] call validates it with [PinRef::validate] instead.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PinRef {
    port: Port,
    pin: u8,
}

impl PinRef {
    /// Number of pins on each port.
    pub const PIN_COUNT: u8 = 8;

    pub const fn new(port: Port, pin: u8) -> Self {
        PinRef { port, pin }
    }

    pub const fn port(&self) -> Port {
        self.port
    }

    pub const fn pin(&self) -> u8 {
        self.pin
    }

    /// Checks that the pin index is within the port.
    ///
    /// # Errors
    /// - `GpioError::OutOfRange` if the pin index is 8 or more.
    pub fn validate(&self) -> GpioResult<()> {
        if self.pin >= Self::PIN_COUNT {
            return Err(GpioError::OutOfRange(*self));
        }
        Ok(())
    }

    /// Gets the single-bit register mask of the pin. Only meaningful after [PinRef::validate].
    pub(crate) fn mask(&self) -> u8 {
        1 << self.pin
    }

    fn flat_index(&self) -> usize {
        self.port.index() * Self::PIN_COUNT as usize + self.pin as usize
    }
}

impl Display for PinRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}{}", self.port, self.pin)
    }
}

impl FromStr for PinRef {
    type Err = GpioError;

    /// Parses pins written like `B3` or `RB3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(['R', 'r']).filter(|rest| rest.len() >= 2).unwrap_or(s);
        let mut chars = s.chars();
        let port = chars
            .next()
            .ok_or_else(|| GpioError::Other("parsing pin failed: empty string".to_string()))?;
        let port = Port::try_from(port)?;
        let pin: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| GpioError::Other(format!("parsing pin index of {:?} failed", s)))?;
        let pin = PinRef::new(port, pin);
        pin.validate()?;
        Ok(pin)
    }
}

/// Checks that every pin is in range and that no pin is used twice.
///
/// Used by the descriptors, which each own their pins exclusively.
pub fn validate_pins(pins: &[PinRef]) -> GpioResult<()> {
    let mut used: BitArray<[u8; Port::COUNT]> = BitArray::ZERO;
    for pin in pins {
        pin.validate()?;
        let index = pin.flat_index();
        if used[index] {
            return Err(GpioError::AlreadyInUse(*pin));
        }
        used.set(index, true);
    }
    Ok(())
}

/// Specifies the direction of a GPIO pin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    Output,
    /// Pins come out of reset as inputs.
    #[default]
    Input,
}

/// Specifies the logic level of a GPIO pin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Logic {
    #[default]
    Low,
    High,
}

impl Logic {
    pub fn is_high(self) -> bool {
        self == Logic::High
    }

    pub fn is_low(self) -> bool {
        self == Logic::Low
    }
}

impl From<bool> for Logic {
    fn from(value: bool) -> Self {
        if value { Logic::High } else { Logic::Low }
    }
}

impl Not for Logic {
    type Output = Logic;

    fn not(self) -> Self::Output {
        match self {
            Logic::Low => Logic::High,
            Logic::High => Logic::Low,
        }
    }
}

/// The pin abstraction every driver in this crate is built on.
///
/// Pin operations validate the [PinRef] first and return a configuration error without
/// touching any register when it is out of range. Port operations take a [Port], which is
/// always in range.
pub trait PinDriver: Debug {
    /// Sets the pin direction.
    fn set_direction(&self, pin: PinRef, direction: Direction) -> GpioResult<()>;

    /// Gets the currently configured pin direction.
    fn direction(&self, pin: PinRef) -> GpioResult<Direction>;

    /// Writes the output latch of the pin.
    fn write_logic(&self, pin: PinRef, level: Logic) -> GpioResult<()>;

    /// Reads the level of the pin. Output pins read back their latch.
    fn read_logic(&self, pin: PinRef) -> GpioResult<Logic>;

    /// Inverts the output latch of the pin.
    fn toggle_logic(&self, pin: PinRef) -> GpioResult<()>;

    /// Sets the direction and then the initial level of the pin.
    fn initialize(&self, pin: PinRef, direction: Direction, level: Logic) -> GpioResult<()> {
        self.set_direction(pin, direction)?;
        self.write_logic(pin, level)
    }

    /// Sets the direction of the whole port. A set bit makes the pin an input.
    fn set_port_direction(&self, port: Port, mask: u8) -> GpioResult<()>;

    /// Gets the direction mask of the whole port. A set bit means the pin is an input.
    fn port_direction(&self, port: Port) -> GpioResult<u8>;

    /// Writes the output latch of the whole port.
    fn write_port(&self, port: Port, value: u8) -> GpioResult<()>;

    /// Reads the levels of the whole port.
    fn read_port(&self, port: Port) -> GpioResult<u8>;

    /// Inverts the output latch of the whole port.
    fn toggle_port(&self, port: Port) -> GpioResult<()>;
}
