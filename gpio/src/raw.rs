use crate::{Direction, GpioResult, Logic, PinDriver, PinRef, Port};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// Register-level model of the five GPIO ports.
///
/// Every port has three 8-bit registers, indexed by [Port]:
/// - `TRIS`: data direction, a set bit makes the pin an input. Resets to `0xFF`.
/// - `LAT`: output latch, written by the output operations.
/// - `PORT`: the levels driven onto the pins from outside, visible on input pins only.
///
/// Reading an output pin returns its latch, reading an input pin returns the external level.
pub struct RegisterFile {
    tris: [AtomicU8; Port::COUNT],
    lat: [AtomicU8; Port::COUNT],
    external: [AtomicU8; Port::COUNT],
}

impl RegisterFile {
    const TRIS_RESET: u8 = 0xFF;

    pub fn new() -> Self {
        RegisterFile {
            tris: std::array::from_fn(|_| AtomicU8::new(Self::TRIS_RESET)),
            lat: std::array::from_fn(|_| AtomicU8::new(0)),
            external: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }

    /// Reads the raw `TRIS` register of the port.
    pub fn raw_tris(&self, port: Port) -> u8 {
        self.tris[port.index()].load(Ordering::Relaxed)
    }

    /// Reads the raw `LAT` register of the port.
    pub fn raw_lat(&self, port: Port) -> u8 {
        self.lat[port.index()].load(Ordering::Relaxed)
    }

    /// Computes the levels seen on the port pins.
    pub fn raw_port(&self, port: Port) -> u8 {
        let tris = self.raw_tris(port);
        let lat = self.raw_lat(port);
        let external = self.external[port.index()].load(Ordering::Relaxed);
        (lat & !tris) | (external & tris)
    }

    /// Drives a level onto the pin from outside the microcontroller.
    ///
    /// Only observable while the pin is configured as an input.
    pub fn set_input_level(&self, pin: PinRef, level: Logic) -> GpioResult<()> {
        pin.validate()?;
        Self::raw_write_bit(&self.external[pin.port().index()], pin.mask(), level.is_high());
        Ok(())
    }

    fn raw_write_bit(register: &AtomicU8, mask: u8, set: bool) {
        if set {
            register.fetch_or(mask, Ordering::Relaxed);
        } else {
            register.fetch_and(!mask, Ordering::Relaxed);
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RegisterFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tris = Port::ALL.map(|port| self.raw_tris(port));
        let lat = Port::ALL.map(|port| self.raw_lat(port));
        write!(f, "RegisterFile(TRIS={:02X?}, LAT={:02X?})", tris, lat)
    }
}

impl PinDriver for RegisterFile {
    fn set_direction(&self, pin: PinRef, direction: Direction) -> GpioResult<()> {
        pin.validate()?;
        let input = direction == Direction::Input;
        Self::raw_write_bit(&self.tris[pin.port().index()], pin.mask(), input);
        Ok(())
    }

    fn direction(&self, pin: PinRef) -> GpioResult<Direction> {
        pin.validate()?;
        if self.raw_tris(pin.port()) & pin.mask() != 0 {
            Ok(Direction::Input)
        } else {
            Ok(Direction::Output)
        }
    }

    fn write_logic(&self, pin: PinRef, level: Logic) -> GpioResult<()> {
        pin.validate()?;
        Self::raw_write_bit(&self.lat[pin.port().index()], pin.mask(), level.is_high());
        Ok(())
    }

    fn read_logic(&self, pin: PinRef) -> GpioResult<Logic> {
        pin.validate()?;
        Ok(Logic::from(self.raw_port(pin.port()) & pin.mask() != 0))
    }

    fn toggle_logic(&self, pin: PinRef) -> GpioResult<()> {
        pin.validate()?;
        self.lat[pin.port().index()].fetch_xor(pin.mask(), Ordering::Relaxed);
        Ok(())
    }

    fn set_port_direction(&self, port: Port, mask: u8) -> GpioResult<()> {
        self.tris[port.index()].store(mask, Ordering::Relaxed);
        Ok(())
    }

    fn port_direction(&self, port: Port) -> GpioResult<u8> {
        Ok(self.raw_tris(port))
    }

    fn write_port(&self, port: Port, value: u8) -> GpioResult<()> {
        self.lat[port.index()].store(value, Ordering::Relaxed);
        Ok(())
    }

    fn read_port(&self, port: Port) -> GpioResult<u8> {
        Ok(self.raw_port(port))
    }

    fn toggle_port(&self, port: Port) -> GpioResult<()> {
        self.lat[port.index()].fetch_xor(0xFF, Ordering::Relaxed);
        Ok(())
    }
}
