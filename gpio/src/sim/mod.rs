//! Simulated board: the register file, a simulated clock and models of the peripherals
//! wired to it.
//!
//! [SimBoard] implements both [PinDriver] and [Delay], so every driver of this crate can run
//! against it unchanged.

mod clock;
mod lcd;
mod matrix;

pub use clock::*;
pub use lcd::*;
pub use matrix::*;

use crate::delay::Delay;
use crate::keypad::KeypadDescriptor;
use crate::lcd::hd44780::driver::HD44780Bus;
use crate::raw::RegisterFile;
use crate::{Direction, GpioError, GpioResult, Logic, PinDriver, PinRef, Port};
use log::{trace, warn};
use std::cell::{Cell, Ref, RefCell, RefMut};

#[derive(Debug, Default)]
pub struct SimBoard {
    registers: RegisterFile,
    clock: SimClock,
    lcd: RefCell<Option<Hd44780Sim>>,
    keypad: RefCell<Option<MatrixSim>>,
    fault: Cell<Option<PinRef>>,
}

impl SimBoard {
    pub fn new() -> Self {
        SimBoard::default()
    }

    /// Attaches an HD44780 display to the pins of `bus`.
    pub fn with_lcd(self, bus: &HD44780Bus) -> Self {
        self.lcd.replace(Some(Hd44780Sim::new(bus)));
        self
    }

    /// Attaches a key matrix to the pins of `descriptor`.
    pub fn with_keypad(self, descriptor: &KeypadDescriptor) -> Self {
        self.keypad.replace(Some(MatrixSim::new(descriptor)));
        self
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn lcd(&self) -> Option<Ref<'_, Hd44780Sim>> {
        Ref::filter_map(self.lcd.borrow(), Option::as_ref).ok()
    }

    pub fn lcd_mut(&self) -> Option<RefMut<'_, Hd44780Sim>> {
        RefMut::filter_map(self.lcd.borrow_mut(), Option::as_mut).ok()
    }

    pub fn keypad(&self) -> Option<Ref<'_, MatrixSim>> {
        Ref::filter_map(self.keypad.borrow(), Option::as_ref).ok()
    }

    pub fn press_key(&self, row: usize, column: usize) {
        if let Some(keypad) = self.keypad.borrow_mut().as_mut() {
            keypad.press(row, column);
        }
    }

    pub fn release_key(&self, row: usize, column: usize) {
        if let Some(keypad) = self.keypad.borrow_mut().as_mut() {
            keypad.release(row, column);
        }
    }

    pub fn release_all_keys(&self) {
        if let Some(keypad) = self.keypad.borrow_mut().as_mut() {
            keypad.release_all();
        }
    }

    /// Drives a level onto an input pin from outside, as a button or sensor would.
    pub fn set_input_level(&self, pin: PinRef, level: Logic) -> GpioResult<()> {
        self.registers.set_input_level(pin, level)?;
        self.changed();
        Ok(())
    }

    /// Makes every operation on `pin` fail with `GpioError::Transport`, or clears the fault
    /// with `None`.
    pub fn inject_fault(&self, pin: Option<PinRef>) {
        self.fault.set(pin);
    }

    fn check(&self, pin: PinRef) -> GpioResult<()> {
        pin.validate()?;
        if self.fault.get() == Some(pin) {
            trace!("Injected fault on {}", pin);
            return Err(GpioError::Transport(pin));
        }
        Ok(())
    }

    fn changed(&self) {
        match self.lcd.try_borrow_mut() {
            Ok(mut lcd) => {
                if let Some(lcd) = lcd.as_mut() {
                    lcd.observe(&self.registers, self.clock.now_us());
                }
            }
            Err(_) => warn!("LCD model is borrowed, pin change not observed"),
        }
    }

    fn refresh_inputs(&self) -> GpioResult<()> {
        match self.keypad.try_borrow() {
            Ok(keypad) => match keypad.as_ref() {
                Some(keypad) => keypad.drive(&self.registers),
                None => Ok(()),
            },
            Err(_) => {
                warn!("Key matrix is borrowed, inputs not refreshed");
                Ok(())
            }
        }
    }
}

impl PinDriver for SimBoard {
    fn set_direction(&self, pin: PinRef, direction: Direction) -> GpioResult<()> {
        self.check(pin)?;
        self.registers.set_direction(pin, direction)?;
        self.changed();
        Ok(())
    }

    fn direction(&self, pin: PinRef) -> GpioResult<Direction> {
        self.check(pin)?;
        self.registers.direction(pin)
    }

    fn write_logic(&self, pin: PinRef, level: Logic) -> GpioResult<()> {
        self.check(pin)?;
        self.registers.write_logic(pin, level)?;
        self.changed();
        Ok(())
    }

    fn read_logic(&self, pin: PinRef) -> GpioResult<Logic> {
        self.check(pin)?;
        self.refresh_inputs()?;
        self.registers.read_logic(pin)
    }

    fn toggle_logic(&self, pin: PinRef) -> GpioResult<()> {
        self.check(pin)?;
        self.registers.toggle_logic(pin)?;
        self.changed();
        Ok(())
    }

    fn set_port_direction(&self, port: Port, mask: u8) -> GpioResult<()> {
        self.registers.set_port_direction(port, mask)?;
        self.changed();
        Ok(())
    }

    fn port_direction(&self, port: Port) -> GpioResult<u8> {
        self.registers.port_direction(port)
    }

    fn write_port(&self, port: Port, value: u8) -> GpioResult<()> {
        self.registers.write_port(port, value)?;
        self.changed();
        Ok(())
    }

    fn read_port(&self, port: Port) -> GpioResult<u8> {
        self.refresh_inputs()?;
        self.registers.read_port(port)
    }

    fn toggle_port(&self, port: Port) -> GpioResult<()> {
        self.registers.toggle_port(port)?;
        self.changed();
        Ok(())
    }
}

impl Delay for SimBoard {
    fn delay_us(&self, us: u32) {
        self.clock.delay_us(us);
    }
}
