use crate::policy::{ErrorPolicy, Sequence};
use crate::{validate_pins, Direction, GpioResult, Logic, PinDriver, PinRef};
use log::debug;

/// A DC motor behind an H-bridge driven by two direction pins.
#[derive(Debug)]
pub struct DcMotor<'a> {
    pins: &'a dyn PinDriver,
    bridge: [PinRef; 2],
    initial: [Logic; 2],
    policy: ErrorPolicy,
}

impl<'a> DcMotor<'a> {
    /// Creates the driver with both pins starting low, the motor stopped.
    ///
    /// # Errors
    /// - `GpioError::OutOfRange` if a pin index is out of range.
    /// - `GpioError::AlreadyInUse` if both pins are the same.
    pub fn new(pins: &'a dyn PinDriver, bridge: [PinRef; 2]) -> GpioResult<Self> {
        validate_pins(&bridge)?;
        Ok(DcMotor {
            pins,
            bridge,
            initial: [Logic::Low; 2],
            policy: ErrorPolicy::default(),
        })
    }

    /// Sets the levels driven by [DcMotor::initialize].
    pub fn with_initial(mut self, initial: [Logic; 2]) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn drive(&self, levels: [Logic; 2]) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy);
        for (&pin, level) in self.bridge.iter().zip(levels) {
            seq.step(self.pins.write_logic(pin, level))?;
        }
        seq.finish()
    }

    pub fn initialize(&self) -> GpioResult<()> {
        let mut seq = Sequence::new(self.policy);
        for (&pin, level) in self.bridge.iter().zip(self.initial) {
            seq.step(self.pins.initialize(pin, Direction::Output, level))?;
        }
        seq.finish()
    }

    pub fn move_right(&self) -> GpioResult<()> {
        debug!("Motor on {:?} moving right", self.bridge);
        self.drive([Logic::High, Logic::Low])
    }

    pub fn move_left(&self) -> GpioResult<()> {
        debug!("Motor on {:?} moving left", self.bridge);
        self.drive([Logic::Low, Logic::High])
    }

    pub fn stop(&self) -> GpioResult<()> {
        debug!("Motor on {:?} stopped", self.bridge);
        self.drive([Logic::Low, Logic::Low])
    }
}
