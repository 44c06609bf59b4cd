use crate::delay::Delay;
use std::cell::Cell;

/// Simulated monotonic clock counting microseconds.
///
/// Time only moves when a driver waits through [Delay], so timing constraints can be checked
/// without sleeping.
#[derive(Debug, Default)]
pub struct SimClock {
    now_us: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        SimClock::default()
    }

    /// Gets the number of microseconds elapsed since the clock was created.
    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    /// Moves the clock forward.
    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get().saturating_add(us));
    }
}

impl Delay for SimClock {
    fn delay_us(&self, us: u32) {
        self.advance_us(us as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_advance_the_clock() {
        let clock = SimClock::new();
        clock.delay_us(150);
        clock.delay_ms(20);
        assert_eq!(clock.now_us(), 20_150);

        clock.delay_ms(u32::MAX);
        assert_eq!(clock.now_us(), 20_150 + u32::MAX as u64);
    }
}
