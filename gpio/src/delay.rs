use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

/// Blocking delay capability used for bus timing and settle times.
///
/// Drivers only ever wait through this trait, so the protocol logic can run against a
/// simulated clock, see [crate::sim::SimClock].
pub trait Delay: Debug {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&self, us: u32);

    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// Delay backed by [std::thread::sleep].
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_us(&self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    #[ignore = "sleeps in real time"]
    fn std_delay_blocks() {
        let start = Instant::now();
        StdDelay.delay_us(500);
        StdDelay.delay_ms(2);
        assert!(start.elapsed() >= Duration::from_micros(2500));
    }
}
