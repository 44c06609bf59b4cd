//! Error aggregation for multi-step pin sequences.

use crate::GpioResult;
use log::warn;

/// Decides what happens when one step of a multi-step sequence fails.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Every step runs and the sequence reports the status of its last step, so an earlier
    /// failure can be masked by a later success. Compatible with the classic status-code drivers.
    #[default]
    Permissive,
    /// The first failing step aborts the sequence and its error is returned.
    Strict,
}

/// Tracks the status of a running sequence according to an [ErrorPolicy].
///
/// Wrap each step with [Sequence::step] and propagate with `?`. Under [ErrorPolicy::Strict]
/// the step's error comes straight back, under [ErrorPolicy::Permissive] it is recorded and
/// the sequence keeps going. [Sequence::finish] gives the final status.
///
/// ```
/// use picboard_gpio::policy::{ErrorPolicy, Sequence};
/// use picboard_gpio::{GpioError, GpioResult};
///
/// fn run(policy: ErrorPolicy) -> GpioResult<()> {
///     let mut seq = Sequence::new(policy);
///     seq.step(Err(GpioError::InvalidArgument))?;
///     seq.step(Ok(()))?;
///     seq.finish()
/// }
///
/// assert_eq!(run(ErrorPolicy::Strict), Err(GpioError::InvalidArgument));
/// assert_eq!(run(ErrorPolicy::Permissive), Ok(()));
/// ```
#[derive(Debug)]
#[must_use]
pub struct Sequence {
    policy: ErrorPolicy,
    status: GpioResult<()>,
}

impl Sequence {
    pub fn new(policy: ErrorPolicy) -> Self {
        Sequence {
            policy,
            status: Ok(()),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Records the result of one step.
    pub fn step(&mut self, result: GpioResult<()>) -> GpioResult<()> {
        match self.policy {
            ErrorPolicy::Strict => result,
            ErrorPolicy::Permissive => {
                if let (Err(previous), Ok(())) = (&self.status, &result) {
                    warn!("Step failure masked by a later step: {}", previous);
                }
                self.status = result;
                Ok(())
            }
        }
    }

    /// Records the result of a step that produces a value.
    ///
    /// Under [ErrorPolicy::Permissive] a failed step yields `fallback`.
    pub fn step_value<T>(&mut self, result: GpioResult<T>, fallback: T) -> GpioResult<T> {
        match result {
            Ok(value) => {
                self.step(Ok(()))?;
                Ok(value)
            }
            Err(err) => {
                self.step(Err(err))?;
                Ok(fallback)
            }
        }
    }

    /// Ends the sequence, returning its status.
    pub fn finish(self) -> GpioResult<()> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpioError, PinRef, Port};

    fn failure() -> GpioError {
        GpioError::Transport(PinRef::new(Port::C, 1))
    }

    #[test]
    fn strict_returns_first_failure() {
        let mut seq = Sequence::new(ErrorPolicy::Strict);
        assert_eq!(seq.step(Ok(())), Ok(()));
        assert_eq!(seq.step(Err(failure())), Err(failure()));
    }

    #[test]
    fn permissive_reports_last_step() {
        let mut seq = Sequence::new(ErrorPolicy::Permissive);
        assert_eq!(seq.step(Err(failure())), Ok(()));
        assert_eq!(seq.step(Ok(())), Ok(()));
        assert_eq!(seq.finish(), Ok(()));

        let mut seq = Sequence::new(ErrorPolicy::Permissive);
        seq.step(Ok(())).unwrap();
        seq.step(Err(failure())).unwrap();
        assert_eq!(seq.finish(), Err(failure()));
    }

    #[test]
    fn values_fall_back_when_permissive() {
        let mut seq = Sequence::new(ErrorPolicy::Permissive);
        assert_eq!(seq.step_value(Err(failure()), 7), Ok(7));
        assert_eq!(seq.finish(), Err(failure()));

        let mut seq = Sequence::new(ErrorPolicy::Strict);
        assert_eq!(seq.step_value::<u8>(Err(failure()), 7), Err(failure()));
        assert_eq!(seq.step_value(Ok(3), 7), Ok(3));
    }
}
