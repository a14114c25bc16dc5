// DC motor driven by a differential pair of PWM outputs
//
// Energising one leg while the other is held at 0 spins the motor one way,
// swapping the legs spins it the other way.

use crate::pwm::{Gpio, PwmError, PwmOutput};

/// One physical DC motor. Holds only its pin assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motor {
    leg_a: Gpio,
    leg_b: Gpio,
}

impl Motor {
    pub const fn new(leg_a: Gpio, leg_b: Gpio) -> Self {
        Self { leg_a, leg_b }
    }

    /// Drive the motor at `speed` (raw duty cycle)
    ///
    /// `direction == true` energises leg A, `false` energises leg B. The
    /// inactive leg is zeroed before the active leg is set, so both legs are
    /// never high at once. `speed` is passed through unchecked.
    pub fn drive<O>(&self, io: &mut O, speed: u32, direction: bool) -> Result<(), PwmError>
    where
        O: PwmOutput + ?Sized,
    {
        let (active, inactive) = if direction {
            (self.leg_a, self.leg_b)
        } else {
            (self.leg_b, self.leg_a)
        };

        io.set_duty_cycle(inactive, 0)?;
        io.set_duty_cycle(active, speed)
    }
}
