// Motion primitives for the two-wheeled base
//
// Every primitive is a blocking action: command the motors, wait the
// calibrated time, return. Nothing here catches or retries; errors go
// straight up to the session.

use std::time::Duration;

use tracing::debug;

use super::calibration::Calibration;
use super::dc_motor::Motor;
use crate::clock::{Clock, Interrupted};
use crate::pwm::{PwmError, PwmOutput};

/// Rotation sense for turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Ccw,
    Cw,
}

impl Spin {
    /// Motor direction flag: both wheels spin the same way, true for CCW
    pub fn motor_direction(self) -> bool {
        matches!(self, Spin::Ccw)
    }
}

impl From<bool> for Spin {
    fn from(ccw: bool) -> Self {
        if ccw { Spin::Ccw } else { Spin::Cw }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Forward,
    Backward,
}

impl From<bool> for Travel {
    fn from(forward: bool) -> Self {
        if forward {
            Travel::Forward
        } else {
            Travel::Backward
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("PWM write failed: {0}")]
    Pwm(#[from] PwmError),

    #[error("Motion {0}")]
    Interrupted(#[from] Interrupted),

    #[error("A polygon needs at least one side")]
    NoSides,

    #[error("Side length must be a finite, non-negative number of meters, got {0}")]
    InvalidSideLength(f64),
}

/// The pair of drive motors plus what is needed to time their motion
pub struct DiffDrive<'a, O, C>
where
    O: PwmOutput + ?Sized,
    C: Clock + ?Sized,
{
    io: &'a mut O,
    clock: &'a mut C,
    right: Motor,
    left: Motor,
    calibration: &'a Calibration,
}

impl<'a, O, C> DiffDrive<'a, O, C>
where
    O: PwmOutput + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(
        io: &'a mut O,
        clock: &'a mut C,
        right: Motor,
        left: Motor,
        calibration: &'a Calibration,
    ) -> Self {
        Self {
            io,
            clock,
            right,
            left,
            calibration,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        self.calibration
    }

    /// Zero both legs of both motors
    pub fn stop(&mut self) -> Result<(), MotionError> {
        debug!("stop");
        self.right.drive(&mut *self.io, 0, true)?;
        self.left.drive(&mut *self.io, 0, true)?;
        Ok(())
    }

    /// Rotate about the wheelbase center by `angle_deg`
    ///
    /// Returns with the motors still running; the caller stops them (or the
    /// next command overrides).
    pub fn turn(&mut self, angle_deg: f64, spin: Spin) -> Result<(), MotionError> {
        let duration = self.calibration.turn_duration(angle_deg);
        let speed = self.calibration.turn_speed;
        let direction = spin.motor_direction();
        debug!(
            "turn {:.1} deg {:?}: speed={}, duration={:?}",
            angle_deg, spin, speed, duration
        );

        self.right.drive(&mut *self.io, speed, direction)?;
        self.left.drive(&mut *self.io, speed, direction)?;
        self.clock.sleep(duration)?;
        Ok(())
    }

    /// Drive straight for `duration`, then stop
    pub fn drive_straight(
        &mut self,
        travel: Travel,
        duration: Duration,
    ) -> Result<(), MotionError> {
        let profile = self.calibration.straight_profile(travel);
        debug!(
            "drive {:?} for {:?}: right={:?}, left={:?}",
            travel, duration, profile.right, profile.left
        );

        self.right
            .drive(&mut *self.io, profile.right.speed, profile.right.direction)?;
        self.left
            .drive(&mut *self.io, profile.left.speed, profile.left.direction)?;
        self.clock.sleep(duration)?;
        self.stop()
    }
}
