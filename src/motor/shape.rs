// Closed polygon paths built from the motion primitives

use tracing::info;

use super::drive::{DiffDrive, MotionError, Spin, Travel};
use crate::clock::Clock;
use crate::pwm::PwmOutput;

/// Regular polygon to drive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonPlan {
    pub sides: u32,
    pub spin: Spin,
    /// Length of each side in meters
    pub side_length_m: f64,
}

impl PolygonPlan {
    /// Polygon with 1 m sides
    pub fn new(sides: u32, spin: Spin) -> Self {
        Self {
            sides,
            spin,
            side_length_m: 1.0,
        }
    }

    /// Exterior angle turned at each vertex
    pub fn turn_angle(&self) -> f64 {
        360.0 / self.sides as f64
    }
}

impl Default for PolygonPlan {
    fn default() -> Self {
        Self::new(3, Spin::Cw)
    }
}

/// Drive a regular polygon
///
/// Each side: drive forward, stop, turn by 360/sides in the plan's
/// direction, stop. Sides are always driven forward; only the turn
/// direction follows `plan.spin`.
pub fn drive_polygon<O, C>(
    drive: &mut DiffDrive<'_, O, C>,
    plan: &PolygonPlan,
) -> Result<(), MotionError>
where
    O: PwmOutput + ?Sized,
    C: Clock + ?Sized,
{
    if plan.sides == 0 {
        return Err(MotionError::NoSides);
    }
    if !plan.side_length_m.is_finite() || plan.side_length_m < 0.0 {
        return Err(MotionError::InvalidSideLength(plan.side_length_m));
    }

    let turn_angle = plan.turn_angle();
    let side = drive.calibration().straight_duration(plan.side_length_m);

    for i in 0..plan.sides {
        info!("Side {}/{}", i + 1, plan.sides);
        drive.drive_straight(Travel::Forward, side)?;
        drive.stop()?;
        drive.turn(turn_angle, plan.spin)?;
        drive.stop()?;
    }

    Ok(())
}
