// Motor control for the two-wheeled differential-drive base
//
// Provides:
// - DC motor abstraction over a pair of PWM legs
// - Empirical calibration (timing and per-wheel speeds)
// - Motion primitives: stop, turn, drive straight
// - Shape driver for regular polygons

pub mod calibration;
mod dc_motor;
mod drive;
mod shape;

pub use calibration::{Calibration, StraightProfile, WheelCommand};
pub use dc_motor::Motor;
pub use drive::{DiffDrive, MotionError, Spin, Travel};
pub use shape::{drive_polygon, PolygonPlan};
