// Empirical timing and speed constants
//
// Turning: duration = 0.0055 s/deg * angle + 0.04 s, both wheels at 200.
// Straight: 3.9 s of driving covers about 1 m. The per-wheel speeds differ
// to compensate for one motor being stronger than the other.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::drive::Travel;

pub const TURN_SECS_PER_DEGREE: f64 = 0.0055;
pub const TURN_OFFSET_SECS: f64 = 0.04;
pub const TURN_SPEED: u32 = 200;
pub const SECS_PER_METER: f64 = 3.9;

/// Speed and energised leg for one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelCommand {
    pub speed: u32,
    pub direction: bool,
}

impl WheelCommand {
    pub const fn new(speed: u32, direction: bool) -> Self {
        Self { speed, direction }
    }
}

/// Wheel commands for one straight-drive direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StraightProfile {
    pub right: WheelCommand,
    pub left: WheelCommand,
}

// These values come from tuning on the robot and are not symmetric
// (187/200 forward, 187/20 backward). Keep them as measured.
pub const STRAIGHT_FORWARD: StraightProfile = StraightProfile {
    right: WheelCommand::new(187, false),
    left: WheelCommand::new(200, true),
};

pub const STRAIGHT_BACKWARD: StraightProfile = StraightProfile {
    right: WheelCommand::new(187, true),
    left: WheelCommand::new(20, false),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub turn_secs_per_degree: f64,
    pub turn_offset_secs: f64,
    pub turn_speed: u32,
    pub secs_per_meter: f64,
    pub straight_forward: StraightProfile,
    pub straight_backward: StraightProfile,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            turn_secs_per_degree: TURN_SECS_PER_DEGREE,
            turn_offset_secs: TURN_OFFSET_SECS,
            turn_speed: TURN_SPEED,
            secs_per_meter: SECS_PER_METER,
            straight_forward: STRAIGHT_FORWARD,
            straight_backward: STRAIGHT_BACKWARD,
        }
    }
}

impl Calibration {
    /// Seconds needed to rotate by `angle_deg` about the wheelbase center
    pub fn turn_secs(&self, angle_deg: f64) -> f64 {
        self.turn_secs_per_degree * angle_deg + self.turn_offset_secs
    }

    pub fn turn_duration(&self, angle_deg: f64) -> Duration {
        secs_to_duration(self.turn_secs(angle_deg))
    }

    /// Driving time for a straight segment of `meters`
    pub fn straight_duration(&self, meters: f64) -> Duration {
        secs_to_duration(self.secs_per_meter * meters)
    }

    pub fn straight_profile(&self, travel: Travel) -> StraightProfile {
        match travel {
            Travel::Forward => self.straight_forward,
            Travel::Backward => self.straight_backward,
        }
    }
}

/// Negative and NaN durations clamp to zero, overflow to `Duration::MAX`
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}
