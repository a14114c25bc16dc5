// Pins, PWM settings, daemon address and the loadable robot configuration
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::motor::Calibration;
use crate::pwm::Gpio;

// Motor 1 (left motor) legs
pub const PIN_MOTOR1_LEGA: Gpio = 8;
pub const PIN_MOTOR1_LEGB: Gpio = 7;

// Motor 2 (right motor) legs
pub const PIN_MOTOR2_LEGA: Gpio = 5;
pub const PIN_MOTOR2_LEGB: Gpio = 6;

// Duty cycle range (8-bit) and PWM frequency, applied to all four pins
pub const PWM_RANGE: u32 = 255;
pub const PWM_FREQUENCY_HZ: u32 = 1000;

// pigpio daemon address (overridable with PIGPIO_ADDR / PIGPIO_PORT)
pub const DEFAULT_PIGPIO_HOST: &str = "localhost";
pub const DEFAULT_PIGPIO_PORT: u16 = 8888;

/// Error loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Pin assignment for the two motors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub left_a: Gpio,
    pub left_b: Gpio,
    pub right_a: Gpio,
    pub right_b: Gpio,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            left_a: PIN_MOTOR1_LEGA,
            left_b: PIN_MOTOR1_LEGB,
            right_a: PIN_MOTOR2_LEGA,
            right_b: PIN_MOTOR2_LEGB,
        }
    }
}

impl PinMap {
    /// All four pins, motor 1 first
    pub fn all(&self) -> [Gpio; 4] {
        [self.left_a, self.left_b, self.right_a, self.right_b]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmSettings {
    pub range: u32,
    pub frequency_hz: u32,
}

impl Default for PwmSettings {
    fn default() -> Self {
        Self {
            range: PWM_RANGE,
            frequency_hz: PWM_FREQUENCY_HZ,
        }
    }
}

/// Everything the session needs to know about the robot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub pins: PinMap,
    pub pwm: PwmSettings,
    pub calibration: Calibration,
}

impl RobotConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
