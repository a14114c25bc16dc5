// PWM output capability
//
// Provides:
// - The duty-cycle write used during motion (PwmOutput)
// - The one-time setup / teardown calls of a hardware interface (PwmInterface)
// - An in-memory interface for tests and dry runs (SimPwm)

pub mod sim;

pub use sim::{SimEvent, SimPwm, Trace};

/// Broadcom GPIO number
pub type Gpio = u32;

/// GPIO pin modes (only outputs are driven here)
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output = 1,
}

/// Error types for the hardware interface
#[derive(Debug, thiserror::Error)]
pub enum PwmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} on GPIO {gpio} rejected with status {code} ({reason})")]
    Rejected {
        command: &'static str,
        gpio: Gpio,
        code: i32,
        reason: &'static str,
    },

    #[error("Invalid response to {command}: {reason}")]
    InvalidResponse {
        command: &'static str,
        reason: String,
    },

    #[error("Hardware interface not connected")]
    NotConnected,
}

/// A single duty-cycle write. This is all the motion code ever needs.
pub trait PwmOutput {
    /// Set the duty cycle of `gpio`. Values are not range checked here,
    /// the interface decides what to do with out-of-range values.
    fn set_duty_cycle(&mut self, gpio: Gpio, duty: u32) -> Result<(), PwmError>;
}

/// Full hardware interface handle used by the session
pub trait PwmInterface: PwmOutput {
    /// Round-trip check that the interface is reachable
    fn check_connection(&mut self) -> Result<(), PwmError>;

    fn set_mode(&mut self, gpio: Gpio, mode: PinMode) -> Result<(), PwmError>;

    /// Set the duty cycle range. Returns the range the hardware actually uses.
    fn set_pwm_range(&mut self, gpio: Gpio, range: u32) -> Result<u32, PwmError>;

    /// Set the PWM frequency. Returns the closest frequency the hardware supports.
    fn set_pwm_frequency(&mut self, gpio: Gpio, hz: u32) -> Result<u32, PwmError>;

    /// Read back the current duty cycle of `gpio`
    fn duty_cycle(&mut self, gpio: Gpio) -> Result<u32, PwmError>;

    /// Release the interface. Further calls fail with `PwmError::NotConnected`.
    fn close(&mut self) -> Result<(), PwmError>;
}
