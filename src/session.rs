// One driving session: check the interface, configure the pins, drive the
// shape, then always zero every PWM output and release the interface.
//
// A PWM channel keeps its last duty cycle after the process exits, so a
// session that ends without zeroing leaves a motor running.

use std::error::Error;

use tracing::{debug, error, info, warn};

use crate::clock::{Clock, Interrupted};
use crate::config::{ConfigError, RobotConfig};
use crate::motor::{drive_polygon, DiffDrive, MotionError, Motor, PolygonPlan};
use crate::pwm::{Gpio, PinMode, PwmError, PwmInterface};

/// How the motion part of a session ended
#[derive(Debug)]
pub enum Outcome {
    Completed,
    Faulted(MotionError),
    Interrupted,
}

impl Outcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Faulted(_) => 2,
            Outcome::Interrupted => 130,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unable to connect to pigpio daemon: {0}")]
    Connect(#[source] PwmError),

    #[error("Hardware interface not reachable: {0}")]
    NotConnected(#[source] PwmError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("PWM setup failed: {0}")]
    Setup(#[source] PwmError),

    #[error("Shutdown failed, motors may still be powered: {0}")]
    Shutdown(#[source] PwmError),

    #[error("Motion worker failed: {0}")]
    Worker(String),
}

impl SessionError {
    /// Process exit status for this error
    ///
    /// 3 means nothing was commanded, 4 means the motors may still be
    /// powered. Everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Connect(_) | SessionError::NotConnected(_) => 3,
            SessionError::Shutdown(_) => 4,
            SessionError::Config(_) | SessionError::Setup(_) | SessionError::Worker(_) => 1,
        }
    }
}

/// Zeroes the pins and closes the interface exactly once, either through
/// `shutdown` or, if the session unwinds first, on drop.
pub struct ShutdownGuard<'a, I>
where
    I: PwmInterface + ?Sized,
{
    io: &'a mut I,
    pins: [Gpio; 4],
    released: bool,
}

impl<'a, I> ShutdownGuard<'a, I>
where
    I: PwmInterface + ?Sized,
{
    pub fn new(io: &'a mut I, pins: [Gpio; 4]) -> Self {
        Self {
            io,
            pins,
            released: false,
        }
    }

    pub fn io(&mut self) -> &mut I {
        &mut *self.io
    }

    pub fn shutdown(mut self) -> Result<(), PwmError> {
        self.released = true;
        release(&mut *self.io, &self.pins)
    }
}

impl<I> Drop for ShutdownGuard<'_, I>
where
    I: PwmInterface + ?Sized,
{
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        warn!("Session ended without explicit shutdown, zeroing PWM outputs");
        if let Err(e) = release(&mut *self.io, &self.pins) {
            warn!("Failed to shut down PWM on drop: {}", e);
        }
    }
}

/// Zero every pin (even if one fails), then close. Returns the first error.
fn release<I>(io: &mut I, pins: &[Gpio]) -> Result<(), PwmError>
where
    I: PwmInterface + ?Sized,
{
    info!("Turning off...");
    let mut first_err = None;

    for &pin in pins {
        if let Err(e) = io.set_duty_cycle(pin, 0) {
            warn!("Failed to zero GPIO {}: {}", pin, e);
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }

    if let Err(e) = io.close() {
        warn!("Failed to close hardware interface: {}", e);
        if first_err.is_none() {
            first_err = Some(e);
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Output mode, range and frequency on every pin, then clear them
fn setup_pins<I>(io: &mut I, config: &RobotConfig) -> Result<(), PwmError>
where
    I: PwmInterface + ?Sized,
{
    let pins = config.pins.all();

    for &pin in &pins {
        io.set_mode(pin, PinMode::Output)?;
    }

    for &pin in &pins {
        let range = io.set_pwm_range(pin, config.pwm.range)?;
        debug!("GPIO {} PWM range {} (real {})", pin, config.pwm.range, range);
    }

    for &pin in &pins {
        let hz = io.set_pwm_frequency(pin, config.pwm.frequency_hz)?;
        if hz != config.pwm.frequency_hz {
            warn!(
                "GPIO {} PWM frequency {} Hz not available, using {} Hz",
                pin, config.pwm.frequency_hz, hz
            );
        }
    }

    // Clear all pins, just in case
    for &pin in &pins {
        io.set_duty_cycle(pin, 0)?;
    }

    Ok(())
}

fn report_fault(err: &MotionError) {
    error!("Ending due to fault: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {}", cause);
        source = cause.source();
    }
    debug!("Fault detail: {:?}", err);
}

/// Run one session against `io`
///
/// Motion faults are reported and turned into an `Outcome`; they never skip
/// the shutdown. Only an unreachable interface, a setup failure or a failed
/// shutdown after a completed run come back as `Err`. A shutdown that fails
/// after a setup error, fault or interrupt is logged and the earlier result
/// is kept.
pub fn run<I, C>(
    io: &mut I,
    clock: &mut C,
    config: &RobotConfig,
    plan: &PolygonPlan,
) -> Result<Outcome, SessionError>
where
    I: PwmInterface + ?Sized,
    C: Clock + ?Sized,
{
    info!("Setting up the GPIO...");
    io.check_connection().map_err(SessionError::NotConnected)?;
    info!("GPIO ready...");

    let pins = config.pins;
    let mut guard = ShutdownGuard::new(io, pins.all());

    if let Err(e) = setup_pins(guard.io(), config) {
        error!("PWM setup failed: {}", e);
        if let Err(shutdown_err) = guard.shutdown() {
            error!("Shutdown failed, motors may still be powered: {}", shutdown_err);
        }
        return Err(SessionError::Setup(e));
    }

    let left = Motor::new(pins.left_a, pins.left_b);
    let right = Motor::new(pins.right_a, pins.right_b);
    info!("Motors ready...");

    // Ctrl-C during connect or setup must not energise anything
    let result = if clock.interrupt_pending() {
        Err(MotionError::Interrupted(Interrupted))
    } else {
        info!("Go, robot!");
        let mut drive = DiffDrive::new(guard.io(), &mut *clock, right, left, &config.calibration);
        drive_polygon(&mut drive, plan)
    };

    let outcome = match result {
        Ok(()) => {
            info!("All done.");
            Outcome::Completed
        }
        Err(MotionError::Interrupted(_)) => {
            warn!("Ending due to operator interrupt");
            Outcome::Interrupted
        }
        Err(e) => {
            report_fault(&e);
            Outcome::Faulted(e)
        }
    };

    match (guard.shutdown(), outcome) {
        (Ok(()), outcome) => Ok(outcome),
        (Err(e), Outcome::Completed) => Err(SessionError::Shutdown(e)),
        (Err(e), outcome) => {
            error!("Shutdown failed, motors may still be powered: {}", e);
            Ok(outcome)
        }
    }
}
