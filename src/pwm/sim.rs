// In-memory PWM interface
//
// Records every call into a shared trace so a simulated clock can interleave
// its sleeps with the hardware writes. Used by the tests and by --dry-run.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use super::{Gpio, PinMode, PwmError, PwmInterface, PwmOutput};

/// One recorded interaction with the simulated hardware
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Mode { gpio: Gpio, mode: PinMode },
    Range { gpio: Gpio, range: u32 },
    Frequency { gpio: Gpio, hz: u32 },
    Duty { gpio: Gpio, duty: u32 },
    Sleep(Duration),
    Close,
}

/// Shared, ordered record of simulated events
pub type Trace = Rc<RefCell<Vec<SimEvent>>>;

#[derive(Debug)]
pub struct SimPwm {
    connected: bool,
    closed: bool,
    duty: BTreeMap<Gpio, u32>,
    trace: Trace,
    duty_writes: usize,
    fail_at_write: Option<usize>,
    fail_close: bool,
}

impl Default for SimPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPwm {
    pub fn new() -> Self {
        Self {
            connected: true,
            closed: false,
            duty: BTreeMap::new(),
            trace: Rc::new(RefCell::new(Vec::new())),
            duty_writes: 0,
            fail_at_write: None,
            fail_close: false,
        }
    }

    /// An interface whose connection check fails
    pub fn unreachable() -> Self {
        Self {
            connected: false,
            ..Self::new()
        }
    }

    /// Fail the duty-cycle write with this zero-based index (once)
    pub fn fail_at_write(mut self, index: usize) -> Self {
        self.fail_at_write = Some(index);
        self
    }

    /// Make every `close` fail, leaving the interface open
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Handle to the event trace, for sharing with a `SimClock`
    pub fn trace(&self) -> Trace {
        Rc::clone(&self.trace)
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.trace.borrow().clone()
    }

    /// Last duty cycle written to `gpio` (0 if never written)
    pub fn current_duty(&self, gpio: Gpio) -> u32 {
        self.duty.get(&gpio).copied().unwrap_or(0)
    }

    /// Number of duty-cycle writes attempted so far
    pub fn duty_writes(&self) -> usize {
        self.duty_writes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&self, event: SimEvent) {
        self.trace.borrow_mut().push(event);
    }

    fn ensure_open(&self) -> Result<(), PwmError> {
        if self.connected && !self.closed {
            Ok(())
        } else {
            Err(PwmError::NotConnected)
        }
    }
}

impl PwmOutput for SimPwm {
    fn set_duty_cycle(&mut self, gpio: Gpio, duty: u32) -> Result<(), PwmError> {
        self.ensure_open()?;
        let index = self.duty_writes;
        self.duty_writes += 1;

        if self.fail_at_write == Some(index) {
            self.fail_at_write = None;
            return Err(PwmError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("injected fault on write {index} (GPIO {gpio})"),
            )));
        }

        debug!("sim: GPIO {} duty {}", gpio, duty);
        self.duty.insert(gpio, duty);
        self.record(SimEvent::Duty { gpio, duty });
        Ok(())
    }
}

impl PwmInterface for SimPwm {
    fn check_connection(&mut self) -> Result<(), PwmError> {
        self.ensure_open()
    }

    fn set_mode(&mut self, gpio: Gpio, mode: PinMode) -> Result<(), PwmError> {
        self.ensure_open()?;
        self.record(SimEvent::Mode { gpio, mode });
        Ok(())
    }

    fn set_pwm_range(&mut self, gpio: Gpio, range: u32) -> Result<u32, PwmError> {
        self.ensure_open()?;
        self.record(SimEvent::Range { gpio, range });
        Ok(range)
    }

    fn set_pwm_frequency(&mut self, gpio: Gpio, hz: u32) -> Result<u32, PwmError> {
        self.ensure_open()?;
        self.record(SimEvent::Frequency { gpio, hz });
        Ok(hz)
    }

    fn duty_cycle(&mut self, gpio: Gpio) -> Result<u32, PwmError> {
        self.ensure_open()?;
        Ok(self.current_duty(gpio))
    }

    fn close(&mut self) -> Result<(), PwmError> {
        self.ensure_open()?;
        if self.fail_close {
            return Err(PwmError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected fault on close",
            )));
        }
        self.closed = true;
        self.record(SimEvent::Close);
        Ok(())
    }
}
