// Blocking waits between motor commands
//
// Motion is open loop: the only synchronisation is sleeping for a computed
// duration. Sleeping goes through the Clock trait so tests can run without
// real-time delay and an operator interrupt can end a wait early.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::pwm::{SimEvent, SimPwm, Trace};

/// The wait was cut short by an operator interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interrupted by operator")]
pub struct Interrupted;

pub trait Clock {
    /// Block for `duration`
    fn sleep(&mut self, duration: Duration) -> Result<(), Interrupted>;

    /// Consume an interrupt that arrived while nobody was sleeping
    fn interrupt_pending(&mut self) -> bool;
}

/// Real-time clock that wakes early when a message arrives on `interrupts`
pub struct InterruptibleClock {
    interrupts: Receiver<()>,
}

impl InterruptibleClock {
    pub fn new(interrupts: Receiver<()>) -> Self {
        Self { interrupts }
    }
}

impl Clock for InterruptibleClock {
    fn sleep(&mut self, duration: Duration) -> Result<(), Interrupted> {
        let Some(deadline) = Instant::now().checked_add(duration) else {
            // Past the end of the clock, only an interrupt ends this wait
            return match self.interrupts.recv() {
                Ok(()) => Err(Interrupted),
                Err(_) => {
                    thread::sleep(duration);
                    Ok(())
                }
            };
        };

        match self.interrupts.recv_timeout(duration) {
            Ok(()) => Err(Interrupted),
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Err(RecvTimeoutError::Disconnected) => {
                // Nobody can interrupt us any more, sleep out the rest
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
                Ok(())
            }
        }
    }

    fn interrupt_pending(&mut self) -> bool {
        self.interrupts.try_recv().is_ok()
    }
}

/// Simulated clock: advances instantly and records each sleep
#[derive(Debug, Default)]
pub struct SimClock {
    elapsed: Duration,
    sleeps: Vec<Duration>,
    trace: Option<Trace>,
    interrupt_on: Option<usize>,
    pending: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose sleeps are interleaved into the trace of `pwm`
    pub fn sharing(pwm: &SimPwm) -> Self {
        Self {
            trace: Some(pwm.trace()),
            ..Self::default()
        }
    }

    /// Report an interrupt on the sleep with this zero-based index
    pub fn interrupt_on(mut self, index: usize) -> Self {
        self.interrupt_on = Some(index);
        self
    }

    /// Start with an interrupt already queued
    pub fn pending_interrupt(mut self) -> Self {
        self.pending = true;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Clock for SimClock {
    fn sleep(&mut self, duration: Duration) -> Result<(), Interrupted> {
        if self.interrupt_on == Some(self.sleeps.len()) {
            return Err(Interrupted);
        }
        self.elapsed += duration;
        self.sleeps.push(duration);
        if let Some(trace) = &self.trace {
            trace.borrow_mut().push(SimEvent::Sleep(duration));
        }
        Ok(())
    }

    fn interrupt_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
