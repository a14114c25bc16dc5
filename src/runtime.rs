// Runs a session from the command line
//
// The session itself is blocking (motion is timed with real sleeps), so it
// runs on a blocking worker. A Ctrl-C listener on the async side wakes the
// worker's clock early, which ends the motion and goes through the normal
// shutdown.

use std::path::PathBuf;
use std::sync::mpsc;

use tracing::{info, warn};

use crate::clock::{InterruptibleClock, SimClock};
use crate::config::{RobotConfig, DEFAULT_PIGPIO_HOST, DEFAULT_PIGPIO_PORT};
use crate::motor::PolygonPlan;
use crate::pigpio::PigpioClient;
use crate::pwm::SimPwm;
use crate::session::{self, Outcome, SessionError};

/// What to drive and where the hardware is
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub plan: PolygonPlan,
    pub host: String,
    pub port: u16,
    pub config_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            plan: PolygonPlan::default(),
            host: DEFAULT_PIGPIO_HOST.to_string(),
            port: DEFAULT_PIGPIO_PORT,
            config_path: None,
            dry_run: false,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<RobotConfig, SessionError> {
    match path {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Ok(RobotConfig::load(path)?)
        }
        None => Ok(RobotConfig::default()),
    }
}

/// Drive the session against the simulated interface, without waiting
pub fn run_dry(config: &RobotConfig, plan: &PolygonPlan) -> Result<Outcome, SessionError> {
    info!("Dry run: no hardware will be commanded");
    let mut sim = SimPwm::new();
    let mut clock = SimClock::sharing(&sim);

    let outcome = session::run(&mut sim, &mut clock, config, plan)?;

    info!(
        "Dry run finished: {} duty cycle writes, {:.2}s of driving",
        sim.duty_writes(),
        clock.elapsed().as_secs_f64()
    );
    Ok(outcome)
}

pub async fn run(opts: RunOptions) -> Result<Outcome, SessionError> {
    let config = load_config(opts.config_path.as_ref())?;
    let RunOptions {
        plan,
        host,
        port,
        dry_run,
        ..
    } = opts;

    info!(
        "Polygon: {} sides, turning {:?}, {} m per side",
        plan.sides, plan.spin, plan.side_length_m
    );

    if dry_run {
        return run_dry(&config, &plan);
    }

    let (interrupt_tx, interrupt_rx) = mpsc::channel();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the robot");
            // Worker may already be gone
            let _ = interrupt_tx.send(());
        }
    });

    let worker = tokio::task::spawn_blocking(move || {
        let mut client = PigpioClient::connect(&host, port).map_err(SessionError::Connect)?;
        let mut clock = InterruptibleClock::new(interrupt_rx);
        session::run(&mut client, &mut clock, &config, &plan)
    });

    let joined = worker.await;
    watcher.abort();

    joined.map_err(|e| SessionError::Worker(e.to_string()))?
}
