use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use diffdrive_pigpio::config::{DEFAULT_PIGPIO_HOST, DEFAULT_PIGPIO_PORT};
use diffdrive_pigpio::motor::{PolygonPlan, Spin};
use diffdrive_pigpio::runtime::{self, RunOptions};

/// Drive a regular polygon with a two-wheeled robot (open loop, timed)
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Number of sides
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    sides: u32,

    /// Turn counter-clockwise at each vertex (default is clockwise)
    #[arg(long)]
    ccw: bool,

    /// Length of each side in meters
    #[arg(long, default_value_t = 1.0)]
    side_length: f64,

    /// pigpio daemon host
    #[arg(long, env = "PIGPIO_ADDR", default_value = DEFAULT_PIGPIO_HOST)]
    host: String,

    /// pigpio daemon port
    #[arg(long, env = "PIGPIO_PORT", default_value_t = DEFAULT_PIGPIO_PORT)]
    port: u16,

    /// JSON file overriding pins, PWM settings and calibration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulate the run without contacting the daemon
    #[arg(long)]
    dry_run: bool,
}

impl From<Args> for RunOptions {
    fn from(args: Args) -> Self {
        Self {
            plan: PolygonPlan {
                sides: args.sides,
                spin: Spin::from(args.ccw),
                side_length_m: args.side_length,
            },
            host: args.host,
            port: args.port,
            config_path: args.config,
            dry_run: args.dry_run,
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug for per-command detail)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let code = match runtime::run(args.into()).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}
