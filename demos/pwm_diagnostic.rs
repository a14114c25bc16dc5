// PWM diagnostic: READ-ONLY check of the pigpio daemon and the motor pins
//
// This tool does NOT write anything - no pin is configured, no motor moves.
// Run it after a session to confirm every motor pin was left at duty cycle 0.
//
// Usage: cargo run --example pwm_diagnostic -- [host] [port]
// Example: cargo run --example pwm_diagnostic -- raspberrypi.local 8888

use diffdrive_pigpio::config::{PinMap, DEFAULT_PIGPIO_HOST, DEFAULT_PIGPIO_PORT};
use diffdrive_pigpio::pigpio::PigpioClient;
use diffdrive_pigpio::pwm::PwmInterface;

const PIN_NAMES: [&str; 4] = ["Left leg A", "Left leg B", "Right leg A", "Right leg B"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    // Get address from args or use default
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PIGPIO_HOST.to_string());
    let port = match std::env::args().nth(2) {
        Some(p) => p.parse()?,
        None => DEFAULT_PIGPIO_PORT,
    };
    let pins = PinMap::default().all();

    println!("PWM diagnostic (read-only)");
    println!("Daemon: {}:{}", host, port);
    println!("Motor pins: {:?}", pins);
    println!();

    println!("Step 1: Connecting to pigpio daemon...");
    let mut client = match PigpioClient::connect(&host, port) {
        Ok(client) => {
            println!("  ✓ Connected");
            client
        }
        Err(e) => {
            println!("  ✗ Failed to connect: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Is pigpiod running? (sudo pigpiod)");
            println!("  - Remote access needs pigpiod started without -l");
            println!("  - Check PIGPIO_ADDR / PIGPIO_PORT");
            return Err(e.into());
        }
    };

    match client.version() {
        Ok(v) => println!("  pigpio version {}", v),
        Err(e) => println!("  ✗ Version query failed: {}", e),
    }
    println!();

    println!("Step 2: Reading PWM state...");
    let mut all_zero = true;
    for (name, &gpio) in PIN_NAMES.iter().zip(pins.iter()) {
        println!("  === {} (GPIO {}) ===", name, gpio);

        match client.pwm_range(gpio) {
            Ok(range) => println!("    Range:      {}", range),
            Err(e) => println!("    Range:      ERROR - {}", e),
        }

        match client.pwm_frequency(gpio) {
            Ok(hz) => println!("    Frequency:  {} Hz", hz),
            Err(e) => println!("    Frequency:  ERROR - {}", e),
        }

        match client.duty_cycle(gpio) {
            Ok(0) => println!("    Duty cycle: 0"),
            Ok(duty) => {
                println!("    Duty cycle: {}  ⚠ MOTOR POWERED", duty);
                all_zero = false;
            }
            // Pin never used for PWM, so it is not driving anything
            Err(e) => println!("    Duty cycle: n/a - {}", e),
        }
        println!();
    }

    client.close()?;

    if all_zero {
        println!("All motor pins are idle.");
    } else {
        println!("⚠ WARNING: at least one motor pin is still driven!");
    }

    Ok(())
}
