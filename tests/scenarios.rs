// End-to-end driving sessions against the simulated PWM interface

use std::time::Duration;

use diffdrive_pigpio::clock::SimClock;
use diffdrive_pigpio::config::RobotConfig;
use diffdrive_pigpio::motor::{Calibration, MotionError, PolygonPlan, Spin};
use diffdrive_pigpio::pwm::{PwmError, SimEvent, SimPwm};
use diffdrive_pigpio::session::{self, Outcome, SessionError};

const PINS: [u32; 4] = [8, 7, 5, 6];

// Per polygon side: straight (4) + stop inside straight (4) + stop (4)
// + turn (4) + stop (4)
const WRITES_PER_SIDE: usize = 20;

// Mode, range, frequency and clear for each pin
const SETUP_EVENTS: usize = 16;

fn duty(gpio: u32, duty: u32) -> SimEvent {
    SimEvent::Duty { gpio, duty }
}

/// Writes of one `stop`: right motor (5/6) then left motor (8/7), leg B zeroed first
fn stop_writes() -> Vec<SimEvent> {
    vec![duty(6, 0), duty(5, 0), duty(7, 0), duty(8, 0)]
}

fn motion_events(events: &[SimEvent]) -> &[SimEvent] {
    // Skip setup, drop the final shutdown (4 zeroes + close)
    &events[SETUP_EVENTS..events.len() - 5]
}

#[test]
fn triangle_clockwise_sequence() {
    let mut sim = SimPwm::new();
    let mut clock = SimClock::sharing(&sim);
    let plan = PolygonPlan::new(3, Spin::Cw);

    let outcome = session::run(&mut sim, &mut clock, &RobotConfig::default(), &plan).unwrap();
    assert!(matches!(outcome, Outcome::Completed));

    let cal = Calibration::default();
    let turn = cal.turn_duration(120.0);

    let mut side = vec![
        // drive straight forward: right leg B 187, left leg A 200
        duty(5, 0),
        duty(6, 187),
        duty(7, 0),
        duty(8, 200),
        SimEvent::Sleep(Duration::from_millis(3900)),
    ];
    side.extend(stop_writes()); // end of drive straight
    side.extend(stop_writes()); // explicit stop
    side.extend([
        // clockwise turn: both motors on leg B at 200
        duty(5, 0),
        duty(6, 200),
        duty(8, 0),
        duty(7, 200),
        SimEvent::Sleep(turn),
    ]);
    side.extend(stop_writes());

    let expected: Vec<SimEvent> = (0..3).flat_map(|_| side.clone()).collect();
    assert_eq!(motion_events(&sim.events()), expected.as_slice());

    // 3 x (3.9 + 0.0055 * 120 + 0.04) = 13.8 s
    let total = clock.elapsed().as_secs_f64();
    assert!((total - 13.8).abs() < 1e-6, "total {}", total);
}

#[test]
fn polygon_counts_for_many_side_counts() {
    let cal = Calibration::default();
    for sides in 1..=8u32 {
        let mut sim = SimPwm::new();
        let mut clock = SimClock::new();
        let plan = PolygonPlan::new(sides, Spin::Ccw);
        session::run(&mut sim, &mut clock, &RobotConfig::default(), &plan).unwrap();

        let turn = cal.turn_duration(360.0 / sides as f64);
        let straights = clock
            .sleeps()
            .iter()
            .filter(|d| **d == Duration::from_millis(3900))
            .count();
        let turns = clock.sleeps().iter().filter(|d| **d == turn).count();

        assert_eq!(clock.sleeps().len(), 2 * sides as usize);
        assert_eq!(straights, sides as usize);
        assert_eq!(turns, sides as usize);
        // setup clear (4) + motion + shutdown (4)
        assert_eq!(sim.duty_writes(), 8 + WRITES_PER_SIDE * sides as usize);
    }
}

#[test]
fn successful_run_leaves_all_channels_zero() {
    let mut sim = SimPwm::new();
    let mut clock = SimClock::new();
    session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::new(4, Spin::Cw),
    )
    .unwrap();

    for pin in PINS {
        assert_eq!(sim.current_duty(pin), 0, "GPIO {}", pin);
    }
    assert!(sim.is_closed());
    assert_eq!(sim.events().last(), Some(&SimEvent::Close));
}

#[test]
fn unreachable_interface_never_drives() {
    let mut sim = SimPwm::unreachable();
    let mut clock = SimClock::new();
    let err = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::default(),
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::NotConnected(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(sim.duty_writes(), 0);
    assert!(sim.events().is_empty());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn fault_in_third_segment_still_shuts_down_once() {
    // Second write of the third straight segment (right motor's active leg)
    let fail_at = 4 + 2 * WRITES_PER_SIDE + 1;
    let mut sim = SimPwm::new().fail_at_write(fail_at);
    let mut clock = SimClock::new();

    let outcome = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::new(3, Spin::Cw),
    )
    .unwrap();

    match &outcome {
        Outcome::Faulted(MotionError::Pwm(PwmError::Io(_))) => {}
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 2);

    // Two full sides slept, no third straight
    assert_eq!(clock.sleeps().len(), 4);

    let events = sim.events();
    let closes = events.iter().filter(|e| **e == SimEvent::Close).count();
    assert_eq!(closes, 1);

    // Shutdown: exactly the four zeroes then close, at the very end
    let tail = &events[events.len() - 5..];
    assert_eq!(
        tail,
        &[duty(8, 0), duty(7, 0), duty(5, 0), duty(6, 0), SimEvent::Close]
    );
    for pin in PINS {
        assert_eq!(sim.current_duty(pin), 0);
    }
}

#[test]
fn interrupt_mid_segment_shuts_down() {
    let mut sim = SimPwm::new();
    // Interrupt during the second sleep (first turn)
    let mut clock = SimClock::new().interrupt_on(1);

    let outcome = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::new(3, Spin::Ccw),
    )
    .unwrap();

    assert!(matches!(outcome, Outcome::Interrupted));
    assert_eq!(outcome.exit_code(), 130);
    for pin in PINS {
        assert_eq!(sim.current_duty(pin), 0);
    }
    assert!(sim.is_closed());
}

#[test]
fn interrupt_queued_before_start_never_drives() {
    let mut sim = SimPwm::new();
    let mut clock = SimClock::new().pending_interrupt();

    let outcome = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::new(3, Spin::Cw),
    )
    .unwrap();

    assert!(matches!(outcome, Outcome::Interrupted));
    assert_eq!(outcome.exit_code(), 130);
    // Only the setup clear and the shutdown zeroes, never a non-zero duty
    assert_eq!(sim.duty_writes(), 8);
    assert!(sim
        .events()
        .iter()
        .all(|e| !matches!(e, SimEvent::Duty { duty, .. } if *duty != 0)));
    assert!(clock.sleeps().is_empty());
}

#[test]
fn fault_survives_failed_shutdown() {
    let fail_at = 4 + WRITES_PER_SIDE + 1;
    let mut sim = SimPwm::new().fail_at_write(fail_at).fail_close();
    let mut clock = SimClock::new();

    let outcome = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::new(3, Spin::Cw),
    )
    .unwrap();

    assert!(matches!(outcome, Outcome::Faulted(_)));
    assert_eq!(outcome.exit_code(), 2);
    for pin in PINS {
        assert_eq!(sim.current_duty(pin), 0);
    }
}

#[test]
fn setup_failure_still_zeroes_and_closes() {
    // Fail the first clearing write during setup
    let mut sim = SimPwm::new().fail_at_write(0);
    let mut clock = SimClock::new();

    let err = session::run(
        &mut sim,
        &mut clock,
        &RobotConfig::default(),
        &PolygonPlan::default(),
    )
    .unwrap_err();

    assert!(matches!(err, SessionError::Setup(_)));
    assert!(sim.is_closed());
    assert!(clock.sleeps().is_empty());
}

#[test]
fn custom_pins_from_config() {
    let config = RobotConfig::from_json(
        r#"{ "pins": { "left_a": 20, "left_b": 21, "right_a": 12, "right_b": 13 } }"#,
    )
    .unwrap();
    let mut sim = SimPwm::new();
    let mut clock = SimClock::new();
    session::run(&mut sim, &mut clock, &config, &PolygonPlan::new(1, Spin::Cw)).unwrap();

    let touched: std::collections::BTreeSet<u32> = sim
        .events()
        .iter()
        .filter_map(|e| match e {
            SimEvent::Duty { gpio, .. } => Some(*gpio),
            _ => None,
        })
        .collect();
    assert_eq!(touched.into_iter().collect::<Vec<_>>(), vec![12, 13, 20, 21]);
}
