//! Motor behavior tests against recorded mock lines.

use train_pulse::hal::{MockDelay, MockHardware, MockPin, MockPwm, SignalEvent, SignalTrace};
use train_pulse::{
    CommandCode, Direction, DriveMode, MotorDevice, MotorError, PinAssignment, PinConfig, PulseSettings,
};

type Motor = MotorDevice<MockPin, MockPwm, MockDelay>;

const FORWARD_PIN: u8 = 5;
const PWM_PIN: u8 = 6;
const BACKWARD_PIN: u8 = 7;
const PULSE_PIN: u8 = 4;

fn bridge_motor(trace: &SignalTrace) -> Motor {
    let mut hw = MockHardware::new(trace.clone());
    MotorDevice::from_assignment(
        "A",
        1_000,
        PinAssignment::bridge(FORWARD_PIN, BACKWARD_PIN, PWM_PIN),
        &PulseSettings::default(),
        &mut hw,
    )
    .unwrap()
}

fn pulse_motor(trace: &SignalTrace) -> Motor {
    let mut hw = MockHardware::new(trace.clone());
    MotorDevice::from_assignment(
        "B",
        500,
        PinAssignment::direct(PULSE_PIN),
        &PulseSettings::default(),
        &mut hw,
    )
    .unwrap()
}

fn percent_of_max(percent: u32) -> u16 {
    (percent * u32::from(u16::MAX) / 100) as u16
}

// ============================================================================
// BridgePwm
// ============================================================================

#[test]
fn bridge_forward_then_inc() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);

    motor.forward(Some(30)).unwrap();
    assert_eq!(motor.speed(), 30);
    assert_eq!(motor.direction(), Direction::Forward);
    assert_eq!(trace.last_duty(PWM_PIN), Some(percent_of_max(30)));

    motor.change_speed(10).unwrap();
    assert_eq!(motor.speed(), 40);
    assert_eq!(trace.last_duty(PWM_PIN), Some(26_214));
    assert_eq!(trace.levels(FORWARD_PIN).last(), Some(&true));
    assert_eq!(trace.levels(BACKWARD_PIN).last(), Some(&false));
}

#[test]
fn bridge_reverse_drops_forward_line_first() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);
    motor.forward(None).unwrap();
    trace.clear();

    motor.backward(None).unwrap();

    let order: Vec<_> = trace
        .events()
        .into_iter()
        .filter(|e| matches!(e, SignalEvent::Level { .. }))
        .collect();
    assert_eq!(
        order,
        vec![
            SignalEvent::Level {
                gpio: FORWARD_PIN,
                high: false
            },
            SignalEvent::Level {
                gpio: BACKWARD_PIN,
                high: true
            },
        ]
    );
    // A moving motor keeps its speed when reversed
    assert_eq!(motor.speed(), 50);
}

#[test]
fn bridge_speed_keeps_direction() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);
    motor.backward(Some(20)).unwrap();

    motor.set_speed(75).unwrap();
    assert_eq!(motor.direction(), Direction::Backward);
    assert_eq!(trace.last_duty(PWM_PIN), Some(percent_of_max(75)));
}

#[test]
fn bridge_speed_from_stopped_reports_stopped_direction() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);

    motor.change_speed(10).unwrap();

    let state = motor.serialize();
    assert_eq!(state.speed, 10);
    assert!(state.is_moving());
    assert_eq!(state.direction, Direction::Stopped);
    // Neither direction line was raised.
    assert_eq!(trace.levels(FORWARD_PIN), vec![false]);
    assert_eq!(trace.levels(BACKWARD_PIN), vec![false]);
}

#[test]
fn bridge_speed_clamps() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);

    motor.set_speed(250).unwrap();
    assert_eq!(motor.speed(), 100);
    assert_eq!(trace.last_duty(PWM_PIN), Some(u16::MAX));

    motor.set_speed(-5).unwrap();
    assert_eq!(motor.speed(), 0);
    assert_eq!(trace.last_duty(PWM_PIN), Some(0));
}

#[test]
fn bridge_dec_bottoms_out_at_zero() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);
    motor.forward(Some(5)).unwrap();

    motor.change_speed(-10).unwrap();
    assert_eq!(motor.speed(), 0);
    assert_eq!(trace.last_duty(PWM_PIN), Some(0));
}

#[test]
fn bridge_stop_lowers_everything() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);
    motor.forward(Some(80)).unwrap();

    motor.stop().unwrap();
    assert_eq!(motor.speed(), 0);
    assert_eq!(motor.direction(), Direction::Stopped);
    assert_eq!(trace.levels(FORWARD_PIN).last(), Some(&false));
    assert_eq!(trace.levels(BACKWARD_PIN).last(), Some(&false));
    assert_eq!(trace.last_duty(PWM_PIN), Some(0));
}

#[test]
fn bridge_never_delays() {
    let trace = SignalTrace::new();
    let mut motor = bridge_motor(&trace);
    motor.forward(None).unwrap();
    motor.toggle().unwrap();

    assert_eq!(trace.total_delay_us(), 0);
}

// ============================================================================
// DirectPulse
// ============================================================================

#[test]
fn pulse_forward_sends_one_frame() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    trace.clear();

    motor.forward(None).unwrap();

    assert_eq!(trace.pulse_count(PULSE_PIN), usize::from(CommandCode::Forward.pulse_count()));
    assert_eq!(trace.levels(PULSE_PIN).last(), Some(&false));
    assert_eq!(motor.speed(), 50);
    assert_eq!(motor.direction(), Direction::Forward);
}

#[test]
fn pulse_frame_starts_with_sync_gap() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    trace.clear();

    motor.backward(None).unwrap();

    let events = trace.events();
    assert_eq!(
        &events[..2],
        &[
            SignalEvent::Level {
                gpio: PULSE_PIN,
                high: false
            },
            SignalEvent::DelayMs(30),
        ]
    );
    assert_eq!(trace.pulse_count(PULSE_PIN), 3);
    // 3 pulses at 500 Hz: 1 ms high + 1 ms low each
    assert_eq!(trace.total_delay_us(), 30_000 + 3 * 2 * 1_000);
}

#[test]
fn pulse_speed_is_unsupported() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    trace.clear();

    let err = motor.set_speed(40).unwrap_err();
    assert_eq!(
        err,
        MotorError::UnsupportedOperation {
            operation: "set_speed",
            mode: DriveMode::DirectPulse,
        }
    );
    assert_eq!(err.status_code(), 400);
    assert!(trace.events().is_empty());
    assert_eq!(motor.speed(), 0);
}

#[test]
fn pulse_inc_and_dec_send_step_frames() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    motor.forward(None).unwrap();
    trace.clear();

    motor.change_speed(10).unwrap();
    assert_eq!(trace.pulse_count(PULSE_PIN), usize::from(CommandCode::SpeedUp.pulse_count()));
    assert_eq!(motor.speed(), 60);

    trace.clear();
    motor.change_speed(-10).unwrap();
    assert_eq!(trace.pulse_count(PULSE_PIN), usize::from(CommandCode::SpeedDown.pulse_count()));
    assert_eq!(motor.speed(), 50);
}

#[test]
fn pulse_counter_stays_in_range() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    motor.forward(Some(95)).unwrap();

    motor.change_speed(10).unwrap();
    assert_eq!(motor.speed(), 100);

    motor.stop().unwrap();
    motor.change_speed(-10).unwrap();
    assert_eq!(motor.speed(), 0);
}

#[test]
fn pulse_explicit_speed_only_moves_counter() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    trace.clear();

    motor.forward(Some(70)).unwrap();
    assert_eq!(motor.speed(), 70);
    assert_eq!(trace.pulse_count(PULSE_PIN), 2);
}

#[test]
fn pulse_toggle_round_trip() {
    let trace = SignalTrace::new();
    let mut motor = pulse_motor(&trace);
    trace.clear();

    motor.toggle().unwrap();
    assert!(motor.is_moving());
    assert_eq!(trace.pulse_count(PULSE_PIN), 2);

    trace.clear();
    motor.toggle().unwrap();
    assert!(!motor.is_moving());
    assert_eq!(trace.pulse_count(PULSE_PIN), 1);
}

#[test]
fn falling_edge_still_ends_low() {
    let trace = SignalTrace::new();
    let mut hw = MockHardware::new(trace.clone());
    let settings = PulseSettings {
        sync_gap_ms: 10,
        edge: train_pulse::Edge::Falling,
    };
    let mut motor =
        MotorDevice::from_assignment("F", 1_000, PinAssignment::direct(PULSE_PIN), &settings, &mut hw).unwrap();
    trace.clear();

    motor.forward(None).unwrap();
    assert_eq!(trace.levels(PULSE_PIN).last(), Some(&false));
    assert_eq!(trace.pulse_count(PULSE_PIN), 2);
}

// ============================================================================
// Hardware failures
// ============================================================================

#[test]
fn failing_line_surfaces_at_construction() {
    let trace = SignalTrace::new();
    let pin = MockPin::new(PULSE_PIN, trace.clone()).failing();

    let err = MotorDevice::<MockPin, MockPwm, MockDelay>::new(
        "Dead",
        500,
        PinConfig::direct(pin),
        MockDelay::new(trace.clone()),
        PulseSettings::default(),
    )
    .unwrap_err();

    assert!(err.is_hardware());
    assert_eq!(err.status_code(), 500);
}

#[test]
fn failing_pwm_surfaces_on_run() {
    let trace = SignalTrace::new();
    let pins = PinConfig::bridge(
        MockPin::new(FORWARD_PIN, trace.clone()),
        MockPin::new(BACKWARD_PIN, trace.clone()),
        MockPwm::new(PWM_PIN, trace.clone()).failing(),
    );

    let result = MotorDevice::new("Dead", 1_000, pins, MockDelay::new(trace.clone()), PulseSettings::default());
    assert!(matches!(result, Err(MotorError::Hardware(_))));
}

#[test]
fn narrow_pwm_resolution_scales() {
    let trace = SignalTrace::new();
    let pins = PinConfig::bridge(
        MockPin::new(FORWARD_PIN, trace.clone()),
        MockPin::new(BACKWARD_PIN, trace.clone()),
        MockPwm::new(PWM_PIN, trace.clone()).with_max_duty(1023),
    );
    let mut motor: Motor =
        MotorDevice::new("Esp", 1_000, pins, MockDelay::new(trace.clone()), PulseSettings::default()).unwrap();

    motor.forward(Some(50)).unwrap();
    assert_eq!(trace.last_duty(PWM_PIN), Some(511));
}

#[test]
fn state_snapshot_matches_device() {
    let trace = SignalTrace::disabled();
    let mut motor = bridge_motor(&trace);
    motor.backward(Some(45)).unwrap();

    let state = motor.serialize();
    assert_eq!(state.name.as_str(), "A");
    assert_eq!(state.speed, 45);
    assert_eq!(state.freq, 1_000);
    assert_eq!(state.mode, DriveMode::BridgePwm);
    assert_eq!(state.direction, Direction::Backward);
}
