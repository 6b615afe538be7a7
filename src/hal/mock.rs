//! Mock implementations for testing without hardware.
//!
//! Every mock writes into a shared [`SignalTrace`], so a test can assert
//! the exact waveform a motor produced across all of its lines.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockPin`] | [`OutputPin`] | Records level changes |
//! | [`MockPwm`] | [`SetDutyCycle`] | Records duty changes (16-bit range) |
//! | [`MockDelay`] | [`DelayNs`] | Records delays without sleeping |
//! | [`MockHardware`] | [`MotorHardware`] | Hands out the above by GPIO number |
//!
//! # Example
//!
//! ```rust
//! use train_pulse::hal::{MockHardware, SignalTrace};
//! use train_pulse::{MotorDevice, PinConfig, PulseSettings};
//!
//! let trace = SignalTrace::new();
//! let mut hw = MockHardware::new(trace.clone());
//!
//! let mut motor = MotorDevice::from_assignment(
//!     "A",
//!     1_000,
//!     PinConfig::bridge(5, 7, 6),
//!     &PulseSettings::default(),
//!     &mut hw,
//! )
//! .unwrap();
//!
//! motor.forward(Some(40)).unwrap();
//! assert_eq!(trace.last_duty(6), Some((40 * 65_535 / 100) as u16));
//! ```
//!
//! [`OutputPin`]: crate::traits::OutputPin
//! [`SetDutyCycle`]: crate::traits::SetDutyCycle
//! [`DelayNs`]: crate::traits::DelayNs
//! [`MotorHardware`]: crate::traits::MotorHardware

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::traits::MotorHardware;

// ============================================================================
// Signal Trace
// ============================================================================

/// One observable hardware action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalEvent {
    /// A digital line was driven.
    Level {
        /// GPIO number.
        gpio: u8,
        /// Level written.
        high: bool,
    },
    /// A PWM channel duty was set.
    Duty {
        /// GPIO number.
        gpio: u8,
        /// Raw duty value.
        duty: u16,
    },
    /// Busy-wait in milliseconds.
    DelayMs(u32),
    /// Busy-wait in microseconds.
    DelayUs(u32),
}

/// Shared, cloneable log of hardware actions.
///
/// Clones share the same log. A disabled trace drops everything, which
/// keeps long-running desktop demos from growing without bound.
#[derive(Clone, Debug)]
pub struct SignalTrace {
    events: Option<Arc<Mutex<Vec<SignalEvent>>>>,
}

impl SignalTrace {
    /// Creates an empty, recording trace.
    pub fn new() -> Self {
        Self {
            events: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Creates a trace that records nothing.
    pub fn disabled() -> Self {
        Self { events: None }
    }

    fn record(&self, event: SignalEvent) {
        if let Some(events) = &self.events {
            events.lock().unwrap().push(event);
        }
    }

    /// Snapshot of every recorded event, oldest first.
    pub fn events(&self) -> Vec<SignalEvent> {
        self.events
            .as_ref()
            .map(|events| events.lock().unwrap().clone())
            .unwrap_or_default()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        if let Some(events) = &self.events {
            events.lock().unwrap().clear();
        }
    }

    /// Every level written to `gpio`, in order.
    pub fn levels(&self, gpio: u8) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SignalEvent::Level { gpio: g, high } if g == gpio => Some(high),
                _ => None,
            })
            .collect()
    }

    /// Number of low-to-high transitions on `gpio`.
    ///
    /// For a pulse frame this equals the number of pulses sent, whichever
    /// edge polarity was used.
    pub fn pulse_count(&self, gpio: u8) -> usize {
        let mut count = 0;
        let mut high = false;
        for level in self.levels(gpio) {
            if level && !high {
                count += 1;
            }
            high = level;
        }
        count
    }

    /// Most recent duty written to the PWM channel on `gpio`.
    pub fn last_duty(&self, gpio: u8) -> Option<u16> {
        self.events().into_iter().rev().find_map(|e| match e {
            SignalEvent::Duty { gpio: g, duty } if g == gpio => Some(duty),
            _ => None,
        })
    }

    /// Sum of all recorded delays, in microseconds.
    pub fn total_delay_us(&self) -> u64 {
        self.events()
            .into_iter()
            .map(|e| match e {
                SignalEvent::DelayMs(ms) => u64::from(ms) * 1_000,
                SignalEvent::DelayUs(us) => u64::from(us),
                _ => 0,
            })
            .sum()
    }
}

impl Default for SignalTrace {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Mock Error
// ============================================================================

/// Error raised by mocks configured to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for MockError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

// ============================================================================
// Mock Pin
// ============================================================================

/// Mock digital output line.
///
/// # Example
///
/// ```rust
/// use train_pulse::hal::{MockPin, SignalTrace};
/// use embedded_hal::digital::OutputPin;
///
/// let trace = SignalTrace::new();
/// let mut pin = MockPin::new(4, trace.clone());
/// pin.set_high().unwrap();
/// pin.set_low().unwrap();
///
/// assert_eq!(trace.levels(4), vec![true, false]);
/// assert!(!pin.is_high());
/// ```
#[derive(Debug)]
pub struct MockPin {
    gpio: u8,
    high: bool,
    fail: bool,
    trace: SignalTrace,
}

impl MockPin {
    /// Creates a mock line on `gpio`, initially low.
    pub fn new(gpio: u8, trace: SignalTrace) -> Self {
        Self {
            gpio,
            high: false,
            fail: false,
            trace,
        }
    }

    /// Make every write fail with [`MockError`].
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// GPIO number of this line.
    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError);
        }
        self.high = high;
        self.trace.record(SignalEvent::Level { gpio: self.gpio, high });
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), MockError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), MockError> {
        self.write(true)
    }
}

// ============================================================================
// Mock PWM
// ============================================================================

/// Mock PWM channel with a 16-bit duty range.
#[derive(Debug)]
pub struct MockPwm {
    gpio: u8,
    duty: u16,
    max_duty: u16,
    fail: bool,
    trace: SignalTrace,
}

impl MockPwm {
    /// Creates a mock channel on `gpio` with `max_duty` of 65535, at 0%.
    pub fn new(gpio: u8, trace: SignalTrace) -> Self {
        Self {
            gpio,
            duty: 0,
            max_duty: u16::MAX,
            fail: false,
            trace,
        }
    }

    /// Use a different duty resolution.
    pub fn with_max_duty(mut self, max_duty: u16) -> Self {
        self.max_duty = max_duty;
        self
    }

    /// Make every write fail with [`MockError`].
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// GPIO number this channel drives.
    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    /// Current raw duty.
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = MockError;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError);
        }
        self.duty = duty;
        self.trace.record(SignalEvent::Duty { gpio: self.gpio, duty });
        Ok(())
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Mock busy-wait that records instead of sleeping.
#[derive(Clone, Debug)]
pub struct MockDelay {
    trace: SignalTrace,
}

impl MockDelay {
    /// Creates a delay recording into `trace`.
    pub fn new(trace: SignalTrace) -> Self {
        Self { trace }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.record(SignalEvent::DelayUs(ns / 1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.trace.record(SignalEvent::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.record(SignalEvent::DelayMs(ms));
    }
}

// ============================================================================
// Mock Hardware
// ============================================================================

/// Mock pin provider.
///
/// Refuses to hand out a GPIO twice until it is released, and can be
/// told to reject specific pins or hand out lines whose writes fail.
#[derive(Debug, Default)]
pub struct MockHardware {
    trace: SignalTrace,
    claimed: BTreeSet<u8>,
    broken: BTreeSet<u8>,
    failing: BTreeSet<u8>,
}

impl MockHardware {
    /// Creates a provider whose lines record into `trace`.
    pub fn new(trace: SignalTrace) -> Self {
        Self {
            trace,
            ..Default::default()
        }
    }

    /// Make claims of `gpio` fail.
    pub fn with_broken_pin(mut self, gpio: u8) -> Self {
        self.broken.insert(gpio);
        self
    }

    /// Hand out `gpio` normally, but as a line whose writes fail.
    pub fn with_failing_pin(mut self, gpio: u8) -> Self {
        self.failing.insert(gpio);
        self
    }

    /// The shared trace.
    pub fn trace(&self) -> &SignalTrace {
        &self.trace
    }

    /// Returns true if `gpio` has been handed out.
    pub fn is_claimed(&self, gpio: u8) -> bool {
        self.claimed.contains(&gpio)
    }

    fn claim(&mut self, gpio: u8) -> Result<(), MockError> {
        if self.broken.contains(&gpio) || !self.claimed.insert(gpio) {
            return Err(MockError);
        }
        Ok(())
    }
}

impl MotorHardware for MockHardware {
    type Error = MockError;
    type Output = MockPin;
    type Pwm = MockPwm;
    type Delay = MockDelay;

    fn output(&mut self, gpio: u8) -> Result<MockPin, MockError> {
        self.claim(gpio)?;
        let pin = MockPin::new(gpio, self.trace.clone());
        Ok(if self.failing.contains(&gpio) { pin.failing() } else { pin })
    }

    fn pwm(&mut self, gpio: u8, _frequency_hz: u32) -> Result<MockPwm, MockError> {
        self.claim(gpio)?;
        let pwm = MockPwm::new(gpio, self.trace.clone());
        Ok(if self.failing.contains(&gpio) { pwm.failing() } else { pwm })
    }

    fn release_output(&mut self, line: MockPin) {
        self.claimed.remove(&line.gpio());
    }

    fn release_pwm(&mut self, channel: MockPwm) {
        self.claimed.remove(&channel.gpio());
    }

    fn delay(&mut self) -> MockDelay {
        MockDelay::new(self.trace.clone())
    }
}
