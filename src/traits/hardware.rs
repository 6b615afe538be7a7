//! Hardware abstraction for motor output lines, PWM channels and pulse timing.
//!
//! The motor core is written against the `embedded-hal` 1.0 traits so the
//! same code drives ESP32 GPIO, desktop mocks, or any other HAL:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`OutputPin`] | Pulse control line, H-bridge direction lines |
//! | [`SetDutyCycle`] | H-bridge speed channel |
//! | [`DelayNs`] | Busy-wait timing for pulse frames |
//! | [`MotorHardware`] | Claims the above by GPIO number at runtime |
//!
//! # Example
//!
//! ```rust
//! use train_pulse::hal::{MockHardware, SignalTrace};
//! use train_pulse::traits::MotorHardware;
//! use embedded_hal::digital::OutputPin;
//!
//! let mut hw = MockHardware::new(SignalTrace::new());
//! let mut line = hw.output(4).unwrap();
//! line.set_high().unwrap();
//! assert!(line.is_high());
//! ```

pub use embedded_hal::delay::DelayNs;
pub use embedded_hal::digital::OutputPin;
pub use embedded_hal::pwm::SetDutyCycle;

use core::fmt;

/// Direction of train travel.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Moving forward (forward line high on a bridge).
    Forward,
    /// Moving backward (backward line high on a bridge).
    Backward,
    /// Not moving.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_pulse::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Backward.as_str(), "backward");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polarity a pulse starts on.
///
/// A rising-edge pulse drives the line high for the first half period and
/// low for the second; a falling-edge pulse does the opposite. Either way
/// the frame ends with the line low.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Edge {
    /// Pulse starts high.
    #[default]
    Rising,
    /// Pulse starts low.
    Falling,
}

impl Edge {
    /// Level the line is driven to at the start of each pulse.
    #[inline]
    pub const fn leading_level_high(&self) -> bool {
        matches!(self, Edge::Rising)
    }
}

/// How a motor is driven. Fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DriveMode {
    /// Single control line feeding an external pulse-count decoder.
    DirectPulse,
    /// H-bridge with forward/backward lines and a PWM speed channel.
    BridgePwm,
}

impl DriveMode {
    /// Returns the mode as a snake_case string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DriveMode::DirectPulse => "direct_pulse",
            DriveMode::BridgePwm => "bridge_pwm",
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims motor hardware by GPIO number.
///
/// Devices defined in configuration, or added at runtime through the HTTP
/// API, only know pin numbers. A `MotorHardware` implementation turns those
/// numbers into driven lines. Output and PWM lines share one error type so
/// a motor has a single hardware failure type.
///
/// Lines handed back through `release_*` make their GPIO available again;
/// a replaced motor returns its lines this way.
///
/// # Example Implementation
///
/// ```rust,ignore
/// impl MotorHardware for MyBoard {
///     type Error = MyError;
///     type Output = MyPin;
///     type Pwm = MyPwm;
///     type Delay = MyBusyWait;
///
///     fn output(&mut self, gpio: u8) -> Result<MyPin, MyError> { /* ... */ }
///     fn pwm(&mut self, gpio: u8, frequency_hz: u32) -> Result<MyPwm, MyError> { /* ... */ }
///     fn delay(&mut self) -> MyBusyWait { MyBusyWait }
///     fn release_output(&mut self, line: MyPin) { /* ... */ }
///     fn release_pwm(&mut self, channel: MyPwm) { /* ... */ }
/// }
/// ```
pub trait MotorHardware {
    /// Error raised while claiming or driving a line.
    type Error: embedded_hal::digital::Error + embedded_hal::pwm::Error;
    /// Digital output line.
    type Output: OutputPin<Error = Self::Error>;
    /// PWM channel.
    type Pwm: SetDutyCycle<Error = Self::Error>;
    /// Busy-wait delay used for pulse frames.
    type Delay: DelayNs;

    /// Claim `gpio` as a push-pull output, initially low.
    fn output(&mut self, gpio: u8) -> Result<Self::Output, Self::Error>;

    /// Claim `gpio` as a PWM channel at `frequency_hz`, initially 0% duty.
    fn pwm(&mut self, gpio: u8, frequency_hz: u32) -> Result<Self::Pwm, Self::Error>;

    /// A delay source for one motor's pulse encoder.
    fn delay(&mut self) -> Self::Delay;

    /// Take back an output line so its GPIO can be claimed again.
    fn release_output(&mut self, line: Self::Output);

    /// Take back a PWM channel, freeing its GPIO and any timer it held.
    fn release_pwm(&mut self, channel: Self::Pwm);
}
