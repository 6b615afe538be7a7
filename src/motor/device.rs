//! One motor: logical state plus the lines that realize it.
//!
//! A [`MotorDevice`] runs in one of two fixed modes:
//!
//! - **DirectPulse**: a single control line feeds an external pulse-count
//!   decoder. Every intent becomes one [`CommandCode`] frame. The speed
//!   value is a logical counter only, the decoder keeps the real speed.
//! - **BridgePwm**: two direction lines plus a PWM channel drive an
//!   H-bridge directly. Speed maps linearly onto the full duty range.
//!
//! ```text
//!             forward / backward / toggle
//!   Stopped ------------------------------> Moving(direction, speed)
//!      ^                                        |   set_speed / change_speed
//!      +----------------------------------------+   forward / backward
//!                  stop / toggle
//! ```
//!
//! Speed and direction are tracked separately: `set_speed` and
//! `change_speed` never pick a direction.

use log::{debug, info};

use crate::config::{short_string, PulseConfig, ShortString};
use crate::error::{InvalidArgument, MotorError};
use crate::motor::pins::{PinAssignment, PinConfig, PinSet};
use crate::pulse::{CommandCode, PulseEncoder, DEFAULT_SYNC_GAP_MS};
use crate::traits::{DelayNs, Direction, DriveMode, Edge, MotorHardware, OutputPin, SetDutyCycle};

/// Speed used when a stopped motor is started without an explicit value.
pub const DEFAULT_SPEED: u8 = 50;

/// Upper bound of the speed scale.
pub const MAX_SPEED: u8 = 100;

/// Pulse framing applied to DirectPulse command frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseSettings {
    /// Idle LOW time before each frame.
    pub sync_gap_ms: u32,
    /// Level each pulse starts on.
    pub edge: Edge,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            sync_gap_ms: DEFAULT_SYNC_GAP_MS,
            edge: Edge::Rising,
        }
    }
}

impl From<&PulseConfig> for PulseSettings {
    fn from(config: &PulseConfig) -> Self {
        Self {
            sync_gap_ms: config.sync_gap_ms,
            edge: config.edge,
        }
    }
}

/// Reportable snapshot of one motor. Never touches hardware.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorState {
    /// Motor name.
    pub name: ShortString,
    /// Speed, 0-100.
    pub speed: u8,
    /// Carrier frequency in Hz.
    pub freq: u32,
    /// Drive mode.
    pub mode: DriveMode,
    /// Last commanded direction. Speed changes leave it alone.
    pub direction: Direction,
}

impl MotorState {
    /// Returns true if the motor was moving when the snapshot was taken.
    pub fn is_moving(&self) -> bool {
        self.speed > 0
    }
}

enum Drive<P, W, D> {
    Pulse(PulseEncoder<P, D>),
    Bridge { forward: P, backward: P, pwm: W },
}

/// A single motor in either DirectPulse or BridgePwm mode.
///
/// Owns its lines exclusively. Every operation takes `&mut self`, so a
/// frame or pin sequence can never interleave with another on the same
/// device.
pub struct MotorDevice<P, W, D> {
    name: ShortString,
    frequency_hz: u32,
    speed: u8,
    direction: Direction,
    sync_gap_ms: u32,
    assignment: Option<PinAssignment>,
    drive: Drive<P, W, D>,
}

/// A device built from a [`MotorHardware`] provider's line types.
pub type HardwareMotor<H> =
    MotorDevice<<H as MotorHardware>::Output, <H as MotorHardware>::Pwm, <H as MotorHardware>::Delay>;

fn clamp_speed(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_SPEED)) as u8
}

fn duty_for(speed: u8, max_duty: u16) -> u16 {
    (u32::from(speed) * u32::from(max_duty) / u32::from(MAX_SPEED)) as u16
}

/// Claim every line of `set`, or none of them.
fn claim_set<H: MotorHardware>(
    hw: &mut H,
    set: PinSet<u8, u8>,
    frequency_hz: u32,
) -> Result<PinSet<H::Output, H::Pwm>, MotorError<H::Error>> {
    match set {
        PinSet::Direct { control } => Ok(PinSet::Direct {
            control: hw.output(control).map_err(MotorError::Hardware)?,
        }),
        PinSet::Bridge {
            forward,
            backward,
            pwm,
        } => {
            let forward = hw.output(forward).map_err(MotorError::Hardware)?;
            let backward = match hw.output(backward) {
                Ok(line) => line,
                Err(e) => {
                    hw.release_output(forward);
                    return Err(MotorError::Hardware(e));
                }
            };
            let pwm = match hw.pwm(pwm, frequency_hz) {
                Ok(channel) => channel,
                Err(e) => {
                    hw.release_output(forward);
                    hw.release_output(backward);
                    return Err(MotorError::Hardware(e));
                }
            };
            Ok(PinSet::Bridge {
                forward,
                backward,
                pwm,
            })
        }
    }
}

impl<P, W, D> MotorDevice<P, W, D>
where
    P: OutputPin,
    W: SetDutyCycle<Error = P::Error>,
    D: DelayNs,
{
    /// Build a device from already claimed lines and leave it stopped.
    ///
    /// The stop is real: bridge lines go low with zero duty, a
    /// DirectPulse device transmits a STOP frame.
    ///
    /// # Errors
    ///
    /// - [`MotorError::InvalidArgument`] if `frequency_hz` is zero
    /// - [`MotorError::Configuration`] unless exactly one complete pin set is given
    /// - [`MotorError::Hardware`] if the initial stop fails
    pub fn new(
        name: &str,
        frequency_hz: u32,
        pins: PinConfig<P, W>,
        delay: D,
        pulse: PulseSettings,
    ) -> Result<Self, MotorError<P::Error>> {
        if frequency_hz == 0 {
            return Err(InvalidArgument::Frequency.into());
        }

        let mut device = Self::assemble(name, frequency_hz, pins.into_set()?, delay, pulse);
        device.stop()?;
        Ok(device)
    }

    /// Build a device from GPIO numbers, claiming lines through `hw`.
    ///
    /// The assignment is validated before any line is claimed. If a claim
    /// or the initial stop fails, every line claimed so far goes back to
    /// `hw`.
    pub fn from_assignment<H>(
        name: &str,
        frequency_hz: u32,
        pins: PinAssignment,
        pulse: &PulseSettings,
        hw: &mut H,
    ) -> Result<Self, MotorError<P::Error>>
    where
        H: MotorHardware<Output = P, Pwm = W, Delay = D, Error = P::Error>,
    {
        if frequency_hz == 0 {
            return Err(InvalidArgument::Frequency.into());
        }

        let claimed = claim_set(hw, pins.into_set()?, frequency_hz)?;
        let mut device = Self::assemble(name, frequency_hz, claimed, hw.delay(), *pulse);
        device.assignment = Some(pins);

        if let Err(e) = device.stop() {
            device.release(hw);
            return Err(e);
        }
        Ok(device)
    }

    fn assemble(name: &str, frequency_hz: u32, pins: PinSet<P, W>, delay: D, pulse: PulseSettings) -> Self {
        let drive = match pins {
            PinSet::Direct { control } => Drive::Pulse(PulseEncoder::new(control, delay, pulse.edge)),
            PinSet::Bridge {
                forward,
                backward,
                pwm,
            } => Drive::Bridge {
                forward,
                backward,
                pwm,
            },
        };

        let device = Self {
            name: short_string(name),
            frequency_hz,
            speed: 0,
            direction: Direction::Stopped,
            sync_gap_ms: pulse.sync_gap_ms,
            assignment: None,
            drive,
        };
        info!(
            "motor '{}' created: {} @ {} Hz",
            device.name,
            device.mode(),
            frequency_hz
        );
        device
    }

    /// Hand every line back to `hw`, consuming the device.
    ///
    /// Lines keep their last level; [`stop`](Self::stop) first to leave
    /// the motor idle.
    pub fn release<H>(self, hw: &mut H)
    where
        H: MotorHardware<Output = P, Pwm = W, Delay = D, Error = P::Error>,
    {
        info!("motor '{}' released", self.name);
        match self.drive {
            Drive::Pulse(encoder) => {
                let (control, _delay) = encoder.into_parts();
                hw.release_output(control);
            }
            Drive::Bridge {
                forward,
                backward,
                pwm,
            } => {
                hw.release_output(forward);
                hw.release_output(backward);
                hw.release_pwm(pwm);
            }
        }
    }

    /// GPIO numbers the device was built from, if it was claimed through
    /// [`from_assignment`](Self::from_assignment).
    #[inline]
    pub fn assignment(&self) -> Option<PinAssignment> {
        self.assignment
    }

    /// Motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Carrier frequency.
    #[inline]
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Current speed, 0-100.
    #[inline]
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Last commanded direction.
    ///
    /// Only `forward`, `backward`, `stop` and `toggle` change it; speed
    /// changes never do. Use [`is_moving`](Self::is_moving) for motion.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Drive mode, fixed at construction.
    pub fn mode(&self) -> DriveMode {
        match self.drive {
            Drive::Pulse(_) => DriveMode::DirectPulse,
            Drive::Bridge { .. } => DriveMode::BridgePwm,
        }
    }

    /// Returns true if speed is above zero.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.speed > 0
    }

    /// Run forward.
    ///
    /// With `speed`, that value (clamped) becomes the new speed; without,
    /// a stopped motor starts at [`DEFAULT_SPEED`] and a moving one keeps
    /// its speed.
    pub fn forward(&mut self, speed: Option<i32>) -> Result<(), MotorError<P::Error>> {
        self.run(Direction::Forward, speed)
    }

    /// Run backward. Mirror of [`forward`](Self::forward).
    pub fn backward(&mut self, speed: Option<i32>) -> Result<(), MotorError<P::Error>> {
        self.run(Direction::Backward, speed)
    }

    fn run(&mut self, direction: Direction, speed: Option<i32>) -> Result<(), MotorError<P::Error>> {
        let speed = match speed {
            Some(value) => clamp_speed(value),
            None if self.speed == 0 => DEFAULT_SPEED,
            None => self.speed,
        };
        let forward_high = direction == Direction::Forward;

        match &mut self.drive {
            Drive::Pulse(encoder) => {
                let code = if forward_high {
                    CommandCode::Forward
                } else {
                    CommandCode::Backward
                };
                encoder.send(code, self.frequency_hz, self.sync_gap_ms)?;
            }
            Drive::Bridge {
                forward,
                backward,
                pwm,
            } => {
                if forward_high {
                    backward.set_low().map_err(MotorError::Hardware)?;
                    forward.set_high().map_err(MotorError::Hardware)?;
                } else {
                    forward.set_low().map_err(MotorError::Hardware)?;
                    backward.set_high().map_err(MotorError::Hardware)?;
                }
                apply_duty(pwm, speed)?;
            }
        }

        self.speed = speed;
        self.direction = direction;
        debug!("motor '{}' {} at {}%", self.name, direction, speed);
        Ok(())
    }

    /// Stop. Speed is 0 afterwards whatever the prior state.
    pub fn stop(&mut self) -> Result<(), MotorError<P::Error>> {
        match &mut self.drive {
            Drive::Pulse(encoder) => {
                encoder.send(CommandCode::Stop, self.frequency_hz, self.sync_gap_ms)?;
            }
            Drive::Bridge {
                forward,
                backward,
                pwm,
            } => {
                forward.set_low().map_err(MotorError::Hardware)?;
                backward.set_low().map_err(MotorError::Hardware)?;
                pwm.set_duty_cycle_fully_off().map_err(MotorError::Hardware)?;
            }
        }

        self.speed = 0;
        self.direction = Direction::Stopped;
        debug!("motor '{}' stopped", self.name);
        Ok(())
    }

    /// Set speed directly (clamped to 0-100). BridgePwm only.
    ///
    /// Direction lines and [`direction`](Self::direction) are left as they
    /// are, so a stopped motor given a speed reports `Stopped` with a
    /// non-zero speed until `forward` or `backward` picks a direction.
    ///
    /// # Errors
    ///
    /// [`MotorError::UnsupportedOperation`] in DirectPulse mode, which has
    /// no continuous speed channel.
    pub fn set_speed(&mut self, percent: i32) -> Result<(), MotorError<P::Error>> {
        let speed = clamp_speed(percent);
        match &mut self.drive {
            Drive::Pulse(_) => {
                return Err(MotorError::UnsupportedOperation {
                    operation: "set_speed",
                    mode: DriveMode::DirectPulse,
                })
            }
            Drive::Bridge { pwm, .. } => apply_duty(pwm, speed)?,
        }
        self.speed = speed;
        debug!("motor '{}' speed {}%", self.name, speed);
        Ok(())
    }

    /// Adjust speed by `delta` percent.
    ///
    /// BridgePwm re-applies duty for the clamped result. DirectPulse
    /// moves the clamped counter and sends one SPEEDUP (`delta > 0`) or
    /// SPEEDDOWN (`delta < 0`) frame; a zero delta sends nothing.
    pub fn change_speed(&mut self, delta: i32) -> Result<(), MotorError<P::Error>> {
        let target = i32::from(self.speed).saturating_add(delta);
        let encoder = match &mut self.drive {
            Drive::Pulse(encoder) => encoder,
            Drive::Bridge { .. } => return self.set_speed(target),
        };

        let code = match delta {
            d if d > 0 => CommandCode::SpeedUp,
            d if d < 0 => CommandCode::SpeedDown,
            _ => return Ok(()),
        };
        encoder.send(code, self.frequency_hz, self.sync_gap_ms)?;
        self.speed = clamp_speed(target);
        debug!("motor '{}' speed counter {}%", self.name, self.speed);
        Ok(())
    }

    /// Stop if moving, otherwise start forward at the default speed.
    pub fn toggle(&mut self) -> Result<(), MotorError<P::Error>> {
        if self.is_moving() {
            self.stop()
        } else {
            self.forward(None)
        }
    }

    /// Snapshot for reporting.
    pub fn serialize(&self) -> MotorState {
        MotorState {
            name: self.name.clone(),
            speed: self.speed,
            freq: self.frequency_hz,
            mode: self.mode(),
            direction: self.direction,
        }
    }
}

fn apply_duty<W: SetDutyCycle>(pwm: &mut W, speed: u8) -> Result<(), MotorError<W::Error>> {
    let duty = duty_for(speed, pwm.max_duty_cycle());
    pwm.set_duty_cycle(duty).map_err(MotorError::Hardware)
}

impl<P, W, D> core::fmt::Debug for MotorDevice<P, W, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorDevice")
            .field("name", &self.name)
            .field("frequency_hz", &self.frequency_hz)
            .field("speed", &self.speed)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
