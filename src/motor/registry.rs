//! Named lookup and action dispatch across all motors.

use alloc::vec::Vec;

use log::{info, warn};

use crate::config::{short_string, Config};
use crate::error::{InvalidArgument, MotorError};
use crate::motor::device::{MotorDevice, MotorState, PulseSettings};
use crate::traits::{DelayNs, MotorHardware, OutputPin, SetDutyCycle};

/// Step applied by the `inc` and `dec` actions.
pub const SPEED_STEP: i32 = 10;

/// An action that can be dispatched to a named motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorAction {
    /// Run forward.
    Forward,
    /// Run backward.
    Backward,
    /// Stop.
    Stop,
    /// Set speed; needs a value.
    SetSpeed,
    /// Speed up by [`SPEED_STEP`].
    IncSpeed,
    /// Slow down by [`SPEED_STEP`].
    DecSpeed,
    /// Stop if moving, otherwise start.
    Toggle,
}

impl MotorAction {
    /// Parse the action segment of a request. Case-sensitive.
    ///
    /// ```
    /// use train_pulse::MotorAction;
    ///
    /// assert_eq!(MotorAction::parse("inc"), Some(MotorAction::IncSpeed));
    /// assert_eq!(MotorAction::parse("speed"), Some(MotorAction::SetSpeed));
    /// assert_eq!(MotorAction::parse("warp"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "forward" => Some(Self::Forward),
            "backward" => Some(Self::Backward),
            "stop" => Some(Self::Stop),
            "speed" => Some(Self::SetSpeed),
            "inc" => Some(Self::IncSpeed),
            "dec" => Some(Self::DecSpeed),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }

    /// Text form accepted by [`parse`](Self::parse).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Stop => "stop",
            Self::SetSpeed => "speed",
            Self::IncSpeed => "inc",
            Self::DecSpeed => "dec",
            Self::Toggle => "toggle",
        }
    }

    /// Apply this action to one device.
    pub fn apply<P, W, D>(self, device: &mut MotorDevice<P, W, D>, value: Option<i32>) -> Result<(), MotorError<P::Error>>
    where
        P: OutputPin,
        W: SetDutyCycle<Error = P::Error>,
        D: DelayNs,
    {
        match self {
            Self::Forward => device.forward(value),
            Self::Backward => device.backward(value),
            Self::Stop => device.stop(),
            Self::SetSpeed => {
                let percent = value.ok_or(InvalidArgument::MissingValue("speed"))?;
                device.set_speed(percent)
            }
            Self::IncSpeed => device.change_speed(SPEED_STEP),
            Self::DecSpeed => device.change_speed(-SPEED_STEP),
            Self::Toggle => device.toggle(),
        }
    }
}

/// All motors, keyed by unique name.
///
/// Insertion order is kept for reporting. Adding a device under an
/// existing name replaces it in place.
pub struct MotorRegistry<P, W, D> {
    devices: Vec<MotorDevice<P, W, D>>,
}

/// A registry of devices built from a [`MotorHardware`] provider.
pub type HardwareRegistry<H> =
    MotorRegistry<<H as MotorHardware>::Output, <H as MotorHardware>::Pwm, <H as MotorHardware>::Delay>;

impl<P, W, D> Default for MotorRegistry<P, W, D> {
    fn default() -> Self {
        Self { devices: Vec::new() }
    }
}

impl<P, W, D> MotorRegistry<P, W, D>
where
    P: OutputPin,
    W: SetDutyCycle<Error = P::Error>,
    D: DelayNs,
{
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured motor, in order.
    ///
    /// Stops at the first motor that fails to build.
    pub fn from_config<H>(config: &Config, hw: &mut H) -> Result<Self, MotorError<P::Error>>
    where
        H: MotorHardware<Output = P, Pwm = W, Delay = D, Error = P::Error>,
    {
        let pulse = PulseSettings::from(&config.pulse);
        let mut registry = Self::new();
        for motor in &config.motors {
            let device = MotorDevice::from_assignment(&motor.name, motor.frequency_hz, motor.pins, &pulse, hw)?;
            registry.add(device);
        }
        Ok(registry)
    }

    /// Insert `device`, replacing any device with the same name.
    ///
    /// A replacement keeps the old device's position and the old device
    /// is handed back, so its lines can be released.
    pub fn add(&mut self, device: MotorDevice<P, W, D>) -> Option<MotorDevice<P, W, D>> {
        let end = self.devices.len();
        self.insert(end, device)
    }

    /// Insert `device` at `index` (clamped to the end), or replace a
    /// device with the same name in its current position.
    pub fn insert(&mut self, index: usize, device: MotorDevice<P, W, D>) -> Option<MotorDevice<P, W, D>> {
        match self.position(device.name()) {
            Some(existing) => {
                warn!("motor '{}' replaced", device.name());
                Some(core::mem::replace(&mut self.devices[existing], device))
            }
            None => {
                info!("motor '{}' added", device.name());
                self.devices.insert(index.min(self.devices.len()), device);
                None
            }
        }
    }

    /// Take the named device out, along with the position it held.
    pub fn remove(&mut self, name: &str) -> Option<(usize, MotorDevice<P, W, D>)> {
        let index = self.position(name)?;
        info!("motor '{}' removed", name);
        Some((index, self.devices.remove(index)))
    }

    // Stored names are truncated, so compare against the truncated key.
    fn position(&self, name: &str) -> Option<usize> {
        let key = short_string(name);
        self.devices.iter().position(|d| d.name() == key.as_str())
    }

    /// Look up a device.
    ///
    /// # Errors
    ///
    /// [`MotorError::NotFound`] if no device has this name.
    pub fn get(&self, name: &str) -> Result<&MotorDevice<P, W, D>, MotorError<P::Error>> {
        match self.position(name) {
            Some(index) => Ok(&self.devices[index]),
            None => Err(MotorError::NotFound(short_string(name))),
        }
    }

    /// Look up a device for mutation.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut MotorDevice<P, W, D>, MotorError<P::Error>> {
        match self.position(name) {
            Some(index) => Ok(&mut self.devices[index]),
            None => Err(MotorError::NotFound(short_string(name))),
        }
    }

    /// Returns true if a device has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All devices in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &MotorDevice<P, W, D>> {
        self.devices.iter()
    }

    /// Snapshot of every device, in insertion order.
    pub fn states(&self) -> Vec<MotorState> {
        self.devices.iter().map(MotorDevice::serialize).collect()
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no device is registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Run `action` on the named device and return its new state.
    ///
    /// An unrecognized action leaves the device untouched and still
    /// returns its state.
    ///
    /// # Errors
    ///
    /// - [`MotorError::NotFound`] for an unknown name (checked first)
    /// - [`MotorError::InvalidArgument`] for `speed` without a value
    /// - whatever the device operation returns
    pub fn dispatch_action(
        &mut self,
        name: &str,
        action: &str,
        value: Option<i32>,
    ) -> Result<MotorState, MotorError<P::Error>> {
        let device = self.get_mut(name)?;
        match MotorAction::parse(action) {
            Some(action) => action.apply(&mut *device, value)?,
            None => warn!("motor '{}': ignoring unknown action '{}'", name, action),
        }
        Ok(device.serialize())
    }
}

impl<P, W, D> core::fmt::Debug for MotorRegistry<P, W, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.devices.iter()).finish()
    }
}
