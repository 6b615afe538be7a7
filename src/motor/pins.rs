//! Pin sets and drive-mode classification.

use crate::error::PinConfigError;
use crate::traits::DriveMode;

/// Pins supplied for one motor.
///
/// Exactly one complete set must be present: a single `control` line
/// (DirectPulse) or `forward` + `backward` + `pwm` (BridgePwm). The same
/// type carries claimed lines (`PinConfig<P, W>`) and plain GPIO numbers
/// ([`PinAssignment`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinConfig<P, W> {
    /// Control line for the pulse-count decoder.
    pub control: Option<P>,
    /// Forward direction line of an H-bridge.
    pub forward: Option<P>,
    /// Backward direction line of an H-bridge.
    pub backward: Option<P>,
    /// PWM speed channel of an H-bridge.
    pub pwm: Option<W>,
}

/// GPIO numbers for one motor.
pub type PinAssignment = PinConfig<u8, u8>;

/// A validated, complete pin set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinSet<P, W> {
    /// One control line for the pulse-count decoder.
    Direct {
        /// Control line.
        control: P,
    },
    /// H-bridge direction lines plus speed channel.
    Bridge {
        /// Forward direction line.
        forward: P,
        /// Backward direction line.
        backward: P,
        /// PWM speed channel.
        pwm: W,
    },
}

impl<P, W> PinSet<P, W> {
    /// Drive mode this set selects.
    pub fn mode(&self) -> DriveMode {
        match self {
            PinSet::Direct { .. } => DriveMode::DirectPulse,
            PinSet::Bridge { .. } => DriveMode::BridgePwm,
        }
    }
}

impl<P, W> Default for PinConfig<P, W> {
    fn default() -> Self {
        Self {
            control: None,
            forward: None,
            backward: None,
            pwm: None,
        }
    }
}

impl<P, W> PinConfig<P, W> {
    /// DirectPulse pin set.
    pub fn direct(control: P) -> Self {
        Self {
            control: Some(control),
            ..Self::default()
        }
    }

    /// BridgePwm pin set.
    pub fn bridge(forward: P, backward: P, pwm: W) -> Self {
        Self {
            control: None,
            forward: Some(forward),
            backward: Some(backward),
            pwm: Some(pwm),
        }
    }

    /// Classify the pin set.
    ///
    /// # Errors
    ///
    /// Any combination other than exactly one complete set.
    ///
    /// # Example
    ///
    /// ```
    /// use train_pulse::{DriveMode, PinAssignment, PinConfigError};
    ///
    /// assert_eq!(PinAssignment::direct(4).mode(), Ok(DriveMode::DirectPulse));
    /// assert_eq!(PinAssignment::bridge(5, 7, 6).mode(), Ok(DriveMode::BridgePwm));
    ///
    /// let mixed = PinAssignment { control: Some(4), ..PinAssignment::bridge(5, 7, 6) };
    /// assert_eq!(mixed.mode(), Err(PinConfigError::MixedModes));
    /// ```
    pub fn mode(&self) -> Result<DriveMode, PinConfigError> {
        let forward = self.forward.is_some();
        let backward = self.backward.is_some();
        let pwm = self.pwm.is_some();
        let any_bridge = forward || backward || pwm;

        match (self.control.is_some(), any_bridge) {
            (false, false) => Err(PinConfigError::NoPins),
            (true, true) => Err(PinConfigError::MixedModes),
            (true, false) => Ok(DriveMode::DirectPulse),
            (false, true) if forward && backward && pwm => Ok(DriveMode::BridgePwm),
            (false, true) => Err(PinConfigError::IncompleteBridge {
                forward,
                backward,
                pwm,
            }),
        }
    }

    /// Validate and take the pins out as a [`PinSet`].
    ///
    /// Classifies exactly like [`mode`](Self::mode).
    pub fn into_set(self) -> Result<PinSet<P, W>, PinConfigError> {
        let PinConfig {
            control,
            forward,
            backward,
            pwm,
        } = self;

        match (control, forward, backward, pwm) {
            (Some(control), None, None, None) => Ok(PinSet::Direct { control }),
            (None, Some(forward), Some(backward), Some(pwm)) => Ok(PinSet::Bridge {
                forward,
                backward,
                pwm,
            }),
            (None, None, None, None) => Err(PinConfigError::NoPins),
            (Some(_), ..) => Err(PinConfigError::MixedModes),
            (None, forward, backward, pwm) => Err(PinConfigError::IncompleteBridge {
                forward: forward.is_some(),
                backward: backward.is_some(),
                pwm: pwm.is_some(),
            }),
        }
    }
}
