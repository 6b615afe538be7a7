//! Error types for pulse encoding, motor devices and the registry.
//!
//! Hardware failures are carried as the generic `E` of the lines involved
//! and are never retried. Everything else is a caller mistake that can be
//! reported back (for example as an HTTP status).

use crate::config::ShortString;
use crate::pulse::COMMAND_MAX_COUNT;
use crate::traits::DriveMode;

/// A pin combination that does not describe exactly one drive mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PinConfigError {
    /// Neither a control pin nor any bridge pin was given.
    #[error("no pins given: provide a control pin, or forward, backward and pwm pins")]
    NoPins,
    /// A control pin was combined with one or more bridge pins.
    #[error("control pin cannot be combined with bridge pins")]
    MixedModes,
    /// Some but not all bridge pins were given.
    #[error("incomplete bridge pin set (forward: {forward}, backward: {backward}, pwm: {pwm})")]
    IncompleteBridge {
        /// Whether a forward pin was given.
        forward: bool,
        /// Whether a backward pin was given.
        backward: bool,
        /// Whether a pwm pin was given.
        pwm: bool,
    },
}

/// An argument outside its accepted range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    /// Pulse count outside `1..=COMMAND_MAX_COUNT`.
    #[error("pulse count {0} outside 1..={max}", max = COMMAND_MAX_COUNT)]
    PulseCount(u8),
    /// Frequency must be at least 1 Hz.
    #[error("frequency must be greater than 0 Hz")]
    Frequency,
    /// An action that needs a value was sent without one.
    #[error("action `{0}` requires a value")]
    MissingValue(&'static str),
}

/// Failure while transmitting a pulse frame.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransmitError<E> {
    /// Frame rejected before any pin was touched.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// Writing the output line failed.
    #[error("hardware failure: {0:?}")]
    Hardware(E),
}

/// Errors from motor devices and the registry.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MotorError<E> {
    /// Bad pin combination at construction.
    #[error("configuration error: {0}")]
    Configuration(#[from] PinConfigError),
    /// Out-of-range command, frequency or missing value.
    #[error("invalid argument: {0}")]
    InvalidArgument(InvalidArgument),
    /// No device with this name.
    #[error("motor `{0}` not found")]
    NotFound(ShortString),
    /// Operation has no meaning in the device's drive mode.
    #[error("`{operation}` is not supported in {mode} mode")]
    UnsupportedOperation {
        /// Name of the rejected operation.
        operation: &'static str,
        /// Drive mode of the device.
        mode: DriveMode,
    },
    /// Writing a pin or PWM channel failed.
    #[error("hardware failure: {0:?}")]
    Hardware(E),
}

impl<E> From<InvalidArgument> for MotorError<E> {
    fn from(err: InvalidArgument) -> Self {
        MotorError::InvalidArgument(err)
    }
}

impl<E> From<TransmitError<E>> for MotorError<E> {
    fn from(err: TransmitError<E>) -> Self {
        match err {
            TransmitError::InvalidArgument(e) => MotorError::InvalidArgument(e),
            TransmitError::Hardware(e) => MotorError::Hardware(e),
        }
    }
}

impl<E> MotorError<E> {
    /// HTTP-equivalent status for this error.
    ///
    /// Caller mistakes map to 400, unknown devices to 404 and hardware
    /// failures to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            MotorError::Configuration(_)
            | MotorError::InvalidArgument(_)
            | MotorError::UnsupportedOperation { .. } => 400,
            MotorError::NotFound(_) => 404,
            MotorError::Hardware(_) => 500,
        }
    }

    /// Returns true if this is a hardware failure.
    pub fn is_hardware(&self) -> bool {
        matches!(self, MotorError::Hardware(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::short_string;

    #[test]
    fn status_codes() {
        let err: MotorError<()> = PinConfigError::NoPins.into();
        assert_eq!(err.status_code(), 400);

        let err: MotorError<()> = InvalidArgument::Frequency.into();
        assert_eq!(err.status_code(), 400);

        let err: MotorError<()> = MotorError::NotFound(short_string("X"));
        assert_eq!(err.status_code(), 404);

        let err: MotorError<()> = MotorError::UnsupportedOperation {
            operation: "set_speed",
            mode: DriveMode::DirectPulse,
        };
        assert_eq!(err.status_code(), 400);

        let err: MotorError<()> = MotorError::Hardware(());
        assert_eq!(err.status_code(), 500);
        assert!(err.is_hardware());
    }

    #[test]
    fn transmit_error_flattens() {
        let err: MotorError<u8> = TransmitError::Hardware(7u8).into();
        assert_eq!(err, MotorError::Hardware(7));

        let err: MotorError<u8> = TransmitError::InvalidArgument(InvalidArgument::PulseCount(9)).into();
        assert_eq!(err, MotorError::InvalidArgument(InvalidArgument::PulseCount(9)));
    }

    #[test]
    fn messages_name_the_problem() {
        let msg = format!(
            "{}",
            PinConfigError::IncompleteBridge {
                forward: true,
                backward: false,
                pwm: true
            }
        );
        assert!(msg.contains("backward: false"));

        let msg = format!("{}", InvalidArgument::PulseCount(0));
        assert_eq!(msg, "pulse count 0 outside 1..=8");

        let err: MotorError<()> = MotorError::UnsupportedOperation {
            operation: "set_speed",
            mode: DriveMode::DirectPulse,
        };
        assert_eq!(
            format!("{}", err),
            "`set_speed` is not supported in direct_pulse mode"
        );
    }
}
