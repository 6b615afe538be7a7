//! Motor devices and the registry that owns them.
//!
//! - `pins`: pin sets and drive-mode classification
//! - `device`: [`MotorDevice`], one motor in DirectPulse or BridgePwm mode
//! - `registry`: [`MotorRegistry`], named lookup and action dispatch

pub mod device;
pub mod pins;
pub mod registry;

pub use device::{HardwareMotor, MotorDevice, MotorState, PulseSettings, DEFAULT_SPEED, MAX_SPEED};
pub use pins::{PinAssignment, PinConfig, PinSet};
pub use registry::{HardwareRegistry, MotorAction, MotorRegistry, SPEED_STEP};
