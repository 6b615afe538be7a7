//! Trait definitions for hardware abstraction.
//!
//! The motor core only depends on the `embedded-hal` traits re-exported
//! here plus [`MotorHardware`], which claims lines by GPIO number.
//!
//! # Submodules
//!
//! - `hardware`: pin/PWM/delay traits, [`Direction`], [`Edge`], [`DriveMode`]

pub mod hardware;

pub use hardware::*;
