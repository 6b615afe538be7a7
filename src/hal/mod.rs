//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Recording test doubles for desktop development (requires `std`)
//! - `esp32`: ESP32 GPIO, LEDC PWM and soft-AP glue (requires `esp32` feature)

#[cfg(feature = "std")]
pub mod mock;

#[cfg(feature = "esp32")]
pub mod esp32;

#[cfg(feature = "std")]
pub use mock::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
