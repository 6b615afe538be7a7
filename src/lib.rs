//! # train-pulse
//!
//! Model train motor control over GPIO, with a minimal HTTP interface.
//!
//! ## Features
//!
//! - **Two drive modes**: an H-bridge driven directly (two direction lines
//!   plus PWM), or a single line speaking a pulse-count protocol to an
//!   external discrete decoder
//! - **Pulse encoder**: sync gap + N pulses at a given frequency, also
//!   usable as a standalone OOK transmitter
//! - **Registry**: named motors with REST-style action dispatch
//! - **Hardware abstraction**: everything is generic over `embedded-hal`
//!   traits, with mocks for desktop testing
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - `embedded-hal` re-exports, [`MotorHardware`] and shared enums
//! - `pulse` - command codes and pulse-frame transmission
//! - `motor` - [`MotorDevice`] and [`MotorRegistry`]
//! - `config` - builder-style configuration with `heapless` storage
//! - `services` - request routing and HTTP servers (feature-gated)
//! - `hal` - concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use train_pulse::{
//!     hal::{MockHardware, SignalTrace},
//!     Config, MotorRegistry,
//! };
//!
//! let trace = SignalTrace::new();
//! let mut hw = MockHardware::new(trace.clone());
//!
//! // Default fleet: one DirectPulse motor "TestTrain" on GPIO4
//! let mut registry = MotorRegistry::from_config(&Config::default(), &mut hw).unwrap();
//!
//! let state = registry.dispatch_action("TestTrain", "forward", None).unwrap();
//! assert_eq!(state.speed, 50);
//!
//! let err = registry.dispatch_action("Ghost", "stop", None).unwrap_err();
//! assert_eq!(err.status_code(), 404);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Error types and their HTTP status mapping.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Motor devices, pin sets and the registry.
pub mod motor;
/// Pulse-count framing and command codes.
pub mod pulse;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Request routing and HTTP servers (feature-gated).
#[cfg(feature = "http")]
pub mod services;

// Re-exports for convenience
pub use error::{InvalidArgument, MotorError, PinConfigError, TransmitError};
pub use motor::{
    HardwareMotor, HardwareRegistry, MotorAction, MotorDevice, MotorRegistry, MotorState, PinAssignment, PinConfig,
    PinSet, PulseSettings,
};
pub use pulse::{CommandCode, PulseEncoder, PulseFrame, COMMAND_MAX_COUNT};
pub use traits::{Direction, DriveMode, Edge, MotorHardware};

// Config re-exports
pub use config::{AccessPointConfig, Config, MotorConfig, PulseConfig, WebConfig};
