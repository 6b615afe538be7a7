//! Shared motor registry for all request-serving front ends.
//!
//! `SharedRegistry` wraps one [`MotorRegistry`] plus the hardware provider
//! that new motors are claimed from. One lock covers both, so requests are
//! served strictly one at a time and a pulse frame never interleaves with
//! another command.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use train_pulse::hal::{MockHardware, SignalTrace};
//! use train_pulse::services::{MotorBackend, SharedRegistry};
//! use train_pulse::Config;
//!
//! let hw = MockHardware::new(SignalTrace::disabled());
//! let shared = Arc::new(SharedRegistry::from_config(&Config::default(), hw).unwrap());
//!
//! let state = shared.dispatch("TestTrain", "toggle", None).unwrap();
//! assert!(state.is_moving());
//! assert_eq!(shared.status().len(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;

use crate::config::Config;
use crate::error::{InvalidArgument, MotorError};
use crate::motor::{HardwareRegistry, MotorDevice, MotorRegistry, MotorState, PinAssignment, PulseSettings};
use crate::traits::MotorHardware;

// ============================================================================
// Service Error
// ============================================================================

/// A failed request, already mapped to an HTTP status.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable reason.
    pub message: String,
}

impl ServiceError {
    /// Create an error with an explicit status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

impl<E: fmt::Debug> From<MotorError<E>> for ServiceError {
    fn from(err: MotorError<E>) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Operations the request router needs from the motor side.
///
/// This abstraction lets the router be exercised without hardware and
/// shared between the axum and esp-idf-svc servers.
pub trait MotorBackend: Send + Sync {
    /// Snapshot of every motor, in insertion order.
    fn status(&self) -> Vec<MotorState>;

    /// Create a motor (replacing any with the same name) and return its state.
    ///
    /// A replacement takes the old motor's place and may reuse its lines.
    /// If the replacement fails, the old motor stays registered.
    fn add(&self, name: &str, frequency_hz: u32, pins: PinAssignment) -> Result<MotorState, ServiceError>;

    /// Run an action on a named motor and return its new state.
    fn dispatch(&self, name: &str, action: &str, value: Option<i32>) -> Result<MotorState, ServiceError>;
}

impl<B: MotorBackend + ?Sized> MotorBackend for Arc<B> {
    fn status(&self) -> Vec<MotorState> {
        (**self).status()
    }

    fn add(&self, name: &str, frequency_hz: u32, pins: PinAssignment) -> Result<MotorState, ServiceError> {
        (**self).add(name, frequency_hz, pins)
    }

    fn dispatch(&self, name: &str, action: &str, value: Option<i32>) -> Result<MotorState, ServiceError> {
        (**self).dispatch(name, action, value)
    }
}

// ============================================================================
// Shared Registry
// ============================================================================

struct Inner<H: MotorHardware> {
    registry: HardwareRegistry<H>,
    hardware: H,
}

/// Thread-safe registry plus the hardware provider new motors come from.
pub struct SharedRegistry<H: MotorHardware> {
    inner: Mutex<Inner<H>>,
    pulse: PulseSettings,
}

impl<H> SharedRegistry<H>
where
    H: MotorHardware,
{
    /// Wrap an existing registry.
    pub fn new(registry: HardwareRegistry<H>, hardware: H, pulse: PulseSettings) -> Self {
        Self {
            inner: Mutex::new(Inner { registry, hardware }),
            pulse,
        }
    }

    /// Build the configured fleet and wrap it.
    pub fn from_config(config: &Config, mut hardware: H) -> Result<Self, MotorError<H::Error>> {
        let registry = MotorRegistry::from_config(config, &mut hardware)?;
        Ok(Self::new(registry, hardware, PulseSettings::from(&config.pulse)))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<H>> {
        // A panic mid-request leaves the registry itself consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Access the registry with the lock held.
    ///
    /// The closure pattern keeps the lock from being held across await
    /// points.
    pub fn with_registry<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut HardwareRegistry<H>) -> R,
    {
        f(&mut self.lock().registry)
    }

    /// Pulse framing applied to motors created through [`MotorBackend::add`].
    pub fn pulse(&self) -> PulseSettings {
        self.pulse
    }
}

impl<H> MotorBackend for SharedRegistry<H>
where
    H: MotorHardware + Send,
    H::Output: Send,
    H::Pwm: Send,
    H::Delay: Send,
    H::Error: fmt::Debug,
{
    fn status(&self) -> Vec<MotorState> {
        self.lock().registry.states()
    }

    fn add(&self, name: &str, frequency_hz: u32, pins: PinAssignment) -> Result<MotorState, ServiceError> {
        // Bad requests never touch the running motor.
        if frequency_hz == 0 {
            return Err(MotorError::<H::Error>::from(InvalidArgument::Frequency).into());
        }
        pins.mode().map_err(MotorError::<H::Error>::Configuration)?;

        let mut inner = self.lock();
        let Inner { registry, hardware } = &mut *inner;

        // The old motor is stopped and its lines freed so the new one may
        // reuse them.
        let previous = registry.remove(name).map(|(index, mut old)| {
            if let Err(e) = old.stop() {
                warn!("motor '{}' did not stop before replacement: {:?}", name, e);
            }
            let rebuild = old.assignment().map(|pins| (old.frequency_hz(), pins));
            old.release(&mut *hardware);
            (index, rebuild)
        });

        match MotorDevice::from_assignment(name, frequency_hz, pins, &self.pulse, hardware) {
            Ok(device) => {
                let state = device.serialize();
                match previous {
                    Some((index, _)) => registry.insert(index, device),
                    None => registry.add(device),
                };
                Ok(state)
            }
            Err(e) => {
                if let Some((index, Some((old_frequency, old_pins)))) = previous {
                    match MotorDevice::from_assignment(name, old_frequency, old_pins, &self.pulse, hardware) {
                        Ok(old) => {
                            warn!("motor '{}' kept its previous pins after a failed replacement", name);
                            registry.insert(index, old);
                        }
                        Err(restore) => warn!("motor '{}' could not be restored: {:?}", name, restore),
                    }
                }
                Err(e.into())
            }
        }
    }

    fn dispatch(&self, name: &str, action: &str, value: Option<i32>) -> Result<MotorState, ServiceError> {
        Ok(self.lock().registry.dispatch_action(name, action, value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockHardware, SignalTrace};

    fn shared() -> SharedRegistry<MockHardware> {
        SharedRegistry::from_config(&Config::default(), MockHardware::new(SignalTrace::disabled())).unwrap()
    }

    #[test]
    fn status_lists_configured_fleet() {
        let states = shared().status();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name.as_str(), "TestTrain");
        assert_eq!(states[0].freq, 500);
    }

    #[test]
    fn add_then_dispatch() {
        let shared = shared();
        let state = shared.add("Shunter", 1_000, PinAssignment::bridge(14, 16, 15)).unwrap();
        assert_eq!(state.speed, 0);

        let state = shared.dispatch("Shunter", "forward", Some(30)).unwrap();
        assert_eq!(state.speed, 30);
        assert_eq!(shared.status().len(), 2);
    }

    #[test]
    fn add_maps_errors_to_status() {
        let shared = shared();

        let err = shared.add("Bad", 0, PinAssignment::direct(9)).unwrap_err();
        assert_eq!(err.status, 400);

        // GPIO4 already belongs to TestTrain
        let err = shared.add("Clash", 500, PinAssignment::direct(4)).unwrap_err();
        assert_eq!(err.status, 500);
    }

    #[test]
    fn readding_a_motor_reuses_its_lines() {
        let shared = shared();

        let state = shared.add("TestTrain", 800, PinAssignment::direct(4)).unwrap();
        assert_eq!(state.freq, 800);

        shared.add("Shunter", 1_000, PinAssignment::bridge(14, 16, 15)).unwrap();
        shared.add("Shunter", 2_000, PinAssignment::bridge(14, 16, 15)).unwrap();

        let states = shared.status();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name.as_str(), "TestTrain");
        assert_eq!(states[1].freq, 2_000);
    }

    #[test]
    fn moved_motor_frees_its_old_pins() {
        let shared = shared();
        shared.add("Other", 500, PinAssignment::direct(9)).unwrap();
        shared.add("Other", 500, PinAssignment::direct(10)).unwrap();

        assert!(shared.add("Third", 500, PinAssignment::direct(9)).is_ok());
        shared.with_registry(|registry| {
            assert!(registry.get("Other").is_ok());
            assert_eq!(registry.len(), 3);
        });
    }

    #[test]
    fn invalid_replacement_leaves_motor_running() {
        let shared = shared();
        shared.dispatch("TestTrain", "forward", None).unwrap();

        assert_eq!(shared.add("TestTrain", 0, PinAssignment::direct(4)).unwrap_err().status, 400);
        assert_eq!(
            shared.add("TestTrain", 500, PinAssignment::default()).unwrap_err().status,
            400
        );

        let states = shared.status();
        assert_eq!(states[0].speed, 50);
        assert!(states[0].is_moving());
    }

    #[test]
    fn failed_claim_restores_previous_motor() {
        let shared = shared();
        shared.add("Other", 500, PinAssignment::direct(9)).unwrap();

        // GPIO9 belongs to Other, so TestTrain cannot move there.
        let err = shared.add("TestTrain", 700, PinAssignment::direct(9)).unwrap_err();
        assert_eq!(err.status, 500);

        let states = shared.status();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name.as_str(), "TestTrain");
        assert_eq!(states[0].freq, 500);
        assert_eq!(states[0].speed, 0);
        assert!(shared.dispatch("TestTrain", "forward", None).is_ok());
    }

    #[test]
    fn dispatch_unknown_motor_is_404() {
        let err = shared().dispatch("Ghost", "stop", None).unwrap_err();
        assert_eq!(err.status, 404);
        assert!(err.message.contains("Ghost"));
    }

    #[test]
    fn with_registry_sees_changes() {
        let shared = shared();
        shared.dispatch("TestTrain", "forward", None).unwrap();

        let speed = shared.with_registry(|registry| registry.get("TestTrain").map(|d| d.speed()));
        assert_eq!(speed, Ok(50));
    }
}
