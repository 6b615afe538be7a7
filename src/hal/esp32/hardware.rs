//! GPIO, LEDC PWM and busy-wait delay for ESP32 boards.
//!
//! `esp-idf-hal` drivers already implement the `embedded-hal` traits, but
//! with different error types for GPIO and LEDC. The thin wrappers here
//! share one [`Esp32HalError`], which is what [`MotorHardware`] needs.
//!
//! Lines are claimed by GPIO number at runtime, since motors can be added
//! over HTTP. [`Esp32Hardware`] refuses to hand out a GPIO twice until the
//! line is released again.

use std::collections::BTreeSet;
use std::fmt;

use embedded_hal::{digital, pwm};
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::{
    config::TimerConfig, LedcDriver, LedcTimerDriver, LowSpeed, Resolution, CHANNEL0, CHANNEL1, CHANNEL2, CHANNEL3,
    TIMER0, TIMER1, TIMER2, TIMER3,
};
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;
use log::debug;

use crate::traits::{MotorHardware, OutputPin, SetDutyCycle};

/// Number of independent PWM outputs (one LEDC timer + channel each).
pub const PWM_SLOTS: u8 = 4;

/// PWM resolution (10-bit = 1024 steps)
const PWM_RESOLUTION: Resolution = Resolution::Bits10;

// ============================================================================
// Error
// ============================================================================

/// Failure of an ESP32 line or claim.
#[derive(Debug)]
pub enum Esp32HalError {
    /// Driver call failed.
    Esp(EspError),
    /// GPIO already belongs to another motor.
    PinInUse(u8),
    /// All LEDC timer/channel pairs are taken.
    NoFreePwm,
}

impl fmt::Display for Esp32HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Esp(e) => write!(f, "esp-idf error: {e}"),
            Self::PinInUse(gpio) => write!(f, "GPIO{gpio} already in use"),
            Self::NoFreePwm => write!(f, "all {PWM_SLOTS} PWM outputs in use"),
        }
    }
}

impl std::error::Error for Esp32HalError {}

impl From<EspError> for Esp32HalError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

impl digital::Error for Esp32HalError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for Esp32HalError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

// ============================================================================
// Output line
// ============================================================================

/// Push-pull output on one GPIO.
pub struct Esp32Output {
    gpio: u8,
    driver: PinDriver<'static, AnyOutputPin, Output>,
}

impl Esp32Output {
    /// GPIO number of this line.
    pub fn gpio(&self) -> u8 {
        self.gpio
    }
}

impl digital::ErrorType for Esp32Output {
    type Error = Esp32HalError;
}

impl OutputPin for Esp32Output {
    fn set_low(&mut self) -> Result<(), Esp32HalError> {
        Ok(self.driver.set_low()?)
    }

    fn set_high(&mut self) -> Result<(), Esp32HalError> {
        Ok(self.driver.set_high()?)
    }
}

// ============================================================================
// PWM channel
// ============================================================================

/// LEDC channel with its own timer, 10-bit resolution.
pub struct Esp32Pwm {
    gpio: u8,
    slot: usize,
    driver: LedcDriver<'static>,
    // Dropped after the channel.
    _timer: LedcTimerDriver<'static, LowSpeed>,
}

impl Esp32Pwm {
    /// GPIO number of this channel.
    pub fn gpio(&self) -> u8 {
        self.gpio
    }
}

impl pwm::ErrorType for Esp32Pwm {
    type Error = Esp32HalError;
}

impl SetDutyCycle for Esp32Pwm {
    fn max_duty_cycle(&self) -> u16 {
        self.driver.get_max_duty().min(u32::from(u16::MAX)) as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Esp32HalError> {
        Ok(self.driver.set_duty(u32::from(duty))?)
    }
}

// ============================================================================
// Pin provider
// ============================================================================

/// Hands out ESP32 lines by GPIO number.
///
/// # Example
///
/// ```ignore
/// use train_pulse::hal::esp32::Esp32Hardware;
/// use train_pulse::{Config, MotorRegistry};
///
/// let mut hw = Esp32Hardware::new();
/// let registry = MotorRegistry::from_config(&Config::default(), &mut hw)?;
/// ```
#[derive(Debug, Default)]
pub struct Esp32Hardware {
    claimed: BTreeSet<u8>,
    pwm_slots: [bool; PWM_SLOTS as usize],
}

impl Esp32Hardware {
    /// Create a provider with every GPIO and PWM slot free.
    ///
    /// The caller must not take the same GPIOs or LEDC timers 0-3 /
    /// channels 0-3 through `Peripherals` as well.
    pub fn new() -> Self {
        Self::default()
    }

    /// PWM slots still available.
    pub fn free_pwm_slots(&self) -> u8 {
        self.pwm_slots.iter().filter(|used| !**used).count() as u8
    }

    fn claim(&mut self, gpio: u8) -> Result<AnyOutputPin, Esp32HalError> {
        if !self.claimed.insert(gpio) {
            return Err(Esp32HalError::PinInUse(gpio));
        }
        // SAFETY: each GPIO number is handed out at most once until released.
        Ok(unsafe { AnyOutputPin::new(i32::from(gpio)) })
    }
}

/// Timer and channel for LEDC `slot`.
///
/// # Safety
///
/// `slot` must not be in use by another live [`Esp32Pwm`].
unsafe fn ledc(
    slot: usize,
    config: &TimerConfig,
    pin: AnyOutputPin,
) -> Result<(LedcTimerDriver<'static, LowSpeed>, LedcDriver<'static>), EspError> {
    match slot {
        0 => {
            let timer = LedcTimerDriver::new(TIMER0::<LowSpeed>::new(), config)?;
            let driver = LedcDriver::new(CHANNEL0::<LowSpeed>::new(), &timer, pin)?;
            Ok((timer, driver))
        }
        1 => {
            let timer = LedcTimerDriver::new(TIMER1::<LowSpeed>::new(), config)?;
            let driver = LedcDriver::new(CHANNEL1::<LowSpeed>::new(), &timer, pin)?;
            Ok((timer, driver))
        }
        2 => {
            let timer = LedcTimerDriver::new(TIMER2::<LowSpeed>::new(), config)?;
            let driver = LedcDriver::new(CHANNEL2::<LowSpeed>::new(), &timer, pin)?;
            Ok((timer, driver))
        }
        _ => {
            let timer = LedcTimerDriver::new(TIMER3::<LowSpeed>::new(), config)?;
            let driver = LedcDriver::new(CHANNEL3::<LowSpeed>::new(), &timer, pin)?;
            Ok((timer, driver))
        }
    }
}

impl MotorHardware for Esp32Hardware {
    type Error = Esp32HalError;
    type Output = Esp32Output;
    type Pwm = Esp32Pwm;
    type Delay = Ets;

    fn output(&mut self, gpio: u8) -> Result<Esp32Output, Esp32HalError> {
        let pin = self.claim(gpio)?;
        let driver = PinDriver::output(pin).map_err(|e| {
            self.claimed.remove(&gpio);
            Esp32HalError::Esp(e)
        })?;
        debug!("GPIO{} claimed as output", gpio);
        Ok(Esp32Output { gpio, driver })
    }

    fn pwm(&mut self, gpio: u8, frequency_hz: u32) -> Result<Esp32Pwm, Esp32HalError> {
        let slot = self
            .pwm_slots
            .iter()
            .position(|used| !used)
            .ok_or(Esp32HalError::NoFreePwm)?;
        let pin = self.claim(gpio)?;
        let config = TimerConfig::default()
            .frequency(frequency_hz.Hz())
            .resolution(PWM_RESOLUTION);

        // SAFETY: the slot is marked free, so no live channel uses its
        // timer/channel pair.
        let (timer, driver) = unsafe { ledc(slot, &config, pin) }.map_err(|e| {
            self.claimed.remove(&gpio);
            Esp32HalError::Esp(e)
        })?;
        self.pwm_slots[slot] = true;
        debug!("GPIO{} claimed as PWM slot {} @ {} Hz", gpio, slot, frequency_hz);
        Ok(Esp32Pwm {
            gpio,
            slot,
            driver,
            _timer: timer,
        })
    }

    fn release_output(&mut self, line: Esp32Output) {
        let gpio = line.gpio;
        drop(line);
        self.claimed.remove(&gpio);
        debug!("GPIO{} released", gpio);
    }

    fn release_pwm(&mut self, channel: Esp32Pwm) {
        let (gpio, slot) = (channel.gpio, channel.slot);
        drop(channel);
        self.claimed.remove(&gpio);
        self.pwm_slots[slot] = false;
        debug!("GPIO{} released, PWM slot {} free", gpio, slot);
    }

    fn delay(&mut self) -> Ets {
        Ets
    }
}
