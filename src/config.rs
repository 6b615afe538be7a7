//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless` strings and vectors for `no_std` compatibility while
//! remaining ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use train_pulse::config::{Config, MotorConfig, WebConfig};
//! use train_pulse::PinAssignment;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.motors.len(), 1);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_web(WebConfig::default().with_port(8080))
//!     .with_motor(MotorConfig::new("Shunter", 1_000, PinAssignment::bridge(5, 7, 6)));
//! assert_eq!(config.motors.len(), 2);
//! ```

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::motor::PinAssignment;
use crate::pulse::DEFAULT_SYNC_GAP_MS;
use crate::traits::Edge;

/// Maximum length for short config strings (SSIDs, motor names)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum number of motors in a configured fleet
pub const MAX_MOTORS: usize = 8;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Byte length of the longest prefix of `s` that fits in `cap` bytes
/// without splitting a character.
fn fitting_prefix(s: &str, cap: usize) -> &str {
    if s.len() <= cap {
        return s;
    }
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= cap)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(fitting_prefix(s, MAX_SHORT_STRING));
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Soft access point configuration
    pub access_point: AccessPointConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Pulse framing shared by all DirectPulse motors
    pub pulse: PulseConfig,
    /// Motors created at startup, in order
    pub motors: HVec<MotorConfig, MAX_MOTORS>,
}

impl Default for Config {
    fn default() -> Self {
        let mut motors = HVec::new();
        let _ = motors.push(MotorConfig::default());
        Self {
            access_point: AccessPointConfig::default(),
            web: WebConfig::default(),
            pulse: PulseConfig::default(),
            motors,
        }
    }
}

impl Config {
    /// Set access point configuration
    pub fn with_access_point(mut self, access_point: AccessPointConfig) -> Self {
        self.access_point = access_point;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set pulse framing configuration
    pub fn with_pulse(mut self, pulse: PulseConfig) -> Self {
        self.pulse = pulse;
        self
    }

    /// Append a motor. Ignored once [`MAX_MOTORS`] are configured.
    pub fn with_motor(mut self, motor: MotorConfig) -> Self {
        let _ = self.motors.push(motor);
        self
    }

    /// Drop all configured motors
    pub fn without_motors(mut self) -> Self {
        self.motors.clear();
        self
    }
}

// ============================================================================
// Access Point Config
// ============================================================================

/// Soft access point configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessPointConfig {
    /// Network name broadcast by the controller
    pub ssid: ShortString,
    /// WPA2 passphrase (empty = open network)
    pub password: ShortString,
    /// WiFi channel
    pub channel: u8,
    /// Maximum simultaneous stations
    pub max_connections: u16,
    /// Whether the access point is started
    pub enabled: bool,
}

impl Default for AccessPointConfig {
    fn default() -> Self {
        Self {
            ssid: short_string("PicoMotor"),
            password: short_string("12345678"),
            channel: 1,
            max_connections: 4,
            enabled: true,
        }
    }
}

impl AccessPointConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the passphrase
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the channel
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set the station limit
    pub fn with_max_connections(mut self, max: u16) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable or disable the access point
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if the network is open (no passphrase)
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether the HTTP server is started at all
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Pulse Config
// ============================================================================

/// Pulse framing for DirectPulse motors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulseConfig {
    /// Idle LOW time before each frame, in milliseconds
    pub sync_gap_ms: u32,
    /// Level each pulse starts on
    pub edge: Edge,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            sync_gap_ms: DEFAULT_SYNC_GAP_MS,
            edge: Edge::Rising,
        }
    }
}

impl PulseConfig {
    /// Set the sync gap
    pub fn with_sync_gap_ms(mut self, ms: u32) -> Self {
        self.sync_gap_ms = ms;
        self
    }

    /// Set the pulse edge
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }
}

// ============================================================================
// Motor Config
// ============================================================================

/// One motor created at startup
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorConfig {
    /// Unique motor name (also the URL segment)
    pub name: ShortString,
    /// Pulse or PWM carrier frequency
    pub frequency_hz: u32,
    /// GPIO numbers; exactly one complete set
    pub pins: PinAssignment,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            name: short_string("TestTrain"),
            frequency_hz: 500,
            pins: PinAssignment::direct(4),
        }
    }
}

impl MotorConfig {
    /// Describe a motor
    pub fn new(name: &str, frequency_hz: u32, pins: PinAssignment) -> Self {
        Self {
            name: short_string(name),
            frequency_hz,
            pins,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DriveMode;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.web.port, 80);
        assert_eq!(config.pulse.sync_gap_ms, 30);
        assert_eq!(config.motors.len(), 1);
    }

    #[test]
    fn default_fleet_is_one_direct_pulse_train() {
        let config = Config::default();
        let motor = &config.motors[0];
        assert_eq!(motor.name.as_str(), "TestTrain");
        assert_eq!(motor.frequency_hz, 500);
        assert_eq!(motor.pins.control, Some(4));
        assert_eq!(motor.pins.mode(), Ok(DriveMode::DirectPulse));
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 17 four-byte characters = 68 bytes; only 16 fit
        let input = "\u{1F682}".repeat(17);
        let s = short_string(&input);
        assert_eq!(s.len(), 64);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());

        let input = format!("a{}", "\u{1F682}".repeat(16));
        let s = short_string(&input);
        assert_eq!(s.len(), 61);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_access_point(AccessPointConfig::default().with_ssid("Layout"))
            .with_web(WebConfig::default().with_port(3000))
            .with_pulse(PulseConfig::default().with_edge(Edge::Falling))
            .with_motor(MotorConfig::new("Shunter", 1_000, PinAssignment::bridge(5, 7, 6)));

        assert_eq!(config.access_point.ssid.as_str(), "Layout");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.pulse.edge, Edge::Falling);
        assert_eq!(config.motors[1].name.as_str(), "Shunter");
        assert_eq!(config.motors[1].pins.mode(), Ok(DriveMode::BridgePwm));
    }

    #[test]
    fn motor_list_is_bounded() {
        let mut config = Config::default().without_motors();
        for i in 0..(MAX_MOTORS + 3) {
            let name = format!("m{i}");
            config = config.with_motor(MotorConfig::new(&name, 500, PinAssignment::direct(i as u8)));
        }
        assert_eq!(config.motors.len(), MAX_MOTORS);
        assert_eq!(config.motors[MAX_MOTORS - 1].name.as_str(), "m7");
    }

    // =========================================================================
    // AccessPointConfig Tests
    // =========================================================================

    #[test]
    fn access_point_default() {
        let ap = AccessPointConfig::default();
        assert_eq!(ap.ssid.as_str(), "PicoMotor");
        assert_eq!(ap.password.as_str(), "12345678");
        assert_eq!(ap.channel, 1);
        assert_eq!(ap.max_connections, 4);
        assert!(ap.enabled);
        assert!(!ap.is_open());
    }

    #[test]
    fn access_point_builder() {
        let ap = AccessPointConfig::default()
            .with_ssid("Yard")
            .with_password("")
            .with_channel(6)
            .with_max_connections(2)
            .with_enabled(false);

        assert_eq!(ap.ssid.as_str(), "Yard");
        assert!(ap.is_open());
        assert_eq!(ap.channel, 6);
        assert_eq!(ap.max_connections, 2);
        assert!(!ap.enabled);
    }

    // =========================================================================
    // WebConfig Tests
    // =========================================================================

    #[test]
    fn web_config_default() {
        let web = WebConfig::default();
        assert_eq!(web.port, 80);
        assert!(web.cors_permissive);
        assert!(web.enabled);
    }

    #[test]
    fn web_config_builder() {
        let web = WebConfig::default()
            .with_port(3000)
            .with_cors(false)
            .with_enabled(false);

        assert_eq!(web.port, 3000);
        assert!(!web.cors_permissive);
        assert!(!web.enabled);
    }

    // =========================================================================
    // PulseConfig Tests
    // =========================================================================

    #[test]
    fn pulse_config_builder() {
        let pulse = PulseConfig::default().with_sync_gap_ms(0).with_edge(Edge::Falling);
        assert_eq!(pulse.sync_gap_ms, 0);
        assert_eq!(pulse.edge, Edge::Falling);
    }
}
