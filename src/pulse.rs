//! Pulse-count framing for the external discrete decoder.
//!
//! A frame is a long LOW sync gap followed by `N` pulses at a given pulse
//! repetition frequency, 50% duty each. The decoder counts the pulses after
//! the gap and latches output `N`. The line is always left LOW.
//!
//! ```text
//!          sync gap          pulse 1     pulse 2     pulse N
//! ‾‾‾‾|__________________|‾‾‾‾|____|‾‾‾‾|____| ... |‾‾‾‾|____|_____
//!                         half  half
//! ```
//!
//! Motor commands use the fixed [`CommandCode`] table. The same encoder
//! doubles as a standalone OOK transmitter via
//! [`PulseEncoder::send_command`].
//!
//! # Example
//!
//! ```rust
//! use train_pulse::hal::{MockDelay, MockPin, SignalTrace};
//! use train_pulse::pulse::{CommandCode, PulseEncoder};
//! use train_pulse::traits::Edge;
//!
//! let trace = SignalTrace::new();
//! let pin = MockPin::new(15, trace.clone());
//! let mut tx = PulseEncoder::new(pin, MockDelay::new(trace.clone()), Edge::Rising);
//!
//! tx.send(CommandCode::Forward, 250, 30).unwrap();
//! assert_eq!(trace.pulse_count(15), 2);
//! ```

use log::debug;

use crate::error::{InvalidArgument, TransmitError};
use crate::traits::{DelayNs, Edge, OutputPin};

/// Design ceiling on pulse counts a decoder can distinguish.
pub const COMMAND_MAX_COUNT: u8 = 8;

/// Sync gap used by the standalone transmitter when none is given.
pub const DEFAULT_SYNC_GAP_MS: u32 = 30;

/// Motor commands understood by the pulse-count decoder.
///
/// The discriminant is the number of pulses sent for the command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandCode {
    /// Stop the motor.
    Stop = 1,
    /// Run forward.
    Forward = 2,
    /// Run backward.
    Backward = 3,
    /// One speed step up.
    SpeedUp = 4,
    /// One speed step down.
    SpeedDown = 5,
}

impl CommandCode {
    /// Every command code, in pulse-count order.
    pub const ALL: [CommandCode; 5] = [
        CommandCode::Stop,
        CommandCode::Forward,
        CommandCode::Backward,
        CommandCode::SpeedUp,
        CommandCode::SpeedDown,
    ];

    /// Number of pulses that encode this command.
    #[inline]
    pub const fn pulse_count(self) -> u8 {
        self as u8
    }

    /// Look up the command encoded by `count` pulses.
    pub fn from_pulse_count(count: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.pulse_count() == count)
    }
}

const _: () = {
    let mut i = 0;
    while i < CommandCode::ALL.len() {
        assert!(CommandCode::ALL[i].pulse_count() <= COMMAND_MAX_COUNT);
        i += 1;
    }
};

/// A validated pulse frame. Not stored; built per transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseFrame {
    pulse_count: u8,
    frequency_hz: u32,
    sync_gap_ms: u32,
}

impl PulseFrame {
    /// Validate and build a frame.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument::PulseCount`] unless `1 <= pulse_count <= 8`,
    /// [`InvalidArgument::Frequency`] if `frequency_hz` is zero.
    pub fn new(pulse_count: u8, frequency_hz: u32, sync_gap_ms: u32) -> Result<Self, InvalidArgument> {
        if frequency_hz == 0 {
            return Err(InvalidArgument::Frequency);
        }
        if !(1..=COMMAND_MAX_COUNT).contains(&pulse_count) {
            return Err(InvalidArgument::PulseCount(pulse_count));
        }
        Ok(Self {
            pulse_count,
            frequency_hz,
            sync_gap_ms,
        })
    }

    /// Frame carrying a motor command.
    pub fn command(code: CommandCode, frequency_hz: u32, sync_gap_ms: u32) -> Result<Self, InvalidArgument> {
        Self::new(code.pulse_count(), frequency_hz, sync_gap_ms)
    }

    /// Number of pulses after the gap.
    #[inline]
    pub fn pulse_count(&self) -> u8 {
        self.pulse_count
    }

    /// Pulse repetition frequency.
    #[inline]
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Length of the leading LOW gap.
    #[inline]
    pub fn sync_gap_ms(&self) -> u32 {
        self.sync_gap_ms
    }

    /// Half of one pulse period, in microseconds (integer division).
    #[inline]
    pub fn half_period_us(&self) -> u32 {
        500_000 / self.frequency_hz
    }

    /// Total time the line is held by this frame, in microseconds.
    pub fn duration_us(&self) -> u64 {
        u64::from(self.sync_gap_ms) * 1_000
            + u64::from(self.pulse_count) * 2 * u64::from(self.half_period_us())
    }
}

/// Drive one already-validated frame onto `pin`.
///
/// Blocks for [`PulseFrame::duration_us`]. The line is driven LOW for the
/// sync gap, toggled `2 * pulse_count` times, then forced LOW.
pub fn transmit_frame<P, D>(pin: &mut P, delay: &mut D, frame: &PulseFrame, edge: Edge) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    let half_us = frame.half_period_us();
    let leading_high = edge.leading_level_high();

    pin.set_low()?;
    delay.delay_ms(frame.sync_gap_ms);

    for _ in 0..frame.pulse_count {
        set_level(pin, leading_high)?;
        delay.delay_us(half_us);
        set_level(pin, !leading_high)?;
        delay.delay_us(half_us);
    }

    pin.set_low()
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

/// Pulse-count transmitter owning one output line.
///
/// Holds the line exclusively: a frame must never interleave with another
/// on the same pin, and `&mut self` on every transmit enforces that.
pub struct PulseEncoder<P, D> {
    pin: P,
    delay: D,
    edge: Edge,
}

impl<P: OutputPin, D: DelayNs> PulseEncoder<P, D> {
    /// Wrap an output line and delay source.
    pub fn new(pin: P, delay: D, edge: Edge) -> Self {
        Self { pin, delay, edge }
    }

    /// Pulse polarity in use.
    #[inline]
    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// Validate and transmit `pulse_count` pulses after a `sync_gap_ms` gap.
    ///
    /// Nothing is written to the pin if validation fails.
    pub fn transmit(
        &mut self,
        pulse_count: u8,
        frequency_hz: u32,
        sync_gap_ms: u32,
    ) -> Result<(), TransmitError<P::Error>> {
        let frame = PulseFrame::new(pulse_count, frequency_hz, sync_gap_ms)?;
        self.transmit_validated(&frame)
    }

    /// Transmit a motor command code.
    pub fn send(
        &mut self,
        code: CommandCode,
        frequency_hz: u32,
        sync_gap_ms: u32,
    ) -> Result<(), TransmitError<P::Error>> {
        let frame = PulseFrame::command(code, frequency_hz, sync_gap_ms)?;
        debug!("sending {:?} ({} pulses @ {} Hz)", code, frame.pulse_count(), frequency_hz);
        self.transmit_validated(&frame)
    }

    /// Standalone transmitter entry point: `cmd` pulses (1-8) at
    /// `frequency_hz` after the default 30 ms sync gap.
    pub fn send_command(&mut self, cmd: u8, frequency_hz: u32) -> Result<(), TransmitError<P::Error>> {
        self.transmit(cmd, frequency_hz, DEFAULT_SYNC_GAP_MS)
    }

    fn transmit_validated(&mut self, frame: &PulseFrame) -> Result<(), TransmitError<P::Error>> {
        transmit_frame(&mut self.pin, &mut self.delay, frame, self.edge).map_err(TransmitError::Hardware)
    }

    /// Release the output line and delay source.
    pub fn into_parts(self) -> (P, D) {
        (self.pin, self.delay)
    }
}
