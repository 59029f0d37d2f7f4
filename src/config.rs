//! Tunable parameters for frame construction and modulation.
//!
//! Nothing in here is mandated by AX.25 itself: the preamble lengths, the
//! silence padding and the placeholder addressing are policy. They default to
//! values that key reliably through cheap handheld transceivers.

use crate::address::Callsign;
use crate::consts::{
    BAUD_RATE, DEFAULT_INFO, DEFAULT_PREAMBLE_FLAGS, DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_MS,
    DEFAULT_SYNC_BYTES, MARK_HZ, MAX_DIGIPEATERS, SPACE_HZ,
};
use crate::error::{Error, Result};

use heapless::Vec;

/// Line coding and tone synthesis settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct AfskConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Symbol rate in symbols per second.
    pub baud_rate: u32,
    /// Tone sent for a `1` symbol, in Hz.
    pub mark_hz: f32,
    /// Tone sent for a `0` symbol, in Hz.
    pub space_hz: f32,
    /// Peak amplitude of the generated tones (0.0 to 1.0].
    pub amplitude: f32,
    /// Number of sync bytes opening the preamble.
    pub sync_bytes: usize,
    /// Number of flag bytes following the sync bytes.
    pub preamble_flags: usize,
    /// Silence before and after the modulated frame, in milliseconds.
    pub silence_ms: u32,
}

impl Default for AfskConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            baud_rate: BAUD_RATE,
            mark_hz: MARK_HZ,
            space_hz: SPACE_HZ,
            amplitude: 1.0,
            sync_bytes: DEFAULT_SYNC_BYTES,
            preamble_flags: DEFAULT_PREAMBLE_FLAGS,
            silence_ms: DEFAULT_SILENCE_MS,
        }
    }
}

impl AfskConfig {
    /// Default settings at the given sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Checks that the settings can produce a usable waveform.
    ///
    /// The sample rate must be above twice the highest tone, and at least one
    /// sample must fit in every symbol.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(Error::InvalidConfig("baud rate must be non-zero"));
        }
        if self.sample_rate < self.baud_rate {
            return Err(Error::InvalidConfig("sample rate below baud rate"));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if !(self.mark_hz > 0.0 && self.space_hz > 0.0) {
            return Err(Error::InvalidConfig("tones must be positive"));
        }
        if self.mark_hz >= nyquist || self.space_hz >= nyquist {
            return Err(Error::InvalidConfig("sample rate too low for tones"));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(Error::InvalidConfig("amplitude must be in (0, 1]"));
        }
        Ok(())
    }

    /// Number of silent samples padded on each side of the frame.
    pub fn silence_samples(&self) -> usize {
        (u64::from(self.sample_rate) * u64::from(self.silence_ms) / 1_000) as usize
    }
}

/// Placeholder addressing used when a frame is built without it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameDefaults {
    /// Destination used when none is given.
    pub destination: Callsign,
    /// Digipeater path used when none is given.
    pub path: Vec<Callsign, MAX_DIGIPEATERS>,
    /// Information field used when none is given.
    pub info: &'static [u8],
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            destination: Callsign::aprs(),
            path: Vec::new(),
            info: DEFAULT_INFO,
        }
    }
}
