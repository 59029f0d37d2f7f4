//! Bell-202 tone synthesis.
//!
//! The [`Modulator`] turns NRZI symbols into audio samples: mark (1200 Hz)
//! for a `true` symbol, space (2200 Hz) for a `false` one, at 1200 symbols
//! per second.
//!
//! Two clocks are involved. Symbol `n` (counting from 1) ends at `n / baud`
//! seconds; sample `k` is taken at `k / sample_rate` seconds. A sample belongs
//! to the current symbol while `k / sample_rate < n / baud`, which is checked
//! as `k * baud < n * sample_rate` in integers. Nothing is accumulated in
//! floating point, so the two clocks cannot drift apart no matter how long
//! the frame is; at 44.1 kHz symbols simply alternate between 36 and 37
//! samples.
//!
//! The oscillator phase is carried across symbol boundaries and never reset.
//! Switching tones changes only how fast the phase advances, so the waveform
//! has no discontinuities for a receiver to trip over.

use core::f32::consts::TAU;
use core::iter::Chain;

use libm::sinf;

use crate::config::AfskConfig;
use crate::encoding::{BitStuffer, Framed, Nrzi, frame_with_preamble, nrzi, stuff};
use crate::error::Result;

/// Phase-continuous two-tone oscillator driven by a symbol stream.
///
/// Created by [`modulate`].
#[derive(Clone, Debug)]
pub struct Modulator<I> {
    symbols: I,
    sample_rate: u64,
    baud_rate: u64,
    amplitude: f32,
    mark_inc: f32,
    space_inc: f32,
    phase: f32,
    phase_inc: f32,
    samples: u64,
    symbol: u64,
    active: bool,
    done: bool,
}

/// Modulates NRZI symbols into samples in `[-amplitude, amplitude]`.
///
/// Fails if `config` does not pass [`AfskConfig::validate`].
pub fn modulate<I>(symbols: I, config: &AfskConfig) -> Result<Modulator<I::IntoIter>>
where
    I: IntoIterator<Item = bool>,
{
    config.validate()?;
    let rate = config.sample_rate as f32;
    Ok(Modulator {
        symbols: symbols.into_iter(),
        sample_rate: u64::from(config.sample_rate),
        baud_rate: u64::from(config.baud_rate),
        amplitude: config.amplitude,
        mark_inc: TAU * config.mark_hz / rate,
        space_inc: TAU * config.space_hz / rate,
        phase: 0.0,
        phase_inc: 0.0,
        samples: 0,
        symbol: 0,
        active: false,
        done: false,
    })
}

impl<I> Modulator<I> {
    /// Oscillator phase for the next sample, in radians, in `[0, 2π)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Samples produced so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Symbols started so far.
    pub fn symbols(&self) -> u64 {
        self.symbol
    }
}

impl<I: Iterator<Item = bool>> Iterator for Modulator<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        loop {
            if self.active && self.samples * self.baud_rate < self.symbol * self.sample_rate {
                let sample = self.amplitude * sinf(self.phase);
                self.samples += 1;
                self.phase += self.phase_inc;
                if self.phase >= TAU {
                    self.phase -= TAU;
                }
                return Some(sample);
            }
            if self.done {
                return None;
            }
            match self.symbols.next() {
                Some(symbol) => {
                    self.symbol += 1;
                    self.phase_inc = if symbol { self.mark_inc } else { self.space_inc };
                    self.active = true;
                }
                None => {
                    self.done = true;
                    self.active = false;
                    debug!(
                        "modulated {} symbols into {} samples",
                        self.symbol,
                        self.samples
                    );
                    return None;
                }
            }
        }
    }
}

/// A run of zero-valued samples.
#[derive(Clone, Debug)]
pub struct Silence {
    remaining: usize,
}

impl Silence {
    /// `samples` samples of silence.
    pub fn new(samples: usize) -> Self {
        Self { remaining: samples }
    }
}

impl Iterator for Silence {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(0.0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Silence {}

/// The line-coded symbol stream of a raw frame bitstream.
pub type Symbols<I> = Nrzi<Framed<BitStuffer<I>>>;

/// Full transmit chain: silence, modulated symbols, silence.
///
/// Created by [`encode`].
#[derive(Clone, Debug)]
pub struct Encoder<I> {
    samples: Chain<Chain<Silence, Modulator<Symbols<I>>>, Silence>,
    sample_rate: u32,
}

/// Encodes a raw frame bitstream (as from
/// [`Frame::to_bitstream`](crate::frame::Frame::to_bitstream)) into audio.
///
/// The bits are stuffed, wrapped in the preamble and closing flag,
/// NRZI-coded and modulated, with `config.silence_ms` of silence on either
/// side to give the transmitter time to key up.
pub fn encode<I>(bits: I, config: &AfskConfig) -> Result<Encoder<I::IntoIter>>
where
    I: IntoIterator<Item = bool>,
{
    let symbols = nrzi(frame_with_preamble(stuff(bits), config));
    let modulator = modulate(symbols, config)?;
    let padding = config.silence_samples();
    debug!(
        "encoding at {} Hz with {} samples of padding",
        config.sample_rate,
        padding
    );
    Ok(Encoder {
        samples: Silence::new(padding)
            .chain(modulator)
            .chain(Silence::new(padding)),
        sample_rate: config.sample_rate,
    })
}

impl<I> Encoder<I> {
    /// Sample rate of the produced audio, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl<I: Iterator<Item = bool>> Iterator for Encoder<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.samples.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::RepeatByte;
    use crate::frame::Frame;

    fn config(sample_rate: u32) -> AfskConfig {
        AfskConfig::with_sample_rate(sample_rate)
    }

    /// Samples produced for each symbol, by watching the symbol counter.
    fn samples_per_symbol(symbols: Vec<bool>, cfg: &AfskConfig) -> Vec<usize> {
        let mut m = modulate(symbols, cfg).unwrap();
        let mut counts = Vec::new();
        while m.next().is_some() {
            let n = m.symbols() as usize;
            if counts.len() < n {
                counts.resize(n, 0);
            }
            counts[n - 1] += 1;
        }
        counts
    }

    #[test]
    fn test_exact_samples_per_symbol() {
        let cfg = config(48_000);
        let counts = samples_per_symbol(vec![true, false, true, true, false], &cfg);
        assert_eq!(counts, vec![40, 40, 40, 40, 40]);
    }

    #[test]
    fn test_fractional_samples_per_symbol_do_not_drift() {
        let cfg = config(44_100);
        let symbols: Vec<bool> = (0..1200).map(|i| i % 3 == 0).collect();
        let counts = samples_per_symbol(symbols, &cfg);
        assert_eq!(counts.len(), 1200);
        assert!(counts.iter().all(|&c| c == 36 || c == 37));
        // One second of symbols is exactly one second of samples.
        assert_eq!(counts.iter().sum::<usize>(), 44_100);
    }

    #[test]
    fn test_low_sample_rate() {
        let cfg = config(8_000);
        let counts = samples_per_symbol(vec![false; 12], &cfg);
        assert!(counts.iter().all(|&c| c == 6 || c == 7));
        assert_eq!(counts.iter().sum::<usize>(), 80);
    }

    #[test]
    fn test_samples_in_range() {
        let cfg = config(22_050);
        let m = modulate(vec![true, false, false, true, false, true], &cfg).unwrap();
        for s in m {
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_phase_is_continuous_across_symbols() {
        let cfg = config(48_000);
        let symbols = vec![true, false, true, false, false, true];
        let samples: Vec<f32> = modulate(symbols.clone(), &cfg).unwrap().collect();
        assert_eq!(samples.len(), 6 * 40);

        // Rebuild the expected waveform with a free-running f64 phase.
        let mut phase = 0.0f64;
        for (k, &sample) in samples.iter().enumerate() {
            let expected = phase.sin() as f32;
            assert!((sample - expected).abs() < 1e-3, "sample {k}");
            let f = if symbols[k / 40] { 1200.0 } else { 2200.0 };
            phase += core::f64::consts::TAU * f / 48_000.0;
        }

        // No jump between neighbours bigger than the fastest tone allows.
        let max_step = TAU * 2200.0 / 48_000.0 + 1e-4;
        for pair in samples.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= max_step);
        }
    }

    #[test]
    fn test_phase_stays_wrapped() {
        let cfg = config(8_000);
        let mut m = modulate(vec![false; 100], &cfg).unwrap();
        while m.next().is_some() {
            assert!((0.0..TAU).contains(&m.phase()));
        }
        assert_eq!(m.samples(), 100 * 8_000 / 1_200 + 1);
    }

    #[test]
    fn test_amplitude_scales_output() {
        let cfg = AfskConfig {
            amplitude: 0.5,
            ..config(48_000)
        };
        let peak = modulate(vec![true; 10], &cfg)
            .unwrap()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 0.5 && peak > 0.49);
    }

    #[test]
    fn test_modulate_rejects_bad_config() {
        assert!(modulate(vec![true], &config(1_000)).is_err());
    }

    #[test]
    fn test_silence() {
        let s = Silence::new(5);
        assert_eq!(s.len(), 5);
        assert!(s.into_iter().all(|x| x == 0.0));
    }

    #[test]
    fn test_encode_length_and_padding() {
        let cfg = AfskConfig {
            sample_rate: 12_000,
            sync_bytes: 2,
            preamble_flags: 2,
            silence_ms: 100,
            ..AfskConfig::default()
        };
        let bits: Vec<bool> = RepeatByte::new(0x00, 2).collect();
        let samples: Vec<f32> = encode(bits, &cfg).unwrap().collect();
        // 2 sync + 2 flags + 2 payload bytes + closing flag, no stuffing needed.
        let symbols = (2 + 2 + 2 + 1) * 8;
        assert_eq!(samples.len(), 2 * 1_200 + symbols * 10);
        assert!(samples[..1_200].iter().all(|&s| s == 0.0));
        assert!(samples[samples.len() - 1_200..].iter().all(|&s| s == 0.0));
        assert!(samples[1_200..1_210].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_frame_to_samples() {
        let frame = Frame::ui("N0CALL".parse().unwrap(), None, None, Some(b"TEST")).unwrap();
        let cfg = AfskConfig {
            sample_rate: 9_600,
            silence_ms: 0,
            ..AfskConfig::default()
        };
        let encoder = frame.to_samples(&cfg).unwrap();
        assert_eq!(encoder.sample_rate(), 9_600);
        let samples = encoder.count();
        let stuffed_bits = stuff(frame.to_bitstream()).count();
        let symbols = (20 + 100) * 8 + stuffed_bits + 8;
        assert_eq!(samples, symbols * 8);
    }
}
