//! Bit-level line coding for AX.25 over Bell-202.
//!
//! This module turns the raw bits of a frame into the symbol stream that is
//! actually keyed onto the audio tones, and back again for self-tests.
//!
//! ## Stages
//!
//! 1. [`stuff`]: a `0` is inserted after every fifth consecutive `1`, so the
//!    payload can never contain the flag pattern `01111110`.
//! 2. [`frame_with_preamble`]: a run of sync bytes and flag bytes is put in
//!    front of the stuffed payload and a single flag closes it.
//! 3. [`nrzi`]: a `0` bit toggles the tone, a `1` bit holds it.
//!
//! Every stage is a lazy, single-pass iterator adapter holding its own state
//! (run counter, NRZI level). None of them can be rewound; build a new chain
//! to encode again.
//!
//! ## Inverses
//!
//! [`unstuff`] and [`nrzi_decode`] undo stages 1 and 3. They exist to check
//! the encoder against itself and are not a receiver.
//!
//! All bytes are expanded least significant bit first.

use core::iter::Chain;

use crate::config::AfskConfig;
use crate::consts::{FLAG, STUFF_RUN, SYNC_BYTE};
use crate::error::{Error, Result};

/// Expands bytes into bits, least significant bit first.
///
/// Created by [`byte_bits`].
#[derive(Clone, Debug)]
pub struct ByteBits<I> {
    bytes: I,
    current: u8,
    remaining: u8,
}

/// Expands `bytes` into a little-bit-endian bitstream.
pub fn byte_bits<I>(bytes: I) -> ByteBits<I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    ByteBits {
        bytes: bytes.into_iter(),
        current: 0,
        remaining: 0,
    }
}

impl<I: Iterator<Item = u8>> Iterator for ByteBits<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            self.current = self.bytes.next()?;
            self.remaining = 8;
        }
        let bit = self.current & 0x01 == 0x01;
        self.current >>= 1;
        self.remaining -= 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.bytes.size_hint();
        let pending = usize::from(self.remaining);
        (
            lo.saturating_mul(8).saturating_add(pending),
            hi.and_then(|hi| hi.checked_mul(8)?.checked_add(pending)),
        )
    }
}

/// One byte repeated a fixed number of times, as bits.
///
/// Used for the sync run, the flag run and the closing flag.
#[derive(Clone, Debug)]
pub struct RepeatByte {
    byte: u8,
    bits_left: usize,
}

impl RepeatByte {
    /// `count` copies of `byte`.
    pub fn new(byte: u8, count: usize) -> Self {
        Self {
            byte,
            bits_left: count.saturating_mul(8),
        }
    }
}

impl Iterator for RepeatByte {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.bits_left == 0 {
            return None;
        }
        let index = (8 - self.bits_left % 8) % 8;
        self.bits_left -= 1;
        Some((self.byte >> index) & 0x01 == 0x01)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.bits_left, Some(self.bits_left))
    }
}

impl ExactSizeIterator for RepeatByte {}

/// Inserts a `0` after every fifth consecutive `1`.
///
/// Created by [`stuff`].
#[derive(Clone, Debug)]
pub struct BitStuffer<I> {
    bits: I,
    ones: u8,
    pending_zero: bool,
}

/// Bit-stuffs a payload bitstream.
///
/// The zero goes in immediately *after* the fifth `1`, and the run counter
/// restarts from zero, so `11111 1` becomes `11111 0 1`.
pub fn stuff<I>(bits: I) -> BitStuffer<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    BitStuffer {
        bits: bits.into_iter(),
        ones: 0,
        pending_zero: false,
    }
}

impl<I: Iterator<Item = bool>> Iterator for BitStuffer<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.pending_zero {
            self.pending_zero = false;
            trace!("stuffing bit");
            return Some(false);
        }
        let bit = self.bits.next()?;
        if bit {
            self.ones += 1;
            if self.ones == STUFF_RUN {
                self.ones = 0;
                self.pending_zero = true;
            }
        } else {
            self.ones = 0;
        }
        Some(bit)
    }
}

/// Removes the `0` following every fifth consecutive `1`.
///
/// Created by [`unstuff`].
#[derive(Clone, Debug)]
pub struct BitUnstuffer<I> {
    bits: I,
    ones: u8,
    position: usize,
    failed: bool,
}

/// Reverses [`stuff`].
///
/// After five consecutive `1`s the next bit must be the stuffed `0`; it is
/// dropped. A `1` in that position cannot come out of [`stuff`] and yields
/// [`Error::StuffingViolation`], after which the stream ends.
pub fn unstuff<I>(bits: I) -> BitUnstuffer<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    BitUnstuffer {
        bits: bits.into_iter(),
        ones: 0,
        position: 0,
        failed: false,
    }
}

impl<I: Iterator<Item = bool>> Iterator for BitUnstuffer<I> {
    type Item = Result<bool>;

    fn next(&mut self) -> Option<Result<bool>> {
        if self.failed {
            return None;
        }
        let mut bit = self.bits.next()?;
        self.position += 1;
        if self.ones == STUFF_RUN {
            self.ones = 0;
            if bit {
                self.failed = true;
                return Some(Err(Error::StuffingViolation {
                    position: self.position - 1,
                }));
            }
            bit = self.bits.next()?;
            self.position += 1;
        }
        if bit {
            self.ones += 1;
        } else {
            self.ones = 0;
        }
        Some(Ok(bit))
    }
}

/// A stuffed payload wrapped in its preamble and closing flag.
pub type Framed<I> = Chain<Chain<Chain<RepeatByte, RepeatByte>, I>, RepeatByte>;

/// Puts the synchronization preamble in front of a stuffed payload and a
/// single flag after it.
///
/// The preamble is `config.sync_bytes` copies of [`SYNC_BYTE`] followed by
/// `config.preamble_flags` copies of [`FLAG`].
pub fn frame_with_preamble<I>(stuffed: I, config: &AfskConfig) -> Framed<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    debug!(
        "framing with {} sync bytes and {} flags",
        config.sync_bytes,
        config.preamble_flags
    );
    RepeatByte::new(SYNC_BYTE, config.sync_bytes)
        .chain(RepeatByte::new(FLAG, config.preamble_flags))
        .chain(stuffed)
        .chain(RepeatByte::new(FLAG, 1))
}

/// NRZI line coder.
///
/// Created by [`nrzi`].
#[derive(Clone, Debug)]
pub struct Nrzi<I> {
    bits: I,
    level: bool,
}

/// NRZI-encodes a bitstream: a `0` toggles the output level, a `1` holds it.
///
/// The level starts `true` (mark) and the emitted value is the level after
/// the input bit has been applied.
pub fn nrzi<I>(bits: I) -> Nrzi<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    Nrzi {
        bits: bits.into_iter(),
        level: true,
    }
}

impl<I: Iterator<Item = bool>> Iterator for Nrzi<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if !self.bits.next()? {
            self.level = !self.level;
        }
        Some(self.level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bits.size_hint()
    }
}

/// NRZI decoder.
///
/// Created by [`nrzi_decode`].
#[derive(Clone, Debug)]
pub struct NrziDecode<I> {
    symbols: I,
    level: bool,
}

/// Reverses [`nrzi`], assuming the same initial level: a symbol equal to the
/// previous one is a `1`, a change is a `0`.
pub fn nrzi_decode<I>(symbols: I) -> NrziDecode<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    NrziDecode {
        symbols: symbols.into_iter(),
        level: true,
    }
}

impl<I: Iterator<Item = bool>> Iterator for NrziDecode<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let symbol = self.symbols.next()?;
        let bit = symbol == self.level;
        self.level = symbol;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.symbols.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().filter(|c| !c.is_whitespace()).map(|c| c == '1').collect()
    }

    fn longest_run_of_ones(bits: &[bool]) -> usize {
        let mut best = 0;
        let mut run = 0;
        for &b in bits {
            run = if b { run + 1 } else { 0 };
            best = best.max(run);
        }
        best
    }

    #[test]
    fn test_byte_bits_lsb_first() {
        let out: Vec<bool> = byte_bits([0x01u8, 0x80]).collect();
        assert_eq!(out, bits("10000000 00000001"));
        assert_eq!(byte_bits([0u8; 3]).size_hint(), (24, Some(24)));
    }

    #[test]
    fn test_repeat_byte_flag_pattern() {
        let out: Vec<bool> = RepeatByte::new(FLAG, 2).collect();
        assert_eq!(out, bits("01111110 01111110"));
        let out: Vec<bool> = RepeatByte::new(0x01, 1).collect();
        assert_eq!(out, bits("10000000"));
        assert_eq!(RepeatByte::new(FLAG, 3).len(), 24);
    }

    #[test]
    fn test_stuff_inserts_after_fifth_one() {
        let out: Vec<bool> = stuff(bits("111111")).collect();
        assert_eq!(out, bits("11111 0 1"));
        let out: Vec<bool> = stuff(bits("11111")).collect();
        assert_eq!(out, bits("11111 0"));
        let out: Vec<bool> = stuff(bits("1111 0 1111")).collect();
        assert_eq!(out, bits("1111 0 1111"));
    }

    #[test]
    fn test_stuff_limits_runs_of_ones() {
        let input = vec![true; 100];
        let out: Vec<bool> = stuff(input).collect();
        assert_eq!(longest_run_of_ones(&out), 5);
        assert_eq!(out.len(), 100 + 20);
    }

    #[test]
    fn test_stuffed_payload_never_contains_flag() {
        let input: Vec<bool> = byte_bits([0x7Eu8, 0xFF, 0x7E, 0xFE, 0x3F]).collect();
        let out: Vec<bool> = stuff(input).collect();
        let flag = bits("01111110");
        assert!(!out.windows(8).any(|w| w == flag.as_slice()));
    }

    #[test]
    fn test_unstuff_inverts_stuff() {
        let input: Vec<bool> = byte_bits(*b"\xff\xfe\x7e\x00\x1f\xf8 APRS").collect();
        let stuffed: Vec<bool> = stuff(input.iter().copied()).collect();
        assert!(stuffed.len() > input.len());
        let out: Result<Vec<bool>> = unstuff(stuffed).collect();
        assert_eq!(out.unwrap(), input);
    }

    #[test]
    fn test_unstuff_rejects_six_ones() {
        let out: Result<Vec<bool>> = unstuff(bits("0111111")).collect();
        assert_eq!(out, Err(Error::StuffingViolation { position: 6 }));
    }

    #[test]
    fn test_frame_with_preamble_layout() {
        let cfg = AfskConfig {
            sync_bytes: 2,
            preamble_flags: 3,
            ..AfskConfig::default()
        };
        let out: Vec<bool> = frame_with_preamble(bits("101"), &cfg).collect();
        assert_eq!(out.len(), 2 * 8 + 3 * 8 + 3 + 8);
        assert!(out[..16].iter().all(|b| !b));
        assert_eq!(&out[16..24], bits("01111110").as_slice());
        assert_eq!(&out[40..43], bits("101").as_slice());
        assert_eq!(&out[43..], bits("01111110").as_slice());
    }

    #[test]
    fn test_nrzi_zero_flips_one_holds() {
        let input = bits("0011010001");
        let out: Vec<bool> = nrzi(input.iter().copied()).collect();
        assert_eq!(out.len(), input.len());
        let mut previous = true;
        for (bit, symbol) in input.iter().zip(out.iter()) {
            if *bit {
                assert_eq!(*symbol, previous);
            } else {
                assert_ne!(*symbol, previous);
            }
            previous = *symbol;
        }
    }

    #[test]
    fn test_nrzi_sync_bytes_alternate() {
        let out: Vec<bool> = nrzi(RepeatByte::new(SYNC_BYTE, 1)).collect();
        assert_eq!(out, bits("01010101"));
    }

    #[test]
    fn test_nrzi_decode_inverts_nrzi() {
        let input: Vec<bool> = byte_bits(*b"AX.25 \x7e\xff").collect();
        let encoded: Vec<bool> = nrzi(input.iter().copied()).collect();
        let decoded: Vec<bool> = nrzi_decode(encoded).collect();
        assert_eq!(decoded, input);
    }
}
