//! AX.25 frame check sequence.
//!
//! The FCS is a CRC-16 with the reflected CCITT polynomial `0x8408`, fed one
//! bit at a time, least significant bit of each byte first. The register
//! starts at `0xFFFF`; the transmitted checksum is its one's complement,
//! low byte first.
//!
//! Running the same accumulator over a frame *and* its checksum always
//! leaves [`FCS_RESIDUE`] in the register, which is how a receiver checks a
//! frame without knowing where the checksum starts.

use crate::consts::{FCS_POLY, FCS_RESIDUE};
use crate::encoding::{ByteBits, byte_bits};
use crate::error::{Error, Result};

/// Bit-serial CRC accumulator producing the frame check sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fcs {
    state: u16,
}

impl Default for Fcs {
    fn default() -> Self {
        Self::new()
    }
}

impl Fcs {
    /// A fresh accumulator.
    pub const fn new() -> Self {
        Self { state: 0xFFFF }
    }

    /// Feeds one bit.
    pub fn update_bit(&mut self, bit: bool) {
        let check = self.state & 0x01 == 0x01;
        self.state >>= 1;
        if check != bit {
            self.state ^= FCS_POLY;
        }
    }

    /// Feeds whole bytes, least significant bit first.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            for i in 0..8 {
                self.update_bit((byte >> i) & 0x01 == 0x01);
            }
        }
    }

    /// The raw register.
    pub fn state(&self) -> u16 {
        self.state
    }

    /// The checksum as it goes on the wire: one's complement, little endian.
    pub fn digest(&self) -> [u8; 2] {
        (!self.state).to_le_bytes()
    }

    /// The checksum as a number, i.e. `u16::from_le_bytes(self.digest())`.
    pub fn value(&self) -> u16 {
        !self.state
    }

    /// `true` once a frame and its own FCS have been fed and they agree.
    pub fn is_good(&self) -> bool {
        self.state == FCS_RESIDUE
    }
}

/// Computes the FCS of `bytes` in one go.
pub fn checksum(bytes: &[u8]) -> [u8; 2] {
    let mut fcs = Fcs::new();
    fcs.update(bytes);
    fcs.digest()
}

/// Passes a bitstream through and appends its 16 FCS bits.
///
/// Created by [`append_fcs`].
#[derive(Debug)]
pub struct AppendFcs<I> {
    bits: I,
    fcs: Fcs,
    digest: Option<ByteBits<core::array::IntoIter<u8, 2>>>,
}

/// Appends the running FCS of `bits` to the end of the stream.
pub fn append_fcs<I>(bits: I) -> AppendFcs<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    AppendFcs {
        bits: bits.into_iter(),
        fcs: Fcs::new(),
        digest: None,
    }
}

impl<I: Iterator<Item = bool>> Iterator for AppendFcs<I> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if let Some(digest) = self.digest.as_mut() {
            return digest.next();
        }
        match self.bits.next() {
            Some(bit) => {
                self.fcs.update_bit(bit);
                Some(bit)
            }
            None => {
                let digest = self.digest.insert(byte_bits(self.fcs.digest()));
                digest.next()
            }
        }
    }
}

/// Strips and checks the trailing FCS of a bitstream.
///
/// Created by [`fcs_validate`].
#[derive(Debug)]
pub struct FcsValidate<I> {
    bits: I,
    fcs: Fcs,
    window: u16,
    filled: u8,
    done: bool,
}

/// Yields every bit of `bits` except the trailing 16, which are compared
/// against the FCS of everything before them.
///
/// On a mismatch the last item is [`Error::ChecksumMismatch`]; a stream
/// shorter than 16 bits ends with [`Error::FrameTooShort`].
pub fn fcs_validate<I>(bits: I) -> FcsValidate<I::IntoIter>
where
    I: IntoIterator<Item = bool>,
{
    FcsValidate {
        bits: bits.into_iter(),
        fcs: Fcs::new(),
        window: 0,
        filled: 0,
        done: false,
    }
}

impl<I: Iterator<Item = bool>> Iterator for FcsValidate<I> {
    type Item = Result<bool>;

    fn next(&mut self) -> Option<Result<bool>> {
        if self.done {
            return None;
        }
        loop {
            match self.bits.next() {
                Some(bit) => {
                    // The window holds the last 16 bits, oldest in bit 0.
                    let oldest = self.window & 0x01 == 0x01;
                    self.window = (self.window >> 1) | (u16::from(bit) << 15);
                    if self.filled < 16 {
                        self.filled += 1;
                        continue;
                    }
                    self.fcs.update_bit(oldest);
                    return Some(Ok(oldest));
                }
                None => {
                    self.done = true;
                    if self.filled < 16 {
                        return Some(Err(Error::FrameTooShort {
                            len: usize::from(self.filled),
                        }));
                    }
                    let expected = self.fcs.value();
                    if self.window != expected {
                        warn!("FCS mismatch: expected {}, found {}", expected, self.window);
                        return Some(Err(Error::ChecksumMismatch {
                            expected,
                            actual: self.window,
                        }));
                    }
                    return None;
                }
            }
        }
    }
}
