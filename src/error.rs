//! Error types for the AX.25 encoder.
//!
//! All fallible operations in the crate return [`Result<T>`], which uses
//! [`Error`] as the error type. Failures are input or programming errors;
//! none of them are transient, so there is nothing to retry.

use heapless::String;

/// How many characters of a rejected callsign are kept for reporting.
pub const REPORTED_CALLSIGN_LEN: usize = 16;

/// Why a callsign was rejected by the address codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CallsignError {
    /// The base callsign is empty.
    Empty,
    /// The base callsign is longer than six characters.
    TooLong,
    /// The base callsign contains something other than ASCII letters and digits.
    InvalidCharacter,
    /// The SSID is not a number between 0 and 15.
    InvalidSsid,
}

impl core::fmt::Display for CallsignError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            CallsignError::Empty => "empty base",
            CallsignError::TooLong => "base longer than 6 characters",
            CallsignError::InvalidCharacter => "base is not ASCII alphanumeric",
            CallsignError::InvalidSsid => "SSID is not 0-15",
        };
        f.write_str(reason)
    }
}

/// The error type for all encoder operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A callsign failed validation; carries the (possibly truncated) input.
    #[error("invalid callsign '{callsign}': {reason}")]
    InvalidCallsign {
        /// The offending callsign text.
        callsign: String<REPORTED_CALLSIGN_LEN>,
        /// What was wrong with it.
        reason: CallsignError,
    },

    /// More digipeaters were requested than AX.25 allows.
    #[error("too many digipeaters: {count} (max 8)")]
    TooManyDigipeaters {
        /// Number of digipeaters supplied.
        count: usize,
    },

    /// The information field does not fit in a frame.
    #[error("information field too long: {len} bytes (max 256)")]
    InfoTooLong {
        /// Length of the supplied information field.
        len: usize,
    },

    /// The trailing FCS does not match the checksum of the preceding bits.
    #[error("FCS mismatch: expected {expected:#06x}, found {actual:#06x}")]
    ChecksumMismatch {
        /// Checksum computed over the received content.
        expected: u16,
        /// Checksum carried by the frame.
        actual: u16,
    },

    /// A frame or bitstream ended before its mandatory fields.
    #[error("frame too short: {len}")]
    FrameTooShort {
        /// Number of bytes (or bits, for bitstreams) available.
        len: usize,
    },

    /// A packet parsed but its structure is not a UI frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// Six consecutive `1` bits were found inside a stuffed payload.
    #[error("bit stuffing violation at bit {position}")]
    StuffingViolation {
        /// Index of the offending bit in the stuffed input.
        position: usize,
    },

    /// A modulator or line coder setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl Error {
    /// Builds an [`Error::InvalidCallsign`], keeping as much of `text` as fits.
    pub fn invalid_callsign(text: &str, reason: CallsignError) -> Self {
        let mut callsign = String::new();
        for c in text.chars() {
            if callsign.push(c).is_err() {
                break;
            }
        }
        Error::InvalidCallsign { callsign, reason }
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = core::result::Result<T, Error>;
