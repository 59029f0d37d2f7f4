//! AX.25 address field encoding.
//!
//! An AX.25 address is seven bytes: the callsign base padded with spaces to
//! six characters, followed by the SSID character, with every byte shifted
//! left by one bit. The low bit freed by the shift is zero everywhere except
//! in the very last byte of the address field, where it marks the end of the
//! field.
//!
//! ## SSIDs
//!
//! SSIDs 0 through 15 are accepted. The SSID character is `'0' + ssid`, so
//! SSIDs 0-9 are the familiar single digits and 10-15 map onto `':'..='?'`.
//! Once shifted this is exactly the `0b011SSSS0` byte AX.25 expects, with the
//! two reserved bits set and the command/response bit clear.
//!
//! ## Functions
//!
//! - [`encode_callsign`]: one callsign to its 7-byte address
//! - [`decode_callsign`]: 7-byte address back to a callsign
//! - [`encode_addresses`]: destination, source and path to an address field

use core::fmt;
use core::str::FromStr;

use heapless::{String, Vec};

use crate::consts::{ADDRESS_LEN, CALLSIGN_LEN, MAX_ADDRESS_FIELD_LEN, MAX_DIGIPEATERS, MAX_SSID};
use crate::error::{CallsignError, Error, Result};

/// Encoded address field: destination, source and up to eight digipeaters.
pub type AddressField = Vec<u8, MAX_ADDRESS_FIELD_LEN>;

/// A station identifier: base callsign plus SSID.
///
/// The base is stored uppercase and space padded. A `Callsign` can only be
/// obtained through validation, so every value encodes without error.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Callsign {
    base: [u8; CALLSIGN_LEN],
    len: u8,
    ssid: u8,
}

impl Callsign {
    /// The APRS generic destination, `APRS`.
    pub const fn aprs() -> Self {
        Self {
            base: *b"APRS  ",
            len: 4,
            ssid: 0,
        }
    }

    /// Validates and builds a callsign from a base and an SSID.
    ///
    /// The base is uppercased. It must be 1-6 ASCII letters or digits and the
    /// SSID must be 0-15; anything else is rejected rather than truncated.
    pub fn new(base: &str, ssid: u8) -> Result<Self> {
        if base.is_empty() {
            return Err(Error::invalid_callsign(base, CallsignError::Empty));
        }
        if base.len() > CALLSIGN_LEN {
            return Err(Error::invalid_callsign(base, CallsignError::TooLong));
        }
        if !base.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::invalid_callsign(base, CallsignError::InvalidCharacter));
        }
        if ssid > MAX_SSID {
            return Err(Error::invalid_callsign(base, CallsignError::InvalidSsid));
        }

        let mut padded = [b' '; CALLSIGN_LEN];
        for (dst, src) in padded.iter_mut().zip(base.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self {
            base: padded,
            len: base.len() as u8,
            ssid,
        })
    }

    /// The base callsign, without padding or SSID.
    pub fn base(&self) -> &str {
        // Only ASCII alphanumerics are ever stored.
        core::str::from_utf8(&self.base[..usize::from(self.len)]).unwrap_or_default()
    }

    /// The secondary station identifier, 0-15.
    pub fn ssid(&self) -> u8 {
        self.ssid
    }
}

impl FromStr for Callsign {
    type Err = Error;

    /// Parses `BASE` or `BASE-SSID`, e.g. `N0CALL` or `WIDE2-1`.
    ///
    /// The SSID is written without leading zeros, so `N0CALL-01` is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            None => Callsign::new(s, 0),
            Some((base, ssid)) => {
                let valid_digits = !ssid.is_empty()
                    && ssid.len() <= 2
                    && !(ssid.len() == 2 && ssid.starts_with('0'))
                    && ssid.bytes().all(|b| b.is_ascii_digit());
                let ssid = if valid_digits { ssid.parse::<u8>().ok() } else { None };
                match ssid {
                    Some(ssid) => Callsign::new(base, ssid).map_err(|e| match e {
                        Error::InvalidCallsign { reason, .. } => {
                            Error::invalid_callsign(s, reason)
                        }
                        other => other,
                    }),
                    None => Err(Error::invalid_callsign(s, CallsignError::InvalidSsid)),
                }
            }
        }
    }
}

impl TryFrom<&str> for Callsign {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base())?;
        if self.ssid != 0 {
            write!(f, "-{}", self.ssid)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callsign({self})")
    }
}

#[cfg(feature = "defmt-0-3")]
impl defmt::Format for Callsign {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}-{}", self.base(), self.ssid);
    }
}

/// Encodes a callsign into its 7-byte AX.25 address.
///
/// The end-of-address bit is left clear; [`encode_addresses`] sets it on the
/// last address of the field.
pub fn encode_callsign(callsign: &Callsign) -> [u8; ADDRESS_LEN] {
    let mut out = [0u8; ADDRESS_LEN];
    for (dst, &src) in out.iter_mut().zip(callsign.base.iter()) {
        *dst = src << 1;
    }
    out[CALLSIGN_LEN] = (b'0' + callsign.ssid) << 1;
    out
}

/// Decodes a 7-byte AX.25 address back into a callsign.
///
/// The end-of-address, command/response and reserved bits of the SSID byte
/// are ignored.
pub fn decode_callsign(address: &[u8; ADDRESS_LEN]) -> Result<Callsign> {
    let chars = address[..CALLSIGN_LEN].iter().map(|&b| b >> 1);
    let len = chars.clone().rposition(|c| c != b' ').map_or(0, |i| i + 1);
    // Shifted bytes are 7-bit, so every one is a single-byte char.
    let mut base: String<CALLSIGN_LEN> = String::new();
    for c in chars.take(len) {
        let _ = base.push(char::from(c));
    }
    let ssid = (address[CALLSIGN_LEN] >> 1) & 0x0F;
    Callsign::new(&base, ssid)
}

/// Returns `true` if `address` is the last one of its address field.
pub fn is_last_address(address: &[u8; ADDRESS_LEN]) -> bool {
    address[CALLSIGN_LEN] & 0x01 == 0x01
}

/// Encodes the address field of a frame: destination, source, then each
/// digipeater in routing order.
///
/// Bit 0 of the very last byte is set to terminate the field.
pub fn encode_addresses(
    destination: &Callsign,
    source: &Callsign,
    path: &[Callsign],
) -> Result<AddressField> {
    if path.len() > MAX_DIGIPEATERS {
        return Err(Error::TooManyDigipeaters { count: path.len() });
    }

    let mut field = AddressField::new();
    for callsign in [destination, source].into_iter().chain(path.iter()) {
        field
            .extend_from_slice(&encode_callsign(callsign))
            .map_err(|_| Error::TooManyDigipeaters { count: path.len() })?;
    }
    if let Some(last) = field.last_mut() {
        *last |= 0x01;
    }
    Ok(field)
}
