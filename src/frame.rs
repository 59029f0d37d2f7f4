//! AX.25 UI frame construction.
//!
//! A [`Frame`] is built once per transmission and never changes afterwards.
//! Everything the rest of the pipeline needs is derived from it on demand:
//!
//! ```text
//! [destination:7][source:7][digipeater:7]*0..8 [control:1][pid:1][info:N][fcs:2]
//! ```
//!
//! Flags are not part of the frame; the line coder adds them.
//!
//! ## Example
//!
//! ```rust
//! use ax25_afsk::frame::Frame;
//!
//! let frame = Frame::builder("N0CALL".parse()?)
//!     .digipeater("WIDE1-1".parse()?)
//!     .info(b">Hello from Rust")
//!     .build()?;
//!
//! assert_eq!(frame.header().len(), 3 * 7 + 2);
//! # Ok::<(), ax25_afsk::error::Error>(())
//! ```

use core::fmt::{self, Write};

use heapless::Vec;

use crate::address::{AddressField, Callsign, decode_callsign, encode_addresses, is_last_address};
use crate::config::{AfskConfig, FrameDefaults};
use crate::consts::{
    ADDRESS_LEN, FCS_LEN, MAX_DIGIPEATERS, MAX_HEADER_LEN, MAX_INFO_LEN, PID_NO_LAYER_3,
    UI_CONTROL,
};
use crate::crc::{Fcs, checksum};
use crate::encoding::{ByteBits, byte_bits};
use crate::error::{Error, Result};
use crate::modulation::{Encoder, encode};

/// Ordered digipeater path.
pub type Path = Vec<Callsign, MAX_DIGIPEATERS>;

/// Address field, control and PID.
pub type Header = Vec<u8, MAX_HEADER_LEN>;

/// Information field storage.
#[cfg(feature = "std")]
pub type Info = std::vec::Vec<u8>;
/// Information field storage.
#[cfg(not(feature = "std"))]
pub type Info = Vec<u8, MAX_INFO_LEN>;

/// A complete packet: header, information field and FCS.
#[cfg(feature = "std")]
pub type FrameBytes = std::vec::Vec<u8>;
/// A complete packet: header, information field and FCS.
#[cfg(not(feature = "std"))]
pub type FrameBytes = Vec<u8, { crate::consts::MAX_FRAME_LEN }>;

/// The bitstream of a packet, as returned by [`Frame::to_bitstream`].
pub type FrameBits = ByteBits<<FrameBytes as IntoIterator>::IntoIter>;

/// The kinds of frame this crate can build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameKind {
    /// Unnumbered Information: connectionless, used by APRS.
    #[default]
    Ui,
}

impl FrameKind {
    /// Control field byte.
    pub const fn control(self) -> u8 {
        match self {
            FrameKind::Ui => UI_CONTROL,
        }
    }

    /// Protocol identifier byte.
    pub const fn protocol_id(self) -> u8 {
        match self {
            FrameKind::Ui => PID_NO_LAYER_3,
        }
    }
}

#[cfg(feature = "std")]
fn info_from_slice(info: &[u8]) -> Result<Info> {
    if info.len() > MAX_INFO_LEN {
        return Err(Error::InfoTooLong { len: info.len() });
    }
    Ok(info.to_vec())
}

#[cfg(not(feature = "std"))]
fn info_from_slice(info: &[u8]) -> Result<Info> {
    Vec::from_slice(info).map_err(|_| Error::InfoTooLong { len: info.len() })
}

/// An immutable AX.25 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    destination: Callsign,
    source: Callsign,
    path: Path,
    info: Info,
    addresses: AddressField,
}

impl Frame {
    /// Starts building a frame from `source`.
    pub fn builder<'a>(source: Callsign) -> FrameBuilder<'a> {
        FrameBuilder::new(source)
    }

    /// Builds a UI frame in one call.
    ///
    /// Missing pieces come from [`FrameDefaults::default`].
    pub fn ui(
        source: Callsign,
        destination: Option<Callsign>,
        path: Option<&[Callsign]>,
        info: Option<&[u8]>,
    ) -> Result<Self> {
        let mut builder = FrameBuilder::new(source);
        if let Some(destination) = destination {
            builder = builder.destination(destination);
        }
        if let Some(path) = path {
            builder = builder.path(path);
        }
        if let Some(info) = info {
            builder = builder.info(info);
        }
        builder.build()
    }

    /// Parses a packet (header, info and FCS, without flags) back into a frame.
    ///
    /// The FCS must check out, the address field must terminate after the
    /// source or a digipeater, and the frame must be a UI frame.
    pub fn from_bytes(packet: &[u8]) -> Result<Self> {
        let min_len = 2 * ADDRESS_LEN + 2 + FCS_LEN;
        if packet.len() < min_len {
            return Err(Error::FrameTooShort { len: packet.len() });
        }

        let (content, trailer) = packet.split_at(packet.len() - FCS_LEN);
        let mut fcs = Fcs::new();
        fcs.update(packet);
        if !fcs.is_good() {
            return Err(Error::ChecksumMismatch {
                expected: u16::from_le_bytes(checksum(content)),
                actual: u16::from_le_bytes([trailer[0], trailer[1]]),
            });
        }

        let mut callsigns: Vec<Callsign, { MAX_DIGIPEATERS + 2 }> = Vec::new();
        let mut offset = 0;
        loop {
            let Some(chunk) = content.get(offset..offset + ADDRESS_LEN) else {
                return Err(Error::MalformedFrame("address field not terminated"));
            };
            let mut address = [0u8; ADDRESS_LEN];
            address.copy_from_slice(chunk);
            callsigns
                .push(decode_callsign(&address)?)
                .map_err(|_| Error::MalformedFrame("address field not terminated"))?;
            offset += ADDRESS_LEN;
            if is_last_address(&address) {
                break;
            }
        }
        if callsigns.len() < 2 {
            return Err(Error::MalformedFrame("address field ends after destination"));
        }

        let rest = &content[offset..];
        let kind = FrameKind::Ui;
        match rest {
            [control, pid, ..] if *control == kind.control() && *pid == kind.protocol_id() => {}
            [_, _, ..] => return Err(Error::MalformedFrame("not a UI frame")),
            _ => return Err(Error::FrameTooShort { len: packet.len() }),
        }

        Frame::builder(callsigns[1])
            .destination(callsigns[0])
            .path(&callsigns[2..])
            .info(&rest[2..])
            .build()
    }

    /// The frame type.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Destination address.
    pub fn destination(&self) -> &Callsign {
        &self.destination
    }

    /// Source address.
    pub fn source(&self) -> &Callsign {
        &self.source
    }

    /// Digipeater path, in routing order.
    pub fn path(&self) -> &[Callsign] {
        &self.path
    }

    /// Information field.
    pub fn info(&self) -> &[u8] {
        &self.info
    }

    /// Encoded address field, end-of-address bit included.
    pub fn addresses(&self) -> &[u8] {
        &self.addresses
    }

    /// Address field followed by the control and PID bytes.
    pub fn header(&self) -> Header {
        let mut header = Header::new();
        // The address field is at most MAX_HEADER_LEN - 2 bytes long.
        let _ = header.extend_from_slice(&self.addresses);
        let _ = header.push(self.kind.control());
        let _ = header.push(self.kind.protocol_id());
        header
    }

    /// Frame check sequence over the header and the information field.
    pub fn fcs(&self) -> [u8; 2] {
        let mut fcs = Fcs::new();
        fcs.update(&self.header());
        fcs.update(&self.info);
        trace!("fcs = {}", fcs.value());
        fcs.digest()
    }

    /// The packet as it is checksummed: header, info, FCS.
    pub fn to_bytes(&self) -> FrameBytes {
        let mut bytes = FrameBytes::new();
        // Capacity is MAX_FRAME_LEN, which a built frame never exceeds.
        #[cfg(feature = "std")]
        {
            bytes.extend_from_slice(&self.header());
            bytes.extend_from_slice(&self.info);
            bytes.extend_from_slice(&self.fcs());
        }
        #[cfg(not(feature = "std"))]
        {
            let _ = bytes.extend_from_slice(&self.header());
            let _ = bytes.extend_from_slice(&self.info);
            let _ = bytes.extend_from_slice(&self.fcs());
        }
        bytes
    }

    /// The packet's bits, least significant bit of each byte first, flags excluded.
    pub fn to_bitstream(&self) -> FrameBits {
        byte_bits(self.to_bytes())
    }

    /// Line-codes and modulates the frame into padded audio samples.
    pub fn to_samples(&self, config: &AfskConfig) -> Result<Encoder<FrameBits>> {
        encode(self.to_bitstream(), config)
    }
}

/// Renders the TNC2 monitor form, e.g. `N0CALL>APRS,WIDE1-1:>hello`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.destination)?;
        for digi in &self.path {
            write!(f, ",{digi}")?;
        }
        f.write_char(':')?;
        for chunk in self.info.utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_char(char::REPLACEMENT_CHARACTER)?;
            }
        }
        Ok(())
    }
}

/// Builder for [`Frame`].
///
/// Anything not set falls back to the builder's [`FrameDefaults`].
#[derive(Clone, Debug)]
pub struct FrameBuilder<'a> {
    kind: FrameKind,
    source: Callsign,
    destination: Option<Callsign>,
    path: Option<Path>,
    requested_digipeaters: usize,
    info: Option<&'a [u8]>,
    defaults: FrameDefaults,
}

impl<'a> FrameBuilder<'a> {
    /// A builder for a UI frame from `source`.
    pub fn new(source: Callsign) -> Self {
        Self {
            kind: FrameKind::Ui,
            source,
            destination: None,
            path: None,
            requested_digipeaters: 0,
            info: None,
            defaults: FrameDefaults::default(),
        }
    }

    /// Frame type to build.
    pub fn kind(mut self, kind: FrameKind) -> Self {
        self.kind = kind;
        self
    }

    /// Destination address.
    pub fn destination(mut self, destination: Callsign) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Replaces the digipeater path.
    pub fn path(mut self, path: &[Callsign]) -> Self {
        let mut stored = Path::new();
        for digi in path.iter().take(MAX_DIGIPEATERS) {
            let _ = stored.push(*digi);
        }
        self.requested_digipeaters = path.len();
        self.path = Some(stored);
        self
    }

    /// Appends one digipeater to the path.
    pub fn digipeater(mut self, digi: Callsign) -> Self {
        let path = self.path.get_or_insert_with(Path::new);
        let _ = path.push(digi);
        self.requested_digipeaters += 1;
        self
    }

    /// Information field.
    pub fn info(mut self, info: &'a [u8]) -> Self {
        self.info = Some(info);
        self
    }

    /// Placeholder values for anything left unset.
    pub fn defaults(mut self, defaults: FrameDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Validates and assembles the frame.
    pub fn build(self) -> Result<Frame> {
        if self.requested_digipeaters > MAX_DIGIPEATERS {
            return Err(Error::TooManyDigipeaters {
                count: self.requested_digipeaters,
            });
        }
        let destination = self.destination.unwrap_or(self.defaults.destination);
        let path = self.path.unwrap_or(self.defaults.path);
        let info = info_from_slice(self.info.unwrap_or(self.defaults.info))?;
        let addresses = encode_addresses(&destination, &self.source, &path)?;

        debug!(
            "built frame: {} digipeaters, {} info bytes",
            path.len(),
            info.len()
        );
        Ok(Frame {
            kind: self.kind,
            destination,
            source: self.source,
            path,
            info,
            addresses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_INFO, FLAG};
    use crate::encoding::{nrzi, nrzi_decode, stuff, unstuff, frame_with_preamble};

    fn call(s: &str) -> Callsign {
        s.parse().unwrap()
    }

    fn test_frame() -> Frame {
        Frame::ui(call("N0CALL"), None, None, Some(b"TEST")).unwrap()
    }

    /// Independent bytewise CRC-16/X-25 for cross-checking.
    fn reference_crc(data: &[u8]) -> u16 {
        let mut crc: u16 = 0xFFFF;
        for &byte in data {
            crc ^= u16::from(byte);
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0x8408 } else { crc >> 1 };
            }
        }
        !crc
    }

    fn pack(bits: &[bool]) -> std::vec::Vec<u8> {
        bits.chunks(8)
            .map(|c| c.iter().enumerate().fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i)))
            .collect()
    }

    #[test]
    fn test_header_layout() {
        let frame = test_frame();
        let header = frame.header();
        assert_eq!(header.len(), 16);
        let dest: std::vec::Vec<u8> = header[..7].iter().map(|b| b >> 1).collect();
        assert_eq!(&dest, b"APRS  0");
        let src: std::vec::Vec<u8> = header[7..14].iter().map(|b| b >> 1).collect();
        assert_eq!(&src, b"N0CALL0");
        assert_eq!(header[13] & 1, 1);
        assert_eq!(header[14], 0x03);
        assert_eq!(header[15], 0xF0);
    }

    #[test]
    fn test_packet_bytes() {
        let frame = test_frame();
        let bytes = frame.to_bytes();
        let expected_header: [u8; 16] = [
            0x82, 0xA0, 0xA4, 0xA6, 0x40, 0x40, 0x60, 0x9C, 0x60, 0x86, 0x82, 0x98, 0x98, 0x61,
            0x03, 0xF0,
        ];
        assert_eq!(&bytes[..16], &expected_header);
        assert_eq!(&bytes[16..20], b"TEST");
        let crc = reference_crc(&bytes[..20]);
        assert_eq!(&bytes[20..], &crc.to_le_bytes());
        assert_eq!(frame.fcs(), crc.to_le_bytes());
    }

    #[test]
    fn test_defaults_apply() {
        let frame = Frame::builder(call("N0CALL")).build().unwrap();
        assert_eq!(frame.destination(), &Callsign::aprs());
        assert!(frame.path().is_empty());
        assert_eq!(frame.info(), DEFAULT_INFO);
    }

    #[test]
    fn test_custom_defaults() {
        let mut path = Path::new();
        path.push(call("WIDE2-2")).unwrap();
        let defaults = FrameDefaults {
            destination: call("APZ001"),
            path,
            info: b"beacon",
        };
        let frame = Frame::builder(call("N0CALL")).defaults(defaults).build().unwrap();
        assert_eq!(frame.to_string(), "N0CALL>APZ001,WIDE2-2:beacon");
    }

    #[test]
    fn test_display_tnc2() {
        let frame = Frame::ui(
            call("N0CALL-9"),
            Some(call("APRS")),
            Some(&[call("WIDE1-1"), call("WIDE2-1")]),
            Some(b">hi\xff"),
        )
        .unwrap();
        assert_eq!(frame.to_string(), "N0CALL-9>APRS,WIDE1-1,WIDE2-1:>hi\u{FFFD}");
    }

    #[test]
    fn test_too_many_digipeaters() {
        let path = [call("WIDE1-1"); 9];
        assert_eq!(
            Frame::ui(call("N0CALL"), None, Some(&path), None),
            Err(Error::TooManyDigipeaters { count: 9 })
        );
        let mut builder = Frame::builder(call("N0CALL"));
        for _ in 0..9 {
            builder = builder.digipeater(call("RELAY"));
        }
        assert_eq!(builder.build(), Err(Error::TooManyDigipeaters { count: 9 }));
    }

    #[test]
    fn test_info_too_long() {
        let info = [b'x'; 257];
        assert_eq!(
            Frame::ui(call("N0CALL"), None, None, Some(&info)),
            Err(Error::InfoTooLong { len: 257 })
        );
        let info = [b'x'; 256];
        assert!(Frame::ui(call("N0CALL"), None, None, Some(&info)).is_ok());
    }

    #[test]
    fn test_bitstream_matches_bytes() {
        let frame = test_frame();
        let bits: std::vec::Vec<bool> = frame.to_bitstream().collect();
        assert_eq!(bits.len(), 22 * 8);
        assert_eq!(pack(&bits), frame.to_bytes().to_vec());
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let frame = Frame::ui(
            call("N0CALL-1"),
            Some(call("APRS")),
            Some(&[call("WIDE1-1")]),
            Some(b"!4903.50N/07201.75W-"),
        )
        .unwrap();
        let parsed = Frame::from_bytes(&frame.to_bytes()).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_from_bytes_rejects_corruption() {
        let mut bytes = test_frame().to_bytes();
        bytes[17] ^= 0x04;
        assert!(matches!(
            Frame::from_bytes(&bytes),
            Err(Error::ChecksumMismatch { .. })
        ));
        assert!(matches!(
            Frame::from_bytes(&bytes[..10]),
            Err(Error::FrameTooShort { len: 10 })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_non_ui() {
        let frame = test_frame();
        let mut content = frame.header().to_vec();
        content[14] = 0x13;
        content.extend_from_slice(b"TEST");
        let fcs = checksum(&content);
        content.extend_from_slice(&fcs);
        assert_eq!(
            Frame::from_bytes(&content),
            Err(Error::MalformedFrame("not a UI frame"))
        );
    }

    #[test]
    fn test_line_coded_round_trip() {
        let frame = test_frame();
        let cfg = AfskConfig {
            sync_bytes: 4,
            preamble_flags: 6,
            ..AfskConfig::default()
        };
        let symbols: std::vec::Vec<bool> =
            nrzi(frame_with_preamble(stuff(frame.to_bitstream()), &cfg)).collect();
        let decoded: std::vec::Vec<bool> = nrzi_decode(symbols).collect();

        let preamble = (cfg.sync_bytes + cfg.preamble_flags) * 8;
        assert_eq!(pack(&decoded[preamble - 8..preamble]), [FLAG]);
        let payload = &decoded[preamble..decoded.len() - 8];
        assert_eq!(pack(&decoded[decoded.len() - 8..]), [FLAG]);

        let unstuffed: Result<std::vec::Vec<bool>> = unstuff(payload.iter().copied()).collect();
        let bytes = pack(&unstuffed.unwrap());
        assert_eq!(bytes, frame.to_bytes().to_vec());
        assert_eq!(Frame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_stuffing_in_payload_is_recovered() {
        let frame = Frame::ui(call("N0CALL"), None, None, Some(&[0xFF, 0xFF, 0x7E, 0xFF])).unwrap();
        let raw: std::vec::Vec<bool> = frame.to_bitstream().collect();
        let stuffed: std::vec::Vec<bool> = stuff(raw.iter().copied()).collect();
        assert!(stuffed.len() > raw.len());

        // The PID (0xF0) ends in four ones, so the first info bit completes a
        // run of five and the stuffed zero follows it.
        let info_start = 16 * 8;
        let header_stuffed: std::vec::Vec<bool> = stuff(raw[..info_start].iter().copied()).collect();
        let at = header_stuffed.len() + 1;
        assert!(stuffed[at - 5..at].iter().all(|&b| b));
        assert!(!stuffed[at]);

        let mut run = 0;
        for (i, &bit) in stuffed.iter().enumerate() {
            if run == 5 {
                assert!(!bit, "missing stuffed zero at {i}");
            }
            run = if bit { run + 1 } else { 0 };
            assert!(run <= 5);
        }

        let recovered: Result<std::vec::Vec<bool>> = unstuff(stuffed).collect();
        assert_eq!(recovered.unwrap(), raw);
    }
}
