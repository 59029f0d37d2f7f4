//! Constants used across the AX.25 framing and Bell-202 modulation pipeline.
//!
//! This module defines the protocol-wide values of an AX.25 UI frame, the
//! Bell-202 tone plan, and the capacity limits used to size the fixed buffers
//! of `no_std` builds.
//!
//! ## Key Concepts
//!
//! - **Tones**: Bell-202 signals a `1` symbol with the mark tone and a `0`
//!   symbol with the space tone, at 1200 symbols per second.
//! - **Fields**: A UI frame always carries control `0x03` and PID `0xF0`.
//! - **Flags**: `0x7E` (`01111110`) delimits frames on the wire and fills the
//!   synchronization preamble.
//! - **Capacities**: Derived from the 8-digipeater limit and the default
//!   256-byte AX.25 information field (N1).
//!
//! The same limits are enforced with and without the `std` feature so that a
//! frame accepted on a host also fits on a microcontroller.

/// Mark tone, in Hz. Sent for a `1` symbol.
pub const MARK_HZ: f32 = 1200.0;

/// Space tone, in Hz. Sent for a `0` symbol.
pub const SPACE_HZ: f32 = 2200.0;

/// Bell-202 symbol rate, in symbols per second.
pub const BAUD_RATE: u32 = 1200;

/// Default audio sample rate, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// HDLC/AX.25 flag byte (`01111110`).
pub const FLAG: u8 = 0x7E;

/// Control field of an Unnumbered Information (UI) frame.
pub const UI_CONTROL: u8 = 0x03;

/// Protocol identifier meaning "no layer 3 protocol".
pub const PID_NO_LAYER_3: u8 = 0xF0;

/// Byte repeated at the start of the preamble.
///
/// NRZI turns a run of `0` bits into alternating mark/space tones, which
/// gives the receiver something to lock its clock onto.
pub const SYNC_BYTE: u8 = 0x00;

/// Default number of [`SYNC_BYTE`]s at the start of the preamble.
pub const DEFAULT_SYNC_BYTES: usize = 20;

/// Default number of [`FLAG`] bytes between the sync run and the frame.
pub const DEFAULT_PREAMBLE_FLAGS: usize = 100;

/// Default silence padding before and after the modulated frame, in milliseconds.
pub const DEFAULT_SILENCE_MS: u32 = 1_050;

/// Number of consecutive `1` bits after which a `0` is stuffed.
pub const STUFF_RUN: u8 = 5;

/// Longest callsign base, in characters.
pub const CALLSIGN_LEN: usize = 6;

/// Highest SSID accepted by the address codec.
pub const MAX_SSID: u8 = 15;

/// Length (in bytes) of one encoded address.
pub const ADDRESS_LEN: usize = CALLSIGN_LEN + 1;

/// Maximum number of digipeaters in a path.
pub const MAX_DIGIPEATERS: usize = 8;

/// Maximum size (in bytes) of the address field: destination, source and a full path.
pub const MAX_ADDRESS_FIELD_LEN: usize = ADDRESS_LEN * (2 + MAX_DIGIPEATERS);

/// Maximum size (in bytes) of the information field.
pub const MAX_INFO_LEN: usize = 256;

/// Length (in bytes) of the frame check sequence.
pub const FCS_LEN: usize = 2;

/// Maximum size (in bytes) of the frame header: address field, control and PID.
pub const MAX_HEADER_LEN: usize = MAX_ADDRESS_FIELD_LEN + 2;

/// Maximum size (in bytes) of a complete packet, excluding flags.
pub const MAX_FRAME_LEN: usize = MAX_HEADER_LEN + MAX_INFO_LEN + FCS_LEN;

/// CRC register value left after running the FCS over a frame and its own checksum.
pub const FCS_RESIDUE: u16 = 0xF0B8;

/// Reflected CRC-CCITT polynomial used by the FCS.
pub const FCS_POLY: u16 = 0x8408;

/// Default destination callsign for APRS traffic.
pub const DEFAULT_DESTINATION: &str = "APRS";

/// Placeholder information field sent when none is supplied.
pub const DEFAULT_INFO: &[u8] = b":EMAIL    :test@example.com Test email";
