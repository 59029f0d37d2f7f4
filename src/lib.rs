//! # ax25-afsk
//!
//! A portable, no_std Rust encoder for AX.25 UI frames (as used by APRS) and a software
//! Bell-202 AFSK modulator, turning a callsign and a payload into audio samples ready for
//! a sound card, a DAC or a filtered PWM pin.
//!
//! The transmit chain is:
//! - address field encoding and UI frame assembly with a CRC-16 frame check sequence
//! - HDLC bit stuffing, a sync/flag preamble and a closing flag
//! - NRZI line coding
//! - phase-continuous 1200/2200 Hz tone synthesis at 1200 baud, padded with silence
//!
//! Every stage is a lazy iterator, so a complete packet can be generated sample by sample
//! without ever being held in memory as audio.
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support and replaces `heapless::Vec`s with
//! `std::vec::Vec`s |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for sample timing |
//! | `timer-isr` (default) | Uses `critical_section::with` for sample timing |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use ax25_afsk::config::AfskConfig;
//! use ax25_afsk::frame::Frame;
//!
//! let frame = Frame::builder("N0CALL-9".parse()?)
//!     .digipeater("WIDE1-1".parse()?)
//!     .info(b"!4903.50N/07201.75W-Test")
//!     .build()?;
//!
//! let config = AfskConfig::with_sample_rate(44_100);
//! for sample in frame.to_samples(&config)? {
//!     assert!((-1.0..=1.0).contains(&sample));
//! }
//! # Ok::<(), ax25_afsk::error::Error>(())
//! ```
//!
//! On a microcontroller, hand the frame to an [`AfskDriver`](driver::AfskDriver) and call
//! `tick()` at the sample rate, either from a timer interrupt or with
//! `run_afsk_tick_loop()` and a `DelayNs` implementation:
//!
//! ```rust,ignore
//! driver.send(&frame).ok();
//! ax25_afsk::timer::run_afsk_tick_loop(&mut driver, &mut delay);
//! ```
//!
//! ## Integration Notes
//!
//! - Only UI frames with no layer-3 protocol are produced; there is no receiver.
//! - Timing precision matters: the tones are computed for the configured sample rate, so
//!   use the rate the timer actually achieves (see [`timer::compute_ocr_value`]).
//! - Only one driver instance should be active at a time in interrupt-driven mode.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod address;
pub mod config;
pub mod consts;
pub mod crc;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod modulation;
pub mod timer;

pub use address::Callsign;
pub use config::AfskConfig;
pub use error::{Error, Result};
pub use frame::Frame;
pub use modulation::encode;
