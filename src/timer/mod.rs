//! Timer and tick-loop utilities for the AFSK driver.
//!
//! The driver produces one audio sample per `tick()`, so the tick source runs at the
//! sample rate rather than the baud rate. This employs two approaches: an interrupt service
//! routine using `critical_section::with` (`timer-isr` feature), or a busy-loop delay timer
//! (`delay-loop` feature).
//!
//! Contains helpers for polling- and ISR-based scheduling, including:
//! - `compute_ocr_value`: runtime OCR calculator
//! - `const_ocr_value`: compile-time OCR calculator
//! - `run_afsk_tick_loop`: blocking transmit loop for `DelayNs` (feature `delay-loop`)
//! - `global_afsk_timer_tick` and `tick_afsk_timer!()`: interrupt-based tick callback wrapper
//! (feature `timer-isr`)
//!
//! Common settings for a 16 MHz AVR: (For use with `compute_ocr_value` and `const_ocr_value`)
//!
//! | PRESCALER | OCR | Sample rate |
//! |-----------|-----|-------------|
//! |         8 | 207 |     9615 Hz |
//! |         8 | 103 |    19231 Hz |
//! |         1 | 362 |    44077 Hz |
//!
//! Feed the achieved sample rate (the second value returned by the calculators) back into
//! [`AfskConfig::sample_rate`](crate::config::AfskConfig::sample_rate) so the tones come out
//! on frequency.

use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Timer counts between two samples, kept inside a 16-bit compare register.
fn clamp_counts(counts: u64) -> u64 {
    counts.clamp(1, u64::from(u16::MAX) + 1)
}

/// Computes the OCR value for an AVR timer (CTC mode)
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 1, 8, 64)
/// - `sample_rate`: desired tick rate in Hz (e.g., 9600)
///
/// # Returns
/// - OCR value for OCRnA (rounds to nearest integer)
/// - The sample rate actually achieved with that value (for the `AfskConfig`)
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, sample_rate: u32) -> (u16, u32) {
    let timer_hz = f64::from(f_cpu) / f64::from(prescaler.max(1));
    let counts = clamp_counts(round(timer_hz / f64::from(sample_rate.max(1))) as u64);
    let achieved = round(timer_hz / counts as f64) as u32;
    ((counts - 1) as u16, achieved)
}

/// Compile-time OCR value calculator
///
/// Integer-only variant of [`compute_ocr_value`]; rounds the same way.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 1, 8, 64)
/// - `sample_rate`: desired tick rate in Hz (e.g., 9600)
///
/// # Returns
/// - OCR value for OCRnA (rounds to nearest integer)
/// - The sample rate actually achieved with that value (for the `AfskConfig`)
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, sample_rate: u32) -> (u16, u32) {
    let prescaler = (if prescaler == 0 { 1 } else { prescaler }) as u64;
    let sample_rate = (if sample_rate == 0 { 1 } else { sample_rate }) as u64;
    let timer_hz = f_cpu as u64 / prescaler;
    let mut counts = (timer_hz + sample_rate / 2) / sample_rate;
    if counts == 0 {
        counts = 1;
    } else if counts > u16::MAX as u64 + 1 {
        counts = u16::MAX as u64 + 1;
    }
    let achieved = (timer_hz + counts / 2) / counts;
    ((counts - 1) as u16, achieved as u32)
}

/// Nanoseconds between two ticks at `sample_rate`.
pub const fn sample_period_ns(sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        return 0;
    }
    1_000_000_000 / sample_rate
}
