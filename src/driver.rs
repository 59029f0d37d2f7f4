//! AFSK transmit driver for PWM audio outputs.
//!
//! This module provides the [`AfskDriver`] struct, which plays the sample
//! stream of an AX.25 frame out of any `embedded-hal` PWM channel. Filter the
//! PWM pin with a simple RC low-pass and feed it into the microphone input of
//! a transceiver; an optional PTT pin keys the transmitter for the duration of
//! the packet.
//!
//! The driver is independent of the target's clocks, provided that
//! [`tick()`](AfskDriver::tick) is called once per audio sample (e.g. every
//! 104.2 µs at a 9600 Hz sample rate).
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! # use core::convert::Infallible;
//! # struct Pwm;
//! # impl embedded_hal::pwm::ErrorType for Pwm { type Error = Infallible; }
//! # impl embedded_hal::pwm::SetDutyCycle for Pwm {
//! #     fn max_duty_cycle(&self) -> u16 { 255 }
//! #     fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Infallible> { Ok(()) }
//! # }
//! use ax25_afsk::config::AfskConfig;
//! use ax25_afsk::driver::AfskDriver;
//! use ax25_afsk::frame::Frame;
//!
//! # let ptt = Pin::new(&[PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)]);
//! let config = AfskConfig::with_sample_rate(9_600);
//! let mut driver: AfskDriver<Pwm, Pin> = AfskDriver::new(Pwm, Some(ptt), config, None)?;
//!
//! let frame = Frame::builder("N0CALL".parse()?).info(b">on the air").build()?;
//! driver.send(&frame).ok();
//!
//! loop {
//!     driver.tick(); // Called every 1 / 9600 s by a delay or timer interrupt
//!     # break; // For testing purposes
//! }
//! # driver.ptt.as_mut().map(|ptt| ptt.done());
//! # Ok::<(), ax25_afsk::error::Error>(())
//! ```
//!
//! For timer and tick scheduling helpers, see [`crate::timer`].

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use libm::roundf;

use crate::config::AfskConfig;
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameBits};
use crate::modulation::Encoder;
use crate::timer::sample_period_ns;

/// Operational mode of the [`AfskDriver`].
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AfskMode {
    ///   Nothing queued. The PWM output rests at mid-scale (silence) and PTT is released.
    #[default]
    Idle,
    ///   A packet is being played out, one sample per [`tick()`](AfskDriver::tick).
    ///   PTT is keyed for the whole transmission, silence padding included.
    Tx,
}

/// A software Bell-202 AFSK transmitter driving a PWM channel.
///
/// ## Type Parameters
///
/// - `PWM`: A type implementing [`embedded_hal::pwm::SetDutyCycle`] carrying the audio
/// - `PTT`: A type implementing [`embedded_hal::digital::OutputPin`] used to key the radio
///
/// ## Notes
///
/// - Only one `AfskDriver` instance should be active if you're using interrupts.
/// - You are responsible for calling `tick()` at the configured sample rate using
///   either a hardware timer interrupt or a polling loop.
#[derive(Debug)]
pub struct AfskDriver<PWM, PTT>
where
    PWM: SetDutyCycle,
    PTT: OutputPin,
{
    /// The current mode of the transmitter
    pub mode: AfskMode,
    /// Audio PWM channel
    pub pwm: PWM,
    /// Push To Talk (PTT) pin
    pub ptt: Option<PTT>,
    ptt_inverted: bool,
    config: AfskConfig,
    tx: Option<Encoder<FrameBits>>,

    /// Counter of completed transmissions.
    /// Incremented when a packet has been played out in full and the driver returns to idle.
    pub tx_good: u16,

    /// Counter of failed PWM or PTT writes.
    pub tx_errors: u16,
}

impl<PWM, PTT> AfskDriver<PWM, PTT>
where
    PWM: SetDutyCycle,
    PTT: OutputPin,
{
    /// Creates a new `AfskDriver` on the given PWM channel.
    ///
    /// # Arguments
    /// - `pwm`: The PWM channel carrying the audio.
    /// - `ptt`: The optional push to talk output.
    /// - `config`: Modulation settings; `tick()` must run at `config.sample_rate`.
    /// - `ptt_inverted`: Whether the PTT signal is active low.
    ///
    /// # Returns
    /// An idle driver with the PWM output at mid-scale and PTT released, or
    /// [`Error::InvalidConfig`] if `config` is unusable.
    pub fn new(
        pwm: PWM,
        ptt: Option<PTT>,
        config: AfskConfig,
        ptt_inverted: Option<bool>,
    ) -> Result<Self> {
        config.validate()?;
        let mut driver = Self {
            mode: AfskMode::Idle,
            pwm,
            ptt,
            ptt_inverted: ptt_inverted.unwrap_or(false),
            config,
            tx: None,
            tx_good: 0,
            tx_errors: 0,
        };
        driver.write_sample(0.0);
        driver.write_ptt(false);
        Ok(driver)
    }

    /// Modulation settings in use.
    pub fn config(&self) -> &AfskConfig {
        &self.config
    }

    /// Time between two `tick()` calls, in nanoseconds.
    pub fn sample_period_ns(&self) -> u32 {
        sample_period_ns(self.config.sample_rate)
    }

    fn write_sample(&mut self, sample: f32) {
        let max = f32::from(self.pwm.max_duty_cycle());
        let duty = roundf((sample.clamp(-1.0, 1.0) * 0.5 + 0.5) * max) as u16;
        if self.pwm.set_duty_cycle(duty).is_err() {
            self.tx_errors = self.tx_errors.wrapping_add(1);
        }
    }

    fn write_ptt(&mut self, mode: bool) {
        let state = if self.ptt_inverted { !mode } else { mode };
        if let Some(ref mut ptt) = self.ptt {
            let result = if state { ptt.set_high() } else { ptt.set_low() };
            if result.is_err() {
                self.tx_errors = self.tx_errors.wrapping_add(1);
            }
        }
    }

    /// Releases PTT, silences the output and drops any packet in flight.
    pub fn set_mode_idle(&mut self) {
        if self.mode != AfskMode::Idle {
            self.tx = None;
            self.write_sample(0.0);
            self.write_ptt(false);
            self.mode = AfskMode::Idle;
        }
    }

    fn set_mode_tx(&mut self) {
        if self.mode != AfskMode::Tx {
            self.write_ptt(true);
            self.mode = AfskMode::Tx;
        }
    }

    /// Advances the transmitter by one audio sample.
    ///
    /// Must be called at the configured sample rate. Does nothing while idle.
    pub fn tick(&mut self) {
        if self.mode != AfskMode::Tx {
            return;
        }
        match self.tx.as_mut().and_then(Iterator::next) {
            Some(sample) => self.write_sample(sample),
            None => {
                self.tx_good = self.tx_good.wrapping_add(1);
                debug!("transmission {} complete", self.tx_good);
                self.set_mode_idle();
            }
        }
    }

    /// Polls for the end of the current transmission.
    ///
    /// Returns `WouldBlock` while a packet is being played out.
    pub fn wait_packet_sent(&self) -> nb::Result<(), Infallible> {
        if self.mode == AfskMode::Tx {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Queues a frame for transmission and keys the transmitter.
    ///
    /// Returns `WouldBlock` while another packet is still being sent.
    /// The samples are generated lazily by subsequent `tick()` calls.
    pub fn send(&mut self, frame: &Frame) -> nb::Result<(), Error> {
        if self.mode == AfskMode::Tx {
            return Err(nb::Error::WouldBlock);
        }
        let encoder = frame.to_samples(&self.config).map_err(nb::Error::Other)?;
        debug!(
            "queued frame: {} info bytes at {} Hz",
            frame.info().len(),
            encoder.sample_rate()
        );
        self.tx = Some(encoder);
        self.set_mode_tx();
        Ok(())
    }
}
