use crate::driver::AfskDriver;
use crate::error::Error;
use crate::frame::Frame;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// A driver shared between the main loop and the sample-rate interrupt.
pub type GlobalAfskDriver<PWM, PTT> = Mutex<RefCell<Option<AfskDriver<PWM, PTT>>>>;

/// Used to initialize the global static `AfskDriver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use ax25_afsk::timer::{GlobalAfskDriver, global_afsk_driver_init};
/// use some_hal::{Pwm1, PD2};
///
/// static AFSK_DRIVER: GlobalAfskDriver<Pwm1, PD2> = global_afsk_driver_init();
/// ```
pub const fn global_afsk_driver_init<PWM: SetDutyCycle, PTT: OutputPin>()
-> GlobalAfskDriver<PWM, PTT> {
    Mutex::new(RefCell::new(None))
}

/// Installs a driver in the global slot, replacing any previous one.
///
/// # Arguments
/// * The global static `AfskDriver`
/// * The driver, built with [`AfskDriver::new`] for the timer's sample rate
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let (ocr, rate) = const_ocr_value(16_000_000, 8, 9_600);
///     let driver = AfskDriver::new(pwm, Some(ptt), AfskConfig::with_sample_rate(rate), None)?;
///     global_afsk_driver_setup(&AFSK_DRIVER, driver);
/// }
/// ```
pub fn global_afsk_driver_setup<PWM: SetDutyCycle, PTT: OutputPin>(
    global_driver: &'static GlobalAfskDriver<PWM, PTT>,
    driver: AfskDriver<PWM, PTT>,
) {
    critical_section::with(|cs| {
        let _ = global_driver.borrow(cs).replace(Some(driver));
    });
}

/// Runs the tick at each interrupt
///
/// # Arguments
/// * The global static `AfskDriver`
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     global_afsk_timer_tick(&AFSK_DRIVER);
/// }
/// ```
pub fn global_afsk_timer_tick<PWM: SetDutyCycle, PTT: OutputPin>(
    global_driver: &'static GlobalAfskDriver<PWM, PTT>,
) {
    critical_section::with(|cs| {
        if let Some(driver) = global_driver.borrow(cs).borrow_mut().as_mut() {
            driver.tick();
        }
    });
}

/// Queues a frame on the global driver.
///
/// Returns `WouldBlock` while a previous packet is still on the air or before
/// the driver has been set up, so it can be retried with `nb::block!` while
/// the interrupt keeps ticking.
pub fn global_afsk_send<PWM: SetDutyCycle, PTT: OutputPin>(
    global_driver: &'static GlobalAfskDriver<PWM, PTT>,
    frame: &Frame,
) -> nb::Result<(), Error> {
    critical_section::with(|cs| match global_driver.borrow(cs).borrow_mut().as_mut() {
        Some(driver) => driver.send(frame),
        None => Err(nb::Error::WouldBlock),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AfskConfig;
    use crate::driver::AfskMode;
    use crate::driver::mock::RecordingPwm;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;

    static DRIVER: GlobalAfskDriver<RecordingPwm, PinMock> = global_afsk_driver_init();

    fn config() -> AfskConfig {
        AfskConfig {
            sample_rate: 4_800,
            sync_bytes: 1,
            preamble_flags: 1,
            silence_ms: 0,
            ..AfskConfig::default()
        }
    }

    fn mode() -> Option<AfskMode> {
        critical_section::with(|cs| DRIVER.borrow(cs).borrow().as_ref().map(|d| d.mode))
    }

    #[test]
    fn test_global_driver_lifecycle() {
        let frame = Frame::ui("N0CALL".parse().unwrap(), None, None, Some(b"ISR")).unwrap();

        // Nothing installed yet: ticks are ignored and sends wait.
        global_afsk_timer_tick(&DRIVER);
        assert_eq!(global_afsk_send(&DRIVER, &frame), Err(nb::Error::WouldBlock));

        let driver = AfskDriver::new(RecordingPwm::new(255), None, config(), None).unwrap();
        global_afsk_driver_setup(&DRIVER, driver);
        assert_eq!(mode(), Some(AfskMode::Idle));

        assert_eq!(global_afsk_send(&DRIVER, &frame), Ok(()));
        assert_eq!(global_afsk_send(&DRIVER, &frame), Err(nb::Error::WouldBlock));
        assert_eq!(mode(), Some(AfskMode::Tx));

        let samples = frame.to_samples(&config()).unwrap().count();
        for _ in 0..=samples {
            global_afsk_timer_tick(&DRIVER);
        }
        assert_eq!(mode(), Some(AfskMode::Idle));
        let sent = critical_section::with(|cs| {
            DRIVER.borrow(cs).borrow().as_ref().map(|d| (d.tx_good, d.pwm.duties.len()))
        });
        assert_eq!(sent, Some((1, samples + 2)));
    }
}
