/// Declares a static global `AFSK_DRIVER` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `AFSK_DRIVER` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared driver state.
///
/// # Arguments
/// - `$pwm`: The concrete type of the audio PWM channel (must implement `SetDutyCycle`)
/// - `$ptt`: The concrete type of the PTT pin (must implement `OutputPin`)
///
/// # Example
/// ```rust,ignore
/// init_afsk_driver!(MyPwmChannel, MyPttPin);
/// ```
#[macro_export]
macro_rules! init_afsk_driver {
    ( $pwm:ty, $ptt:ty ) => {
        pub static AFSK_DRIVER: $crate::critical_section::Mutex<
            core::cell::RefCell<Option<$crate::driver::AfskDriver<$pwm, $ptt>>>,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Installs a driver in the global `AFSK_DRIVER` singleton.
///
/// # Arguments
/// - `$driver`: An `AfskDriver` built for the timer's sample rate
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let config = AfskConfig::with_sample_rate(9_615);
///     setup_afsk_driver!(AfskDriver::new(pwm, Some(ptt), config, None).unwrap());
/// }
/// ```
///
/// # Notes
/// - Must be called inside a critical section-aware context (safe in `main()`).
/// - Requires `init_afsk_driver!` to have been used earlier.
#[macro_export]
macro_rules! setup_afsk_driver {
    ( $driver:expr ) => {
        $crate::critical_section::with(|cs| {
            let _ = AFSK_DRIVER.borrow(cs).replace(Some($driver));
        });
    };
}

/// Calls `tick()` on the global `AFSK_DRIVER` if it has been initialized.
///
/// This macro is intended to be invoked from a timer ISR running at the
/// configured sample rate.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_afsk_timer!();
/// }
/// ```
///
/// # Notes
/// - This macro assumes `AFSK_DRIVER` was declared with `init_afsk_driver!`
///   and initialized via `setup_afsk_driver!`.
/// - Does nothing if the driver hasn't been set up yet.
#[macro_export]
macro_rules! tick_afsk_timer {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(driver) = AFSK_DRIVER.borrow(cs).borrow_mut().as_mut() {
                driver.tick();
            }
        });
    };
}
