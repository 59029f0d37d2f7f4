use crate::driver::{AfskDriver, AfskMode};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// Runs a blocking loop that plays out the packet queued on the provided AFSK driver.
///
/// This is a simple timing loop for use in environments where interrupts are unavailable
/// or undesired. It paces the driver with a delay provider implementing
/// `embedded_hal::delay::DelayNs`, waiting one sample period between ticks.
///
/// # Arguments
/// - `driver`: A mutable reference to an `AfskDriver` with a packet queued by `send()`.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
///
/// # Example
/// ```rust,ignore
/// use ax25_afsk::timer::run_afsk_tick_loop;
///
/// driver.send(&frame).ok();
/// run_afsk_tick_loop(&mut driver, &mut delay);
/// ```
///
/// # Notes
/// - Returns once the driver is back to idle, i.e. immediately if nothing was queued.
/// - The time spent in `tick()` adds to every period; at high sample rates prefer a
///   timer interrupt.
pub fn run_afsk_tick_loop<D: DelayNs, PWM, PTT>(driver: &mut AfskDriver<PWM, PTT>, delay: &mut D)
where
    PWM: SetDutyCycle,
    PTT: OutputPin,
{
    let period_ns = driver.sample_period_ns();
    while driver.mode == AfskMode::Tx {
        driver.tick();
        delay.delay_ns(period_ns);
    }
}
