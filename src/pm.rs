// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Power management
//!
//! Sequences the peripheral drivers around sleep transitions: the RTT
//! counter state is parked before the chip suspends and reconciled
//! afterwards, GPIO interrupt triggers are rewritten for wake-up, and
//! the time until the next RTT alarm becomes the sleep duration hint.
//!
//! Actually suspending the chip is ROM/runtime territory, not register
//! pokes this HAL can own, so the suspend primitives sit behind the
//! [`Sleep`] trait and are supplied by the application runtime.

use core::cell::Cell;

use critical_section::Mutex;

use crate::gpio;
use crate::macros::debug;
use crate::rtt::{Rtt, RttHw};

/// Sleep modes, from lightest to deepest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepMode {
    /// CPU waits for the next interrupt, all peripherals keep running.
    Modem,
    /// CPU and peripherals suspended, RAM retained; execution resumes
    /// after wake-up.
    Light,
    /// Everything but the RTC domain is powered down; wake-up goes
    /// through reset.
    Deep,
}

/// Why the chip woke from light sleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeupCause {
    /// The sleep timer expired.
    Timer,
    /// A GPIO wake-up trigger matched.
    Gpio,
}

/// Suspend primitives supplied by the application runtime.
pub trait Sleep {
    /// Waits for the next interrupt (modem sleep).
    fn idle(&mut self);

    /// Enters light sleep, optionally waking after `duration_us`.
    fn light_sleep(&mut self, duration_us: Option<u64>);

    /// Enters deep sleep, optionally waking (through reset) after
    /// `duration_us`.
    fn deep_sleep(&mut self, duration_us: Option<u64>) -> !;

    /// Restarts the chip.
    fn reset(&mut self) -> !;
}

static WAKEUP_CAUSE: Mutex<Cell<WakeupCause>> = Mutex::new(Cell::new(WakeupCause::Timer));

/// The cause of the most recent light-sleep wake-up.
pub fn wakeup_cause() -> WakeupCause {
    critical_section::with(|cs| WAKEUP_CAUSE.borrow(cs).get())
}

pub(crate) fn set_wakeup_cause(cause: WakeupCause) {
    critical_section::with(|cs| WAKEUP_CAUSE.borrow(cs).set(cause));
}

/// Enters the given sleep mode.
///
/// For [`SleepMode::Light`] the RTT and GPIO drivers are suspended
/// around the transition and the returned cause tells what ended the
/// sleep; a pending RTT alarm that expired while sleeping is dispatched
/// before this returns. [`SleepMode::Deep`] does not return.
pub fn enter<HW: RttHw, S: Sleep>(
    mode: SleepMode,
    rtt: &mut Rtt<HW>,
    sleep: &mut S,
) -> Option<WakeupCause> {
    match mode {
        SleepMode::Modem => {
            sleep.idle();
            None
        }
        SleepMode::Light => {
            // Timer is the default cause; the GPIO handler overrides it
            // when a wake-up trigger matched.
            set_wakeup_cause(WakeupCause::Timer);

            let hint = rtt.sleep_enter();
            gpio::sleep_enter(mode);
            debug!("pm: light sleep hint={:?}", hint);

            sleep.light_sleep(hint);

            let cause = wakeup_cause();
            gpio::sleep_exit(cause);
            rtt.sleep_exit(cause);
            debug!("pm: woke up cause={:?}", cause);

            Some(cause)
        }
        SleepMode::Deep => {
            let hint = rtt.sleep_enter();
            sleep.deep_sleep(hint)
        }
    }
}

/// Powers the chip off: deep sleep without any wake-up source.
pub fn off<S: Sleep>(sleep: &mut S) -> ! {
    sleep.deep_sleep(None)
}

/// Restarts the chip, carrying the RTT counter over the reset.
pub fn reboot<HW: RttHw, S: Sleep>(rtt: &mut Rtt<HW>, sleep: &mut S) -> ! {
    rtt.save_counter();
    sleep.reset()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    /// The wake-up cause is a process-wide static; tests that go through
    /// a light sleep cycle must not interleave.
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[derive(Default)]
    struct FakeHw {
        counter: u32,
        alarm: Option<u32>,
    }

    impl RttHw for FakeHw {
        fn init(&mut self) {}
        fn counter(&self) -> u32 {
            self.counter
        }
        fn set_alarm(&mut self, alarm: u32) {
            self.alarm = Some(alarm);
        }
        fn clear_alarm(&mut self) {
            self.alarm = None;
        }
        fn save_counter(&mut self) {}
        fn restore_counter(&mut self, _in_init: bool) {}
        fn power_on(&mut self) {}
        fn power_off(&mut self) {}
        fn on_interrupt(&mut self) -> bool {
            self.alarm.take().is_some()
        }
    }

    #[derive(Default)]
    struct FakeSleep {
        idles: u32,
        light: Option<Option<u64>>,
        /// Cause to report from light sleep.
        wake: Option<WakeupCause>,
    }

    impl Sleep for FakeSleep {
        fn idle(&mut self) {
            self.idles += 1;
        }

        fn light_sleep(&mut self, duration_us: Option<u64>) {
            self.light = Some(duration_us);
            if let Some(cause) = self.wake {
                set_wakeup_cause(cause);
            }
        }

        fn deep_sleep(&mut self, _duration_us: Option<u64>) -> ! {
            unreachable!("deep sleep is not exercised on the host");
        }

        fn reset(&mut self) -> ! {
            unreachable!("reset is not exercised on the host");
        }
    }

    #[test]
    fn modem_sleep_only_idles() {
        let mut rtt = Rtt::new(FakeHw::default());
        let mut sleep = FakeSleep::default();

        assert_eq!(enter(SleepMode::Modem, &mut rtt, &mut sleep), None);
        assert_eq!(sleep.idles, 1);
        assert_eq!(sleep.light, None);
    }

    static WOKEN: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn light_sleep_passes_the_alarm_hint_and_dispatches_on_timer_wakeup() {
        let _serial = SERIAL.lock().unwrap();
        WOKEN.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.set_alarm(40_000, || {
            WOKEN.fetch_add(1, Ordering::Relaxed);
        });

        let mut sleep = FakeSleep {
            wake: Some(WakeupCause::Timer),
            ..FakeSleep::default()
        };

        let cause = enter(SleepMode::Light, &mut rtt, &mut sleep);
        assert_eq!(cause, Some(WakeupCause::Timer));
        assert_eq!(sleep.light, Some(Some(40_000)));
        assert_eq!(WOKEN.load(Ordering::Relaxed), 1);
    }

    static NOT_WOKEN: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn gpio_wakeup_leaves_the_alarm_pending() {
        let _serial = SERIAL.lock().unwrap();
        NOT_WOKEN.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.set_alarm(40_000, || {
            NOT_WOKEN.fetch_add(1, Ordering::Relaxed);
        });

        let mut sleep = FakeSleep {
            wake: Some(WakeupCause::Gpio),
            ..FakeSleep::default()
        };

        let cause = enter(SleepMode::Light, &mut rtt, &mut sleep);
        assert_eq!(cause, Some(WakeupCause::Gpio));
        assert_eq!(NOT_WOKEN.load(Ordering::Relaxed), 0);
        assert!(rtt.alarm_is_set());
    }

    #[test]
    fn light_sleep_without_alarm_has_no_hint() {
        let _serial = SERIAL.lock().unwrap();
        let mut rtt = Rtt::new(FakeHw::default());
        let mut sleep = FakeSleep {
            wake: Some(WakeupCause::Timer),
            ..FakeSleep::default()
        };

        enter(SleepMode::Light, &mut rtt, &mut sleep);
        assert_eq!(sleep.light, Some(None));
    }
}
