// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Emulated real-time timer (RTT)
//!
//! The ESP8266 RTC counter is clocked by an inaccurate RC oscillator and
//! cannot raise interrupts, so a 32-bit RTT with a frequency of 1 MHz is
//! emulated on top of a CPU timer while the chip is awake. The RTC counter
//! is only consulted in sleep modes and across reboots: the active counter
//! is parked in battery backed storage before suspending and reconciled
//! against the elapsed RTC time afterwards.
//!
//! Two interchangeable hardware backends implement the [`RttHw`] contract
//! of a 32-bit, 1 MHz counter with a single alarm:
//!
//! - [`frc::FrcRtt`] uses the FRC2 free-running CPU timer. This is the
//!   default choice, but FRC2 is owned by the WiFi stack when that is
//!   active.
//! - [`sys::SysRtt`] runs on top of any 32-bit microsecond system clock
//!   that can provide a one-shot timeout (see [`sys::SysClock`]).
//!
//! The hardware has no overflow interrupt; [`Rtt`] emulates overflow
//! callbacks by arming a hardware alarm at the logical wrap point.
//!
//! The crate does not install interrupt vectors. Route the backend's
//! interrupt (FRC2, or the system clock's timeout callback) to
//! [`Rtt::on_interrupt`].

pub mod frc;
pub mod sys;

pub use frc::FrcRtt;
pub use sys::{SysClock, SysRtt};

use embedded_hal::timer::{Cancel, CountDown};
use void::Void;

use crate::macros::{debug, trace};
use crate::pm::WakeupCause;
use crate::time::{Hertz, MicroSeconds};

/// Frequency of the emulated counter.
pub const FREQUENCY: Hertz = Hertz(1_000_000);

/// Largest value the emulated counter reaches before wrapping.
pub const MAX_VALUE: u32 = u32::MAX;

/// Alarm and overflow handlers.
pub type Callback = fn();

/// Converts RTT ticks to microseconds.
pub const fn ticks_to_us(ticks: u32) -> u64 {
    ticks as u64 * 1_000_000 / FREQUENCY.0 as u64
}

/// Contract between the RTT façade and a hardware counter driver.
///
/// Implementations present a 32-bit counter with a frequency of 1 MHz and
/// a single alarm, regardless of the resolution of the underlying
/// hardware. The counter has no set operation; the façade layers its own
/// offset on top.
pub trait RttHw {
    /// Prepares the hardware counter.
    fn init(&mut self);

    /// Current counter value (1 MHz, wrapping at 32 bits).
    fn counter(&self) -> u32;

    /// Arms the alarm at the given counter value.
    ///
    /// An alarm at or below the current counter value fires after the
    /// counter wraps, not immediately.
    fn set_alarm(&mut self, alarm: u32);

    /// Disarms the alarm.
    fn clear_alarm(&mut self);

    /// Parks the counter in RTC-retained storage before sleep or reboot.
    fn save_counter(&mut self);

    /// Restores the counter from RTC-retained storage.
    ///
    /// `in_init` is true when recovering from a reboot or deep sleep,
    /// false when resuming from light sleep.
    fn restore_counter(&mut self, in_init: bool);

    /// Starts the counter and enables its interrupt.
    fn power_on(&mut self);

    /// Stops the counter and disables its interrupt.
    fn power_off(&mut self);

    /// Services the hardware interrupt.
    ///
    /// Returns true when the armed alarm target was reached and the
    /// façade should dispatch its callbacks.
    fn on_interrupt(&mut self) -> bool;
}

/// The emulated real-time timer.
pub struct Rtt<HW> {
    hw: HW,
    /// Offset of the logical counter relative to the hardware counter.
    offset: u32,
    /// Alarm value as set at the interface.
    alarm: u32,
    alarm_cb: Option<Callback>,
    overflow_cb: Option<Callback>,
    /// Alarm target currently armed in hardware (logical value).
    alarm_active: u32,
    alarm_set: bool,
    /// The next alarm interrupt is a sleep wake-up.
    wakeup: bool,
    /// `CountDown` bookkeeping.
    cd_start: u32,
    cd_ticks: Option<u32>,
}

impl<HW: RttHw> Rtt<HW> {
    /// Initializes the RTT on the given backend.
    ///
    /// Restores the counter from RTC-retained storage (it keeps ticking
    /// over deep sleep and reboots), clears any alarm configuration and
    /// powers the hardware counter on.
    pub fn new(hw: HW) -> Self {
        let mut rtt = Rtt {
            hw,
            offset: 0,
            alarm: 0,
            alarm_cb: None,
            overflow_cb: None,
            alarm_active: 0,
            alarm_set: false,
            wakeup: false,
            cd_start: 0,
            cd_ticks: None,
        };

        rtt.hw.init();
        rtt.hw.restore_counter(true);
        rtt.clear_alarm();
        rtt.clear_overflow_callback();
        rtt.power_on();
        rtt
    }

    /// Releases the hardware backend.
    pub fn free(mut self) -> HW {
        self.hw.clear_alarm();
        self.hw.power_off();
        self.hw
    }

    /// Starts the hardware counter and enables its interrupt.
    pub fn power_on(&mut self) {
        self.hw.power_on();
    }

    /// Stops the hardware counter and disables its interrupt.
    pub fn power_off(&mut self) {
        self.hw.power_off();
    }

    /// Current counter value.
    pub fn counter(&self) -> u32 {
        self.hw.counter().wrapping_add(self.offset)
    }

    /// Sets the counter to the given value.
    pub fn set_counter(&mut self, counter: u32) {
        self.offset = counter.wrapping_sub(self.hw.counter());
        debug!("rtt: set counter={} offset={}", counter, self.offset);
        self.update_hw_alarm();
    }

    /// Registers the overflow callback.
    ///
    /// There is no overflow interrupt in hardware; the wrap of the
    /// logical counter is detected with an alarm at 0.
    pub fn set_overflow_callback(&mut self, cb: Callback) {
        self.overflow_cb = Some(cb);
        self.update_hw_alarm();
    }

    /// Removes the overflow callback.
    pub fn clear_overflow_callback(&mut self) {
        self.overflow_cb = None;
        self.update_hw_alarm();
    }

    /// Arms the alarm at an absolute counter value.
    ///
    /// A value at or below the current counter fires after the counter
    /// wraps around.
    pub fn set_alarm(&mut self, alarm: u32, cb: Callback) {
        debug!("rtt: set alarm={} @rtt={}", alarm, self.counter());
        self.alarm = alarm;
        self.alarm_cb = Some(cb);
        self.update_hw_alarm();
    }

    /// Removes a pending alarm.
    pub fn clear_alarm(&mut self) {
        self.alarm = 0;
        self.alarm_cb = None;
        self.update_hw_alarm();
    }

    /// The most recently configured alarm value.
    pub fn alarm(&self) -> u32 {
        self.alarm
    }

    /// Whether an alarm callback is currently registered.
    pub fn alarm_is_set(&self) -> bool {
        self.alarm_cb.is_some()
    }

    /// Parks the counter in RTC-retained storage.
    pub fn save_counter(&mut self) {
        self.hw.save_counter();
    }

    /// Reconciles the counter with the time elapsed on the RTC.
    pub fn restore_counter(&mut self, in_init: bool) {
        self.hw.restore_counter(in_init);
    }

    /// Services the RTT interrupt.
    ///
    /// Call this from the interrupt the backend raises (the FRC2 vector,
    /// or the system clock's timeout callback).
    pub fn on_interrupt(&mut self) {
        if self.hw.on_interrupt() {
            self.dispatch();
        }
    }

    /// Prepares the RTT for a sleep mode.
    ///
    /// Saves the counter state and, when an alarm is armed, returns the
    /// time until that alarm as a wake-up hint in microseconds. Returns
    /// `None` when nothing is armed or the alarm is due immediately.
    pub fn sleep_enter(&mut self) -> Option<u64> {
        self.save_counter();

        if !self.alarm_set {
            return None;
        }

        let counter = self.counter();
        let t_diff = ticks_to_us(self.alarm_active.wrapping_sub(counter));
        debug!(
            "rtt: sleep alarm={} @rtt={} t_diff={}",
            self.alarm_active, counter, t_diff
        );

        if t_diff != 0 {
            self.wakeup = true;
            Some(t_diff)
        } else {
            self.wakeup = false;
            None
        }
    }

    /// Resynchronizes the RTT after a sleep mode.
    ///
    /// When the wake-up was caused by the sleep timer, the pending alarm
    /// is dispatched as if the hardware alarm interrupt had fired.
    pub fn sleep_exit(&mut self, cause: WakeupCause) {
        self.restore_counter(false);

        if cause == WakeupCause::Timer {
            self.dispatch();
        }
    }

    /// Chooses the next hardware alarm target.
    fn update_hw_alarm(&mut self) {
        if self.alarm_cb.is_some() && (self.alarm > self.counter() || self.overflow_cb.is_none()) {
            // The alarm is the next event if it is ahead of the counter or
            // no overflow callback is registered.
            self.alarm_active = self.alarm;
            self.alarm_set = true;
            self.hw.set_alarm(self.alarm.wrapping_sub(self.offset));
        } else if self.overflow_cb.is_some() {
            // Otherwise the overflow at logical 0 is the next event.
            self.alarm_active = 0;
            self.alarm_set = true;
            self.hw.set_alarm(0u32.wrapping_sub(self.offset));
        } else {
            self.alarm_set = false;
            self.hw.clear_alarm();
        }
    }

    /// Decides whether the armed target was the alarm or the overflow and
    /// invokes the matching callbacks.
    fn dispatch(&mut self) {
        let alarm = self.alarm_active;

        if self.wakeup {
            self.wakeup = false;
            trace!("rtt: wake-up alarm @rtt={}", self.counter());
        }

        if alarm == self.alarm {
            if let Some(cb) = self.alarm_cb {
                // Clear the alarm first; this also arms the overflow
                // target if an overflow callback is registered.
                self.clear_alarm();
                cb();
            }
        }

        if alarm == 0 {
            // Arm the next event before running the handler so that a
            // handler setting a new alarm wins.
            self.update_hw_alarm();
            if let Some(cb) = self.overflow_cb {
                cb();
            }
        }
    }
}

/// Polled timeouts on top of the RTT counter.
impl<HW: RttHw> CountDown for Rtt<HW> {
    type Time = MicroSeconds;

    fn start<T>(&mut self, timeout: T)
    where
        T: Into<MicroSeconds>,
    {
        self.cd_start = self.counter();
        self.cd_ticks = Some(timeout.into().0);
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        match self.cd_ticks {
            None => Ok(()),
            Some(ticks) => {
                if self.counter().wrapping_sub(self.cd_start) >= ticks {
                    self.cd_ticks = None;
                    Ok(())
                } else {
                    Err(nb::Error::WouldBlock)
                }
            }
        }
    }
}

impl<HW: RttHw> Cancel for Rtt<HW> {
    type Error = Void;

    fn cancel(&mut self) -> Result<(), Self::Error> {
        self.cd_ticks = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    /// Backend driven by hand from the tests.
    #[derive(Default)]
    struct FakeHw {
        counter: u32,
        alarm: Option<u32>,
        powered: bool,
        saved: u32,
        restores: u32,
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

        fn save_counter(&mut self) {
            self.saved = self.counter;
        }

        fn restore_counter(&mut self, _in_init: bool) {
            self.restores += 1;
        }

        fn power_on(&mut self) {
            self.powered = true;
        }

        fn power_off(&mut self) {
            self.powered = false;
        }

        fn on_interrupt(&mut self) -> bool {
            // The fake raises only alarm interrupts.
            self.alarm.take().is_some()
        }
    }

    #[test]
    fn counter_follows_hardware_plus_offset() {
        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = 100;
        assert_eq!(rtt.counter(), 100);

        rtt.set_counter(5_000);
        assert_eq!(rtt.counter(), 5_000);

        rtt.hw.counter = 150;
        assert_eq!(rtt.counter(), 5_050);
    }

    #[test]
    fn set_counter_survives_wraparound() {
        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = u32::MAX - 10;
        rtt.set_counter(20);
        assert_eq!(rtt.counter(), 20);

        // Ten hardware ticks later.
        rtt.hw.counter = u32::MAX;
        assert_eq!(rtt.counter(), 30);
    }

    static ALARM_FIRED: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn alarm_is_armed_relative_to_offset_and_fires_once() {
        ALARM_FIRED.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = 100;
        rtt.set_counter(1_000);

        rtt.set_alarm(1_500, || {
            ALARM_FIRED.fetch_add(1, Ordering::Relaxed);
        });
        assert!(rtt.alarm_is_set());
        assert_eq!(rtt.alarm(), 1_500);
        // Armed in hardware coordinates: logical 1500 minus offset 900.
        assert_eq!(rtt.hw.alarm, Some(600));

        rtt.hw.counter = 600;
        rtt.on_interrupt();
        assert_eq!(ALARM_FIRED.load(Ordering::Relaxed), 1);
        assert!(!rtt.alarm_is_set());
        // No overflow callback: nothing re-armed.
        assert_eq!(rtt.hw.alarm, None);

        // A spurious interrupt dispatches nothing.
        rtt.on_interrupt();
        assert_eq!(ALARM_FIRED.load(Ordering::Relaxed), 1);
    }

    static OVERFLOW_FIRED: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn overflow_is_emulated_with_an_alarm_at_zero() {
        OVERFLOW_FIRED.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = 100;
        rtt.set_counter(u32::MAX - 50);

        rtt.set_overflow_callback(|| {
            OVERFLOW_FIRED.fetch_add(1, Ordering::Relaxed);
        });
        // Logical 0 in hardware coordinates.
        let hw_target = 0u32.wrapping_sub(u32::MAX - 50).wrapping_add(100);
        assert_eq!(rtt.hw.alarm, Some(hw_target));

        rtt.hw.counter = hw_target;
        rtt.on_interrupt();
        assert_eq!(OVERFLOW_FIRED.load(Ordering::Relaxed), 1);
        // The overflow callback stays registered and is re-armed.
        assert_eq!(rtt.hw.alarm, Some(hw_target));
    }

    static PAST_ALARM: AtomicU32 = AtomicU32::new(0);
    static PAST_OVERFLOW: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn alarm_behind_counter_defers_to_overflow() {
        PAST_ALARM.store(0, Ordering::Relaxed);
        PAST_OVERFLOW.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = 10_000;
        rtt.set_overflow_callback(|| {
            PAST_OVERFLOW.fetch_add(1, Ordering::Relaxed);
        });

        // Alarm value below the current counter: the overflow at 0 is the
        // next event, the alarm comes after the wrap.
        rtt.set_alarm(5_000, || {
            PAST_ALARM.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(rtt.hw.alarm, Some(0));

        // Counter wraps; the overflow fires and re-arms the alarm.
        rtt.hw.counter = 0;
        rtt.on_interrupt();
        assert_eq!(PAST_OVERFLOW.load(Ordering::Relaxed), 1);
        assert_eq!(PAST_ALARM.load(Ordering::Relaxed), 0);
        assert_eq!(rtt.hw.alarm, Some(5_000));

        rtt.hw.counter = 5_000;
        rtt.on_interrupt();
        assert_eq!(PAST_ALARM.load(Ordering::Relaxed), 1);
    }

    static SLEEP_ALARM: AtomicU32 = AtomicU32::new(0);

    #[test]
    fn sleep_enter_returns_time_to_alarm() {
        SLEEP_ALARM.store(0, Ordering::Relaxed);

        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = 1_000;
        rtt.set_alarm(21_000, || {
            SLEEP_ALARM.fetch_add(1, Ordering::Relaxed);
        });

        // 20 000 ticks at 1 MHz is 20 000 us.
        assert_eq!(rtt.sleep_enter(), Some(20_000));
        assert_eq!(rtt.hw.saved, 1_000);

        // Timer wake-up dispatches the pending alarm.
        rtt.hw.counter = 21_000;
        rtt.sleep_exit(WakeupCause::Timer);
        assert_eq!(SLEEP_ALARM.load(Ordering::Relaxed), 1);
        assert!(rtt.hw.restores >= 1);
    }

    #[test]
    fn sleep_enter_without_alarm_gives_no_hint() {
        let mut rtt = Rtt::new(FakeHw::default());
        assert_eq!(rtt.sleep_enter(), None);

        // A GPIO wake-up must not dispatch anything.
        rtt.sleep_exit(WakeupCause::Gpio);
    }

    #[test]
    fn countdown_polls_against_the_counter() {
        let mut rtt = Rtt::new(FakeHw::default());
        rtt.hw.counter = u32::MAX - 5;

        rtt.start(MicroSeconds(10));
        assert!(matches!(rtt.wait(), Err(nb::Error::WouldBlock)));

        // Across the wrap.
        rtt.hw.counter = 4;
        assert!(rtt.wait().is_ok());
        // Once elapsed, wait keeps returning Ok.
        assert!(rtt.wait().is_ok());
    }

    #[test]
    fn countdown_cancel_stops_the_timeout() {
        let mut rtt = Rtt::new(FakeHw::default());
        rtt.start(MicroSeconds(100));
        assert!(rtt.cancel().is_ok());
        assert!(rtt.wait().is_ok());
    }

    #[test]
    fn ticks_map_one_to_one_to_microseconds() {
        assert_eq!(ticks_to_us(0), 0);
        assert_eq!(ticks_to_us(1_000_000), 1_000_000);
        assert_eq!(ticks_to_us(u32::MAX), u32::MAX as u64);
    }
}
