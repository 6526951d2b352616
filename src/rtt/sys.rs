// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTT backend on the system microsecond clock.
//!
//! When the WiFi stack is active it owns FRC2, so the RTT falls back to
//! whatever microsecond clock the application runtime maintains. The
//! runtime side is abstracted as [`SysClock`]: a 32-bit wrapping
//! microsecond timestamp plus a one-shot timeout. Route the timeout
//! callback to [`Rtt::on_interrupt`](crate::rtt::Rtt::on_interrupt).
//!
//! The system clock stops during sleep and is reset by a reboot, so this
//! backend keeps its own offset: on restore the time elapsed on the RTC
//! counter is added to the offset, and after a reboot or deep sleep the
//! counter value saved before going down is added back in as well.

use super::RttHw;
use crate::macros::debug;
use crate::rtc::{Rtc, Scratch};

/// Microsecond clock provided by the application runtime.
pub trait SysClock {
    /// Current system time in microseconds, wrapping at 32 bits.
    fn now_us(&self) -> u32;

    /// Arms a one-shot timeout the given number of microseconds from now.
    /// A pending timeout is replaced.
    fn start_alarm(&mut self, after_us: u32);

    /// Cancels a pending timeout.
    fn cancel_alarm(&mut self);
}

/// Offset after a sleep phase: the RTC-elapsed time is folded in, and at
/// cold start the previously saved counter as well (the system clock
/// restarted from zero).
fn reconciled_offset(offset: u32, saved: u32, elapsed_us: u32, in_init: bool) -> u32 {
    let offset = offset.wrapping_add(elapsed_us);
    if in_init {
        offset.wrapping_add(saved)
    } else {
        offset
    }
}

/// RTT hardware driver on a [`SysClock`].
pub struct SysRtt<C> {
    clock: C,
    rtc: Rtc,
    /// Offset of the counter relative to the system time.
    offset: u32,
    armed: bool,
}

impl<C: SysClock> SysRtt<C> {
    /// Builds the driver from the runtime clock and the RTC block.
    pub fn new(clock: C, rtc: Rtc) -> Self {
        SysRtt {
            clock,
            rtc,
            offset: 0,
            armed: false,
        }
    }

    /// Releases the clock and the RTC block.
    pub fn free(self) -> (C, Rtc) {
        (self.clock, self.rtc)
    }

    /// Access to the RTC block, e.g. to install a measured calibration.
    pub fn rtc_mut(&mut self) -> &mut Rtc {
        &mut self.rtc
    }
}

impl<C: SysClock> RttHw for SysRtt<C> {
    fn init(&mut self) {}

    fn counter(&self) -> u32 {
        self.clock.now_us().wrapping_add(self.offset)
    }

    fn set_alarm(&mut self, alarm: u32) {
        let diff = alarm.wrapping_sub(self.counter());
        debug!("sys: set alarm={} diff={}", alarm, diff);

        self.armed = true;
        self.clock.start_alarm(diff);
    }

    fn clear_alarm(&mut self) {
        self.armed = false;
        self.clock.cancel_alarm();
    }

    fn save_counter(&mut self) {
        critical_section::with(|_| {
            let counter = self.counter();
            let rtc_now = self.rtc.counter();
            self.rtc.set_scratch(Scratch::SavedCounter, counter);
            self.rtc.set_scratch(Scratch::SavedRtc, rtc_now);
        });
    }

    fn restore_counter(&mut self, in_init: bool) {
        critical_section::with(|_| {
            let saved = self.rtc.scratch(Scratch::SavedCounter);
            let rtc_saved = self.rtc.scratch(Scratch::SavedRtc);
            let rtc_diff = self.rtc.counter().wrapping_sub(rtc_saved);
            let elapsed_us = self.rtc.cycles_to_us(rtc_diff);

            self.offset = reconciled_offset(self.offset, saved, elapsed_us, in_init);
        });

        debug!("sys: restored offset={}", self.offset);
    }

    fn power_on(&mut self) {}

    fn power_off(&mut self) {
        self.clock.cancel_alarm();
    }

    fn on_interrupt(&mut self) -> bool {
        if self.armed {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac;

    struct FakeClock {
        now: u32,
        alarm: Option<u32>,
        cancels: u32,
    }

    impl SysClock for FakeClock {
        fn now_us(&self) -> u32 {
            self.now
        }

        fn start_alarm(&mut self, after_us: u32) {
            self.alarm = Some(after_us);
        }

        fn cancel_alarm(&mut self) {
            self.alarm = None;
            self.cancels += 1;
        }
    }

    fn sys_rtt(now: u32) -> SysRtt<FakeClock> {
        // Token only; the tests never touch the registers behind it.
        let rtc = Rtc::new(unsafe { pac::Peripherals::steal() }.RTC);
        SysRtt::new(
            FakeClock {
                now,
                alarm: None,
                cancels: 0,
            },
            rtc,
        )
    }

    #[test]
    fn counter_is_system_time_plus_offset() {
        let mut sys = sys_rtt(1_234);
        assert_eq!(sys.counter(), 1_234);

        sys.offset = 10;
        assert_eq!(sys.counter(), 1_244);

        // Wrapping addition near the top of the range.
        sys.clock.now = u32::MAX;
        assert_eq!(sys.counter(), 9);
    }

    #[test]
    fn alarm_is_armed_with_the_remaining_time() {
        let mut sys = sys_rtt(1_000);
        sys.set_alarm(1_500);
        assert_eq!(sys.clock.alarm, Some(500));
        assert!(sys.on_interrupt());
        // The timeout is one-shot.
        assert!(!sys.on_interrupt());
    }

    #[test]
    fn alarm_behind_the_counter_waits_for_the_wrap() {
        let mut sys = sys_rtt(1_000);
        sys.set_alarm(400);
        // 2^32 - 600 microseconds until the wrapped target.
        assert_eq!(sys.clock.alarm, Some(0u32.wrapping_sub(600)));
    }

    #[test]
    fn clear_alarm_cancels_the_timeout() {
        let mut sys = sys_rtt(0);
        sys.set_alarm(100);
        sys.clear_alarm();
        assert_eq!(sys.clock.alarm, None);
        assert!(!sys.on_interrupt());
    }

    #[test]
    fn power_off_cancels_a_pending_timeout() {
        let mut sys = sys_rtt(0);
        sys.set_alarm(100);
        sys.power_off();
        assert_eq!(sys.clock.cancels, 1);
    }

    #[test]
    fn reconciliation_folds_in_rtc_elapsed_time() {
        // Light sleep resume: only the elapsed time moves the offset.
        assert_eq!(reconciled_offset(100, 77_000, 2_500, false), 2_600);
        // Cold start: the saved counter is folded in as well.
        assert_eq!(reconciled_offset(0, 77_000, 2_500, true), 79_500);
        // Wrapping is fine on both paths.
        assert_eq!(reconciled_offset(u32::MAX, 0, 1, false), 0);
    }
}
