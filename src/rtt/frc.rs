// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTT backend on the FRC2 free-running counter.
//!
//! FRC2 is a 32-bit count-up timer on the 80 MHz AHB clock; with the /256
//! prescaler it runs at 312.5 kHz. The backend scales it to the 1 MHz
//! counter the RTT contract requires, which shrinks the usable hardware
//! range to [`FRC_OVERFLOW`] counts: the point where the scaled value
//! would pass 2^32 microseconds. The hardware never reaches its own wrap;
//! instead the backend parks the alarm register at the scaled mark and
//! reloads `count % FRC_OVERFLOW` when it is hit, so the façade observes
//! a clean 32-bit, 1 MHz counter.
//!
//! While the chip sleeps FRC2 is powered down. The counter is saved to
//! the RTC scratch registers together with the RTC counter, and on
//! restore the RTC cycles that passed in between are converted to
//! microseconds and folded back in.

use super::RttHw;
use crate::macros::{debug, trace};
use crate::pac::{self, dport, frc2};
use crate::rtc::{Rtc, Scratch};

/// FRC2 frequency with the /256 prescaler.
pub const FRC_FREQUENCY: u32 = 80_000_000 >> 8;

/// Hardware counts corresponding to 2^32 microseconds.
pub const FRC_OVERFLOW: u32 = ((1u64 << 32) * FRC_FREQUENCY as u64 / 1_000_000) as u32;

/// Scales hardware counts to microseconds (truncating to 32 bits).
const fn counter_to_us(count: u32) -> u32 {
    (count as u64 * 1_000_000 / FRC_FREQUENCY as u64) as u32
}

/// Scales microseconds to hardware counts (truncating to 32 bits).
const fn us_to_counter(us: u32) -> u32 {
    (us as u64 * FRC_FREQUENCY as u64 / 1_000_000) as u32
}

/// Counter value to reload after a sleep phase: the parked value plus the
/// time that elapsed on the RTC in the meantime.
fn reloaded_count(saved: u32, elapsed_us: u32) -> u32 {
    saved.wrapping_add(us_to_counter(elapsed_us)) % FRC_OVERFLOW
}

/// RTT hardware driver on the FRC2 counter.
pub struct FrcRtt {
    frc2: pac::FRC2,
    dport: pac::DPORT,
    rtc: Rtc,
    /// Alarm target in hardware counts, as set at the interface.
    alarm: u32,
    /// An alarm target is registered.
    armed: bool,
    /// Alarm target currently in the alarm register, 0 when the register
    /// holds the overflow mark.
    active: u32,
}

impl FrcRtt {
    /// Claims FRC2 as the RTT counter.
    ///
    /// The DPORT block is needed to gate the FRC2 edge interrupt, the RTC
    /// to carry the counter over sleep phases.
    pub fn new(frc2: pac::FRC2, dport: pac::DPORT, rtc: Rtc) -> Self {
        FrcRtt {
            frc2,
            dport,
            rtc,
            alarm: 0,
            armed: false,
            active: 0,
        }
    }

    /// Releases the owned peripherals.
    pub fn free(self) -> (pac::FRC2, pac::DPORT, Rtc) {
        (self.frc2, self.dport, self.rtc)
    }

    /// Access to the RTC block, e.g. to install a measured calibration.
    pub fn rtc_mut(&mut self) -> &mut Rtc {
        &mut self.rtc
    }

    /// Re-arms the alarm register for the next event: the registered
    /// alarm if it is still ahead of the counter, the overflow mark
    /// otherwise.
    fn update_alarm(&mut self, count: u32) {
        if self.armed && self.alarm > count {
            self.active = self.alarm;
            // NOTE(unsafe) plain write to the alarm register
            unsafe { self.frc2.alarm.write(self.active) };
        } else {
            self.active = 0;
            unsafe { self.frc2.alarm.write(FRC_OVERFLOW) };
        }
    }
}

impl RttHw for FrcRtt {
    fn init(&mut self) {
        debug!(
            "frc: init saved={} rtc_saved={} @rtc={}",
            self.rtc.scratch(Scratch::SavedCounter),
            self.rtc.scratch(Scratch::SavedRtc),
            self.rtc.counter()
        );

        // NOTE(unsafe) full configuration write: /256 prescaler, no
        // auto-reload, counter running.
        unsafe {
            self.frc2
                .ctrl
                .write(frc2::CTRL_CLK_DIV_256 | frc2::CTRL_ENABLE);
            self.frc2.alarm.write(FRC_OVERFLOW);
        }
        self.active = 0;
    }

    fn counter(&self) -> u32 {
        counter_to_us(self.frc2.count.read())
    }

    fn set_alarm(&mut self, alarm: u32) {
        let count = self.frc2.count.read();

        self.alarm = us_to_counter(alarm) % FRC_OVERFLOW;
        self.armed = true;
        self.update_alarm(count);

        debug!(
            "frc: set alarm_us={} alarm={} active={} @frc={}",
            alarm, self.alarm, self.active, count
        );
    }

    fn clear_alarm(&mut self) {
        // Only the bookkeeping is reset; the alarm register keeps its
        // value until the next interrupt re-arms the overflow mark.
        self.alarm = 0;
        self.armed = false;
    }

    fn save_counter(&mut self) {
        critical_section::with(|_| {
            let count = self.frc2.count.read();
            let rtc_now = self.rtc.counter();
            self.rtc.set_scratch(Scratch::SavedCounter, count);
            self.rtc.set_scratch(Scratch::SavedRtc, rtc_now);
        });

        trace!(
            "frc: saved count={} rtc={}",
            self.rtc.scratch(Scratch::SavedCounter),
            self.rtc.scratch(Scratch::SavedRtc)
        );
    }

    fn restore_counter(&mut self, _in_init: bool) {
        critical_section::with(|_| {
            let saved = self.rtc.scratch(Scratch::SavedCounter);
            let rtc_saved = self.rtc.scratch(Scratch::SavedRtc);
            let rtc_diff = self.rtc.counter().wrapping_sub(rtc_saved);
            let elapsed_us = self.rtc.cycles_to_us(rtc_diff);

            // NOTE(unsafe) writing LOAD also sets the counter
            unsafe { self.frc2.load.write(reloaded_count(saved, elapsed_us)) };
        });
    }

    fn power_on(&mut self) {
        // NOTE(unsafe) read-modify-write of the control and interrupt
        // enable registers
        unsafe {
            self.frc2.ctrl.modify(|v| v | frc2::CTRL_ENABLE);
            self.dport
                .int_enable
                .modify(|v| v | dport::INT_ENABLE_FRC2);
        }
    }

    fn power_off(&mut self) {
        unsafe {
            self.frc2.ctrl.modify(|v| v & !frc2::CTRL_ENABLE);
            self.dport
                .int_enable
                .modify(|v| v & !dport::INT_ENABLE_FRC2);
        }
    }

    fn on_interrupt(&mut self) -> bool {
        let count = self.frc2.count.read() % FRC_OVERFLOW;

        // NOTE(unsafe) acknowledge the edge interrupt
        unsafe { self.frc2.int_clear.write(frc2::INT_CLEAR) };

        if self.active == 0 {
            // Scaled overflow mark reached: emulate the 32-bit wrap.
            trace!("frc: overflow @frc={}", count);
            unsafe { self.frc2.load.write(count) };
        }

        let fired = self.armed && self.active == self.alarm;
        if fired {
            self.armed = false;
        }

        self.update_alarm(count);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_overflow_marks_the_32bit_microsecond_wrap() {
        // 2^32 us at 312.5 kHz.
        assert_eq!(FRC_OVERFLOW, 1_342_177_280);
        assert_eq!(counter_to_us(FRC_OVERFLOW), 0); // exactly 2^32, truncated
        assert_eq!(counter_to_us(FRC_OVERFLOW - 1), u32::MAX - 3);
    }

    #[test]
    fn count_scales_to_microseconds() {
        assert_eq!(counter_to_us(0), 0);
        assert_eq!(counter_to_us(FRC_FREQUENCY), 1_000_000);
        // 1 count = 3.2 us.
        assert_eq!(counter_to_us(10), 32);
    }

    #[test]
    fn microseconds_scale_to_counts() {
        assert_eq!(us_to_counter(1_000_000), FRC_FREQUENCY);
        assert_eq!(us_to_counter(32), 10);
        // Sub-count values truncate.
        assert_eq!(us_to_counter(3), 0);
    }

    #[test]
    fn reload_adds_the_slept_time() {
        assert_eq!(reloaded_count(1_000, 32), 1_010);
        // The reload stays inside the emulated range.
        assert_eq!(reloaded_count(FRC_OVERFLOW - 5, 32), 5);
    }
}
