// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # RTC power domain
//!
//! The RTC block keeps running in all sleep modes and across soft resets:
//! a free-running counter clocked by the internal RC oscillator and four
//! battery backed scratch words. The RTT emulation uses both to carry its
//! counter over periods where the CPU timers are powered down.
//!
//! The RC oscillator is neither accurate nor stable, so conversions from
//! RTC cycles to microseconds go through a calibration value in the same
//! fixed point format the ROM uses: microseconds per cycle as Q12.

use crate::pac;

/// Nominal slow clock calibration, Q12 microseconds per cycle.
///
/// The RC oscillator runs at roughly 150 kHz; applications that can
/// measure the real period (e.g. against the crystal) should install the
/// measured value with [`Rtc::set_calibration`].
pub const CALIBRATION_DEFAULT: u32 = ((1_000_000u64 << 12) / 150_000) as u32;

/// The four battery backed scratch words and their assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scratch {
    /// Hardware counter parked before a sleep phase or reboot.
    SavedCounter = 0,
    /// RTC counter captured at the same moment.
    SavedRtc = 1,
    /// Free for the application.
    User2 = 2,
    /// Free for the application.
    User3 = 3,
}

/// Converts RTC cycles to microseconds with the given Q12 calibration.
pub fn clk_to_us(cycles: u32, cal: u32) -> u32 {
    ((u64::from(cycles) * u64::from(cal)) >> 12) as u32
}

/// Owned RTC block.
pub struct Rtc {
    rtc: pac::RTC,
    cal: u32,
}

impl Rtc {
    /// Takes ownership of the RTC block.
    pub fn new(rtc: pac::RTC) -> Self {
        Rtc {
            rtc,
            cal: CALIBRATION_DEFAULT,
        }
    }

    /// Releases the raw peripheral.
    pub fn free(self) -> pac::RTC {
        self.rtc
    }

    /// Current value of the battery backed counter.
    pub fn counter(&self) -> u32 {
        self.rtc.counter.read()
    }

    /// Installed slow clock calibration (Q12 microseconds per cycle).
    pub fn calibration(&self) -> u32 {
        self.cal
    }

    /// Installs a measured slow clock calibration.
    pub fn set_calibration(&mut self, cal: u32) {
        self.cal = cal;
    }

    /// Converts RTC cycles to microseconds using the installed calibration.
    pub fn cycles_to_us(&self, cycles: u32) -> u32 {
        clk_to_us(cycles, self.cal)
    }

    /// Reads a battery backed scratch word.
    pub fn scratch(&self, slot: Scratch) -> u32 {
        self.rtc.scratch[slot as usize].read()
    }

    /// Writes a battery backed scratch word.
    pub fn set_scratch(&mut self, slot: Scratch, value: u32) {
        unsafe { self.rtc.scratch[slot as usize].write(value) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_slots_cover_the_four_words() {
        assert_eq!(Scratch::SavedCounter as usize, 0);
        assert_eq!(Scratch::SavedRtc as usize, 1);
        assert_eq!(Scratch::User2 as usize, 2);
        assert_eq!(Scratch::User3 as usize, 3);
    }

    #[test]
    fn calibration_default_is_nominal_period() {
        // 150 kHz -> 6.67 us per cycle, Q12.
        assert_eq!(CALIBRATION_DEFAULT, 27306);
    }

    #[test]
    fn clk_to_us_scales_by_q12_period() {
        // One second worth of cycles at the nominal rate.
        assert_eq!(clk_to_us(150_000, CALIBRATION_DEFAULT), 999_975);
        assert_eq!(clk_to_us(0, CALIBRATION_DEFAULT), 0);
        // A whole number of microseconds per cycle.
        assert_eq!(clk_to_us(1_000, 5 << 12), 5_000);
    }

    #[test]
    fn clk_to_us_truncates_like_the_counter() {
        // Large cycle counts wrap into the 32-bit microsecond domain.
        let cal = 4 << 12;
        assert_eq!(clk_to_us(u32::MAX, cal), u32::MAX.wrapping_mul(4));
    }
}
