// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Register definitions for the ESP8266 peripherals used by this crate.
//!
//! There is no maintained peripheral access crate for the ESP8266, so the
//! blocks this HAL touches are defined here in the usual PAC shape: one
//! zero-sized ownership token per peripheral, `Deref` to a `#[repr(C)]`
//! register block, and a [`Peripherals`] singleton with `take`/`steal`.

use core::marker::PhantomData;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, Ordering};

use volatile_register::{RO, RW};

macro_rules! peripheral {
    ($(#[$doc:meta])* $TY:ident, $block:ty, $addr:literal) => {
        $(#[$doc])*
        pub struct $TY {
            _marker: PhantomData<*const ()>,
        }

        unsafe impl Send for $TY {}

        impl $TY {
            /// Pointer to the register block.
            pub const fn ptr() -> *const $block {
                $addr as *const _
            }
        }

        impl Deref for $TY {
            type Target = $block;

            #[inline(always)]
            fn deref(&self) -> &Self::Target {
                unsafe { &*Self::ptr() }
            }
        }
    };
}

peripheral!(
    /// General purpose I/O for pins 0 to 15.
    GPIO,
    gpio::RegisterBlock,
    0x6000_0300
);
peripheral!(
    /// Pin function multiplexer.
    IOMUX,
    iomux::RegisterBlock,
    0x6000_0800
);
peripheral!(
    /// RTC power domain: battery backed counter, scratch registers and
    /// the GPIO16 pad.
    RTC,
    rtc::RegisterBlock,
    0x6000_0700
);
peripheral!(
    /// Free-running counter 2, a 32-bit count-up timer with alarm.
    FRC2,
    frc2::RegisterBlock,
    0x6000_0620
);
peripheral!(
    /// DPORT interrupt enable block.
    DPORT,
    dport::RegisterBlock,
    0x3ff0_0000
);

/// All peripherals known to this crate.
#[allow(non_snake_case)]
pub struct Peripherals {
    /// GPIO
    pub GPIO: GPIO,
    /// IOMUX
    pub IOMUX: IOMUX,
    /// RTC
    pub RTC: RTC,
    /// FRC2
    pub FRC2: FRC2,
    /// DPORT
    pub DPORT: DPORT,
}

static PERIPHERALS_TAKEN: AtomicBool = AtomicBool::new(false);

impl Peripherals {
    /// Returns all peripherals the first time it is called.
    pub fn take() -> Option<Self> {
        critical_section::with(|_| {
            if PERIPHERALS_TAKEN.swap(true, Ordering::Relaxed) {
                None
            } else {
                Some(unsafe { Self::steal() })
            }
        })
    }

    /// Unchecked version of [`Peripherals::take`].
    ///
    /// # Safety
    ///
    /// Must not be used to create aliases of peripherals that are already
    /// owned elsewhere.
    pub unsafe fn steal() -> Self {
        PERIPHERALS_TAKEN.store(true, Ordering::Relaxed);
        Peripherals {
            GPIO: GPIO {
                _marker: PhantomData,
            },
            IOMUX: IOMUX {
                _marker: PhantomData,
            },
            RTC: RTC {
                _marker: PhantomData,
            },
            FRC2: FRC2 {
                _marker: PhantomData,
            },
            DPORT: DPORT {
                _marker: PhantomData,
            },
        }
    }
}

/// GPIO registers.
pub mod gpio {
    use super::{RO, RW};

    /// Register block at `0x6000_0300`.
    #[repr(C)]
    pub struct RegisterBlock {
        /// Output level.
        pub out: RW<u32>,
        /// Write 1 to set output bits.
        pub out_set: RW<u32>,
        /// Write 1 to clear output bits.
        pub out_clear: RW<u32>,
        /// Output enable.
        pub enable_out: RW<u32>,
        /// Write 1 to set output enable bits.
        pub enable_out_set: RW<u32>,
        /// Write 1 to clear output enable bits.
        pub enable_out_clear: RW<u32>,
        /// Input level.
        pub in_: RO<u32>,
        /// Interrupt status.
        pub status: RW<u32>,
        /// Write 1 to set status bits.
        pub status_set: RW<u32>,
        /// Write 1 to clear status bits.
        pub status_clear: RW<u32>,
        /// Per-pin configuration.
        pub conf: [RW<u32>; 16],
    }

    /// CONF: pin output driven from the sigma-delta source.
    pub const CONF_SOURCE: u32 = 1 << 0;
    /// CONF: open drain driver.
    pub const CONF_OPEN_DRAIN: u32 = 1 << 2;
    /// CONF: interrupt type field offset.
    pub const CONF_INT_TYPE_SHIFT: u32 = 7;
    /// CONF: interrupt type field mask.
    pub const CONF_INT_TYPE_MASK: u32 = 0b111 << CONF_INT_TYPE_SHIFT;
    /// CONF: pin participates in light-sleep wakeup.
    pub const CONF_WAKEUP_ENABLE: u32 = 1 << 10;
}

/// IOMUX registers.
pub mod iomux {
    use super::RW;

    /// Register block at `0x6000_0800`.
    #[repr(C)]
    pub struct RegisterBlock {
        /// Global IOMUX configuration.
        pub conf: RW<u32>,
        /// Per-pad configuration, indexed by IOMUX (not GPIO) number.
        pub pin: [RW<u32>; 16],
    }

    /// Pad drives its output in the active state.
    pub const PIN_OUTPUT_ENABLE: u32 = 1 << 0;
    /// Pad keeps driving its output during sleep.
    pub const PIN_OUTPUT_ENABLE_SLEEP: u32 = 1 << 1;
    /// Pull-down active during sleep.
    pub const PIN_PULLDOWN_SLEEP: u32 = 1 << 2;
    /// Pull-up active during sleep.
    pub const PIN_PULLUP_SLEEP: u32 = 1 << 3;
    /// Pull-down active.
    pub const PIN_PULLDOWN: u32 = 1 << 6;
    /// Pull-up active.
    pub const PIN_PULLUP: u32 = 1 << 7;
    /// Mask covering both function select fields.
    pub const PIN_FUNC_MASK: u32 = (0b11 << 4) | (1 << 8);

    /// Encodes a 3-bit pad function into the split register fields.
    pub const fn func(f: u32) -> u32 {
        ((f & 0b11) << 4) | ((f & 0b100) << 6)
    }
}

/// RTC power domain registers.
pub mod rtc {
    use super::{RO, RW};

    /// Register block at `0x6000_0700`.
    #[repr(C)]
    pub struct RegisterBlock {
        /// Domain control.
        pub ctrl0: RW<u32>,
        /// Counter alarm.
        pub counter_alarm: RW<u32>,
        _reserved0: [u32; 5],
        /// Free-running counter clocked from the RTC oscillator. Keeps
        /// counting in all sleep modes and across soft resets.
        pub counter: RO<u32>,
        /// Interrupt set.
        pub int_set: RW<u32>,
        /// Interrupt clear.
        pub int_clear: RW<u32>,
        /// Interrupt enable.
        pub int_enable: RW<u32>,
        _reserved1: u32,
        /// Battery backed scratch words, preserved over sleep and reset.
        pub scratch: [RW<u32>; 4],
        _reserved2: [u32; 10],
        /// GPIO16 output level (bit 0).
        pub gpio_out: RW<u32>,
        _reserved3: [u32; 2],
        /// GPIO16 output enable (bit 0).
        pub gpio_enable: RW<u32>,
        _reserved4: [u32; 5],
        /// GPIO16 input level (bit 0).
        pub gpio_in: RO<u32>,
        /// GPIO16 pad configuration.
        pub gpio_conf: RW<u32>,
        /// XPD_DCDC pad function configuration.
        pub gpio_cfg: [RW<u32>; 6],
    }

    /// GPIO_CONF/GPIO_ENABLE: drive the pad.
    pub const GPIO_CONF_OUT_ENABLE: u32 = 1 << 0;
    /// GPIO_CFG\[3\]: pull-up on the GPIO16 pad.
    pub const GPIO_CFG3_PIN_PULLUP: u32 = 1 << 2;
    /// GPIO_CFG\[3\]: mask of the pad function bits.
    pub const GPIO_CFG3_FUNC_MASK: u32 = 0x43;
    /// GPIO_CFG\[3\]: pad function RTC GPIO.
    pub const GPIO_CFG3_FUNC_GPIO: u32 = 0x1;
}

/// FRC2 timer registers.
pub mod frc2 {
    use super::{RO, RW};

    /// Register block at `0x6000_0620`.
    #[repr(C)]
    pub struct RegisterBlock {
        /// Counter load value; writing also sets the counter.
        pub load: RW<u32>,
        /// Current counter value.
        pub count: RO<u32>,
        /// Control register.
        pub ctrl: RW<u32>,
        /// Write 1 to bit 0 to clear the pending interrupt.
        pub int_clear: RW<u32>,
        /// Alarm value; an interrupt is raised when the counter reaches it.
        pub alarm: RW<u32>,
    }

    /// CTRL: hold the interrupt line until acknowledged.
    pub const CTRL_INT_HOLD: u32 = 1 << 0;
    /// CTRL: prescaler field offset.
    pub const CTRL_CLK_DIV_SHIFT: u32 = 2;
    /// CTRL: prescaler field mask.
    pub const CTRL_CLK_DIV_MASK: u32 = 0b11 << CTRL_CLK_DIV_SHIFT;
    /// CTRL: divide the 80 MHz AHB clock by 256.
    pub const CTRL_CLK_DIV_256: u32 = 2 << CTRL_CLK_DIV_SHIFT;
    /// CTRL: reload from LOAD on alarm.
    pub const CTRL_RELOAD: u32 = 1 << 6;
    /// CTRL: counter running.
    pub const CTRL_ENABLE: u32 = 1 << 7;
    /// CTRL: raw interrupt status.
    pub const CTRL_INT_STATUS: u32 = 1 << 8;
    /// INT: write to acknowledge the interrupt.
    pub const INT_CLEAR: u32 = 1 << 0;
}

/// DPORT registers.
pub mod dport {
    use super::RW;

    /// Register block at `0x3ff0_0000`.
    #[repr(C)]
    pub struct RegisterBlock {
        _reserved0: u32,
        /// Edge interrupt enable bits.
        pub int_enable: RW<u32>,
    }

    /// INT_ENABLE: watchdog edge interrupt.
    pub const INT_ENABLE_WDT: u32 = 1 << 0;
    /// INT_ENABLE: FRC1 edge interrupt.
    pub const INT_ENABLE_FRC1: u32 = 1 << 1;
    /// INT_ENABLE: FRC2 edge interrupt.
    pub const INT_ENABLE_FRC2: u32 = 1 << 2;
}
