// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HAL for the ESP8266 microcontroller
//!
//! This is an implementation of the [`embedded-hal`] traits for the ESP8266,
//! built around three drivers:
//!
//! - [`rtt`]: a 32-bit real-time timer with a frequency of 1 MHz, emulated
//!   on a CPU timer and carried over sleep phases and reboots with the
//!   battery backed RTC counter,
//! - [`gpio`]: the 16 matrix pins plus the GPIO16 pad in the RTC domain,
//! - [`pm`]: the sleep mode transitions tying the two together.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! # Usage
//!
//! ## Commonly used setup
//!
//! ```rust,no_run
//! use esp8266_hal::pac;
//! use esp8266_hal::prelude::*;
//! use esp8266_hal::rtc::Rtc;
//! use esp8266_hal::rtt::{FrcRtt, Rtt};
//!
//! // Get access to the device specific peripherals
//! let dp = pac::Peripherals::take().unwrap();
//!
//! // Split the GPIO block into independent pins
//! let gpio = dp.GPIO.split(dp.IOMUX);
//! let mut led = gpio.gpio2.into_push_pull_output();
//! led.set_high();
//!
//! // Run the real-time timer on the FRC2 counter
//! let mut rtt = Rtt::new(FrcRtt::new(dp.FRC2, dp.DPORT, Rtc::new(dp.RTC)));
//! rtt.set_alarm(rtt.counter().wrapping_add(1_000_000), || {
//!     // one second later, in interrupt context
//! });
//! ```
//!
//! The crate does not install interrupt vectors; route the FRC2 interrupt
//! to [`rtt::Rtt::on_interrupt`] and the GPIO interrupt to
//! [`gpio::handle_interrupt`].

#![no_std]
#![deny(rustdoc::broken_intra_doc_links)]

mod macros;

pub mod gpio;
pub mod pac;
pub mod pm;
pub mod prelude;
pub mod rtc;
pub mod rtt;
pub mod time;
