// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The prelude: import the commonly used traits in one go.

pub use embedded_hal::prelude::*;

pub use crate::gpio::GpioExt as _esp8266_hal_gpio_GpioExt;
pub use crate::pm::Sleep as _esp8266_hal_pm_Sleep;
pub use crate::rtt::RttHw as _esp8266_hal_rtt_RttHw;
pub use crate::rtt::SysClock as _esp8266_hal_rtt_SysClock;
pub use crate::time::U32Ext as _esp8266_hal_time_U32Ext;
