// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging shims: forward to the `log` crate when the `log` feature is
//! enabled, compile to nothing otherwise.

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::trace!($($arg)+);
        #[cfg(not(feature = "log"))]
        let _ = ::core::format_args!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)+);
        #[cfg(not(feature = "log"))]
        let _ = ::core::format_args!($($arg)+);
    }};
}

pub(crate) use {debug, trace};
