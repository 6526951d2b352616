// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time units used throughout the crate.

/// Hertz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hertz(pub u32);

/// Microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MicroSeconds(pub u32);

/// Extension trait that adds convenience methods to the `u32` type.
pub trait U32Ext {
    /// Wrap in `Hertz`.
    fn hz(self) -> Hertz;

    /// Wrap in kilohertz.
    fn khz(self) -> Hertz;

    /// Wrap in megahertz.
    fn mhz(self) -> Hertz;

    /// Wrap in `MicroSeconds`.
    fn us(self) -> MicroSeconds;

    /// Wrap milliseconds in `MicroSeconds`.
    fn ms(self) -> MicroSeconds;
}

impl U32Ext for u32 {
    fn hz(self) -> Hertz {
        Hertz(self)
    }

    fn khz(self) -> Hertz {
        Hertz(self * 1_000)
    }

    fn mhz(self) -> Hertz {
        Hertz(self * 1_000_000)
    }

    fn us(self) -> MicroSeconds {
        MicroSeconds(self)
    }

    fn ms(self) -> MicroSeconds {
        MicroSeconds(self * 1_000)
    }
}

impl From<Hertz> for MicroSeconds {
    /// Period of the given frequency.
    fn from(freq: Hertz) -> MicroSeconds {
        MicroSeconds(1_000_000 / freq.0)
    }
}
