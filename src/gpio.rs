// Copyright 2024 The esp8266-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General purpose I/O
//!
//! The ESP8266 has a single port of 16 pins plus the GPIO16 pad, which
//! lives in the RTC power domain and has its own registers. Pins 6 to 11
//! connect the flash chip on almost every module and start out in the
//! locked [`Flash`] state.
//!
//! Interrupt handlers are plain `fn()` values registered per pin; route
//! the GPIO interrupt to [`handle_interrupt`]. Edge triggers cannot wake
//! the chip from light sleep, so while sleeping they are rewritten to the
//! level that follows the edge and restored on wake-up.

use core::cell::RefCell;
use core::convert::Infallible;
use core::marker::PhantomData;

use critical_section::Mutex;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

use crate::macros::debug;
use crate::pac::{self, gpio as regs, iomux, rtc};
use crate::pm::{SleepMode, WakeupCause};

/// IOMUX pad index for each GPIO number.
const GPIO_TO_IOMUX: [u8; 16] = [12, 5, 13, 4, 14, 15, 6, 7, 8, 9, 10, 11, 0, 1, 2, 3];

/// GPIO number for each IOMUX pad index.
const IOMUX_TO_GPIO: [u8; 16] = [12, 13, 14, 15, 3, 1, 6, 7, 8, 9, 10, 11, 0, 2, 4, 5];

/// Pad function that routes an IOMUX pad to the GPIO matrix.
const fn gpio_function(pad: usize) -> u32 {
    // Pads 12 to 15 (GPIO0/2/4/5) use function 0 for GPIO, all others
    // function 3.
    if pad > 11 {
        0
    } else {
        3
    }
}

/// Per-pin interrupt handler.
pub type Handler = fn();

/// Interrupt trigger conditions, encoded as in the per-pin CONF field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    RisingEdge = 1,
    FallingEdge = 2,
    AnyEdge = 3,
    LowLevel = 4,
    HighLevel = 5,
}

impl Event {
    /// The level trigger that stands in for this event during light
    /// sleep. Only levels can wake the chip; an edge is replaced with
    /// the level it ends on, and [`Event::AnyEdge`] has no equivalent.
    fn wakeup_level(self) -> Option<Event> {
        match self {
            Event::RisingEdge => Some(Event::HighLevel),
            Event::FallingEdge => Some(Event::LowLevel),
            Event::AnyEdge => None,
            Event::LowLevel | Event::HighLevel => Some(self),
        }
    }
}

/// Extension trait to split the GPIO peripheral into independent pins.
pub trait GpioExt {
    /// The parts to split the GPIO into.
    type Parts;

    /// Splits the GPIO block into independent pins.
    ///
    /// The IOMUX is consumed as well; pin mode changes reconfigure the
    /// pad multiplexer.
    fn split(self, iomux: pac::IOMUX) -> Self::Parts;
}

/// Marker trait for active states.
pub trait Active {}

/// Input mode (type state)
#[derive(Default)]
pub struct Input<MODE = Floating> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Input<MODE> {}

/// Connected to the flash chip (type state)
#[derive(Default)]
pub struct Flash;

/// Floating input (type state)
#[derive(Default)]
pub struct Floating;

/// Pulled up input (type state)
#[derive(Default)]
pub struct PullUp;

/// Output mode (type state)
#[derive(Default)]
pub struct Output<MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Output<MODE> {}

/// Push pull output (type state)
#[derive(Default)]
pub struct PushPull;

/// Open drain output (type state)
#[derive(Default)]
pub struct OpenDrain;

/// Digital output pin state
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinState {
    High,
    Low,
}

mod sealed {
    pub trait PinMode: Default {
        const OUTPUT: bool;
        const OPEN_DRAIN: bool = false;
        const PULLUP: bool = false;
    }
}

use sealed::PinMode;

impl PinMode for Input<Floating> {
    const OUTPUT: bool = false;
}

impl PinMode for Input<PullUp> {
    const OUTPUT: bool = false;
    const PULLUP: bool = true;
}

impl PinMode for Output<PushPull> {
    const OUTPUT: bool = true;
}

impl PinMode for Output<OpenDrain> {
    const OUTPUT: bool = true;
    const OPEN_DRAIN: bool = true;
}

macro_rules! gpio {
    ([$($PXi:ident: ($pxi:ident, $pin_number:expr $(, $MODE:ty)?),)+]) => {
        /// GPIO parts
        pub struct Parts {
            $(
                /// Pin
                pub $pxi: $PXi $(<$MODE>)?,
            )+
            /// The GPIO16 pad in the RTC power domain.
            pub gpio16: Gpio16,
        }

        $(
            pub type $PXi<MODE = Input<Floating>> = Pin<$pin_number, MODE>;
        )+

        impl GpioExt for pac::GPIO {
            type Parts = Parts;

            fn split(self, _iomux: pac::IOMUX) -> Parts {
                Parts {
                    $(
                        $pxi: Pin::new(),
                    )+
                    gpio16: Gpio16::new(),
                }
            }
        }
    }
}

gpio!([
    Gpio0: (gpio0, 0),
    Gpio1: (gpio1, 1),
    Gpio2: (gpio2, 2),
    Gpio3: (gpio3, 3),
    Gpio4: (gpio4, 4),
    Gpio5: (gpio5, 5),
    Gpio6: (gpio6, 6, Flash),
    Gpio7: (gpio7, 7, Flash),
    Gpio8: (gpio8, 8, Flash),
    Gpio9: (gpio9, 9, Flash),
    Gpio10: (gpio10, 10, Flash),
    Gpio11: (gpio11, 11, Flash),
    Gpio12: (gpio12, 12),
    Gpio13: (gpio13, 13),
    Gpio14: (gpio14, 14),
    Gpio15: (gpio15, 15),
]);

/// Generic pin type
///
/// - `N` is the pin number: from `0` to `15`.
/// - `MODE` is one of the pin modes (see the type states above).
pub struct Pin<const N: u8, MODE = Input<Floating>> {
    _mode: PhantomData<MODE>,
}

impl<const N: u8, MODE> Pin<N, MODE> {
    fn new() -> Self {
        Pin { _mode: PhantomData }
    }
}

impl<const N: u8> Pin<N, Flash> {
    /// Put the pin in an active state. The caller must enforce that the
    /// pad is really unused by the flash chip (e.g. GPIO9/GPIO10 on
    /// modules that run the flash in DIO mode).
    pub unsafe fn activate(self) -> Pin<N, Input<Floating>> {
        Pin::new()
    }
}

// Internal helper functions

// NOTE: The functions in this impl block are "safe", but they are
// callable when the pin is in modes where they don't make sense.
impl<const N: u8, MODE> Pin<N, MODE> {
    #[inline(always)]
    fn _set_state(&mut self, state: PinState) {
        match state {
            PinState::High => self._set_high(),
            PinState::Low => self._set_low(),
        }
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        // NOTE(unsafe) atomic write to a stateless set register
        unsafe { (*pac::GPIO::ptr()).out_set.write(1 << N) }
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        // NOTE(unsafe) atomic write to a stateless clear register
        unsafe { (*pac::GPIO::ptr()).out_clear.write(1 << N) }
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        // NOTE(unsafe) atomic read with no side effects
        unsafe { (*pac::GPIO::ptr()).out.read() & (1 << N) == 0 }
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        // NOTE(unsafe) atomic read with no side effects
        unsafe { (*pac::GPIO::ptr()).in_.read() & (1 << N) == 0 }
    }
}

impl<const N: u8, M> Pin<N, M> {
    fn mode<MODE: PinMode>(&mut self) {
        let gpio = unsafe { &*pac::GPIO::ptr() };
        let mux = unsafe { &*pac::IOMUX::ptr() };
        let pad = GPIO_TO_IOMUX[N as usize] as usize;

        // NOTE(unsafe) the pad and the CONF register belong to this pin
        unsafe {
            mux.pin[pad].modify(|v| {
                let cleared = v
                    & !(iomux::PIN_FUNC_MASK
                        | iomux::PIN_PULLUP
                        | iomux::PIN_PULLDOWN
                        | iomux::PIN_OUTPUT_ENABLE);
                let mut v = cleared | iomux::func(gpio_function(pad));
                if MODE::PULLUP {
                    v |= iomux::PIN_PULLUP;
                }
                if MODE::OUTPUT {
                    v |= iomux::PIN_OUTPUT_ENABLE;
                }
                v
            });

            if MODE::OPEN_DRAIN {
                gpio.conf[N as usize].modify(|v| (v & !regs::CONF_SOURCE) | regs::CONF_OPEN_DRAIN);
            } else {
                gpio.conf[N as usize]
                    .modify(|v| v & !(regs::CONF_SOURCE | regs::CONF_OPEN_DRAIN));
            }

            if MODE::OUTPUT {
                gpio.enable_out_set.write(1 << N);
            } else {
                gpio.enable_out_clear.write(1 << N);
            }
        }
    }
}

impl<const N: u8, MODE> Pin<N, MODE>
where
    MODE: Active,
{
    /// Configures the pin to operate as a floating input pin.
    #[inline]
    pub fn into_floating_input(mut self) -> Pin<N, Input<Floating>> {
        self.mode::<Input<Floating>>();
        Pin::new()
    }

    /// Configures the pin to operate as a pulled up input pin.
    #[inline]
    pub fn into_pull_up_input(mut self) -> Pin<N, Input<PullUp>> {
        self.mode::<Input<PullUp>>();
        Pin::new()
    }

    /// Configures the pin to operate as a push-pull output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_push_pull_output(self) -> Pin<N, Output<PushPull>> {
        self.into_push_pull_output_with_state(PinState::Low)
    }

    /// Configures the pin to operate as a push-pull output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_push_pull_output_with_state(
        mut self,
        initial_state: PinState,
    ) -> Pin<N, Output<PushPull>> {
        self._set_state(initial_state);
        self.mode::<Output<PushPull>>();
        Pin::new()
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_open_drain_output(self) -> Pin<N, Output<OpenDrain>> {
        self.into_open_drain_output_with_state(PinState::Low)
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_open_drain_output_with_state(
        mut self,
        initial_state: PinState,
    ) -> Pin<N, Output<OpenDrain>> {
        self._set_state(initial_state);
        self.mode::<Output<OpenDrain>>();
        Pin::new()
    }

    /// Enables or disables the internal pull-up without changing the
    /// pin mode.
    pub fn internal_pull_up(&mut self, on: bool) {
        let mux = unsafe { &*pac::IOMUX::ptr() };
        let pad = GPIO_TO_IOMUX[N as usize] as usize;

        // NOTE(unsafe) the pad belongs to this pin
        unsafe {
            mux.pin[pad].modify(|v| {
                if on {
                    v | iomux::PIN_PULLUP
                } else {
                    v & !iomux::PIN_PULLUP
                }
            });
        }
    }

    /// Erases the pin number from the type.
    ///
    /// This is useful when you want to collect the pins into an array
    /// where you need all the elements to have the same type.
    pub fn erase(self) -> ErasedPin<MODE> {
        ErasedPin {
            pin: N,
            _mode: PhantomData,
        }
    }
}

impl<const N: u8, MODE> Pin<N, Output<MODE>> {
    #[inline]
    pub fn set_high(&mut self) {
        self._set_high()
    }

    #[inline]
    pub fn set_low(&mut self) {
        self._set_low()
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        self._set_state(state)
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        !self._is_set_low()
    }

    #[inline]
    pub fn is_set_low(&self) -> bool {
        self._is_set_low()
    }

    #[inline]
    pub fn toggle(&mut self) {
        if self._is_set_low() {
            self._set_high()
        } else {
            self._set_low()
        }
    }
}

impl<const N: u8, MODE> OutputPin for Pin<N, Output<MODE>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_low();
        Ok(())
    }
}

impl<const N: u8, MODE> StatefulOutputPin for Pin<N, Output<MODE>> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<const N: u8, MODE> ToggleableOutputPin for Pin<N, Output<MODE>> {
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<const N: u8, MODE> Pin<N, Input<MODE>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const N: u8, MODE> InputPin for Pin<N, Input<MODE>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<const N: u8> Pin<N, Output<OpenDrain>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const N: u8> InputPin for Pin<N, Output<OpenDrain>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

// Interrupts

static HANDLERS: Mutex<RefCell<[Option<Handler>; 16]>> = Mutex::new(RefCell::new([None; 16]));
static EVENTS: Mutex<RefCell<[Option<Event>; 16]>> = Mutex::new(RefCell::new([None; 16]));
static SLEEP_SAVED: Mutex<RefCell<[Option<Event>; 16]>> = Mutex::new(RefCell::new([None; 16]));

fn set_int_type(pin: usize, bits: u32) {
    let gpio = unsafe { &*pac::GPIO::ptr() };

    // NOTE(unsafe) the CONF register belongs to the calling pin
    unsafe {
        gpio.conf[pin].modify(|v| {
            (v & !regs::CONF_INT_TYPE_MASK) | (bits << regs::CONF_INT_TYPE_SHIFT)
        });
    }
}

impl<const N: u8, MODE> Pin<N, Input<MODE>> {
    /// Registers `handler` to run when `event` occurs on this pin and
    /// enables the interrupt.
    pub fn attach_interrupt(&mut self, event: Event, handler: Handler) {
        critical_section::with(|cs| {
            HANDLERS.borrow_ref_mut(cs)[N as usize] = Some(handler);
            EVENTS.borrow_ref_mut(cs)[N as usize] = Some(event);
        });
        set_int_type(N as usize, event as u32);
    }

    /// Disables the interrupt and removes the handler.
    pub fn detach_interrupt(&mut self) {
        set_int_type(N as usize, 0);
        critical_section::with(|cs| {
            HANDLERS.borrow_ref_mut(cs)[N as usize] = None;
            EVENTS.borrow_ref_mut(cs)[N as usize] = None;
        });
    }

    /// Re-enables an interrupt masked with
    /// [`disable_interrupt`](Pin::disable_interrupt).
    pub fn enable_interrupt(&mut self) {
        let event = critical_section::with(|cs| EVENTS.borrow_ref(cs)[N as usize]);
        if let Some(event) = event {
            set_int_type(N as usize, event as u32);
        }
    }

    /// Masks the interrupt, keeping the handler registered.
    pub fn disable_interrupt(&mut self) {
        set_int_type(N as usize, 0);
    }
}

/// Services the GPIO interrupt.
///
/// Call this from the GPIO interrupt vector. Every pending pin is
/// acknowledged and its handler invoked; the wake-up cause is set to
/// [`WakeupCause::Gpio`] so that a wake-up from light sleep is
/// attributed correctly.
pub fn handle_interrupt() {
    let gpio = unsafe { &*pac::GPIO::ptr() };

    let mut status = gpio.status.read() & 0xffff;
    // NOTE(unsafe) atomic write to a stateless clear register
    unsafe { gpio.status_clear.write(status) };

    if status != 0 {
        crate::pm::set_wakeup_cause(WakeupCause::Gpio);
    }

    while status != 0 {
        let pin = status.trailing_zeros() as usize;
        status &= !(1 << pin);

        let handler = critical_section::with(|cs| HANDLERS.borrow_ref(cs)[pin]);
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Rewrites interrupt triggers for a sleep phase.
///
/// Only level triggers can wake the chip from light sleep: every pin
/// with an interrupt configured has its trigger replaced by the
/// equivalent wake-up level and flagged as a wake-up source. A two-edge
/// trigger has no level equivalent; it keeps its configuration and
/// simply cannot end the sleep.
pub fn sleep_enter(mode: SleepMode) {
    if mode != SleepMode::Light {
        return;
    }

    critical_section::with(|cs| {
        let events = EVENTS.borrow_ref(cs);
        let mut saved = SLEEP_SAVED.borrow_ref_mut(cs);

        for pin in 0..16 {
            let Some(event) = events[pin] else { continue };

            let Some(level) = event.wakeup_level() else {
                debug!("gpio: pin {} trigger cannot wake from light sleep", pin);
                continue;
            };
            saved[pin] = Some(event);

            // NOTE(unsafe) inside a critical section
            unsafe {
                (*pac::GPIO::ptr()).conf[pin].modify(|v| {
                    (v & !regs::CONF_INT_TYPE_MASK)
                        | ((level as u32) << regs::CONF_INT_TYPE_SHIFT)
                        | regs::CONF_WAKEUP_ENABLE
                });
            }
        }
    });
}

/// Restores the interrupt triggers rewritten by [`sleep_enter`].
pub fn sleep_exit(cause: WakeupCause) {
    debug!("gpio: sleep exit cause={:?}", cause);

    critical_section::with(|cs| {
        let mut saved = SLEEP_SAVED.borrow_ref_mut(cs);

        for pin in 0..16 {
            let Some(event) = saved[pin].take() else { continue };

            // NOTE(unsafe) inside a critical section
            unsafe {
                (*pac::GPIO::ptr()).conf[pin].modify(|v| {
                    (v & !(regs::CONF_INT_TYPE_MASK | regs::CONF_WAKEUP_ENABLE))
                        | ((event as u32) << regs::CONF_INT_TYPE_SHIFT)
                });
            }
        }
    });
}

// Erased pin

/// Pin with the pin number erased from the type.
pub struct ErasedPin<MODE> {
    pin: u8,
    _mode: PhantomData<MODE>,
}

impl<MODE> ErasedPin<MODE> {
    /// Return pin number
    pub fn pin_id(&self) -> u8 {
        self.pin
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        // NOTE(unsafe) atomic write to a stateless set register
        unsafe { (*pac::GPIO::ptr()).out_set.write(1 << self.pin) }
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        // NOTE(unsafe) atomic write to a stateless clear register
        unsafe { (*pac::GPIO::ptr()).out_clear.write(1 << self.pin) }
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        // NOTE(unsafe) atomic read with no side effects
        unsafe { (*pac::GPIO::ptr()).out.read() & (1 << self.pin) == 0 }
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        // NOTE(unsafe) atomic read with no side effects
        unsafe { (*pac::GPIO::ptr()).in_.read() & (1 << self.pin) == 0 }
    }
}

impl<MODE> OutputPin for ErasedPin<Output<MODE>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self._set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self._set_low();
        Ok(())
    }
}

impl<MODE> StatefulOutputPin for ErasedPin<Output<MODE>> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_set_low())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_set_low())
    }
}

impl<MODE> InputPin for ErasedPin<Input<MODE>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_low())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self._is_low())
    }
}

// GPIO16

/// The GPIO16 pad.
///
/// GPIO16 sits in the RTC power domain, away from the IOMUX and the
/// GPIO matrix; only push-pull output and floating input are available
/// and it cannot raise interrupts. The configuration below touches only
/// the pad registers of the RTC block.
pub struct Gpio16<MODE = Input<Floating>> {
    _mode: PhantomData<MODE>,
}

impl<MODE> Gpio16<MODE> {
    fn new() -> Self {
        Gpio16 { _mode: PhantomData }
    }

    fn init(output: bool) {
        let block = unsafe { &*pac::RTC::ptr() };

        // NOTE(unsafe) only the GPIO16 pad registers are written
        unsafe {
            // Hand the pad from XPD_DCDC to the RTC GPIO function.
            block.gpio_cfg[3]
                .modify(|v| (v & !rtc::GPIO_CFG3_FUNC_MASK) | rtc::GPIO_CFG3_FUNC_GPIO);
            block.gpio_conf.modify(|v| v & !rtc::GPIO_CONF_OUT_ENABLE);
            block.gpio_enable.modify(|v| {
                if output {
                    v | rtc::GPIO_CONF_OUT_ENABLE
                } else {
                    v & !rtc::GPIO_CONF_OUT_ENABLE
                }
            });
        }
    }

    /// Configures the pad to operate as a push-pull output pin.
    pub fn into_push_pull_output(self) -> Gpio16<Output<PushPull>> {
        Self::init(true);
        Gpio16::new()
    }

    /// Configures the pad to operate as a floating input pin.
    pub fn into_floating_input(self) -> Gpio16<Input<Floating>> {
        Self::init(false);
        Gpio16::new()
    }
}

impl Gpio16<Output<PushPull>> {
    #[inline]
    pub fn set_high(&mut self) {
        // NOTE(unsafe) read-modify-write of bit 0 only
        unsafe { (*pac::RTC::ptr()).gpio_out.modify(|v| v | 1) }
    }

    #[inline]
    pub fn set_low(&mut self) {
        unsafe { (*pac::RTC::ptr()).gpio_out.modify(|v| v & !1) }
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        unsafe { (*pac::RTC::ptr()).gpio_out.read() & 1 != 0 }
    }

    #[inline]
    pub fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low()
        } else {
            self.set_high()
        }
    }
}

impl OutputPin for Gpio16<Output<PushPull>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_low();
        Ok(())
    }
}

impl StatefulOutputPin for Gpio16<Output<PushPull>> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.is_set_high())
    }
}

impl ToggleableOutputPin for Gpio16<Output<PushPull>> {
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl Gpio16<Input<Floating>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        unsafe { (*pac::RTC::ptr()).gpio_in.read() & 1 != 0 }
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl InputPin for Gpio16<Input<Floating>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iomux_tables_are_inverses() {
        for gpio in 0..16 {
            let pad = GPIO_TO_IOMUX[gpio] as usize;
            assert_eq!(IOMUX_TO_GPIO[pad] as usize, gpio);
        }
    }

    #[test]
    fn gpio_function_depends_on_the_pad() {
        // GPIO0/2/4/5 sit on pads 12 to 15 and use function 0.
        assert_eq!(gpio_function(GPIO_TO_IOMUX[0] as usize), 0);
        assert_eq!(gpio_function(GPIO_TO_IOMUX[2] as usize), 0);
        // Everything else uses function 3.
        assert_eq!(gpio_function(GPIO_TO_IOMUX[1] as usize), 3);
        assert_eq!(gpio_function(GPIO_TO_IOMUX[12] as usize), 3);
    }

    #[test]
    fn pad_function_bits_are_split() {
        // Functions 0 to 3 occupy bits 4/5, bit 2 of the function lands
        // in bit 8.
        assert_eq!(iomux::func(0), 0);
        assert_eq!(iomux::func(3), 0b11 << 4);
        assert_eq!(iomux::func(4), 1 << 8);
    }

    #[test]
    fn events_encode_the_conf_int_type_field() {
        assert_eq!(Event::RisingEdge as u32, 1);
        assert_eq!(Event::FallingEdge as u32, 2);
        assert_eq!(Event::AnyEdge as u32, 3);
        assert_eq!(Event::LowLevel as u32, 4);
        assert_eq!(Event::HighLevel as u32, 5);
    }

    #[test]
    fn edges_map_to_the_level_they_end_on() {
        assert_eq!(Event::RisingEdge.wakeup_level(), Some(Event::HighLevel));
        assert_eq!(Event::FallingEdge.wakeup_level(), Some(Event::LowLevel));
        assert_eq!(Event::AnyEdge.wakeup_level(), None);
        assert_eq!(Event::LowLevel.wakeup_level(), Some(Event::LowLevel));
        assert_eq!(Event::HighLevel.wakeup_level(), Some(Event::HighLevel));
    }

    #[test]
    fn sleep_transition_without_interrupts_is_a_no_op() {
        // No pin has an interrupt configured, so no register is touched.
        sleep_enter(SleepMode::Light);
        sleep_exit(WakeupCause::Timer);
        // Deeper modes reconfigure nothing either.
        sleep_enter(SleepMode::Modem);
    }

    #[test]
    fn two_edge_triggers_stay_configured_over_light_sleep() {
        critical_section::with(|cs| {
            EVENTS.borrow_ref_mut(cs)[4] = Some(Event::AnyEdge);
        });

        // The trigger has no wake-up level: it is left as it is, so
        // there is nothing to save and nothing to restore.
        sleep_enter(SleepMode::Light);
        let saved = critical_section::with(|cs| SLEEP_SAVED.borrow_ref(cs)[4]);
        assert_eq!(saved, None);
        sleep_exit(WakeupCause::Gpio);

        critical_section::with(|cs| {
            EVENTS.borrow_ref_mut(cs)[4] = None;
        });
    }
}
