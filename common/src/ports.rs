//! Capabilities the controller drives but does not own.
//!
//! The host binary supplies real implementations; tests supply manual ones.

use crate::types::OutputChannel;

/// Monotonic elapsed-time source in milliseconds.
///
/// Values are expected to be non-decreasing, except that a counter may wrap
/// back toward zero. The controller treats a backward step as a reset.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Digital outputs for the cooling, heating and fan circuits.
///
/// Energizing one channel de-energizes the others; `OutputChannel::None`
/// turns everything off. Calls are idempotent and cannot fail.
pub trait Actuator {
    fn set_output(&mut self, channel: OutputChannel);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn set_output(&mut self, channel: OutputChannel) {
        (**self).set_output(channel)
    }
}
