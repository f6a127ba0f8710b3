//! GPIO pin abstractions
//!
//! The TM1637 bus is open-drain: a line is either released (floats high
//! through a pull-up) or actively driven low. A line is never driven
//! actively high, so two devices can safely share it.

use core::convert::Infallible;

/// An open-drain signal line
///
/// Implementations typically switch the pin between input-with-pull-up
/// (released) and output-low (driven) modes. On HALs with true open-drain
/// output support, writing high/low achieves the same bus levels.
pub trait OpenDrainPin {
    /// Release the line: switch to input with pull-up, line floats high
    fn set_released(&mut self);

    /// Drive the line low: switch to output, write logic 0
    fn set_driven_low(&mut self);

    /// Set the line according to a logical bit (1 = released/high, 0 = low)
    fn set_bit(&mut self, high: bool) {
        if high {
            self.set_released();
        } else {
            self.set_driven_low();
        }
    }
}

/// Adapter for `embedded-hal` output pins already configured as open-drain
///
/// Many chip HALs (ESP32, RP2040, STM32) can configure a pin as an
/// open-drain output with internal pull-up; on such a pin, `set_high`
/// releases the line and `set_low` pulls it down, which is exactly the
/// [`OpenDrainPin`] contract.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    /// Wrap a pin that is already in open-drain + pull-up mode
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Take back the underlying pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OpenDrainPin for OpenDrain<P>
where
    P: embedded_hal::digital::OutputPin<Error = Infallible>,
{
    fn set_released(&mut self) {
        let _ = self.pin.set_high();
    }

    fn set_driven_low(&mut self) {
        let _ = self.pin.set_low();
    }
}
