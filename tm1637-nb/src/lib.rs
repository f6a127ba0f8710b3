//! Non-blocking driver for the TM1637 4-digit 7-segment display
//!
//! The TM1637 is driven over a proprietary two-wire open-drain protocol
//! (clock + data, similar to but not compatible with I2C). A full
//! 4-digit update takes tens of milliseconds at timings that are
//! reliable on fast MCUs, far too long to block a context that also
//! services audio, motor control or sensor polling. This driver never
//! blocks for the transmission: starting an update arms a resumable
//! state machine, and each [`Tm1637::advance`] call moves the bus by at
//! most one atomic micro-step.
//!
//! # Architecture
//!
//! - [`protocol`] - the protocol engine: phases, the byte/start/stop
//!   sub-state machines, rate limiting and the transmission watchdog
//! - [`segments`] - digit and character segment tables
//! - `display` - stateless number/text formatting on top of
//!   [`Tm1637::set_segments`]
//!
//! Pin and clock collaborators come from `tm1637-nb-hal`:
//! [`OpenDrainPin`](tm1637_nb_hal::OpenDrainPin) and
//! [`Monotonic`](tm1637_nb_hal::Monotonic).
//!
//! # Driving the engine
//!
//! ```ignore
//! let mut display = Tm1637::new(clk_pin, dio_pin, clock);
//! display.show_number_decimal(1234, false, 4, 0);
//! loop {
//!     if display.advance() {
//!         break; // idle, transmission done
//!     }
//!     // other real-time work runs here
//! }
//! ```
//!
//! Alternatively a periodic timer interrupt can call `advance()` on a
//! fixed period while a lower-priority context starts transmissions,
//! gated on [`Tm1637::is_idle`]. See the [`protocol`] module docs for
//! the exact cross-context contract.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

mod display;
pub mod protocol;
pub mod segments;

#[cfg(test)]
pub(crate) mod testutil;

pub use protocol::{Tm1637, Tm1637Config, DIGITS};
pub use segments::{char_to_segment, encode_digit};
