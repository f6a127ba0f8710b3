//! Hardware abstraction traits for the tm1637-nb driver
//!
//! This crate defines the two collaborator contracts the driver needs from
//! the host platform, so the same driver code runs on any chip HAL:
//!
//! - [`gpio::OpenDrainPin`] - an open-drain signal line (release high /
//!   drive low, never driven actively high)
//! - [`time::Monotonic`] - free-running microsecond and millisecond
//!   counters, wraparound-safe via unsigned subtraction
//!
//! For HALs that expose open-drain outputs through the `embedded-hal`
//! `OutputPin` trait, [`gpio::OpenDrain`] adapts such a pin to
//! [`gpio::OpenDrainPin`].

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod time;

// Re-export key traits at crate root for convenience
pub use gpio::{OpenDrain, OpenDrainPin};
pub use time::Monotonic;
