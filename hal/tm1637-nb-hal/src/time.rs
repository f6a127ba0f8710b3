//! Monotonic time source abstraction
//!
//! The driver needs two free-running counters: microseconds for bit-level
//! rate limiting and milliseconds for the transmission watchdog. Both may
//! wrap; all elapsed-time math uses `wrapping_sub`, so wraparound is
//! harmless as long as individual intervals stay under half the counter
//! range.

/// Free-running monotonic clock
pub trait Monotonic {
    /// Current microsecond counter value (wraps)
    fn now_us(&self) -> u32;

    /// Current millisecond counter value (wraps)
    fn now_ms(&self) -> u32;

    /// Busy-wait for at least `us` microseconds
    ///
    /// Only used on the blocking bus-recovery path when a transmission is
    /// started; the stepping path never calls this.
    fn delay_us(&self, us: u32) {
        let start = self.now_us();
        while self.now_us().wrapping_sub(start) < us {}
    }
}

impl<T: Monotonic> Monotonic for &T {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }

    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct FakeClock {
        us: Cell<u32>,
    }

    impl Monotonic for FakeClock {
        fn now_us(&self) -> u32 {
            // Each read advances time so delay_us terminates
            let now = self.us.get();
            self.us.set(now.wrapping_add(1));
            now
        }

        fn now_ms(&self) -> u32 {
            self.us.get() / 1000
        }
    }

    #[test]
    fn test_delay_spans_wraparound() {
        let clock = FakeClock {
            us: Cell::new(u32::MAX - 5),
        };
        // Must terminate even though the counter wraps mid-delay
        clock.delay_us(20);
        assert!(clock.us.get() > 10);
    }
}
