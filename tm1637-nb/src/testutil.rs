//! Shared test doubles: mock bus pins with a common transition trace, a
//! manually-advanced clock, and a peripheral-model wire decoder that
//! recovers start/stop conditions and bytes the way a TM1637 would.

use core::cell::{Cell, RefCell};

use heapless::Vec;
use tm1637_nb_hal::{Monotonic, OpenDrainPin};

use crate::protocol::Tm1637;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Clk,
    Dio,
}

/// One recorded pin-mode transition
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub line: Line,
    pub high: bool,
}

pub type Trace = RefCell<Vec<Edge, 1024>>;

/// Mock open-drain pin logging every transition into a shared trace,
/// preserving the interleaving across both lines
pub struct MockPin<'a> {
    line: Line,
    trace: &'a Trace,
}

impl OpenDrainPin for MockPin<'_> {
    fn set_released(&mut self) {
        self.trace
            .borrow_mut()
            .push(Edge {
                line: self.line,
                high: true,
            })
            .unwrap();
    }

    fn set_driven_low(&mut self) {
        self.trace
            .borrow_mut()
            .push(Edge {
                line: self.line,
                high: false,
            })
            .unwrap();
    }
}

/// Manually-advanced clock
pub struct FakeClock<'a> {
    us: &'a Cell<u64>,
}

impl Monotonic for FakeClock<'_> {
    fn now_us(&self) -> u32 {
        self.us.get() as u32
    }

    fn now_ms(&self) -> u32 {
        (self.us.get() / 1000) as u32
    }

    // Busy-waiting would spin forever on a manual clock
    fn delay_us(&self, us: u32) {
        self.us.set(self.us.get() + u64::from(us));
    }
}

/// Items a TM1637 peripheral would decode off the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Start,
    Stop,
    Byte(u8),
}

/// Peripheral-model decoder: watches both lines, recognizes start/stop
/// conditions and samples data on rising clock edges
pub struct WireDecoder {
    clk: bool,
    dio: bool,
    in_frame: bool,
    await_ack: bool,
    byte: u8,
    bits: u8,
    items: Vec<Item, 64>,
}

impl WireDecoder {
    fn new() -> Self {
        Self {
            clk: true,
            dio: true,
            in_frame: false,
            await_ack: false,
            byte: 0,
            bits: 0,
            items: Vec::new(),
        }
    }

    pub fn decode(trace: &Trace) -> Vec<Item, 64> {
        let mut dec = Self::new();
        for edge in trace.borrow().iter() {
            dec.feed(*edge);
        }
        dec.items
    }

    fn feed(&mut self, edge: Edge) {
        match edge.line {
            Line::Clk => {
                let rising = !self.clk && edge.high;
                self.clk = edge.high;
                if rising {
                    self.clk_rising();
                }
            }
            Line::Dio => {
                let was = self.dio;
                self.dio = edge.high;
                if self.clk && !was && edge.high && self.in_frame {
                    // Data rising while clock high: stop condition
                    self.in_frame = false;
                    self.items.push(Item::Stop).unwrap();
                } else if self.clk && was && !edge.high {
                    // Data falling while clock high: start condition
                    self.in_frame = true;
                    self.await_ack = false;
                    self.byte = 0;
                    self.bits = 0;
                    self.items.push(Item::Start).unwrap();
                }
            }
        }
    }

    fn clk_rising(&mut self) {
        if !self.in_frame {
            return;
        }
        if self.await_ack {
            // ACK slot, not a data bit
            self.await_ack = false;
            return;
        }
        if self.dio {
            self.byte |= 1 << self.bits;
        }
        self.bits += 1;
        if self.bits == 8 {
            self.items.push(Item::Byte(self.byte)).unwrap();
            self.byte = 0;
            self.bits = 0;
            self.await_ack = true;
        }
    }
}

pub fn make_pins<'a>(trace: &'a Trace) -> (MockPin<'a>, MockPin<'a>) {
    (
        MockPin {
            line: Line::Clk,
            trace,
        },
        MockPin {
            line: Line::Dio,
            trace,
        },
    )
}

pub fn make_clock<'a>(us: &'a Cell<u64>) -> FakeClock<'a> {
    FakeClock { us }
}

pub fn make_driver<'a>(
    trace: &'a Trace,
    us: &'a Cell<u64>,
) -> Tm1637<MockPin<'a>, MockPin<'a>, FakeClock<'a>> {
    let (clk, dio) = make_pins(trace);
    Tm1637::new(clk, dio, make_clock(us))
}

/// Step the engine to completion, advancing the clock between calls
pub fn run_to_idle<'a>(
    driver: &mut Tm1637<MockPin<'a>, MockPin<'a>, FakeClock<'a>>,
    us: &Cell<u64>,
) -> u32 {
    let mut calls = 0;
    while !driver.advance() {
        us.set(us.get() + 100);
        calls += 1;
        assert!(calls < 10_000, "transmission never completed");
    }
    calls
}

/// The full expected item sequence for one transmission
pub fn expected_items(segments: &[u8], pos: u8, control: u8) -> Vec<Item, 64> {
    let mut items: Vec<Item, 64> = Vec::new();
    items.push(Item::Start).unwrap();
    items.push(Item::Byte(0x40)).unwrap();
    items.push(Item::Stop).unwrap();
    items.push(Item::Start).unwrap();
    items.push(Item::Byte(0xC0 | (pos & 0x03))).unwrap();
    for &s in segments {
        items.push(Item::Byte(s)).unwrap();
    }
    items.push(Item::Stop).unwrap();
    items.push(Item::Start).unwrap();
    items.push(Item::Byte(control)).unwrap();
    items.push(Item::Stop).unwrap();
    items
}
