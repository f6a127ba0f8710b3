//! TM1637 protocol engine
//!
//! The TM1637 wire protocol is a two-wire open-drain bit-bang: start
//! condition, command byte 0x40 (write data), stop, start, address byte
//! 0xC0 | pos, up to four segment bytes, stop, start, display-control
//! byte 0x80 | brightness, stop. Each byte goes out LSB-first and is
//! followed by one unread ACK clock pulse.
//!
//! A whole transmission takes a couple of hundred bus transitions, tens
//! of milliseconds at timings fast MCUs need for the IC to keep up.
//! Instead of blocking for that long, the engine decomposes the protocol
//! into atomic micro-steps: [`Tm1637::set_segments`] arms a transmission
//! and [`Tm1637::advance`] performs at most one micro-step per call,
//! returning `true` once the bus is idle again.
//!
//! # Stepping contexts
//!
//! Two usage models are supported:
//!
//! 1. Cooperative: the owning context calls `advance()` from its main
//!    loop until it reports idle.
//! 2. Preemptive: a periodic timer interrupt calls `advance()` while a
//!    lower-priority context starts transmissions. The phase tag is an
//!    atomic; [`Tm1637::is_idle`] is a single-word read, and
//!    `set_segments` parks the tag at idle before touching any other
//!    state, then arms the new transmission as its very last action. The
//!    low-priority context must only call `set_segments` while
//!    `is_idle()` reports `true`; that discipline is not checked.
//!
//! `advance()` never blocks. Its only suspension-like behavior is an
//! early `false` return when the minimum inter-step interval has not yet
//! elapsed.

use core::sync::atomic::{AtomicU8, Ordering};

use heapless::Vec;
use tm1637_nb_hal::{Monotonic, OpenDrainPin};

/// Write-data command: auto-increment addressing
const COMM1_WRITE_DATA: u8 = 0x40;
/// Set-address command; low two bits select the starting digit
const COMM2_SET_ADDRESS: u8 = 0xC0;
/// Display-control command; low nibble is brightness + power bit
const COMM3_DISPLAY_CONTROL: u8 = 0x80;

/// Number of digit positions on the display
pub const DIGITS: usize = 4;

/// Timing configuration for the protocol engine
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tm1637Config {
    /// Minimum microseconds between protocol micro-steps
    ///
    /// The TM1637 datasheet floor is about 1 µs, but fast 32-bit cores
    /// toggle pins quicker than the IC can follow; 100 µs is reliable on
    /// ESP32 and RP2040. Slow 8-bit cores can set 0 to disable the gate
    /// entirely.
    pub bit_delay_us: u32,
    /// Settle time after both lines are released during bus recovery
    pub settle_us: u32,
    /// Hold time after the recovery start condition
    pub start_hold_us: u32,
    /// Watchdog timeout for one whole transmission
    ///
    /// A full 4-digit update is ~220 micro-steps, about 22 ms at a
    /// 100 µs step gate. 250 ms gives a 10x margin before a wedged bus
    /// is abandoned.
    pub watchdog_ms: u32,
}

impl Default for Tm1637Config {
    fn default() -> Self {
        Self {
            bit_delay_us: 100,
            settle_us: 50,
            start_hold_us: 10,
            watchdog_ms: 250,
        }
    }
}

/// Top-level protocol phase
///
/// Stored in an `AtomicU8`; `Idle` doubles as the "no transmission in
/// flight" tag observed by [`Tm1637::is_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
enum Phase {
    /// Writing command byte 0x40
    Comm1 = 0,
    /// Stop condition after the command byte
    StopAfterComm1 = 1,
    /// Start condition before the address byte
    StartBeforeAddress = 2,
    /// Writing address byte 0xC0 | pos
    Address = 3,
    /// Writing segment data bytes
    Data = 4,
    /// Stop condition after the data bytes
    StopAfterData = 5,
    /// Start condition before the control byte
    StartBeforeControl = 6,
    /// Writing display-control byte 0x80 | brightness
    Control = 7,
    /// Final stop condition
    FinalStop = 8,
    /// No transmission in flight
    Idle = 9,
}

impl Phase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Phase::Comm1,
            1 => Phase::StopAfterComm1,
            2 => Phase::StartBeforeAddress,
            3 => Phase::Address,
            4 => Phase::Data,
            5 => Phase::StopAfterData,
            6 => Phase::StartBeforeControl,
            7 => Phase::Control,
            8 => Phase::FinalStop,
            _ => Phase::Idle,
        }
    }
}

/// The two bus lines
///
/// Held as a pair so the sub-state machines can sequence both lines
/// while borrowed disjointly from the driver.
struct Bus<CLK, DIO> {
    clk: CLK,
    dio: DIO,
}

/// Byte-writer sub-machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitStep {
    /// Pull clock low before changing data
    ClockLow,
    /// Put the current bit on the data line
    DataBit,
    /// Release clock; the IC samples on the rising edge
    ClockHigh,
    /// Pull clock low for the ACK slot
    AckClockLow,
    /// Release data so the IC can drive its ACK
    AckRelease,
    /// Clock the ACK out (never sampled)
    AckClockHigh,
    /// Final clock-low, byte done
    AckFinish,
}

/// Shifts one byte onto the bus, LSB first, then clocks the ACK slot
///
/// The ACK bit the IC drives is deliberately never read; sampling it
/// would change the observable bus timing for no protocol-level benefit
/// on a single-master bus.
struct ByteWriter {
    byte: u8,
    bits_sent: u8,
    step: BitStep,
}

impl ByteWriter {
    const fn new() -> Self {
        Self {
            byte: 0,
            bits_sent: 0,
            step: BitStep::ClockLow,
        }
    }

    /// Reset the sub-machine to send `byte`
    fn load(&mut self, byte: u8) {
        self.byte = byte;
        self.bits_sent = 0;
        self.step = BitStep::ClockLow;
    }

    /// Perform one micro-step; returns true when the byte (including the
    /// ACK pulse) is complete
    fn step<CLK: OpenDrainPin, DIO: OpenDrainPin>(&mut self, bus: &mut Bus<CLK, DIO>) -> bool {
        match self.step {
            BitStep::ClockLow => {
                bus.clk.set_driven_low();
                self.step = BitStep::DataBit;
            }
            BitStep::DataBit => {
                bus.dio.set_bit(self.byte & 0x01 != 0);
                self.step = BitStep::ClockHigh;
            }
            BitStep::ClockHigh => {
                bus.clk.set_released();
                self.byte >>= 1;
                self.bits_sent += 1;
                self.step = if self.bits_sent < 8 {
                    BitStep::ClockLow
                } else {
                    BitStep::AckClockLow
                };
            }
            BitStep::AckClockLow => {
                bus.clk.set_driven_low();
                self.step = BitStep::AckRelease;
            }
            BitStep::AckRelease => {
                bus.dio.set_released();
                self.step = BitStep::AckClockHigh;
            }
            BitStep::AckClockHigh => {
                bus.clk.set_released();
                self.step = BitStep::AckFinish;
            }
            BitStep::AckFinish => {
                bus.clk.set_driven_low();
                return true;
            }
        }
        false
    }
}

/// Start-condition sub-machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartStep {
    ReleaseClock,
    ReleaseData,
    PullDataLow,
}

/// Generates a start condition: data falls while clock is high
struct StartCondition {
    step: StartStep,
}

impl StartCondition {
    const fn new() -> Self {
        Self {
            step: StartStep::ReleaseClock,
        }
    }

    fn reset(&mut self) {
        self.step = StartStep::ReleaseClock;
    }

    fn step<CLK: OpenDrainPin, DIO: OpenDrainPin>(&mut self, bus: &mut Bus<CLK, DIO>) -> bool {
        match self.step {
            StartStep::ReleaseClock => {
                bus.clk.set_released();
                self.step = StartStep::ReleaseData;
            }
            StartStep::ReleaseData => {
                bus.dio.set_released();
                self.step = StartStep::PullDataLow;
            }
            StartStep::PullDataLow => {
                bus.dio.set_driven_low();
                return true;
            }
        }
        false
    }
}

/// Stop-condition sub-machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopStep {
    ClockLow,
    DataLow,
    ReleaseClock,
    ReleaseData,
}

/// Generates a stop condition: data rises while clock is high
struct StopCondition {
    step: StopStep,
}

impl StopCondition {
    const fn new() -> Self {
        Self {
            step: StopStep::ClockLow,
        }
    }

    fn reset(&mut self) {
        self.step = StopStep::ClockLow;
    }

    fn step<CLK: OpenDrainPin, DIO: OpenDrainPin>(&mut self, bus: &mut Bus<CLK, DIO>) -> bool {
        match self.step {
            StopStep::ClockLow => {
                bus.clk.set_driven_low();
                self.step = StopStep::DataLow;
            }
            StopStep::DataLow => {
                bus.dio.set_driven_low();
                self.step = StopStep::ReleaseClock;
            }
            StopStep::ReleaseClock => {
                bus.clk.set_released();
                self.step = StopStep::ReleaseData;
            }
            StopStep::ReleaseData => {
                bus.dio.set_released();
                return true;
            }
        }
        false
    }
}

/// Non-blocking TM1637 display driver
///
/// Generic over the two open-drain bus lines and a monotonic clock
/// source. See the module docs for the stepping contract.
pub struct Tm1637<CLK, DIO, T> {
    bus: Bus<CLK, DIO>,
    clock: T,
    config: Tm1637Config,

    /// Display-control nibble: brightness 0-7 plus power bit 0x08
    brightness: u8,

    /// Pending transmission payload
    segments: Vec<u8, DIGITS>,
    pos: u8,

    /// Phase tag; the only field observed across contexts
    phase: AtomicU8,

    /// Sub-state machines, touched only by the stepping context while
    /// the phase tag is away from `Idle`
    writer: ByteWriter,
    start: StartCondition,
    stop: StopCondition,
    seg_index: u8,

    /// Timestamp of the last accepted micro-step (µs)
    last_step_us: u32,
    /// Timestamp of the transmission start (ms), for the watchdog
    started_ms: u32,
}

impl<CLK, DIO, T> Tm1637<CLK, DIO, T>
where
    CLK: OpenDrainPin,
    DIO: OpenDrainPin,
    T: Monotonic,
{
    /// Create a driver with default timing ([`Tm1637Config::default`])
    pub fn new(clk: CLK, dio: DIO, clock: T) -> Self {
        Self::with_config(clk, dio, clock, Tm1637Config::default())
    }

    /// Create a driver with explicit timing configuration
    ///
    /// Releases both lines so the bus idles high. Brightness starts at
    /// maximum with the display on.
    pub fn with_config(clk: CLK, dio: DIO, clock: T, config: Tm1637Config) -> Self {
        let mut bus = Bus { clk, dio };
        bus.clk.set_released();
        bus.dio.set_released();

        Self {
            bus,
            clock,
            config,
            brightness: 0x0F,
            segments: Vec::new(),
            pos: 0,
            phase: AtomicU8::new(Phase::Idle as u8),
            writer: ByteWriter::new(),
            start: StartCondition::new(),
            stop: StopCondition::new(),
            seg_index: 0,
            last_step_us: 0,
            started_ms: 0,
        }
    }

    /// Set brightness (0-7, lowest to highest) and display power
    ///
    /// Takes effect on the next transmission; the control byte is sent
    /// as the last byte of every update.
    pub fn set_brightness(&mut self, brightness: u8, on: bool) {
        self.brightness = (brightness & 0x07) | if on { 0x08 } else { 0x00 };
    }

    /// `true` when no transmission is in flight
    ///
    /// A single atomic load, safe to call from a context other than the
    /// one driving [`advance`](Self::advance).
    pub fn is_idle(&self) -> bool {
        self.phase.load(Ordering::Acquire) == Phase::Idle as u8
    }

    /// Begin a transmission of up to four segment bytes at `pos`
    ///
    /// Anything beyond four bytes is silently truncated; only the low
    /// two bits of `pos` reach the wire. The call blocks for the µs-scale
    /// bus recovery (about `settle_us + start_hold_us`), then returns
    /// with the transmission armed; drive it with [`advance`](Self::advance).
    ///
    /// Must only be called while [`is_idle`](Self::is_idle) reports
    /// `true` if another context is stepping the engine.
    pub fn set_segments(&mut self, segments: &[u8], pos: u8) {
        // Park the engine first. A periodic advance() preempting this
        // call must observe "idle", never a half-configured transmission.
        self.phase.store(Phase::Idle as u8, Ordering::Release);

        let len = segments.len().min(DIGITS);
        self.segments.clear();
        // len <= DIGITS, cannot overflow the buffer
        let _ = self.segments.extend_from_slice(&segments[..len]);
        self.pos = pos;
        self.seg_index = 0;
        self.writer.load(COMM1_WRITE_DATA);
        self.start.reset();
        self.stop.reset();

        // Force the bus to a known idle-then-start state. Stray levels
        // left by an aborted or timed-out transmission would otherwise
        // make the IC ignore the next start condition.
        self.bus.clk.set_driven_low();
        self.bus.dio.set_driven_low();
        self.bus.clk.set_released();
        self.bus.dio.set_released();
        self.clock.delay_us(self.config.settle_us);
        // Start condition: DIO falls while CLK is high
        self.bus.dio.set_driven_low();
        self.clock.delay_us(self.config.start_hold_us);

        self.last_step_us = self.clock.now_us();
        self.started_ms = self.clock.now_ms();
        // Arm the state machine only once the bus is settled
        self.phase.store(Phase::Comm1 as u8, Ordering::Release);
    }

    /// Clear the display (all segments off)
    pub fn clear(&mut self) {
        self.set_segments(&[0; DIGITS], 0);
    }

    /// Advance the transmission by at most one micro-step
    ///
    /// Returns `true` when the engine is idle (nothing to do, natural
    /// completion, or watchdog expiry - the latter two are deliberately
    /// indistinguishable), `false` while a transmission is in flight.
    /// Never blocks; when the inter-step interval has not elapsed yet it
    /// returns `false` without touching the bus.
    pub fn advance(&mut self) -> bool {
        let phase = Phase::from_raw(self.phase.load(Ordering::Acquire));
        if phase == Phase::Idle {
            return true;
        }

        // Watchdog: a wedged bus (unresponsive IC, lost pull-up) must
        // not keep the engine busy forever.
        if self.clock.now_ms().wrapping_sub(self.started_ms) > self.config.watchdog_ms {
            self.set_phase(Phase::Idle);
            return true;
        }

        // Rate limit: at most one micro-step per bit_delay_us. The
        // timestamp only moves when a step is actually taken.
        if self.config.bit_delay_us > 0 {
            let now = self.clock.now_us();
            if now.wrapping_sub(self.last_step_us) < self.config.bit_delay_us {
                return false;
            }
            self.last_step_us = now;
        }

        match phase {
            Phase::Comm1 => {
                if self.writer.step(&mut self.bus) {
                    self.stop.reset();
                    self.set_phase(Phase::StopAfterComm1);
                }
            }
            Phase::StopAfterComm1 => {
                if self.stop.step(&mut self.bus) {
                    self.writer.load(COMM2_SET_ADDRESS | (self.pos & 0x03));
                    self.start.reset();
                    self.set_phase(Phase::StartBeforeAddress);
                }
            }
            Phase::StartBeforeAddress => {
                if self.start.step(&mut self.bus) {
                    self.set_phase(Phase::Address);
                }
            }
            Phase::Address => {
                if self.writer.step(&mut self.bus) {
                    self.seg_index = 0;
                    if self.segments.is_empty() {
                        self.stop.reset();
                        self.set_phase(Phase::StopAfterData);
                    } else {
                        self.writer.load(self.segments[0]);
                        self.set_phase(Phase::Data);
                    }
                }
            }
            Phase::Data => {
                if self.writer.step(&mut self.bus) {
                    self.seg_index += 1;
                    if (self.seg_index as usize) < self.segments.len() {
                        self.writer.load(self.segments[self.seg_index as usize]);
                    } else {
                        self.stop.reset();
                        self.set_phase(Phase::StopAfterData);
                    }
                }
            }
            Phase::StopAfterData => {
                if self.stop.step(&mut self.bus) {
                    self.writer.load(COMM3_DISPLAY_CONTROL | (self.brightness & 0x0F));
                    self.start.reset();
                    self.set_phase(Phase::StartBeforeControl);
                }
            }
            Phase::StartBeforeControl => {
                if self.start.step(&mut self.bus) {
                    self.set_phase(Phase::Control);
                }
            }
            Phase::Control => {
                if self.writer.step(&mut self.bus) {
                    self.stop.reset();
                    self.set_phase(Phase::FinalStop);
                }
            }
            Phase::FinalStop => {
                if self.stop.step(&mut self.bus) {
                    self.set_phase(Phase::Idle);
                    return true;
                }
            }
            // Handled by the early return above
            Phase::Idle => {}
        }

        false
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}
