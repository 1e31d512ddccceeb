//! Shared test doubles for the integration tests.
//!
//! Each double is a cheap handle over shared state, so a test can keep a
//! clone for inspection after handing the original to a `Device`.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::{Arc, Mutex};

use ir_receiver::registers::STATUS_IR_DEC_IN;
use ir_receiver::{
    Device, EventSink, InterruptLine, RawEvent, ReceiverConfig, Register, RegisterBlock, TimeoutUs,
};

/// One register access, in the order the device made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(Register),
    Write(Register, u32),
}

#[derive(Default)]
struct RegState {
    words: [u32; 9],
    stuck: [u32; 9],
    input_level: bool,
    log: Vec<Access>,
}

/// Nine-word register file. STATUS reports the scripted input level; bits
/// marked stuck ignore writes.
#[derive(Clone, Default)]
pub struct MockRegisters(Arc<Mutex<RegState>>);

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level the next STATUS read reports.
    pub fn set_input_level(&self, level: bool) {
        self.0.lock().unwrap().input_level = level;
    }

    /// Make `mask` bits of `reg` ignore writes.
    pub fn set_stuck(&self, reg: Register, mask: u32) {
        self.0.lock().unwrap().stuck[reg.index()] = mask;
    }

    /// Preload a register without logging an access.
    pub fn preload(&self, reg: Register, value: u32) {
        self.0.lock().unwrap().words[reg.index()] = value;
    }

    /// Current value of `reg`, without logging an access.
    pub fn word(&self, reg: Register) -> u32 {
        self.0.lock().unwrap().words[reg.index()]
    }

    pub fn accesses(&self) -> Vec<Access> {
        self.0.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.0.lock().unwrap().log.clear();
    }

    /// Whether `reg` was read or written since the last `clear_log`.
    pub fn touched(&self, reg: Register) -> bool {
        self.accesses().iter().any(|access| match *access {
            Access::Read(r) | Access::Write(r, _) => r == reg,
        })
    }
}

impl RegisterBlock for MockRegisters {
    fn read(&mut self, reg: Register) -> u32 {
        let mut state = self.0.lock().unwrap();
        state.log.push(Access::Read(reg));
        let word = state.words[reg.index()];
        if reg == Register::Status && state.input_level {
            word | STATUS_IR_DEC_IN
        } else {
            word
        }
    }

    fn write(&mut self, reg: Register, value: u32) {
        let mut state = self.0.lock().unwrap();
        state.log.push(Access::Write(reg, value));
        let i = reg.index();
        let stuck = state.stuck[i];
        state.words[i] = (state.words[i] & stuck) | (value & !stuck);
    }
}

#[derive(Default)]
struct IrqState {
    enabled: bool,
    enables: u32,
    disables: u32,
}

/// Interrupt line that only counts mask/unmask calls.
#[derive(Clone, Default)]
pub struct MockIrq(Arc<Mutex<IrqState>>);

impl MockIrq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.lock().unwrap().enabled
    }

    pub fn enables(&self) -> u32 {
        self.0.lock().unwrap().enables
    }

    pub fn disables(&self) -> u32 {
        self.0.lock().unwrap().disables
    }
}

impl InterruptLine for MockIrq {
    fn enable(&mut self) {
        let mut state = self.0.lock().unwrap();
        state.enabled = true;
        state.enables += 1;
    }

    fn disable(&mut self) {
        let mut state = self.0.lock().unwrap();
        state.enabled = false;
        state.disables += 1;
    }
}

/// Decoder stand-in that records every event.
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<RawEvent>>>);

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RawEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn timeouts(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == RawEvent::Timeout)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&mut self, event: RawEvent) {
        self.0.lock().unwrap().push(event);
    }
}

pub type MockDevice = Device<MockRegisters, MockIrq, RecordingSink>;

/// Device plus inspection handles for its doubles.
pub struct Rig {
    pub device: MockDevice,
    pub regs: MockRegisters,
    pub irq: MockIrq,
    pub sink: RecordingSink,
}

impl Rig {
    pub fn new() -> Self {
        let regs = MockRegisters::new();
        let irq = MockIrq::new();
        let sink = RecordingSink::new();
        Self {
            device: Device::new(regs.clone(), irq.clone(), sink.clone()),
            regs,
            irq,
            sink,
        }
    }

    /// Rig already configured for `identity` with `timeout_us`.
    pub fn configured(identity: &str, timeout_us: u32) -> Self {
        let rig = Self::new();
        let config =
            ReceiverConfig::new(identity).with_timeout(TimeoutUs::new(timeout_us).unwrap());
        rig.device.configure(&config).unwrap();
        rig
    }

    /// Deliver one edge interrupt at `t_us` with the line at `level`.
    pub fn edge(&self, t_us: u64, level: bool) {
        self.regs.set_input_level(level);
        self.device.on_interrupt(at(t_us));
    }
}

pub fn at(us: u64) -> embassy_time::Instant {
    embassy_time::Instant::from_micros(us)
}

/// The six configuration registers kept across suspend.
pub fn config_words(regs: &MockRegisters) -> [u32; 6] {
    [
        Register::Reg0,
        Register::Reg1,
        Register::LdrActive,
        Register::LdrIdle,
        Register::Bit0,
        Register::LdrRepeat,
    ]
    .map(|reg| regs.word(reg))
}
