//! IR decoder register map and access primitives.
//!
//! Reference: Amlogic Meson IR decoder block (`IR_DEC_*`), identical offsets
//! across the Meson6 / Meson8b / GXBB family. REG2 only exists on Meson8b and
//! newer.
//!
//! | Offset | Register     | Role                                          |
//! |--------|--------------|-----------------------------------------------|
//! | 0x00   | LDR_ACTIVE   | Decode timing: leader active window           |
//! | 0x04   | LDR_IDLE     | Decode timing: leader idle window             |
//! | 0x08   | LDR_REPEAT   | Decode timing: repeat leader window           |
//! | 0x0C   | BIT_0        | Decode timing: bit-0 window                   |
//! | 0x10   | REG0         | Sample rate divisor (bits 11:0)               |
//! | 0x14   | FRAME        | Last hardware-decoded frame (clear on read)   |
//! | 0x18   | STATUS       | Input level (bit 8), latched status           |
//! | 0x1C   | REG1         | Reset, polarity, IRQ select, mode, enable     |
//! | 0x20   | REG2         | Decode mode (Meson8b / GXBB only)             |

use core::ptr::NonNull;

use crate::error::{Error, Result};

// ── Field definitions ────────────────────────────────────────────────────────

/// REG0: sample rate divisor field (bits 11:0).
pub const REG0_RATE_MASK: u32 = 0x0000_0FFF;

/// REG1: decoder soft reset (write 1 then 0).
pub const REG1_RESET: u32 = 1 << 0;
/// REG1: invert input polarity.
pub const REG1_POL: u32 = 1 << 1;
/// REG1: interrupt source select field (bits 3:2).
pub const REG1_IRQSEL_MASK: u32 = 0b11 << 2;
/// REG1_IRQSEL value: hardware NEC frame interrupt.
pub const REG1_IRQSEL_NEC_MODE: u32 = 0;
/// REG1_IRQSEL value: interrupt on both rising and falling edges.
pub const REG1_IRQSEL_RISE_FALL: u32 = 1;
/// REG1_IRQSEL value: falling edges only.
pub const REG1_IRQSEL_FALL: u32 = 2;
/// REG1_IRQSEL value: rising edges only.
pub const REG1_IRQSEL_RISE: u32 = 3;
/// REG1: decoder enable.
pub const REG1_ENABLE: u32 = 1 << 15;

/// STATUS: current (post-polarity) level of the IR input line.
pub const STATUS_IR_DEC_IN: u32 = 1 << 8;

/// Shift `value` into the field described by `mask` (the `FIELD_PREP` idiom).
///
/// `mask` must be non-zero and contiguous; bits of `value` that do not fit
/// are discarded.
#[inline]
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub const fn field_prep(mask: u32, value: u32) -> u32 {
    (value << mask.trailing_zeros()) & mask
}

/// Extract the field described by `mask` from `reg` (the `FIELD_GET` idiom).
#[inline]
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub const fn field_get(mask: u32, reg: u32) -> u32 {
    (reg & mask) >> mask.trailing_zeros()
}

// ── Register identifiers ─────────────────────────────────────────────────────

/// Named registers of the IR decoder block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Leader active window (decode timing).
    LdrActive,
    /// Leader idle window (decode timing).
    LdrIdle,
    /// Repeat leader window (decode timing).
    LdrRepeat,
    /// Bit-0 window (decode timing).
    Bit0,
    /// Sample rate divisor.
    Reg0,
    /// Hardware-decoded frame. Clears on read.
    Frame,
    /// Decoder status, including the live input level.
    Status,
    /// Reset / polarity / IRQ select / enable, and the mode field on Meson6.
    Reg1,
    /// Mode field on Meson8b and newer.
    Reg2,
}

impl Register {
    /// Every register, in offset order.
    pub const ALL: [Register; 9] = [
        Register::LdrActive,
        Register::LdrIdle,
        Register::LdrRepeat,
        Register::Bit0,
        Register::Reg0,
        Register::Frame,
        Register::Status,
        Register::Reg1,
        Register::Reg2,
    ];

    /// Byte offset from the start of the decoder block.
    pub const fn offset(self) -> usize {
        match self {
            Self::LdrActive => 0x00,
            Self::LdrIdle => 0x04,
            Self::LdrRepeat => 0x08,
            Self::Bit0 => 0x0C,
            Self::Reg0 => 0x10,
            Self::Frame => 0x14,
            Self::Status => 0x18,
            Self::Reg1 => 0x1C,
            Self::Reg2 => 0x20,
        }
    }

    /// Index into [`Register::ALL`] (offset / 4).
    pub const fn index(self) -> usize {
        self.offset() / 4
    }

    /// Registers whose read has a side effect on hardware state.
    pub const fn clears_on_read(self) -> bool {
        matches!(self, Self::Frame | Self::Status)
    }

    /// Datasheet name, for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LdrActive => "LDR_ACTIVE",
            Self::LdrIdle => "LDR_IDLE",
            Self::LdrRepeat => "LDR_REPEAT",
            Self::Bit0 => "BIT_0",
            Self::Reg0 => "REG0",
            Self::Frame => "FRAME",
            Self::Status => "STATUS",
            Self::Reg1 => "REG1",
            Self::Reg2 => "REG2",
        }
    }
}

// ── Hardware seam ────────────────────────────────────────────────────────────

/// Raw 32-bit access to the decoder block.
///
/// Implementations perform a single load or store per call and never block.
/// `read` takes `&mut self` because STATUS and FRAME latch state that is
/// cleared by the read.
pub trait RegisterBlock {
    /// Load a register.
    fn read(&mut self, reg: Register) -> u32;

    /// Store a register.
    fn write(&mut self, reg: Register, value: u32);
}

/// Memory-mapped decoder block accessed with volatile loads and stores.
pub struct MmioRegisterBlock {
    base: NonNull<u32>,
}

impl MmioRegisterBlock {
    /// Wrap an already-mapped decoder block.
    ///
    /// # Safety
    ///
    /// `base` must point to the start of the IR decoder register block, stay
    /// mapped for the lifetime of the returned value, be 4-byte aligned, and
    /// cover at least `Register::Reg2.offset() + 4` bytes. No other code may
    /// write these registers while the value is alive.
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    fn ptr(&self, reg: Register) -> *mut u32 {
        // `index()` is at most 8 and the block covers 9 words per the
        // constructor contract, so the offset stays inside the mapping.
        self.base.as_ptr().wrapping_add(reg.index())
    }
}

// SAFETY: the block is plain MMIO with no thread affinity; exclusive access
// is guaranteed by the constructor contract and by `&mut self` on writes.
unsafe impl Send for MmioRegisterBlock {}

impl RegisterBlock for MmioRegisterBlock {
    fn read(&mut self, reg: Register) -> u32 {
        // SAFETY: the pointer is inside the mapped block and aligned (see `new`).
        unsafe { core::ptr::read_volatile(self.ptr(reg)) }
    }

    fn write(&mut self, reg: Register, value: u32) {
        // SAFETY: the pointer is inside the mapped block and aligned (see `new`).
        unsafe { core::ptr::write_volatile(self.ptr(reg), value) }
    }
}

// ── RegisterInterface ────────────────────────────────────────────────────────

/// Read and read-modify-write primitives over a [`RegisterBlock`].
///
/// Does not lock. Callers serialize through the device's capture lock.
pub struct RegisterInterface<B> {
    block: B,
}

impl<B: RegisterBlock> RegisterInterface<B> {
    /// Wrap a register block.
    pub const fn new(block: B) -> Self {
        Self { block }
    }

    /// Direct load. STATUS and FRAME clear latched state when read.
    pub fn read(&mut self, reg: Register) -> u32 {
        self.block.read(reg)
    }

    /// `write(reg, (read(reg) & !mask) | (value & mask))`.
    ///
    /// Only the bits in `mask` change.
    pub fn update(&mut self, reg: Register, mask: u32, value: u32) {
        let current = self.block.read(reg);
        self.block.write(reg, (current & !mask) | (value & mask));
    }

    /// [`update`](Self::update) followed by a read-back of the masked bits.
    ///
    /// A mismatch is reported, not retried: a silent retry could hide a
    /// wiring or clocking fault.
    pub fn update_verified(&mut self, reg: Register, mask: u32, value: u32) -> Result<()> {
        self.update(reg, mask, value);
        let expected = value & mask;
        let actual = self.block.read(reg) & mask;
        if actual == expected {
            Ok(())
        } else {
            error!(
                "{} read back {} under mask {}, expected {}",
                reg.name(),
                actual,
                mask,
                expected
            );
            Err(Error::RegisterVerifyFailed {
                register: reg,
                expected,
                actual,
            })
        }
    }

    /// Borrow the underlying block.
    pub fn block(&self) -> &B {
        &self.block
    }

    /// Mutably borrow the underlying block.
    pub fn block_mut(&mut self) -> &mut B {
        &mut self.block
    }

    /// Give back the underlying block.
    pub fn into_inner(self) -> B {
        self.block
    }
}
