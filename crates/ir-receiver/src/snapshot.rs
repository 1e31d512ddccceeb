//! Register snapshot for power transitions.
//!
//! Configure copies the six decoder configuration registers once raw capture
//! is programmed; resume writes them back verbatim after the on-chip NEC
//! decoder had the line, so capture continues with bit-identical settings. STATUS and FRAME are not
//! part of the snapshot: they are read-to-clear latches, not configuration.

use crate::registers::{Register, RegisterBlock, RegisterInterface};

/// Saved contents of the decoder configuration registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSnapshot {
    /// REG0: sample rate.
    pub reg0: u32,
    /// REG1: reset, polarity, IRQ select, enable (and mode on Meson6).
    pub reg1: u32,
    /// Leader "active" timing window.
    pub leader_active: u32,
    /// Leader "idle" timing window.
    pub leader_idle: u32,
    /// Logic-0 bit timing window.
    pub bit0: u32,
    /// Repeat-leader timing window.
    pub leader_repeat: u32,
}

impl RegisterSnapshot {
    /// Registers captured, in restore order. REG0 goes before REG1 so the
    /// rate is in place when REG1 re-enables the decoder.
    pub const REGISTERS: [Register; 6] = [
        Register::Reg0,
        Register::Reg1,
        Register::LdrActive,
        Register::LdrIdle,
        Register::Bit0,
        Register::LdrRepeat,
    ];

    /// Read the six registers. Touches nothing else.
    pub fn capture<B: RegisterBlock>(regs: &mut RegisterInterface<B>) -> Self {
        Self {
            reg0: regs.read(Register::Reg0),
            reg1: regs.read(Register::Reg1),
            leader_active: regs.read(Register::LdrActive),
            leader_idle: regs.read(Register::LdrIdle),
            bit0: regs.read(Register::Bit0),
            leader_repeat: regs.read(Register::LdrRepeat),
        }
    }

    /// Write every captured register back in full.
    pub fn restore<B: RegisterBlock>(&self, regs: &mut RegisterInterface<B>) {
        for reg in Self::REGISTERS {
            if let Some(value) = self.value(reg) {
                regs.update(reg, u32::MAX, value);
            }
        }
    }

    /// Saved value of `reg`, or `None` if it is not part of the snapshot.
    pub fn value(&self, reg: Register) -> Option<u32> {
        match reg {
            Register::Reg0 => Some(self.reg0),
            Register::Reg1 => Some(self.reg1),
            Register::LdrActive => Some(self.leader_active),
            Register::LdrIdle => Some(self.leader_idle),
            Register::Bit0 => Some(self.bit0),
            Register::LdrRepeat => Some(self.leader_repeat),
            Register::Frame | Register::Status | Register::Reg2 => None,
        }
    }
}
