//! Decode-mode programming sequences.
//!
//! Two register programs exist:
//!
//! ```text
//! raw decode  : reset pulse → mode=RAW → rate → IRQ on rise+fall → polarity
//!               → enable → clear STATUS/FRAME
//! wake decode : mode=NEC → rate = hardware default
//! ```
//!
//! Raw decode hands every edge to software. Wake decode lets the on-chip NEC
//! decoder recognise a power key while software is suspended or off.
//! Both run under the device's capture lock.

use crate::config::RateDivisor;
use crate::error::Result;
use crate::registers::{
    field_prep, Register, RegisterBlock, RegisterInterface, REG0_RATE_MASK, REG1_ENABLE,
    REG1_IRQSEL_MASK, REG1_IRQSEL_RISE_FALL, REG1_POL, REG1_RESET,
};
use crate::variant::HardwareVariant;

/// Decoder operating mode (value of the variant's mode field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum DecodeMode {
    /// On-chip NEC decoder; software sees frames, not edges.
    Nec = 0x0,
    /// Raw/software decode; every edge raises an interrupt.
    Raw = 0x2,
}

impl DecodeMode {
    /// Raw field value.
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Settings the raw-decode program writes, kept by the device for resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSettings {
    /// REG0 sample rate divisor.
    pub rate: RateDivisor,
    /// Invert input polarity.
    pub pulse_inverted: bool,
}

/// Write the decode mode into the variant's mode field and verify it.
pub fn set_mode<B: RegisterBlock>(
    regs: &mut RegisterInterface<B>,
    variant: HardwareVariant,
    mode: DecodeMode,
) -> Result<()> {
    let field = variant.mode_field();
    regs.update_verified(field.register, field.mask, field.prep(mode.bits()))
}

/// Program the decoder for raw edge capture.
///
/// Every field is verified after its write, except the self-clearing reset
/// pulse. STATUS and FRAME are read at the end to drop anything latched
/// while the decoder was being reprogrammed.
pub fn program_raw_decode<B: RegisterBlock>(
    regs: &mut RegisterInterface<B>,
    variant: HardwareVariant,
    settings: RawSettings,
) -> Result<()> {
    regs.update(Register::Reg1, REG1_RESET, REG1_RESET);
    regs.update(Register::Reg1, REG1_RESET, 0);

    set_mode(regs, variant, DecodeMode::Raw)?;
    regs.update_verified(Register::Reg0, REG0_RATE_MASK, settings.rate.field())?;
    regs.update_verified(
        Register::Reg1,
        REG1_IRQSEL_MASK,
        field_prep(REG1_IRQSEL_MASK, REG1_IRQSEL_RISE_FALL),
    )?;
    regs.update_verified(
        Register::Reg1,
        REG1_POL,
        if settings.pulse_inverted { REG1_POL } else { 0 },
    )?;
    regs.update_verified(Register::Reg1, REG1_ENABLE, REG1_ENABLE)?;

    let _ = regs.read(Register::Status);
    let _ = regs.read(Register::Frame);
    trace!("raw decode programmed, layout {}", variant.as_str());
    Ok(())
}

/// Hand the line to the on-chip NEC decoder at the hardware default rate.
pub fn program_wake_decode<B: RegisterBlock>(
    regs: &mut RegisterInterface<B>,
    variant: HardwareVariant,
) -> Result<()> {
    set_mode(regs, variant, DecodeMode::Nec)?;
    regs.update_verified(
        Register::Reg0,
        REG0_RATE_MASK,
        RateDivisor::HARDWARE_DEFAULT.field(),
    )?;
    trace!("wake decode programmed, layout {}", variant.as_str());
    Ok(())
}
