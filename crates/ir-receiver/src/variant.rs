//! Hardware variant (quirk) selection.
//!
//! The Meson receiver family differs in one place only: which register holds
//! the decode-mode field. Meson6 keeps it in REG1 bits 8:7; Meson8b and GXBB
//! moved it to the dedicated REG2 bits 3:0. The variant is resolved once from
//! the device identity and stored, so register accesses never re-branch on
//! the identity string.

use crate::error::{Error, Result};
use crate::registers::{field_prep, Register};

/// Location of the decode-mode field in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeField {
    /// Register holding the field.
    pub register: Register,
    /// In-place mask of the field.
    pub mask: u32,
}

impl ModeField {
    /// Field value for `mode`, shifted into place.
    pub const fn prep(self, mode: u32) -> u32 {
        field_prep(self.mask, mode)
    }
}

/// Register-layout variant of the decoder block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareVariant {
    /// Meson6: mode field in REG1 bits 8:7.
    ModeFieldInRegister1,
    /// Meson8b / GXBB: mode field in REG2 bits 3:0.
    ModeFieldInRegister2,
}

impl HardwareVariant {
    /// Where this variant keeps the decode-mode field.
    pub const fn mode_field(self) -> ModeField {
        match self {
            Self::ModeFieldInRegister1 => ModeField {
                register: Register::Reg1,
                mask: 0b11 << 7,
            },
            Self::ModeFieldInRegister2 => ModeField {
                register: Register::Reg2,
                mask: 0b1111,
            },
        }
    }

    /// Short name, for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModeFieldInRegister1 => "mode-in-reg1",
            Self::ModeFieldInRegister2 => "mode-in-reg2",
        }
    }
}

/// Known device identities. Closed set: anything else is unsupported.
const QUIRK_TABLE: [(&str, HardwareVariant); 5] = [
    ("amlogic,meson6-ir", HardwareVariant::ModeFieldInRegister1),
    ("amlogic,meson8b-ir", HardwareVariant::ModeFieldInRegister2),
    ("amlogic,meson-gxbb-ir", HardwareVariant::ModeFieldInRegister2),
    // Board-neutral aliases for the two layouts.
    ("variant-A", HardwareVariant::ModeFieldInRegister1),
    ("variant-B", HardwareVariant::ModeFieldInRegister2),
];

/// Resolve a device identity string to its register-layout variant.
///
/// Pure lookup: touches no hardware.
///
/// # Errors
///
/// Returns [`Error::UnsupportedVariant`] for an identity not in the table.
pub fn select_variant(identity: &str) -> Result<HardwareVariant> {
    match QUIRK_TABLE.iter().find(|(name, _)| *name == identity) {
        Some(&(_, variant)) => {
            debug!("{} uses layout {}", identity, variant.as_str());
            Ok(variant)
        }
        None => {
            warn!("unsupported IR receiver identity: {}", identity);
            Err(Error::UnsupportedVariant)
        }
    }
}
