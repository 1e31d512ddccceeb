//! Error taxonomy.
//!
//! Only configuration, verification and quiescence failures surface here.
//! Spurious edges and edge/timer races are absorbed by the capture engine and
//! never become errors. Nothing in this crate retries automatically.

use crate::config::OutOfRangeError;
use crate::device::DeviceState;
use crate::registers::Register;

/// Receiver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The device identity is not in the quirk table. Fatal to `configure`.
    #[error("unsupported hardware variant")]
    UnsupportedVariant,

    /// A register did not read back what was written to it.
    #[error("{} read back {actual:#x}, expected {expected:#x}", .register.name())]
    RegisterVerifyFailed {
        /// Register that was written.
        register: Register,
        /// Masked value that was written.
        expected: u32,
        /// Masked value that was read back.
        actual: u32,
    },

    /// Teardown could not confirm the flush timer stopped within the bound.
    ///
    /// Hardware resources must not be released after this error.
    #[error("flush timer did not stop before the teardown deadline")]
    TimerCancelTimeout,

    /// A configuration value is outside the range the hardware supports.
    #[error("value {} outside {}..={}", .0.value, .0.min, .0.max)]
    OutOfRange(OutOfRangeError),

    /// Lifecycle operation called from a state that does not allow it.
    #[error("operation not allowed while {}", .0.as_str())]
    InvalidState(DeviceState),
}

impl From<OutOfRangeError> for Error {
    fn from(err: OutOfRangeError) -> Self {
        Self::OutOfRange(err)
    }
}

/// Result alias for receiver operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;
