//! Receiver configuration newtypes.
//!
//! These prevent out-of-range values from ever reaching the registers:
//! - `TimeoutUs`: inactivity window that closes a frame, 1 µs – 1.25 s
//! - `RateDivisor`: REG0 sample rate field, 12 bits
//!
//! Invalid values are rejected, never clamped.

use embassy_time::Duration;

use crate::registers::REG0_RATE_MASK;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── TimeoutUs ────────────────────────────────────────────────────────────────

/// Inactivity timeout in microseconds.
///
/// When no edge arrives for this long after the last one, the capture engine
/// emits [`RawEvent::Timeout`](crate::RawEvent::Timeout) to close the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct TimeoutUs(u32);

impl TimeoutUs {
    /// Shortest accepted timeout.
    pub const MIN_US: u32 = 1;

    /// Longest accepted timeout (1250 ms).
    pub const MAX_US: u32 = 1_250_000;

    /// Default timeout (125 ms): longer than any gap inside a NEC or RC5 frame.
    pub const DEFAULT: Self = Self(125_000);

    /// Create a `TimeoutUs`, returning an error outside 1..=1_250_000 µs.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `us` is 0 or above 1.25 s.
    pub fn new(us: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_US..=Self::MAX_US).contains(&us) {
            Ok(Self(us))
        } else {
            Err(OutOfRangeError {
                value: us,
                min: Self::MIN_US,
                max: Self::MAX_US,
            })
        }
    }

    /// Return the timeout in microseconds.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The timeout as an Embassy duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.0 as u64)
    }
}

impl Default for TimeoutUs {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── RateDivisor ──────────────────────────────────────────────────────────────

/// REG0 sample rate divisor. The decoder samples every `divisor + 1` µs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct RateDivisor(u16);

impl RateDivisor {
    /// Largest value the 12-bit REG0 rate field holds.
    pub const MAX: u16 = 0x0FFF;

    /// Raw capture default: 10 µs sample period.
    pub const DEFAULT: Self = Self(9);

    /// Hardware reset value, used while the on-chip NEC decoder owns the line
    /// (suspend and power-off).
    pub const HARDWARE_DEFAULT: Self = Self(0x13);

    /// Create a `RateDivisor`, returning an error above `0xFFF`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `divisor` does not fit in 12 bits.
    pub fn new(divisor: u16) -> Result<Self, OutOfRangeError> {
        if divisor > Self::MAX {
            Err(OutOfRangeError {
                value: u32::from(divisor),
                min: 0,
                max: u32::from(Self::MAX),
            })
        } else {
            Ok(Self(divisor))
        }
    }

    /// Return the raw divisor.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Value for the REG0 rate field.
    #[must_use]
    pub const fn field(self) -> u32 {
        self.0 as u32 & REG0_RATE_MASK
    }

    /// Sample period (timing resolution) in microseconds.
    #[must_use]
    pub const fn resolution_us(self) -> u32 {
        (self.0 as u32).saturating_add(1)
    }
}

impl Default for RateDivisor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── ReceiverConfig ───────────────────────────────────────────────────────────

/// Inputs consumed by [`Device::configure`](crate::Device::configure).
///
/// # Example
/// ```
/// use ir_receiver::{RateDivisor, ReceiverConfig, TimeoutUs};
///
/// let config = ReceiverConfig::new("amlogic,meson-gxbb-ir")
///     .with_timeout(TimeoutUs::new(100_000)?)
///     .with_pulse_inverted(true);
/// assert_eq!(config.rate(), RateDivisor::DEFAULT);
/// # Ok::<(), ir_receiver::OutOfRangeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig<'a> {
    identity: &'a str,
    timeout: TimeoutUs,
    pulse_inverted: bool,
    rate: RateDivisor,
}

impl<'a> ReceiverConfig<'a> {
    /// Configuration with the documented defaults: 125 ms timeout, 10 µs
    /// sampling, non-inverted input.
    pub const fn new(identity: &'a str) -> Self {
        Self {
            identity,
            timeout: TimeoutUs::DEFAULT,
            pulse_inverted: false,
            rate: RateDivisor::DEFAULT,
        }
    }

    /// Validate raw inputs in one step.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] for a timeout or divisor the hardware
    /// cannot honour. The identity is checked later, by
    /// [`select_variant`](crate::select_variant).
    pub fn try_new(
        identity: &'a str,
        timeout_us: u32,
        pulse_inverted: bool,
        rate_divisor: u16,
    ) -> Result<Self, OutOfRangeError> {
        Ok(Self {
            identity,
            timeout: TimeoutUs::new(timeout_us)?,
            pulse_inverted,
            rate: RateDivisor::new(rate_divisor)?,
        })
    }

    /// Set the inactivity timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: TimeoutUs) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invert the input polarity (receivers with an active-high output).
    #[must_use]
    pub fn with_pulse_inverted(mut self, inverted: bool) -> Self {
        self.pulse_inverted = inverted;
        self
    }

    /// Set the sample rate divisor.
    #[must_use]
    pub fn with_rate(mut self, rate: RateDivisor) -> Self {
        self.rate = rate;
        self
    }

    /// Device identity (compatible string) used for variant selection.
    pub const fn identity(&self) -> &'a str {
        self.identity
    }

    /// Inactivity timeout.
    pub const fn timeout(&self) -> TimeoutUs {
        self.timeout
    }

    /// Whether the input polarity is inverted.
    pub const fn pulse_inverted(&self) -> bool {
        self.pulse_inverted
    }

    /// Sample rate divisor.
    pub const fn rate(&self) -> RateDivisor {
        self.rate
    }
}
