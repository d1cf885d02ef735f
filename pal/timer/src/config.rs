//! Frequency and prescaler selection

use core::fmt;

use crate::{TimerError, TimerResult};

/// Largest value the 23-bit LOAD register accepts.
pub const MAX_RELOAD: u32 = (1 << 23) - 1;

/// Clock divisor applied before the counter decrements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    /// 80 MHz, 12.5 ns per count
    Div1,
    /// 5 MHz, 200 ns per count
    Div16,
    /// 312.5 kHz, 3.2 us per count
    Div256,
}

impl Prescaler {
    /// Clock divisor
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div16 => 16,
            Self::Div256 => 256,
        }
    }

    /// Encoding of CTRL[3:2]
    pub const fn field_value(self) -> u32 {
        match self {
            Self::Div1 => 0,
            Self::Div16 => 1,
            Self::Div256 => 2,
        }
    }

    /// Decode CTRL[3:2]; the hardware treats 3 as a second /256.
    pub const fn from_field(value: u32) -> Self {
        match value & 0b11 {
            0 => Self::Div1,
            1 => Self::Div16,
            _ => Self::Div256,
        }
    }
}

impl fmt::Display for Prescaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.divisor())
    }
}

/// A validated timer setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    clock_hz: u32,
    frequency_hz: u32,
    prescaler: Prescaler,
    reload: u32,
}

impl TimerConfig {
    /// Compute the reload count `clock_hz / (divisor * frequency_hz)`.
    ///
    /// Fails instead of truncating when the count is zero or does not fit
    /// the counter.
    pub const fn new(clock_hz: u32, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<Self> {
        if frequency_hz == 0 {
            return Err(TimerError::ZeroFrequency);
        }
        let reload = clock_hz as u64 / (prescaler.divisor() as u64 * frequency_hz as u64);
        if reload == 0 {
            return Err(TimerError::ReloadTooSmall { frequency_hz });
        }
        if reload > MAX_RELOAD as u64 {
            return Err(TimerError::ReloadOverflow { reload });
        }
        Ok(Self {
            clock_hz,
            frequency_hz,
            prescaler,
            reload: reload as u32,
        })
    }

    /// Requested interrupt frequency
    pub const fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Prescaler
    pub const fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Value written to LOAD
    pub const fn reload(&self) -> u32 {
        self.reload
    }

    /// Source clock the reload was computed for
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Period actually produced by the hardware, in nanoseconds.
    ///
    /// Differs from `1 / frequency_hz` when the division is not exact.
    pub const fn period_ns(&self) -> u64 {
        self.reload as u64 * self.prescaler.divisor() as u64 * 1_000_000_000 / self.clock_hz as u64
    }
}

impl fmt::Display for TimerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz ({}, reload {})",
            self.frequency_hz, self.prescaler, self.reload
        )
    }
}
