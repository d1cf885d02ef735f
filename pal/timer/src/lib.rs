#![no_std]

//! # PAL Timer
//!
//! Driver for TIMER1 (FRC1), the ESP8266's 23-bit auto-reloading
//! down-counter, plus the interrupt-attach seam the tick scheduler needs.
//!
//! The driver validates a frequency/prescaler pair before touching any
//! register; see [`TimerConfig::new`].

pub mod config;
pub mod driver;
pub mod irq;
pub mod regs;

pub use config::{Prescaler, TimerConfig, MAX_RELOAD};
pub use driver::{HwTimer, TickSource};
pub use irq::{Handler, SoftInterrupt, TimerInterrupt};
pub use regs::TimerRegisters;

#[cfg(target_arch = "xtensa")]
pub use irq::Frc1Interrupt;

use pal_core::PalError;

#[cfg(test)]
extern crate std;

/// Result type for timer operations
pub type TimerResult<T> = Result<T, TimerError>;

/// Timer configuration and access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Requested frequency of zero
    #[error("timer frequency must be non-zero")]
    ZeroFrequency,
    /// Requested frequency is faster than the prescaled clock
    #[error("{frequency_hz} Hz is faster than the prescaled clock")]
    ReloadTooSmall { frequency_hz: u32 },
    /// Reload count does not fit the 23-bit counter
    #[error("reload count {reload} exceeds the 23-bit counter")]
    ReloadOverflow { reload: u64 },
    /// Register field access failed
    #[error(transparent)]
    Register(#[from] PalError),
}
