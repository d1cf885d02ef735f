#![no_std]

//! # PAL Core
//!
//! Register access primitives and shared types for the ESP8266 peripheral
//! access layer. Every driver in the workspace reaches the hardware through
//! the [`Register`] trait and the bit-field helpers in [`field`], so the same
//! driver code runs against real MMIO on target and against
//! [`SimRegister`] on the host.

pub mod field;
pub mod map;
pub mod reg;

#[cfg(test)]
extern crate std;

pub use field::{clear_bit, read_bit, read_field, set_bit, write_field, Field};
pub use reg::{Mmio, Register, SimRegister};

/// PAL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CPU and peripheral clock of the ESP8266 in Hz.
pub const CLOCK_HZ: u32 = 80_000_000;

/// Result type used throughout the PAL
pub type PalResult<T> = Result<T, PalError>;

/// Errors raised by register and resource access
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PalError {
    /// A slot index past the end of a fixed-capacity pool
    #[error("index {index} out of range for pool of {capacity} slots")]
    IndexOutOfRange { index: usize, capacity: usize },
    /// A value wider than the field it is written to
    #[error("value {value:#x} does not fit a {width}-bit field")]
    FieldOverflow { value: u32, width: u8 },
    /// A field that does not lie inside a 32-bit register
    #[error("field at bit {offset} with width {width} exceeds a 32-bit register")]
    InvalidField { offset: u8, width: u8 },
}
