//! Bit-field access inside 32-bit registers
//!
//! A [`Field`] names `width` contiguous bits starting at bit `offset`,
//! least-significant bit first. Writes go through a read-modify-write that
//! leaves every bit outside the field untouched.

use core::fmt;

use crate::reg::Register;
use crate::{PalError, PalResult};

/// A run of bits inside a 32-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    offset: u8,
    width: u8,
}

impl Field {
    /// Create a field, checking that it fits a 32-bit register.
    pub const fn new(offset: u8, width: u8) -> PalResult<Self> {
        if width == 0 || offset as u32 + width as u32 > 32 {
            Err(PalError::InvalidField { offset, width })
        } else {
            Ok(Self { offset, width })
        }
    }

    /// Create a field known at compile time.
    ///
    /// # Panics
    ///
    /// Panics (at compile time in const context) if the field does not fit.
    pub const fn bits(offset: u8, width: u8) -> Self {
        assert!(width > 0 && offset as u32 + width as u32 <= 32, "field exceeds register");
        Self { offset, width }
    }

    /// Single-bit field
    pub const fn bit(offset: u8) -> Self {
        Self::bits(offset, 1)
    }

    /// Bit offset of the least-significant bit
    pub const fn offset(&self) -> u8 {
        self.offset
    }

    /// Number of bits
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Mask of the field bits in register position
    pub const fn mask(&self) -> u32 {
        self.max_value() << self.offset
    }

    /// Extract the field from a register word.
    pub const fn extract(&self, word: u32) -> u32 {
        (word >> self.offset) & self.max_value()
    }

    /// Replace the field inside a register word. Excess high bits of `value`
    /// are discarded.
    pub const fn insert(&self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value & self.max_value()) << self.offset)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 1 {
            write!(f, "[{}]", self.offset)
        } else {
            write!(f, "[{}:{}]", self.offset + self.width - 1, self.offset)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Field {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "[{}+{}]", self.offset, self.width);
    }
}

/// Write `value` into `field` of `reg`.
///
/// Fails with [`PalError::FieldOverflow`] instead of truncating when `value`
/// needs more than `field.width()` bits; the register is left untouched.
pub fn write_field<R: Register + ?Sized>(reg: &R, field: Field, value: u32) -> PalResult<()> {
    if value > field.max_value() {
        return Err(PalError::FieldOverflow {
            value,
            width: field.width,
        });
    }
    reg.write(field.insert(reg.read(), value));
    Ok(())
}

/// Read `field` of `reg`.
pub fn read_field<R: Register + ?Sized>(reg: &R, field: Field) -> u32 {
    field.extract(reg.read())
}

/// Set bit `bit` of `reg` to one.
///
/// # Panics
///
/// Panics if `bit` is 32 or more. Use [`Field::new`] and [`write_field`] for
/// positions only known at run time.
pub fn set_bit<R: Register + ?Sized>(reg: &R, bit: u8) {
    let field = Field::bit(bit);
    reg.write(reg.read() | field.mask());
}

/// Clear bit `bit` of `reg`.
///
/// # Panics
///
/// Panics if `bit` is 32 or more. Use [`Field::new`] and [`write_field`] for
/// positions only known at run time.
pub fn clear_bit<R: Register + ?Sized>(reg: &R, bit: u8) {
    let field = Field::bit(bit);
    reg.write(reg.read() & !field.mask());
}

/// Read bit `bit` of `reg`.
///
/// # Panics
///
/// Panics if `bit` is 32 or more.
pub fn read_bit<R: Register + ?Sized>(reg: &R, bit: u8) -> bool {
    read_field(reg, Field::bit(bit)) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimRegister;

    #[test]
    fn rejects_fields_past_bit_31() {
        assert_eq!(
            Field::new(30, 3),
            Err(PalError::InvalidField { offset: 30, width: 3 })
        );
        assert!(Field::new(0, 0).is_err());
        assert!(Field::new(0, 32).is_ok());
    }

    #[test]
    fn full_width_field_uses_every_bit() {
        let field = Field::bits(0, 32);
        assert_eq!(field.max_value(), u32::MAX);
        assert_eq!(field.mask(), u32::MAX);
    }

    #[test]
    fn insert_discards_excess_bits() {
        let field = Field::bits(4, 2);
        assert_eq!(field.insert(0, 0b111), 0b11_0000);
    }

    #[test]
    fn overflowing_write_leaves_register_untouched() {
        let reg = SimRegister::new(0x1234_5678);
        let err = write_field(&reg, Field::bits(2, 2), 4).unwrap_err();
        assert_eq!(err, PalError::FieldOverflow { value: 4, width: 2 });
        assert_eq!(reg.read(), 0x1234_5678);
    }

    #[test]
    fn bit_helpers_touch_one_bit() {
        let reg = SimRegister::new(0);
        set_bit(&reg, 7);
        assert!(read_bit(&reg, 7));
        assert_eq!(reg.read(), 0x80);
        clear_bit(&reg, 7);
        assert_eq!(reg.read(), 0);
    }

    #[test]
    #[should_panic(expected = "field exceeds register")]
    fn bit_past_31_panics() {
        let reg = SimRegister::new(0);
        set_bit(&reg, 32);
    }

    #[test]
    fn display_uses_datasheet_notation() {
        use std::string::ToString;

        assert_eq!(Field::bits(2, 2).to_string(), "[3:2]");
        assert_eq!(Field::bit(7).to_string(), "[7]");
    }
}
