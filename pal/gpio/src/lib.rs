#![no_std]

//! # PAL GPIO
//!
//! Digital input and output on GPIO0 to GPIO15 and the per-pin interrupt
//! trigger. Pin function selection in IOMUX is left to the board code; a pin
//! must already be routed to its GPIO function.
//!
//! Output level and direction are changed through the write-one-to-set and
//! write-one-to-clear registers, so driving one pin never disturbs another.

use core::fmt;

use log::debug;
use pal_core::map::GPIO_BASE;
use pal_core::{clear_bit, read_bit, read_field, write_field, Field, Mmio, PalError, PalResult, Register};

#[cfg(test)]
extern crate std;

/// Number of GPIO pins in the block
pub const PIN_COUNT: usize = 16;

/// PIN[n][9:7]: interrupt trigger.
pub const PIN_INT_TYPE: Field = Field::bits(7, 3);
/// PIN[n][2]: 1 = open drain, 0 = push-pull.
pub const PIN_DRIVER: u8 = 2;
/// STATUS[15:0]: one pending-interrupt bit per pin.
pub const STATUS_INT: Field = Field::bits(0, 16);

const PIN0_OFFSET: usize = 0x28;

/// Checked GPIO number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    pub const fn new(number: u8) -> PalResult<Self> {
        if (number as usize) < PIN_COUNT {
            Ok(Self(number))
        } else {
            Err(PalError::IndexOutOfRange {
                index: number as usize,
                capacity: PIN_COUNT,
            })
        }
    }

    pub const fn number(&self) -> u8 {
        self.0
    }

    const fn mask(&self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    /// Push-pull output, driven low once configured
    Output,
}

/// Pin interrupt trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptType {
    Disabled,
    RisingEdge,
    FallingEdge,
    AnyEdge,
    LowLevel,
    HighLevel,
}

impl InterruptType {
    /// Encoding of PIN[n][9:7]
    pub const fn field_value(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::RisingEdge => 1,
            Self::FallingEdge => 2,
            Self::AnyEdge => 3,
            Self::LowLevel => 4,
            Self::HighLevel => 5,
        }
    }

    /// Decode PIN[n][9:7]; 6 and 7 are reserved.
    pub const fn from_field(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::RisingEdge),
            2 => Some(Self::FallingEdge),
            3 => Some(Self::AnyEdge),
            4 => Some(Self::LowLevel),
            5 => Some(Self::HighLevel),
            _ => None,
        }
    }
}

/// The GPIO registers the driver touches.
#[derive(Debug)]
pub struct GpioRegisters<R> {
    pub out: R,
    pub out_w1ts: R,
    pub out_w1tc: R,
    pub enable: R,
    pub enable_w1ts: R,
    pub enable_w1tc: R,
    pub input: R,
    pub status: R,
    pub status_w1tc: R,
    pub pin: [R; PIN_COUNT],
}

impl GpioRegisters<Mmio> {
    /// The on-chip GPIO block.
    ///
    /// # Safety
    ///
    /// Only valid on ESP8266 hardware, and only one driver may own the block.
    pub unsafe fn gpio() -> Self {
        let base = Mmio::new(GPIO_BASE);
        Self {
            out: base,
            out_w1ts: base.offset(0x04),
            out_w1tc: base.offset(0x08),
            enable: base.offset(0x0C),
            enable_w1ts: base.offset(0x10),
            enable_w1tc: base.offset(0x14),
            input: base.offset(0x18),
            status: base.offset(0x1C),
            status_w1tc: base.offset(0x24),
            pin: core::array::from_fn(|n| base.offset(PIN0_OFFSET + 4 * n)),
        }
    }
}

/// Driver for the GPIO block
#[derive(Debug)]
pub struct Gpio<R> {
    regs: GpioRegisters<R>,
}

impl<R: Register> Gpio<R> {
    pub const fn new(regs: GpioRegisters<R>) -> Self {
        Self { regs }
    }

    /// Make `pin` an input, or a push-pull output driven low.
    pub fn configure(&mut self, pin: Pin, direction: Direction) {
        match direction {
            Direction::Input => self.regs.enable_w1tc.write(pin.mask()),
            Direction::Output => {
                clear_bit(&self.regs.pin[pin.0 as usize], PIN_DRIVER);
                self.regs.enable_w1ts.write(pin.mask());
                self.regs.out_w1tc.write(pin.mask());
            }
        }
        debug!("gpio: {} configured as {:?}", pin, direction);
    }

    /// Drive `pin` to `high`, enabling its output first.
    pub fn write(&mut self, pin: Pin, high: bool) {
        self.regs.enable_w1ts.write(pin.mask());
        if high {
            self.regs.out_w1ts.write(pin.mask());
        } else {
            self.regs.out_w1tc.write(pin.mask());
        }
    }

    pub fn set_high(&mut self, pin: Pin) {
        self.write(pin, true);
    }

    pub fn set_low(&mut self, pin: Pin) {
        self.write(pin, false);
    }

    /// Drive `pin` to the opposite of the level it reads.
    pub fn toggle(&mut self, pin: Pin) {
        let level = self.read(pin);
        self.write(pin, !level);
    }

    /// Level seen on `pin`
    pub fn read(&self, pin: Pin) -> bool {
        read_bit(&self.regs.input, pin.0)
    }

    pub fn is_output(&self, pin: Pin) -> bool {
        read_bit(&self.regs.enable, pin.0)
    }

    /// Select the interrupt trigger of `pin`.
    pub fn set_interrupt(&mut self, pin: Pin, trigger: InterruptType) -> PalResult<()> {
        write_field(&self.regs.pin[pin.0 as usize], PIN_INT_TYPE, trigger.field_value())
    }

    /// Current trigger of `pin`, `None` for a reserved encoding
    pub fn interrupt_type(&self, pin: Pin) -> Option<InterruptType> {
        InterruptType::from_field(read_field(&self.regs.pin[pin.0 as usize], PIN_INT_TYPE))
    }

    /// Pending pin interrupts, bit n for GPIOn
    pub fn pending_interrupts(&self) -> u16 {
        read_field(&self.regs.status, STATUS_INT) as u16
    }

    /// Acknowledge the pending interrupt of `pin`.
    pub fn acknowledge(&mut self, pin: Pin) {
        self.regs.status_w1tc.write(pin.mask());
    }

    pub fn registers(&self) -> &GpioRegisters<R> {
        &self.regs
    }

    /// Release the register block
    pub fn free(self) -> GpioRegisters<R> {
        self.regs
    }
}
