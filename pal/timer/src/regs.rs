//! TIMER1 register block

use pal_core::map::{TIMER1_BASE, TIMER1_EDGE_INT};
use pal_core::{Field, Mmio, Register};

/// LOAD[22:0]: reload value.
pub const LOAD_VALUE: Field = Field::bits(0, 23);
/// COUNT[22:0]: current counter value.
pub const COUNT_VALUE: Field = Field::bits(0, 23);

/// CTRL[8]: interrupt status (counter reached zero).
pub const CTRL_INT_STATUS: u8 = 8;
/// CTRL[7]: timer enable.
pub const CTRL_ENABLE: u8 = 7;
/// CTRL[6]: auto-reload on zero.
pub const CTRL_AUTO_RELOAD: u8 = 6;
/// CTRL[3:2]: prescaler selector.
pub const CTRL_DIV: Field = Field::bits(2, 2);
/// CTRL[0]: interrupt type, 0 = edge, 1 = level.
pub const CTRL_INT_TYPE: u8 = 0;

/// INT[0]: level interrupt acknowledge.
pub const INT_CLEAR: u8 = 0;

/// Edge-interrupt register bit routing TIMER1.
pub const EDGE_TIMER1: u8 = 1;

/// The registers of TIMER1 the driver touches.
#[derive(Debug)]
pub struct TimerRegisters<R> {
    pub load: R,
    pub count: R,
    pub ctrl: R,
    pub int: R,
    pub edge_int: R,
}

impl<R: Register> TimerRegisters<R> {
    /// Assemble a block from individual registers
    pub const fn new(load: R, count: R, ctrl: R, int: R, edge_int: R) -> Self {
        Self {
            load,
            count,
            ctrl,
            int,
            edge_int,
        }
    }
}

impl TimerRegisters<Mmio> {
    /// The on-chip TIMER1 block.
    ///
    /// # Safety
    ///
    /// Only valid on ESP8266 hardware, and only one driver may own the block.
    pub const unsafe fn timer1() -> Self {
        let base = Mmio::new(TIMER1_BASE);
        Self {
            load: base,
            count: base.offset(0x04),
            ctrl: base.offset(0x08),
            int: base.offset(0x0C),
            edge_int: Mmio::new(TIMER1_EDGE_INT),
        }
    }
}
