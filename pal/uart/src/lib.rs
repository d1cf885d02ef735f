#![no_std]

//! # PAL UART
//!
//! Transmit path of the ESP8266 UARTs. Only the baud divisor is programmed;
//! the frame format stays at the ROM default (8N1).
//!
//! Writers never spin without bound: [`Uart::try_write_byte`] returns
//! [`nb::Error::WouldBlock`] while the TX FIFO is full, [`Uart::write_byte`]
//! gives up after [`UartConfig::tx_poll_budget`] polls, and [`TxQueue`]
//! buffers output that is pushed to the FIFO whenever there is room.

pub mod queue;

pub use queue::TxQueue;

use core::fmt;

use log::{debug, warn};
use pal_core::map::{UART0_BASE, UART1_BASE};
use pal_core::{read_field, write_field, Field, Mmio, PalError, Register, CLOCK_HZ};

#[cfg(test)]
extern crate std;

/// FIFO[7:0]: byte pushed into the TX FIFO.
pub const FIFO_DATA: Field = Field::bits(0, 8);
/// CLKDIV[19:0]: clock cycles per bit.
pub const CLKDIV_VALUE: Field = Field::bits(0, 20);
/// STATUS[23:16]: bytes waiting in the TX FIFO.
pub const STATUS_TXFIFO_CNT: Field = Field::bits(16, 8);

/// Depth of the hardware TX FIFO in bytes.
pub const TX_FIFO_DEPTH: u32 = 128;

/// Result type for UART operations
pub type UartResult<T> = Result<T, UartError>;

/// UART errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Baud rate with no representable clock divisor
    #[error("baud rate {baud_rate} not reachable from the peripheral clock")]
    InvalidBaud { baud_rate: u32 },
    /// TX FIFO still full once the poll budget ran out
    #[error("tx fifo still full after {polls} polls")]
    Timeout { polls: u32 },
    /// Software transmit queue has no room left
    #[error("transmit queue full")]
    QueueFull,
    #[error(transparent)]
    Register(#[from] PalError),
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    pub baud_rate: u32,
    /// FIFO status polls [`Uart::write_byte`] makes before timing out
    pub tx_poll_budget: u32,
}

impl UartConfig {
    pub const DEFAULT: Self = Self {
        baud_rate: 115_200,
        tx_poll_budget: 10_000,
    };

    pub const fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::DEFAULT
        }
    }

    pub const fn with_poll_budget(mut self, polls: u32) -> Self {
        self.tx_poll_budget = polls;
        self
    }

    /// CLKDIV value for this baud rate at `clock_hz`.
    pub const fn clock_divisor(&self, clock_hz: u32) -> UartResult<u32> {
        if self.baud_rate == 0 {
            return Err(UartError::InvalidBaud { baud_rate: 0 });
        }
        let divisor = clock_hz / self.baud_rate;
        if divisor == 0 || divisor > CLKDIV_VALUE.max_value() {
            Err(UartError::InvalidBaud {
                baud_rate: self.baud_rate,
            })
        } else {
            Ok(divisor)
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The registers of one UART the transmit path touches.
#[derive(Debug)]
pub struct UartRegisters<R> {
    pub fifo: R,
    pub clkdiv: R,
    pub status: R,
}

impl<R: Register> UartRegisters<R> {
    pub const fn new(fifo: R, clkdiv: R, status: R) -> Self {
        Self {
            fifo,
            clkdiv,
            status,
        }
    }
}

impl UartRegisters<Mmio> {
    /// # Safety
    ///
    /// Only valid on ESP8266 hardware, and only one driver may own the block.
    pub const unsafe fn uart0() -> Self {
        Self::at(UART0_BASE)
    }

    /// # Safety
    ///
    /// Only valid on ESP8266 hardware, and only one driver may own the block.
    pub const unsafe fn uart1() -> Self {
        Self::at(UART1_BASE)
    }

    const unsafe fn at(base: usize) -> Self {
        let base = Mmio::new(base);
        Self {
            fifo: base,
            clkdiv: base.offset(0x14),
            status: base.offset(0x1C),
        }
    }
}

/// Transmit-side UART driver
#[derive(Debug)]
pub struct Uart<R> {
    regs: UartRegisters<R>,
    clock_hz: u32,
    config: UartConfig,
}

impl<R: Register> Uart<R> {
    /// Wrap a register block clocked at [`CLOCK_HZ`].
    pub const fn new(regs: UartRegisters<R>) -> Self {
        Self::with_clock(regs, CLOCK_HZ)
    }

    pub const fn with_clock(regs: UartRegisters<R>, clock_hz: u32) -> Self {
        Self {
            regs,
            clock_hz,
            config: UartConfig::DEFAULT,
        }
    }

    /// Program the baud divisor. Returns the divisor written.
    ///
    /// A rejected configuration leaves the registers and the previous
    /// configuration in place.
    pub fn configure(&mut self, config: UartConfig) -> UartResult<u32> {
        let divisor = config.clock_divisor(self.clock_hz).map_err(|err| {
            warn!("uart: rejected {} baud: {}", config.baud_rate, err);
            err
        })?;
        write_field(&self.regs.clkdiv, CLKDIV_VALUE, divisor)?;
        debug!("uart: {} baud, clkdiv {}", config.baud_rate, divisor);
        self.config = config;
        Ok(divisor)
    }

    /// Bytes waiting in the TX FIFO
    pub fn tx_fifo_len(&self) -> u32 {
        read_field(&self.regs.status, STATUS_TXFIFO_CNT)
    }

    pub fn is_tx_full(&self) -> bool {
        self.tx_fifo_len() >= TX_FIFO_DEPTH
    }

    /// Push `byte` into the TX FIFO if it has room.
    pub fn try_write_byte(&mut self, byte: u8) -> nb::Result<(), UartError> {
        if self.is_tx_full() {
            return Err(nb::Error::WouldBlock);
        }
        // reading FIFO pops the receive side, so no read-modify-write here
        self.regs.fifo.write(FIFO_DATA.insert(0, u32::from(byte)));
        Ok(())
    }

    /// Push `byte`, polling the FIFO at most `tx_poll_budget` times.
    pub fn write_byte(&mut self, byte: u8) -> UartResult<()> {
        let polls = self.config.tx_poll_budget.max(1);
        for _ in 0..polls {
            match self.try_write_byte(byte) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(err)) => return Err(err),
            }
        }
        warn!("uart: tx fifo full, dropping {:#04x} after {} polls", byte, polls);
        Err(UartError::Timeout { polls })
    }

    /// Write one character, expanding `\n` to `\r\n`.
    pub fn write_char(&mut self, byte: u8) -> UartResult<()> {
        if byte == b'\n' {
            self.write_byte(b'\r')?;
        }
        self.write_byte(byte)
    }

    /// [`write_char`](Self::write_char) every byte of `bytes`; stops at the
    /// first timeout.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> UartResult<()> {
        bytes.iter().try_for_each(|&byte| self.write_char(byte))
    }

    pub fn write_str(&mut self, s: &str) -> UartResult<()> {
        self.write_bytes(s.as_bytes())
    }

    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    pub fn registers(&self) -> &UartRegisters<R> {
        &self.regs
    }

    /// Release the register block
    pub fn free(self) -> UartRegisters<R> {
        self.regs
    }
}

impl<R: Register> fmt::Write for Uart<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pal_core::SimRegister;

    #[test]
    fn default_divisor_is_694() {
        assert_eq!(UartConfig::DEFAULT.clock_divisor(CLOCK_HZ), Ok(694));
    }

    #[test]
    fn unreachable_baud_rates_are_rejected() {
        assert_eq!(
            UartConfig::new(0).clock_divisor(CLOCK_HZ),
            Err(UartError::InvalidBaud { baud_rate: 0 })
        );
        assert!(UartConfig::new(CLOCK_HZ + 1).clock_divisor(CLOCK_HZ).is_err());
        // 80 MHz / 50 baud needs 21 bits
        assert!(UartConfig::new(50).clock_divisor(CLOCK_HZ).is_err());
        assert_eq!(UartConfig::new(77).clock_divisor(CLOCK_HZ), Ok(1_038_961));
    }

    #[test]
    fn full_fifo_would_block() {
        let regs: [SimRegister; 3] = Default::default();
        regs[2].write(TX_FIFO_DEPTH << 16);
        let mut uart = Uart::new(UartRegisters::new(&regs[0], &regs[1], &regs[2]));

        assert_eq!(uart.try_write_byte(b'x'), Err(nb::Error::WouldBlock));
        assert_eq!(regs[0].read(), 0);

        regs[2].write((TX_FIFO_DEPTH - 1) << 16);
        assert_eq!(uart.try_write_byte(b'x'), Ok(()));
        assert_eq!(regs[0].read(), u32::from(b'x'));
    }
}
