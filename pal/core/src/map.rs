//! ESP8266 memory map
//!
//! Base addresses of the peripheral register blocks used by the PAL.
//! See <https://github.com/esp8266/esp8266-wiki/wiki/Memory-Map>.

/// UART0 register block.
pub const UART0_BASE: usize = 0x6000_0000;

/// GPIO register block (GPIO0 to GPIO15).
pub const GPIO_BASE: usize = 0x6000_0300;

/// FRC1 register block (TIMER1, 23-bit down-counter).
pub const TIMER1_BASE: usize = 0x6000_0600;

/// UART1 register block (transmit only).
pub const UART1_BASE: usize = 0x6000_0F00;

/// DPORT edge-interrupt enable register; bit 1 routes TIMER1 as an edge source.
pub const TIMER1_EDGE_INT: usize = 0x3FF0_0004;
