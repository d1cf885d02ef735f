//! UART transmit path against a modelled TX FIFO

use std::cell::RefCell;
use std::fmt::Write as _;
use std::vec::Vec;

use pal_core::{read_field, Register, SimRegister};
use pal_uart::{
    TxQueue, Uart, UartConfig, UartError, UartRegisters, CLKDIV_VALUE, TX_FIFO_DEPTH,
};

/// Bytes accepted by the hardware FIFO, in order
#[derive(Default)]
struct TxFifo {
    bytes: RefCell<Vec<u8>>,
}

impl TxFifo {
    fn sent(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /// The shift register empties the FIFO
    fn drain(&self) {
        self.bytes.borrow_mut().clear();
    }
}

enum Reg<'a> {
    Fifo(&'a TxFifo),
    Status(&'a TxFifo),
    Plain(&'a SimRegister),
}

impl Register for Reg<'_> {
    fn read(&self) -> u32 {
        match self {
            Reg::Fifo(_) => 0,
            Reg::Status(fifo) => (fifo.bytes.borrow().len() as u32) << 16,
            Reg::Plain(reg) => reg.read(),
        }
    }

    fn write(&self, value: u32) {
        match self {
            Reg::Fifo(fifo) => fifo.bytes.borrow_mut().push(value as u8),
            Reg::Status(_) => {}
            Reg::Plain(reg) => reg.write(value),
        }
    }
}

fn uart<'a>(fifo: &'a TxFifo, clkdiv: &'a SimRegister) -> Uart<Reg<'a>> {
    Uart::new(UartRegisters::new(
        Reg::Fifo(fifo),
        Reg::Plain(clkdiv),
        Reg::Status(fifo),
    ))
}

#[test]
fn test_configure_programs_divisor_and_keeps_high_bits() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0xFFF0_0000);
    let mut uart = uart(&fifo, &clkdiv);

    assert_eq!(uart.configure(UartConfig::new(9_600)), Ok(8_333));
    assert_eq!(read_field(&clkdiv, CLKDIV_VALUE), 8_333);
    assert_eq!(clkdiv.read() & 0xFFF0_0000, 0xFFF0_0000);
    assert_eq!(uart.config().baud_rate, 9_600);
}

#[test]
fn test_rejected_baud_keeps_previous_setting() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0);
    let mut uart = uart(&fifo, &clkdiv);
    uart.configure(UartConfig::DEFAULT).unwrap();

    assert_eq!(
        uart.configure(UartConfig::new(0)),
        Err(UartError::InvalidBaud { baud_rate: 0 })
    );
    assert_eq!(read_field(&clkdiv, CLKDIV_VALUE), 694);
    assert_eq!(*uart.config(), UartConfig::DEFAULT);
}

#[test]
fn test_newline_is_sent_as_crlf() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0);
    let mut uart = uart(&fifo, &clkdiv);

    uart.write_str("ok\n").unwrap();
    writeln!(uart, "{}", 42).unwrap();

    assert_eq!(fifo.sent(), b"ok\r\n42\r\n");
}

#[test]
fn test_full_fifo_times_out_after_budget() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0);
    let mut uart = uart(&fifo, &clkdiv);
    uart.configure(UartConfig::DEFAULT.with_poll_budget(3)).unwrap();

    uart.write_bytes(&[b'.'; TX_FIFO_DEPTH as usize]).unwrap();
    assert!(uart.is_tx_full());

    assert_eq!(uart.write_byte(b'!'), Err(UartError::Timeout { polls: 3 }));
    assert_eq!(fifo.sent().len(), TX_FIFO_DEPTH as usize);

    fifo.drain();
    assert_eq!(uart.write_byte(b'!'), Ok(()));
}

#[test]
fn test_queue_pumps_without_blocking() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0);
    let mut uart = uart(&fifo, &clkdiv);
    let mut queue: TxQueue<256> = TxQueue::new();

    queue.enqueue(&[b'a'; 200]).unwrap();
    assert_eq!(queue.pump(&mut uart), TX_FIFO_DEPTH as usize);
    assert_eq!(queue.len(), 200 - TX_FIFO_DEPTH as usize);
    assert_eq!(queue.pump(&mut uart), 0);

    fifo.drain();
    assert_eq!(queue.pump(&mut uart), 200 - TX_FIFO_DEPTH as usize);
    assert!(queue.is_empty());
}

#[test]
fn test_queue_formats_with_crlf() {
    let fifo = TxFifo::default();
    let clkdiv = SimRegister::new(0);
    let mut uart = uart(&fifo, &clkdiv);
    let mut queue: TxQueue<16> = TxQueue::new();

    writeln!(queue, "t={}", 7).unwrap();
    queue.pump(&mut uart);

    assert_eq!(fifo.sent(), b"t=7\r\n");
}
