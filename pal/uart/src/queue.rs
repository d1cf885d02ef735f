//! Buffered transmit queue
//!
//! Output is staged in RAM and moved to the TX FIFO by [`TxQueue::pump`],
//! which never waits for the FIFO. Calling `pump` from the fast tick keeps
//! the UART busy without blocking the scheduler loop.

use core::fmt;

use heapless::Deque;
use pal_core::Register;

use crate::{Uart, UartError, UartResult};

/// Bounded FIFO of bytes waiting for the UART
pub struct TxQueue<const N: usize> {
    queue: Deque<u8, N>,
}

impl<const N: usize> TxQueue<N> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Append one raw byte
    pub fn push(&mut self, byte: u8) -> UartResult<()> {
        self.queue.push_back(byte).map_err(|_| UartError::QueueFull)
    }

    /// Append `bytes`, expanding `\n` to `\r\n`.
    ///
    /// Nothing is queued unless all of it fits.
    pub fn enqueue(&mut self, bytes: &[u8]) -> UartResult<()> {
        let needed = bytes.len() + bytes.iter().filter(|&&b| b == b'\n').count();
        if needed > N - self.queue.len() {
            return Err(UartError::QueueFull);
        }
        for &byte in bytes {
            if byte == b'\n' {
                self.push(b'\r')?;
            }
            self.push(byte)?;
        }
        Ok(())
    }

    /// Move queued bytes into the TX FIFO until it is full or the queue is
    /// empty. Returns the number of bytes moved.
    pub fn pump<R: Register>(&mut self, uart: &mut Uart<R>) -> usize {
        let mut sent = 0;
        while let Some(&byte) = self.queue.front() {
            if uart.try_write_byte(byte).is_err() {
                break;
            }
            self.queue.pop_front();
            sent += 1;
        }
        sent
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop everything not yet sent
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for TxQueue<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.enqueue(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
