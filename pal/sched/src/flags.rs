//! Tick flags shared between the interrupt handler and the main loop
//!
//! Each flag has exactly one writer per direction: the dispatcher raises it,
//! the scheduler loop takes it. A flag is a signal, not a counter; raising it
//! twice before it is taken yields a single tick.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::Granularity;

/// Single-producer, single-consumer tick signal
#[derive(Debug, Default)]
pub struct TickFlag {
    raised: AtomicBool,
}

impl TickFlag {
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Signal one elapsed period. Interrupt side.
    #[inline]
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Test-and-clear. Main loop side.
    ///
    /// The load and the store run inside one critical section because the
    /// ESP8266 core has no atomic read-modify-write instruction.
    #[inline]
    pub fn take(&self) -> bool {
        critical_section::with(|_| {
            let raised = self.raised.load(Ordering::Acquire);
            if raised {
                self.raised.store(false, Ordering::Release);
            }
            raised
        })
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }
}

/// The fast, medium and slow flags
#[derive(Debug, Default)]
pub struct TickFlags {
    fast: TickFlag,
    medium: TickFlag,
    slow: TickFlag,
}

impl TickFlags {
    pub const fn new() -> Self {
        Self {
            fast: TickFlag::new(),
            medium: TickFlag::new(),
            slow: TickFlag::new(),
        }
    }

    /// Flag of `granularity`
    pub const fn get(&self, granularity: Granularity) -> &TickFlag {
        match granularity {
            Granularity::Fast => &self.fast,
            Granularity::Medium => &self.medium,
            Granularity::Slow => &self.slow,
        }
    }

    /// Drop every pending tick
    pub fn clear_all(&self) {
        for granularity in Granularity::ALL {
            self.get(granularity).clear();
        }
    }

    /// Snapshot of the raised flags, without consuming them
    pub fn pending(&self) -> Ticks {
        Ticks {
            fast: self.fast.is_raised(),
            medium: self.medium.is_raised(),
            slow: self.slow.is_raised(),
        }
    }
}

/// Which granularities a scheduler pass serviced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks {
    pub fast: bool,
    pub medium: bool,
    pub slow: bool,
}

impl Ticks {
    /// No tick at all
    pub const NONE: Self = Self {
        fast: false,
        medium: false,
        slow: false,
    };

    pub const fn contains(&self, granularity: Granularity) -> bool {
        match granularity {
            Granularity::Fast => self.fast,
            Granularity::Medium => self.medium,
            Granularity::Slow => self.slow,
        }
    }

    pub const fn is_empty(&self) -> bool {
        !(self.fast || self.medium || self.slow)
    }

    pub(crate) fn set(&mut self, granularity: Granularity) {
        match granularity {
            Granularity::Fast => self.fast = true,
            Granularity::Medium => self.medium = true,
            Granularity::Slow => self.slow = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_the_flag() {
        let flag = TickFlag::new();
        flag.raise();
        assert!(flag.take());
        assert!(!flag.take());
        assert!(!flag.is_raised());
    }

    #[test]
    fn repeated_raises_coalesce() {
        let flag = TickFlag::new();
        flag.raise();
        flag.raise();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn flags_are_independent() {
        let flags = TickFlags::new();
        flags.get(Granularity::Medium).raise();

        let pending = flags.pending();
        assert!(!pending.fast);
        assert!(pending.medium);
        assert!(!pending.slow);

        flags.clear_all();
        assert!(flags.pending().is_empty());
    }
}
