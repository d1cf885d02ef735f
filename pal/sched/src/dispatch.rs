//! Timer interrupt handler
//!
//! Every expiry is a fast tick. Two cascade counters, counted down in fast
//! ticks, derive the medium and slow ticks. Each time base stays within one
//! fast tick of its nominal period.

use core::cell::Cell;

use critical_section::Mutex;

use crate::config::{Granularity, SchedulerConfig};
use crate::flags::TickFlags;

/// Remaining fast ticks until the next medium and slow tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CascadeCounters {
    pub medium: u32,
    pub slow: u32,
}

impl CascadeCounters {
    /// Counters at the start of a period
    pub const fn reloaded(medium_period: u32, slow_period: u32) -> Self {
        Self {
            medium: medium_period,
            slow: slow_period,
        }
    }

    /// Advance by one fast tick; returns which cascades elapsed.
    fn step(&mut self, medium_period: u32, slow_period: u32) -> (bool, bool) {
        (
            count_down(&mut self.medium, medium_period),
            count_down(&mut self.slow, slow_period),
        )
    }
}

/// Decrement `remaining`; on reaching zero reload it to `period` and report
/// the elapsed period. A period of zero behaves like one.
fn count_down(remaining: &mut u32, period: u32) -> bool {
    if *remaining <= 1 {
        *remaining = period;
        true
    } else {
        *remaining -= 1;
        false
    }
}

/// Interrupt-side half of the scheduler.
pub struct TickDispatcher {
    flags: TickFlags,
    medium_period: u32,
    slow_period: u32,
    cascade: Mutex<Cell<CascadeCounters>>,
}

impl TickDispatcher {
    pub const fn new(config: &SchedulerConfig) -> Self {
        Self {
            flags: TickFlags::new(),
            medium_period: config.medium_period,
            slow_period: config.slow_period,
            cascade: Mutex::new(Cell::new(CascadeCounters::reloaded(
                config.medium_period,
                config.slow_period,
            ))),
        }
    }

    /// Interrupt service routine body. Bounded time, never blocks.
    pub fn on_interrupt(&self) {
        let (medium, slow) = critical_section::with(|cs| {
            let cell = self.cascade.borrow(cs);
            let mut cascade = cell.get();
            let elapsed = cascade.step(self.medium_period, self.slow_period);
            cell.set(cascade);
            elapsed
        });

        if medium {
            self.flags.get(Granularity::Medium).raise();
        }
        if slow {
            self.flags.get(Granularity::Slow).raise();
        }
        self.flags.get(Granularity::Fast).raise();
    }

    /// Reload the cascades and drop pending ticks.
    pub fn reset(&self) {
        critical_section::with(|cs| {
            self.cascade
                .borrow(cs)
                .set(CascadeCounters::reloaded(self.medium_period, self.slow_period));
            self.flags.clear_all();
        });
    }

    pub fn flags(&self) -> &TickFlags {
        &self.flags
    }

    /// Current cascade state
    pub fn cascade(&self) -> CascadeCounters {
        critical_section::with(|cs| self.cascade.borrow(cs).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(medium: u32, slow: u32) -> TickDispatcher {
        let cfg = SchedulerConfig::new()
            .with_medium_period(medium)
            .with_slow_period(slow);
        TickDispatcher::new(&cfg)
    }

    #[test]
    fn every_interrupt_is_a_fast_tick() {
        let d = dispatcher(3, 5);
        for _ in 0..4 {
            d.on_interrupt();
            assert!(d.flags().get(Granularity::Fast).take());
        }
    }

    #[test]
    fn medium_fires_on_the_period_boundary() {
        let d = dispatcher(3, 5);
        d.on_interrupt();
        d.on_interrupt();
        assert!(!d.flags().get(Granularity::Medium).is_raised());
        assert_eq!(d.cascade().medium, 1);

        d.on_interrupt();
        assert!(d.flags().get(Granularity::Medium).take());
        assert_eq!(d.cascade().medium, 3);
    }

    #[test]
    fn reset_reloads_and_clears() {
        let d = dispatcher(3, 5);
        d.on_interrupt();
        d.on_interrupt();
        d.reset();
        assert_eq!(d.cascade(), CascadeCounters::reloaded(3, 5));
        assert!(d.flags().pending().is_empty());
    }

    #[test]
    fn period_of_one_fires_every_tick() {
        let d = dispatcher(1, 1);
        for _ in 0..3 {
            d.on_interrupt();
            assert!(d.flags().get(Granularity::Medium).take());
            assert!(d.flags().get(Granularity::Slow).take());
        }
    }
}
