#![no_std]

//! # PAL Tick Scheduler
//!
//! Synthesizes three software time bases from one hardware timer:
//!
//! - the [`dispatch`] interrupt handler runs on every TIMER1 expiry, steps
//!   two cascade counters and raises the fast, medium and slow [`flags`];
//! - the cooperative [`scheduler`] loop, polled from `main`, takes each
//!   raised flag, advances the [`counters`] pool of that granularity and
//!   invokes the matching callback.
//!
//! A ready-made instance with the default configuration (100 kHz / ÷16,
//! 10 µs, 1 ms and 1 s ticks, 10 counters per pool) is reachable through the
//! free functions of this crate:
//!
//! ```ignore
//! let mut timer = HwTimer::new(unsafe { TimerRegisters::timer1() });
//! let mut irq = unsafe { Frc1Interrupt::new() };
//! pal_sched::start(&mut timer, &mut irq)?;
//! pal_sched::init_virtual_counters();
//! loop {
//!     pal_sched::run_once(|| {}, on_millisecond, on_second);
//! }
//! ```

pub mod config;
pub mod counters;
pub mod dispatch;
pub mod flags;
pub mod scheduler;

pub use config::{Granularity, SchedulerConfig};
pub use counters::{CounterPool, SlotId, VirtualCounter, VirtualCounters, DEFAULT_POOL_CAPACITY};
pub use dispatch::{CascadeCounters, TickDispatcher};
pub use flags::{TickFlag, TickFlags, Ticks};
pub use scheduler::{Scheduler, TickHandler};

use pal_core::PalResult;
use pal_timer::{TickSource, TimerConfig, TimerError, TimerInterrupt};

#[cfg(test)]
extern crate std;

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Scheduler start-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedError {
    /// The hardware timer rejected the tick frequency
    #[error(transparent)]
    Timer(#[from] TimerError),
    /// A cascade period of zero fast ticks
    #[error("{granularity} tick period must be non-zero")]
    InvalidPeriod { granularity: Granularity },
}

/// Scheduler with the default pool capacities
pub type DefaultScheduler =
    Scheduler<DEFAULT_POOL_CAPACITY, DEFAULT_POOL_CAPACITY, DEFAULT_POOL_CAPACITY>;

/// Global scheduler instance
static SCHEDULER: DefaultScheduler = Scheduler::new(SchedulerConfig::DEFAULT);

/// Get the global scheduler
pub fn scheduler() -> &'static DefaultScheduler {
    &SCHEDULER
}

/// Reset the global scheduler, program `timer` and attach [`on_interrupt`].
pub fn start<T, I>(timer: &mut T, irq: &mut I) -> SchedResult<TimerConfig>
where
    T: TickSource,
    I: TimerInterrupt,
{
    SCHEDULER.start(timer, irq, on_interrupt)
}

/// Resume tick generation of the global scheduler
pub fn enable_timer<T: TickSource + ?Sized>(timer: &mut T) {
    SCHEDULER.enable_timer(timer);
}

/// Pause tick generation of the global scheduler
pub fn disable_timer<T: TickSource + ?Sized>(timer: &mut T) {
    SCHEDULER.disable_timer(timer);
}

/// Timer interrupt service routine of the global scheduler
pub fn on_interrupt() {
    SCHEDULER.on_interrupt();
}

/// Run one pass of the global scheduler loop
pub fn run_once<A, B, C>(on_fast: A, on_medium: B, on_slow: C) -> Ticks
where
    A: FnOnce(),
    B: FnOnce(),
    C: FnOnce(),
{
    SCHEDULER.run_once(on_fast, on_medium, on_slow)
}

/// Reset every virtual counter of the global scheduler
pub fn init_virtual_counters() {
    SCHEDULER.init_virtual_counters();
}

/// Arm slot `index` of the `granularity` pool of the global scheduler
pub fn arm(granularity: Granularity, index: usize, ticks: u16) -> PalResult<()> {
    SCHEDULER.arm_at(granularity, index, ticks)
}
