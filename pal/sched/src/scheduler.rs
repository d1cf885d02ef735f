//! Cooperative tick scheduler loop

use log::{debug, info};
use pal_core::PalResult;
use pal_timer::{Handler, TickSource, TimerConfig, TimerInterrupt};

use crate::config::{Granularity, SchedulerConfig};
use crate::counters::VirtualCounters;
use crate::dispatch::TickDispatcher;
use crate::flags::{TickFlags, Ticks};
use crate::SchedResult;

/// Per-granularity tick callbacks.
///
/// Every method defaults to doing nothing.
pub trait TickHandler {
    fn on_fast(&mut self) {}
    fn on_medium(&mut self) {}
    fn on_slow(&mut self) {}
}

/// Tick dispatcher, scheduler loop and virtual counter pools of one timer.
///
/// Meant to live in a `static`: the interrupt handler reaches it through
/// [`on_interrupt`](Self::on_interrupt) and `main` through
/// [`run_once`](Self::run_once).
pub struct Scheduler<const F: usize, const M: usize, const S: usize> {
    config: SchedulerConfig,
    dispatcher: TickDispatcher,
    counters: VirtualCounters<F, M, S>,
}

impl<const F: usize, const M: usize, const S: usize> Scheduler<F, M, S> {
    pub const fn new(config: SchedulerConfig) -> Self {
        Self {
            dispatcher: TickDispatcher::new(&config),
            counters: VirtualCounters::new(),
            config,
        }
    }

    /// Reset tick state, program `timer` and route its interrupt to `handler`.
    ///
    /// `handler` must call [`on_interrupt`](Self::on_interrupt) on this
    /// scheduler. The interrupt stays masked until the timer is fully
    /// configured. A rejected configuration is reported before anything is
    /// touched, so a timer already running keeps its ticks and its handler.
    pub fn start<T, I>(&self, timer: &mut T, irq: &mut I, handler: Handler) -> SchedResult<TimerConfig>
    where
        T: TickSource,
        I: TimerInterrupt,
    {
        self.config.validate()?;
        timer.validate(self.config.frequency_hz, self.config.prescaler)?;

        irq.mask();
        self.dispatcher.reset();
        let timer_config = timer.start(self.config.frequency_hz, self.config.prescaler)?;
        irq.attach(handler);
        irq.unmask();

        info!(
            "scheduler: started at {}, medium every {} ticks, slow every {} ticks",
            timer_config, self.config.medium_period, self.config.slow_period
        );
        Ok(timer_config)
    }

    /// Resume tick generation after [`disable_timer`](Self::disable_timer).
    pub fn enable_timer<T: TickSource + ?Sized>(&self, timer: &mut T) {
        timer.enable();
        debug!("scheduler: timer resumed, pending {:?}", self.flags().pending());
    }

    /// Pause tick generation. Pending flags and counters are kept.
    pub fn disable_timer<T: TickSource + ?Sized>(&self, timer: &mut T) {
        timer.disable();
        debug!("scheduler: timer paused, pending {:?}", self.flags().pending());
    }

    /// Interrupt service routine body
    #[inline]
    pub fn on_interrupt(&self) {
        self.dispatcher.on_interrupt();
    }

    /// Service every raised tick once.
    ///
    /// For fast, medium and slow in turn: if the flag is raised it is cleared
    /// first, the virtual counters of that granularity advance by one tick,
    /// then the callback runs. A tick raised while its own callback runs is
    /// seen by the next call. Returns without doing anything when no flag is raised.
    pub fn run_once<A, B, C>(&self, on_fast: A, on_medium: B, on_slow: C) -> Ticks
    where
        A: FnOnce(),
        B: FnOnce(),
        C: FnOnce(),
    {
        let mut ticks = Ticks::NONE;
        if self.service(Granularity::Fast) {
            ticks.set(Granularity::Fast);
            on_fast();
        }
        if self.service(Granularity::Medium) {
            ticks.set(Granularity::Medium);
            on_medium();
        }
        if self.service(Granularity::Slow) {
            ticks.set(Granularity::Slow);
            on_slow();
        }
        ticks
    }

    /// [`run_once`](Self::run_once) with a [`TickHandler`]
    pub fn run_handler<H: TickHandler + ?Sized>(&self, handler: &mut H) -> Ticks {
        let mut ticks = Ticks::NONE;
        for granularity in Granularity::ALL {
            if !self.service(granularity) {
                continue;
            }
            ticks.set(granularity);
            match granularity {
                Granularity::Fast => handler.on_fast(),
                Granularity::Medium => handler.on_medium(),
                Granularity::Slow => handler.on_slow(),
            }
        }
        ticks
    }

    fn service(&self, granularity: Granularity) -> bool {
        if !self.dispatcher.flags().get(granularity).take() {
            return false;
        }
        self.counters.advance(granularity);
        true
    }

    /// Reset every virtual counter to idle
    pub fn init_virtual_counters(&self) {
        self.counters.init_all();
    }

    /// Arm slot `index` of the `granularity` pool with `ticks`
    pub fn arm_at(&self, granularity: Granularity, index: usize, ticks: u16) -> PalResult<()> {
        self.counters.arm_at(granularity, index, ticks)
    }

    pub fn counters(&self) -> &VirtualCounters<F, M, S> {
        &self.counters
    }

    pub fn flags(&self) -> &TickFlags {
        self.dispatcher.flags()
    }

    pub fn dispatcher(&self) -> &TickDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
