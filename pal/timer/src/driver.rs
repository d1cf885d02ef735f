//! TIMER1 driver

use log::{debug, warn};
use pal_core::{clear_bit, read_bit, read_field, set_bit, write_field, Register, CLOCK_HZ};

use crate::config::{Prescaler, TimerConfig};
use crate::regs::{
    TimerRegisters, COUNT_VALUE, CTRL_AUTO_RELOAD, CTRL_DIV, CTRL_ENABLE, CTRL_INT_TYPE,
    EDGE_TIMER1, INT_CLEAR, LOAD_VALUE,
};
use crate::TimerResult;

/// A periodic hardware tick source.
///
/// This is the narrow interface the tick scheduler needs from a timer.
pub trait TickSource {
    /// Check that `frequency_hz` and `prescaler` are reachable without
    /// touching the hardware.
    fn validate(&self, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<TimerConfig>;

    /// Program the timer for `frequency_hz` expiries per second and start it.
    fn start(&mut self, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<TimerConfig>;

    /// Let the counter run. Idempotent.
    fn enable(&mut self);

    /// Stop the counter. Idempotent.
    fn disable(&mut self);

    /// Whether the counter is running
    fn is_enabled(&self) -> bool;
}

/// Driver for the auto-reloading TIMER1 down-counter.
#[derive(Debug)]
pub struct HwTimer<R> {
    regs: TimerRegisters<R>,
    clock_hz: u32,
    config: Option<TimerConfig>,
}

impl<R: Register> HwTimer<R> {
    /// Wrap a register block clocked at [`CLOCK_HZ`].
    pub const fn new(regs: TimerRegisters<R>) -> Self {
        Self::with_clock(regs, CLOCK_HZ)
    }

    /// Wrap a register block clocked at `clock_hz`.
    pub const fn with_clock(regs: TimerRegisters<R>, clock_hz: u32) -> Self {
        Self {
            regs,
            clock_hz,
            config: None,
        }
    }

    /// Configure and arm the timer.
    ///
    /// The combination is validated before any register is written, so a
    /// rejected configuration leaves a running timer running. Otherwise the
    /// timer is disabled first and only re-enabled once prescaler, reload
    /// and auto-reload are in place, so a half-configured timer never fires.
    pub fn configure(&mut self, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<TimerConfig> {
        let config = TimerConfig::new(self.clock_hz, frequency_hz, prescaler).map_err(|err| {
            warn!("timer1: rejected {} Hz with prescaler {}: {}", frequency_hz, prescaler, err);
            err
        })?;

        self.disable();

        write_field(&self.regs.ctrl, CTRL_DIV, prescaler.field_value())?;
        write_field(&self.regs.load, LOAD_VALUE, config.reload())?;
        set_bit(&self.regs.ctrl, CTRL_AUTO_RELOAD);
        clear_bit(&self.regs.ctrl, CTRL_INT_TYPE);

        self.enable();

        clear_bit(&self.regs.int, INT_CLEAR);
        set_bit(&self.regs.edge_int, EDGE_TIMER1);

        debug!("timer1: configured {}", config);
        self.config = Some(config);
        Ok(config)
    }

    /// Set CTRL enable
    pub fn enable(&mut self) {
        set_bit(&self.regs.ctrl, CTRL_ENABLE);
    }

    /// Clear CTRL enable
    pub fn disable(&mut self) {
        clear_bit(&self.regs.ctrl, CTRL_ENABLE);
    }

    pub fn is_enabled(&self) -> bool {
        read_bit(&self.regs.ctrl, CTRL_ENABLE)
    }

    /// Current counter value
    pub fn count(&self) -> u32 {
        read_field(&self.regs.count, COUNT_VALUE)
    }

    /// Last accepted configuration
    pub fn config(&self) -> Option<TimerConfig> {
        self.config
    }

    pub fn registers(&self) -> &TimerRegisters<R> {
        &self.regs
    }

    /// Release the register block
    pub fn free(self) -> TimerRegisters<R> {
        self.regs
    }
}

impl<R: Register> TickSource for HwTimer<R> {
    fn validate(&self, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<TimerConfig> {
        TimerConfig::new(self.clock_hz, frequency_hz, prescaler)
    }

    fn start(&mut self, frequency_hz: u32, prescaler: Prescaler) -> TimerResult<TimerConfig> {
        self.configure(frequency_hz, prescaler)
    }

    fn enable(&mut self) {
        HwTimer::enable(self)
    }

    fn disable(&mut self) {
        HwTimer::disable(self)
    }

    fn is_enabled(&self) -> bool {
        HwTimer::is_enabled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimerError;
    use pal_core::SimRegister;

    fn sim_block(regs: &[SimRegister; 5]) -> TimerRegisters<&SimRegister> {
        TimerRegisters::new(&regs[0], &regs[1], &regs[2], &regs[3], &regs[4])
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let regs: [SimRegister; 5] = Default::default();
        let mut timer = HwTimer::new(sim_block(&regs));

        timer.enable();
        timer.enable();
        assert!(timer.is_enabled());
        assert_eq!(regs[2].read(), 1 << CTRL_ENABLE);

        timer.disable();
        timer.disable();
        assert!(!timer.is_enabled());
        assert_eq!(regs[2].read(), 0);
    }

    #[test]
    fn rejected_configuration_does_not_stop_a_running_timer() {
        let regs: [SimRegister; 5] = Default::default();
        let mut timer = HwTimer::new(sim_block(&regs));
        timer.configure(100_000, Prescaler::Div16).unwrap();
        let before = regs[2].read();

        let err = timer.configure(1, Prescaler::Div1).unwrap_err();

        assert_eq!(err, TimerError::ReloadOverflow { reload: 80_000_000 });
        assert!(timer.is_enabled());
        assert_eq!(regs[2].read(), before);
        assert_eq!(timer.config().map(|c| c.reload()), Some(50));
    }

    #[test]
    fn validate_writes_nothing() {
        let regs: [SimRegister; 5] = Default::default();
        let timer = HwTimer::with_clock(sim_block(&regs), 16_000_000);

        assert_eq!(timer.validate(1_000, Prescaler::Div16).map(|c| c.reload()), Ok(1_000));
        assert_eq!(
            timer.validate(0, Prescaler::Div16),
            Err(TimerError::ZeroFrequency)
        );
        assert!(regs.iter().all(|reg| reg.read() == 0));
        assert_eq!(timer.config(), None);
    }

    #[test]
    fn count_reads_the_low_23_bits() {
        let regs: [SimRegister; 5] = Default::default();
        regs[1].write(0xFF80_0031);
        let timer = HwTimer::new(sim_block(&regs));
        assert_eq!(timer.count(), 0x31);
    }
}
