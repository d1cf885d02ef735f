//! Scheduler configuration

use core::fmt;

use pal_timer::Prescaler;

use crate::{SchedError, SchedResult};

/// One of the three synthesized time bases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Granularity {
    /// One tick per timer expiry
    Fast,
    /// One tick every `medium_period` fast ticks
    Medium,
    /// One tick every `slow_period` fast ticks
    Slow,
}

impl Granularity {
    /// All granularities, in service order
    pub const ALL: [Granularity; 3] = [Self::Fast, Self::Medium, Self::Slow];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Medium => write!(f, "medium"),
            Self::Slow => write!(f, "slow"),
        }
    }
}

/// Tick frequencies of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerConfig {
    /// Timer expiry rate, i.e. the fast tick rate
    pub frequency_hz: u32,
    /// Timer clock divisor
    pub prescaler: Prescaler,
    /// Medium tick period in fast ticks
    pub medium_period: u32,
    /// Slow tick period in fast ticks
    pub slow_period: u32,
}

impl SchedulerConfig {
    /// 10 µs fast tick, 1 ms medium tick, 1 s slow tick.
    pub const DEFAULT: Self = Self {
        frequency_hz: 100_000,
        prescaler: Prescaler::Div16,
        medium_period: 100,
        slow_period: 100_000,
    };

    pub const fn new() -> Self {
        Self::DEFAULT
    }

    pub const fn with_frequency(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub const fn with_prescaler(mut self, prescaler: Prescaler) -> Self {
        self.prescaler = prescaler;
        self
    }

    pub const fn with_medium_period(mut self, fast_ticks: u32) -> Self {
        self.medium_period = fast_ticks;
        self
    }

    pub const fn with_slow_period(mut self, fast_ticks: u32) -> Self {
        self.slow_period = fast_ticks;
        self
    }

    /// Check the cascade periods. The timer validates the frequency itself.
    pub fn validate(&self) -> SchedResult<()> {
        if self.medium_period == 0 {
            return Err(SchedError::InvalidPeriod {
                granularity: Granularity::Medium,
            });
        }
        if self.slow_period == 0 {
            return Err(SchedError::InvalidPeriod {
                granularity: Granularity::Slow,
            });
        }
        Ok(())
    }

    /// Period of `granularity` in fast ticks
    pub const fn period_ticks(&self, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Fast => 1,
            Granularity::Medium => self.medium_period,
            Granularity::Slow => self.slow_period,
        }
    }

    /// Nominal period of `granularity` in nanoseconds
    pub const fn period_ns(&self, granularity: Granularity) -> u64 {
        if self.frequency_hz == 0 {
            return 0;
        }
        self.period_ticks(granularity) as u64 * 1_000_000_000 / self.frequency_hz as u64
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_periods_are_10us_1ms_1s() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.period_ns(Granularity::Fast), 10_000);
        assert_eq!(cfg.period_ns(Granularity::Medium), 1_000_000);
        assert_eq!(cfg.period_ns(Granularity::Slow), 1_000_000_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_period_is_rejected() {
        let cfg = SchedulerConfig::new().with_medium_period(0);
        assert_eq!(
            cfg.validate(),
            Err(SchedError::InvalidPeriod {
                granularity: Granularity::Medium
            })
        );
        let cfg = SchedulerConfig::new().with_slow_period(0);
        assert_eq!(
            cfg.validate(),
            Err(SchedError::InvalidPeriod {
                granularity: Granularity::Slow
            })
        );
    }
}
