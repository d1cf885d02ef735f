//! Virtual counters
//!
//! Fixed pools of software countdown slots, one pool per tick granularity.
//! Application code arms a slot with a number of ticks and polls it until it
//! expires; the scheduler loop advances every armed slot of a pool once per
//! tick of that pool's granularity.
//!
//! Slots are addressed by [`SlotId`], which can only be obtained through a
//! bounds-checked lookup, so arming and querying never index out of range.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use log::warn;
use pal_core::{PalError, PalResult};

use crate::config::Granularity;

/// Slots per pool unless configured otherwise
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// One countdown slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtualCounter {
    value: u16,
    armed: bool,
}

impl VirtualCounter {
    /// State of every slot after initialization
    pub const IDLE: Self = Self {
        value: 1,
        armed: false,
    };

    /// A slot counting down `ticks`
    pub const fn armed(ticks: u16) -> Self {
        Self {
            value: ticks,
            armed: true,
        }
    }

    /// Remaining ticks
    pub const fn value(&self) -> u16 {
        self.value
    }

    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether the slot is not (or no longer) counting down
    pub const fn is_expired(&self) -> bool {
        !self.armed
    }

    /// Apply one tick; returns true on the tick that expires the slot.
    ///
    /// A slot armed with zero ticks expires on its first tick.
    fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.value = self.value.saturating_sub(1);
        if self.value == 0 {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

impl Default for VirtualCounter {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Checked index of a slot in a pool of `N` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId<const N: usize> {
    index: usize,
}

impl<const N: usize> SlotId<N> {
    /// Checked constructor
    pub const fn new(index: usize) -> PalResult<Self> {
        if index < N {
            Ok(Self { index })
        } else {
            Err(PalError::IndexOutOfRange { index, capacity: N })
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<const N: usize> fmt::Display for SlotId<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}/{}", self.index, N)
    }
}

/// A fixed pool of `N` virtual counters
pub struct CounterPool<const N: usize> {
    slots: Mutex<RefCell<[VirtualCounter; N]>>,
}

impl<const N: usize> CounterPool<N> {
    /// A pool with every slot idle
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([VirtualCounter::IDLE; N])),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Look up slot `index`
    pub fn slot(&self, index: usize) -> PalResult<SlotId<N>> {
        SlotId::new(index)
    }

    /// Reset every slot to idle
    pub fn init(&self) {
        critical_section::with(|cs| {
            *self.slots.borrow_ref_mut(cs) = [VirtualCounter::IDLE; N];
        });
    }

    /// Start counting `ticks` on `slot`. Re-arming overwrites a countdown in
    /// progress.
    pub fn arm(&self, slot: SlotId<N>, ticks: u16) {
        critical_section::with(|cs| {
            self.slots.borrow_ref_mut(cs)[slot.index] = VirtualCounter::armed(ticks);
        });
    }

    /// Stop `slot` without waiting for it to expire
    pub fn disarm(&self, slot: SlotId<N>) {
        critical_section::with(|cs| {
            self.slots.borrow_ref_mut(cs)[slot.index].armed = false;
        });
    }

    /// Snapshot of `slot`
    pub fn get(&self, slot: SlotId<N>) -> VirtualCounter {
        critical_section::with(|cs| self.slots.borrow_ref(cs)[slot.index])
    }

    pub fn is_armed(&self, slot: SlotId<N>) -> bool {
        self.get(slot).is_armed()
    }

    pub fn is_expired(&self, slot: SlotId<N>) -> bool {
        self.get(slot).is_expired()
    }

    pub fn value(&self, slot: SlotId<N>) -> u16 {
        self.get(slot).value()
    }

    /// Apply one tick to every armed slot; returns how many expired.
    pub fn advance(&self) -> usize {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref_mut(cs)
                .iter_mut()
                .map(|slot| slot.tick())
                .filter(|expired| *expired)
                .count()
        })
    }

    /// Number of slots currently counting down
    pub fn armed_count(&self) -> usize {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref(cs)
                .iter()
                .filter(|slot| slot.is_armed())
                .count()
        })
    }
}

impl<const N: usize> Default for CounterPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The fast, medium and slow pools
pub struct VirtualCounters<const F: usize, const M: usize, const S: usize> {
    fast: CounterPool<F>,
    medium: CounterPool<M>,
    slow: CounterPool<S>,
}

impl<const F: usize, const M: usize, const S: usize> VirtualCounters<F, M, S> {
    pub const fn new() -> Self {
        Self {
            fast: CounterPool::new(),
            medium: CounterPool::new(),
            slow: CounterPool::new(),
        }
    }

    pub fn fast(&self) -> &CounterPool<F> {
        &self.fast
    }

    pub fn medium(&self) -> &CounterPool<M> {
        &self.medium
    }

    pub fn slow(&self) -> &CounterPool<S> {
        &self.slow
    }

    /// Reset every slot of every pool
    pub fn init_all(&self) {
        self.fast.init();
        self.medium.init();
        self.slow.init();
    }

    /// Capacity of the `granularity` pool
    pub const fn capacity(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Fast => F,
            Granularity::Medium => M,
            Granularity::Slow => S,
        }
    }

    /// Arm slot `index` of the `granularity` pool.
    pub fn arm_at(&self, granularity: Granularity, index: usize, ticks: u16) -> PalResult<()> {
        let result = match granularity {
            Granularity::Fast => self.fast.slot(index).map(|id| self.fast.arm(id, ticks)),
            Granularity::Medium => self.medium.slot(index).map(|id| self.medium.arm(id, ticks)),
            Granularity::Slow => self.slow.slot(index).map(|id| self.slow.arm(id, ticks)),
        };
        if let Err(err) = &result {
            warn!("{} counters: cannot arm: {}", granularity, err);
        }
        result
    }

    /// Snapshot of slot `index` of the `granularity` pool.
    pub fn get_at(&self, granularity: Granularity, index: usize) -> PalResult<VirtualCounter> {
        match granularity {
            Granularity::Fast => self.fast.slot(index).map(|id| self.fast.get(id)),
            Granularity::Medium => self.medium.slot(index).map(|id| self.medium.get(id)),
            Granularity::Slow => self.slow.slot(index).map(|id| self.slow.get(id)),
        }
    }

    /// Apply one tick to the `granularity` pool; returns how many slots expired.
    pub fn advance(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Fast => self.fast.advance(),
            Granularity::Medium => self.medium.advance(),
            Granularity::Slow => self.slow.advance(),
        }
    }
}

impl<const F: usize, const M: usize, const S: usize> Default for VirtualCounters<F, M, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pool_is_idle() {
        let pool: CounterPool<4> = CounterPool::new();
        for index in 0..4 {
            let slot = pool.slot(index).unwrap();
            assert_eq!(pool.get(slot), VirtualCounter::IDLE);
            assert_eq!(pool.value(slot), 1);
        }
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let pool: CounterPool<4> = CounterPool::new();
        assert_eq!(
            pool.slot(4),
            Err(PalError::IndexOutOfRange { index: 4, capacity: 4 })
        );
    }

    #[test]
    fn zero_tick_arm_expires_on_first_tick() {
        let pool: CounterPool<1> = CounterPool::new();
        let slot = pool.slot(0).unwrap();
        pool.arm(slot, 0);
        assert!(pool.is_armed(slot));
        assert_eq!(pool.advance(), 1);
        assert!(pool.is_expired(slot));
        assert_eq!(pool.value(slot), 0);
    }

    #[test]
    fn idle_slots_are_not_decremented() {
        let pool: CounterPool<2> = CounterPool::new();
        assert_eq!(pool.advance(), 0);
        assert_eq!(pool.value(pool.slot(1).unwrap()), 1);
    }

    #[test]
    fn disarm_stops_the_countdown() {
        let pool: CounterPool<1> = CounterPool::new();
        let slot = pool.slot(0).unwrap();
        pool.arm(slot, 3);
        pool.advance();
        pool.disarm(slot);
        pool.advance();
        assert!(pool.is_expired(slot));
        assert_eq!(pool.value(slot), 2);
    }

    #[test]
    fn pools_advance_independently() {
        let counters: VirtualCounters<2, 3, 4> = VirtualCounters::new();
        counters.arm_at(Granularity::Fast, 0, 2).unwrap();
        counters.arm_at(Granularity::Slow, 3, 2).unwrap();

        counters.advance(Granularity::Fast);

        assert_eq!(counters.get_at(Granularity::Fast, 0).unwrap().value(), 1);
        assert_eq!(counters.get_at(Granularity::Slow, 3).unwrap().value(), 2);
        assert_eq!(counters.capacity(Granularity::Medium), 3);
        assert!(counters.arm_at(Granularity::Medium, 3, 1).is_err());
    }
}
