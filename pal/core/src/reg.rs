//! 32-bit register abstraction

use core::sync::atomic::{AtomicU32, Ordering};

/// A 32-bit hardware register.
///
/// Registers are interior-mutable by nature, so every operation takes
/// `&self`. Implementations must perform exactly one bus access per call.
pub trait Register {
    /// Read the whole register.
    fn read(&self) -> u32;

    /// Overwrite the whole register.
    fn write(&self, value: u32);

    /// Read-modify-write the register.
    ///
    /// Not atomic with respect to interrupts; callers sharing a register with
    /// an interrupt handler must serialize externally.
    #[inline]
    fn modify<F>(&self, f: F)
    where
        Self: Sized,
        F: FnOnce(u32) -> u32,
    {
        self.write(f(self.read()));
    }
}

impl<R: Register + ?Sized> Register for &R {
    #[inline]
    fn read(&self) -> u32 {
        (**self).read()
    }

    #[inline]
    fn write(&self, value: u32) {
        (**self).write(value)
    }
}

/// Memory-mapped register at a fixed physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    addr: usize,
}

impl Mmio {
    /// Create a handle for the register at `addr`.
    ///
    /// # Safety
    ///
    /// `addr` must be the 4-byte aligned address of a readable and writable
    /// 32-bit device register for the whole lifetime of the handle.
    pub const unsafe fn new(addr: usize) -> Self {
        Self { addr }
    }

    /// Register address
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Handle for the register `offset` bytes past this one.
    ///
    /// # Safety
    ///
    /// Same contract as [`Mmio::new`] for the resulting address.
    pub const unsafe fn offset(&self, offset: usize) -> Self {
        Self {
            addr: self.addr + offset,
        }
    }
}

impl Register for Mmio {
    #[inline]
    fn read(&self) -> u32 {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.addr as *const u32) }
    }

    #[inline]
    fn write(&self, value: u32) {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.addr as *mut u32, value) }
    }
}

/// RAM-backed register used to run drivers off-target.
///
/// Backed by an atomic so it can live in a `static` and be shared with a
/// thread standing in for an interrupt handler.
#[derive(Debug, Default)]
pub struct SimRegister {
    value: AtomicU32,
}

impl SimRegister {
    /// Create a register holding `value`
    pub const fn new(value: u32) -> Self {
        Self {
            value: AtomicU32::new(value),
        }
    }
}

impl Register for SimRegister {
    #[inline]
    fn read(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    fn write(&self, value: u32) {
        self.value.store(value, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_register_starts_at_reset_value() {
        let reg = SimRegister::new(0xDEAD_BEEF);
        assert_eq!(reg.read(), 0xDEAD_BEEF);
    }

    #[test]
    fn modify_applies_closure_to_current_value() {
        let reg = SimRegister::new(0x0F);
        reg.modify(|v| v << 4);
        assert_eq!(reg.read(), 0xF0);
    }

    #[test]
    fn register_is_usable_through_a_reference() {
        let reg = SimRegister::new(0);
        let by_ref: &dyn Register = &reg;
        by_ref.write(7);
        assert_eq!((&reg).read(), 7);
    }
}
